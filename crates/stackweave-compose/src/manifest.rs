//! The synthesized hand-off to the provisioning engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackweave_common::error::Result;
use stackweave_common::types::Address;

use crate::graph::DependencyEdge;
use crate::resource::ResourceDeclaration;
use crate::value::Value;

/// Declarations plus the validated ordering constraints between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the root construct.
    pub stack: String,
    /// Every declaration, in topological creation order.
    pub resources: Vec<ResourceDeclaration>,
    /// Producer-to-consumer edges.
    pub edges: Vec<DependencyEdge>,
    /// Groups of resources that may be created in parallel, in order.
    pub stages: Vec<Vec<Address>>,
    /// Exported outputs of every construct that has any.
    pub outputs: BTreeMap<Address, BTreeMap<String, Value>>,
}

impl Manifest {
    /// Looks up a declaration by address.
    #[must_use]
    pub fn resource(&self, address: &Address) -> Option<&ResourceDeclaration> {
        self.resources.iter().find(|r| r.address == *address)
    }

    /// Position of `address` in the creation order.
    #[must_use]
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.resources.iter().position(|r| r.address == *address)
    }

    /// Returns `true` if the manifest carries an edge `from -> to`.
    #[must_use]
    pub fn has_edge(&self, from: &Address, to: &Address) -> bool {
        self.edges.iter().any(|e| e.from == *from && e.to == *to)
    }

    /// Serializes the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a manifest previously produced by [`Manifest::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid manifest.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}
