//! Constructs: named, nestable bundles of resource declarations.
//!
//! A [`Construct`] exclusively owns its child declarations and child
//! constructs. Reusable bundles implement [`Blueprint`] and are
//! instantiated under a parent with [`compose`].

use std::collections::BTreeMap;

use serde::Serialize;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::{Address, validate_logical_id};

use crate::context::CompositionContext;
use crate::resource::ResourceDeclaration;
use crate::value::Value;

/// Kind recorded for root constructs.
pub const ROOT_KIND: &str = "stack";

/// A node of the composition tree.
#[derive(Debug, Clone, Serialize)]
pub struct Construct {
    kind: String,
    path: Address,
    resources: Vec<ResourceDeclaration>,
    children: Vec<Construct>,
    outputs: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<Address>,
}

impl Construct {
    /// Creates a root construct named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a valid logical id.
    pub fn root(name: &str) -> Result<Self> {
        Ok(Self::new(ROOT_KIND, Address::root(name)?))
    }

    fn new(kind: &str, path: Address) -> Self {
        Self {
            kind: kind.to_string(),
            path,
            resources: Vec::new(),
            children: Vec::new(),
            outputs: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Construct kind, e.g. `project` or `stack`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Logical id of this construct.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.logical_id()
    }

    /// Address of this construct.
    #[must_use]
    pub const fn path(&self) -> &Address {
        &self.path
    }

    /// Direct child declarations, in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    /// Direct child constructs, in composition order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Exported outputs.
    #[must_use]
    pub const fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    /// A single exported output.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Explicit dependencies supplied when this construct was composed.
    #[must_use]
    pub fn depends_on(&self) -> &[Address] {
        &self.depends_on
    }

    /// Returns `true` if a direct child resource or construct uses `id`.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.resources.iter().any(|r| r.logical_id == id)
            || self.children.iter().any(|c| c.id() == id)
    }

    /// Every declaration in this subtree, depth first, in declaration order.
    #[must_use]
    pub fn all_resources(&self) -> Vec<&ResourceDeclaration> {
        let mut found: Vec<&ResourceDeclaration> = self.resources.iter().collect();
        for child in &self.children {
            found.extend(child.all_resources());
        }
        found
    }

    /// Every construct in this subtree, including `self`, depth first.
    #[must_use]
    pub fn all_constructs(&self) -> Vec<&Self> {
        let mut found = vec![self];
        for child in &self.children {
            found.extend(child.all_constructs());
        }
        found
    }

    /// Finds a construct in this subtree by address.
    #[must_use]
    pub fn find(&self, path: &Address) -> Option<&Self> {
        if self.path == *path {
            return Some(self);
        }
        if !path.is_within(&self.path) {
            return None;
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    pub(crate) fn push_resource(&mut self, declaration: ResourceDeclaration) {
        self.resources.push(declaration);
    }

    fn resource_addresses(&self) -> Vec<Address> {
        self.all_resources()
            .into_iter()
            .map(|r| r.address.clone())
            .collect()
    }
}

/// A reusable construct definition.
///
/// `build` validates the config, declares resources and nested constructs in
/// a fixed order, and returns typed outputs. `exports` selects the outputs
/// other constructs may depend on; everything else is an implementation
/// detail of the blueprint.
pub trait Blueprint {
    /// Caller-supplied configuration.
    type Config;
    /// Typed outputs handed back to the caller.
    type Outputs;

    /// Kind recorded on the construct node.
    const KIND: &'static str;

    /// Populates `scope` from `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required field is missing or
    /// malformed, or any error raised while declaring children.
    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: Self::Config,
    ) -> Result<Self::Outputs>;

    /// Outputs re-exported on the construct node.
    fn exports(outputs: &Self::Outputs) -> BTreeMap<String, Value>;
}

/// Instantiates blueprint `B` as child `id` of `parent`.
///
/// Every resource in the new subtree is ordered after each address in
/// `depends_on`, which may name resources or constructs.
///
/// # Errors
///
/// Returns [`StackweaveError::DuplicateIdentifier`] if `parent` already has a
/// child named `id`, or any error raised by the blueprint. On error neither
/// `parent` nor the context graph keeps anything from the failed build.
pub fn compose<B: Blueprint>(
    ctx: &mut CompositionContext,
    parent: &mut Construct,
    id: &str,
    config: B::Config,
    depends_on: &[Address],
) -> Result<B::Outputs> {
    validate_logical_id(id)?;
    if parent.contains_id(id) {
        return Err(StackweaveError::DuplicateIdentifier {
            scope: parent.path().clone(),
            id: id.to_string(),
        });
    }

    let mut node = Construct::new(B::KIND, parent.path().child(id));
    let checkpoint = ctx.graph().checkpoint();
    let outputs = match B::build(ctx, &mut node, config) {
        Ok(outputs) => outputs,
        Err(err) => {
            // The node is dropped, so nothing it registered may survive.
            ctx.graph_mut().rollback(checkpoint);
            tracing::debug!(path = %node.path, error = %err, "construct discarded");
            return Err(err);
        }
    };
    node.outputs = B::exports(&outputs);
    node.depends_on = depends_on.to_vec();

    let members = node.resource_addresses();
    let graph = ctx.graph_mut();
    for dependency in depends_on {
        for member in &members {
            graph.add_edge(dependency.clone(), member.clone());
        }
    }
    tracing::info!(
        path = %node.path,
        kind = B::KIND,
        resources = members.len(),
        "composed construct"
    );
    graph.add_construct(node.path.clone(), members);
    parent.children.push(node);
    Ok(outputs)
}
