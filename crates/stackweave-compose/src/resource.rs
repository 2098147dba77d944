//! Resource declarations.
//!
//! A [`ResourceSpec`] describes one external resource before registration;
//! [`declare`] turns it into a [`ResourceDeclaration`] owned by a construct
//! and records its ordering edges in the composition context.

use serde::{Deserialize, Serialize};
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::{Address, ResourceKind, validate_logical_id};

use crate::construct::Construct;
use crate::context::CompositionContext;
use crate::merge::merge_config;
use crate::value::{Config, DeferredReference, Value, config_references};

/// One unit of desired external state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Engine-facing resource type.
    pub kind: ResourceKind,
    /// Identifier unique among the owning construct's children.
    pub logical_id: String,
    /// Globally unique address (construct path + logical id).
    pub address: Address,
    /// Merged configuration; may contain deferred references.
    pub config: Config,
    /// Explicit ordering constraints without a data dependency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Address>,
}

impl ResourceDeclaration {
    /// Every deferred reference embedded in the config.
    #[must_use]
    pub fn references(&self) -> Vec<&DeferredReference> {
        config_references(&self.config)
    }
}

/// Builder describing a resource before it is declared.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    kind: ResourceKind,
    logical_id: String,
    defaults: Config,
    config: Config,
    depends_on: Vec<Address>,
}

impl ResourceSpec {
    /// Starts a spec for a resource of `kind` named `logical_id`.
    #[must_use]
    pub fn new(kind: impl Into<ResourceKind>, logical_id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            logical_id: logical_id.into(),
            defaults: Config::new(),
            config: Config::new(),
            depends_on: Vec::new(),
        }
    }

    /// Replaces the construct-supplied defaults.
    #[must_use]
    pub fn defaults(mut self, defaults: Config) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets one default property.
    #[must_use]
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.defaults.insert(key.into(), value.into());
        self
    }

    /// Adds caller overrides; later calls win over earlier ones.
    #[must_use]
    pub fn config(mut self, overrides: Config) -> Self {
        self.config.extend(overrides);
        self
    }

    /// Sets one caller property.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.config.insert(key.into(), value.into());
        self
    }

    /// Sets a caller property only when `value` is present.
    #[must_use]
    pub fn set_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Orders this resource after `dependency` (a resource or construct).
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<Address>) -> Self {
        let dependency = dependency.into();
        if !self.depends_on.contains(&dependency) {
            self.depends_on.push(dependency);
        }
        self
    }
}

/// Handle to a declared resource, used to reference its outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    address: Address,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// Address of the declared resource.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Kind of the declared resource.
    #[must_use]
    pub const fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Deferred reference to output `attribute`.
    #[must_use]
    pub fn reference(&self, attribute: &str) -> DeferredReference {
        DeferredReference::new(self.address.clone(), attribute)
    }

    /// Output `attribute` as a config value.
    #[must_use]
    pub fn attr(&self, attribute: &str) -> Value {
        Value::Ref(self.reference(attribute))
    }
}

impl From<&ResourceHandle> for Address {
    fn from(handle: &ResourceHandle) -> Self {
        handle.address.clone()
    }
}

/// Declares a resource inside `scope`.
///
/// Defaults and caller config are merged with [`merge_config`]. The
/// declaration is added to `scope` and its node to the context graph,
/// together with an edge from every referenced producer and every explicit
/// dependency.
///
/// # Errors
///
/// Returns [`StackweaveError::DuplicateIdentifier`] if `scope` already has a
/// child with the same logical id, whatever its kind, or a configuration
/// error if the logical id is not a valid address segment.
pub fn declare(
    ctx: &mut CompositionContext,
    scope: &mut Construct,
    spec: ResourceSpec,
) -> Result<ResourceHandle> {
    validate_logical_id(&spec.logical_id)?;
    if scope.contains_id(&spec.logical_id) {
        return Err(StackweaveError::DuplicateIdentifier {
            scope: scope.path().clone(),
            id: spec.logical_id,
        });
    }

    let address = scope.path().child(&spec.logical_id);
    let declaration = ResourceDeclaration {
        config: merge_config(&spec.defaults, &spec.config),
        kind: spec.kind,
        logical_id: spec.logical_id,
        address: address.clone(),
        depends_on: spec.depends_on,
    };

    let graph = ctx.graph_mut();
    graph.add_resource(&address)?;
    for reference in declaration.references() {
        graph.add_edge(reference.target.clone(), address.clone());
    }
    for dependency in &declaration.depends_on {
        graph.add_edge(dependency.clone(), address.clone());
    }

    tracing::debug!(
        %address,
        kind = %declaration.kind,
        references = declaration.references().len(),
        depends_on = declaration.depends_on.len(),
        "declared resource"
    );
    let handle = ResourceHandle {
        address,
        kind: declaration.kind.clone(),
    };
    scope.push_resource(declaration);
    Ok(handle)
}
