//! Entry point for a single composition pass.

use std::collections::{BTreeMap, HashMap};

use stackweave_common::config::ComposeSettings;
use stackweave_common::error::Result;
use stackweave_common::types::Address;

use crate::construct::{Blueprint, Construct, compose};
use crate::context::CompositionContext;
use crate::graph::Graph;
use crate::manifest::Manifest;
use crate::resource::{ResourceHandle, ResourceSpec, declare};

/// A root construct together with the context of its composition pass.
#[derive(Debug)]
pub struct Stack {
    root: Construct,
    ctx: CompositionContext,
}

impl Stack {
    /// Starts a pass for a stack named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a valid logical id.
    pub fn new(name: &str, settings: ComposeSettings) -> Result<Self> {
        Ok(Self {
            root: Construct::root(name)?,
            ctx: CompositionContext::new(settings),
        })
    }

    /// Address of the root construct.
    #[must_use]
    pub const fn path(&self) -> &Address {
        self.root.path()
    }

    /// The composition tree built so far.
    #[must_use]
    pub const fn root(&self) -> &Construct {
        &self.root
    }

    /// Stack-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &ComposeSettings {
        self.ctx.settings()
    }

    /// Composes blueprint `B` directly under the root.
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn compose<B: Blueprint>(
        &mut self,
        id: &str,
        config: B::Config,
        depends_on: &[Address],
    ) -> Result<B::Outputs> {
        compose::<B>(&mut self.ctx, &mut self.root, id, config, depends_on)
    }

    /// Declares a resource directly under the root.
    ///
    /// # Errors
    ///
    /// See [`declare`].
    pub fn declare(&mut self, spec: ResourceSpec) -> Result<ResourceHandle> {
        declare(&mut self.ctx, &mut self.root, spec)
    }

    /// Ends the pass: validates the graph and produces the manifest.
    ///
    /// # Errors
    ///
    /// Returns a dangling-reference or cyclic-dependency error from
    /// [`GraphBuilder::finalize`](crate::graph::GraphBuilder::finalize).
    pub fn synth(self) -> Result<Manifest> {
        self.synth_with_graph().map(|(manifest, _)| manifest)
    }

    /// Like [`Stack::synth`], also returning the finalized graph.
    ///
    /// # Errors
    ///
    /// See [`Stack::synth`].
    pub fn synth_with_graph(self) -> Result<(Manifest, Graph)> {
        let graph = self.ctx.finalize()?;

        let mut by_address: HashMap<&Address, _> = self
            .root
            .all_resources()
            .into_iter()
            .map(|r| (&r.address, r))
            .collect();
        let resources = graph
            .order()
            .iter()
            .filter_map(|address| by_address.remove(address).cloned())
            .collect();

        let outputs: BTreeMap<_, _> = self
            .root
            .all_constructs()
            .into_iter()
            .filter(|c| !c.outputs().is_empty())
            .map(|c| (c.path().clone(), c.outputs().clone()))
            .collect();

        let manifest = Manifest {
            stack: self.root.id().to_string(),
            resources,
            edges: graph.edges(),
            stages: graph.stages().to_vec(),
            outputs,
        };
        tracing::info!(
            stack = %manifest.stack,
            resources = manifest.resources.len(),
            edges = manifest.edges.len(),
            "synthesized manifest"
        );
        Ok((manifest, graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn synth_orders_resources_and_keeps_edges() {
        let mut stack = Stack::new("app", ComposeSettings::default()).expect("stack");
        let producer = stack
            .declare(ResourceSpec::new("gcp_service_account", "sa"))
            .expect("sa");
        let consumer = stack
            .declare(ResourceSpec::new("gcp_project_iam_member", "binding").set("member", producer.attr("email")))
            .expect("binding");

        let manifest = stack.synth().expect("synth");
        assert_eq!(manifest.stack, "app");
        assert_eq!(manifest.resources.len(), 2);
        assert!(manifest.has_edge(producer.address(), consumer.address()));
        assert!(manifest.position(producer.address()) < manifest.position(consumer.address()));
        assert_eq!(
            manifest
                .resource(consumer.address())
                .and_then(|r| r.config.get("member")),
            Some(&Value::Ref(producer.reference("email")))
        );
    }

    #[test]
    fn manifest_json_roundtrip_preserves_references() {
        let mut stack = Stack::new("app", ComposeSettings::default()).expect("stack");
        let sa = stack
            .declare(ResourceSpec::new("gcp_service_account", "sa"))
            .expect("sa");
        let _ = stack
            .declare(ResourceSpec::new("gcp_project_iam_member", "binding").set("member", sa.attr("email")))
            .expect("binding");
        let manifest = stack.synth().expect("synth");

        let json = manifest.to_json().expect("json");
        assert!(json.contains("\"$ref\": \"app/sa\""));
        assert_eq!(Manifest::from_json(&json).expect("parse"), manifest);
    }
}
