//! Per-pass composition context.
//!
//! Every `compose` and `declare` call receives the context explicitly.
//! Nothing is process-wide, so independent passes never observe each
//! other's declarations.

use stackweave_common::config::ComposeSettings;
use stackweave_common::error::Result;

use crate::graph::{Graph, GraphBuilder};

/// Mutable state of a single composition pass.
#[derive(Debug, Default)]
pub struct CompositionContext {
    settings: ComposeSettings,
    graph: GraphBuilder,
}

impl CompositionContext {
    /// Creates a context for one pass with the given settings.
    #[must_use]
    pub fn new(settings: ComposeSettings) -> Self {
        Self {
            settings,
            graph: GraphBuilder::new(),
        }
    }

    /// Stack-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &ComposeSettings {
        &self.settings
    }

    /// The dependency graph accumulated so far.
    #[must_use]
    pub const fn graph(&self) -> &GraphBuilder {
        &self.graph
    }

    /// Mutable access to the dependency graph.
    pub const fn graph_mut(&mut self) -> &mut GraphBuilder {
        &mut self.graph
    }

    /// Ends the pass and validates the accumulated graph.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::finalize`].
    pub fn finalize(self) -> Result<Graph> {
        self.graph.finalize()
    }
}
