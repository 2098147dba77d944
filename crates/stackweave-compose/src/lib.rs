//! # stackweave-compose
//!
//! Dependency-aware composition of cloud resource declarations.
//!
//! Handles:
//! - **Naming**: deterministic identifier derivation per resource kind.
//! - **Value / Merge**: config values, deferred references, override-wins merging.
//! - **Resource**: declaration of single resources inside a construct.
//! - **Construct**: nestable bundles and the [`Blueprint`](construct::Blueprint) trait.
//! - **Graph**: dependency graph construction, cycle detection and ordering.
//! - **Stack / Manifest**: one composition pass and its hand-off to the engine.
//! - **Resolve**: substitution of materialized outputs into configs.
//! - **Template**: named-variable rendering for generated files.
//! - **Constructs**: the opinionated construct library.
//!
//! # Example
//!
//! ```rust
//! use stackweave_common::config::ComposeSettings;
//! use stackweave_compose::constructs::{Project, ProjectConfig};
//! use stackweave_compose::stack::Stack;
//!
//! let mut stack = Stack::new("acme", ComposeSettings::default())?;
//! let project = stack.compose::<Project>(
//!     "dev",
//!     ProjectConfig {
//!         name: "acme".into(),
//!         environment: Some("dev".into()),
//!         ..ProjectConfig::default()
//!     },
//!     &[],
//! )?;
//! assert_eq!(project.project_id, "acme-dev");
//! let manifest = stack.synth()?;
//! assert_eq!(manifest.resources.len(), 1);
//! # Ok::<(), stackweave_common::error::StackweaveError>(())
//! ```

pub mod construct;
pub mod constructs;
pub mod context;
pub mod graph;
pub mod manifest;
pub mod merge;
pub mod naming;
pub mod resolve;
pub mod resource;
pub mod stack;
pub mod template;
pub mod value;
