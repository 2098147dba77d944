//! Stack file loading.
//!
//! A stack file (YAML or JSON) names the stack, its settings, the constructs
//! to compose and any raw resources to declare next to them:
//!
//! ```yaml
//! name: acme
//! settings:
//!   org_domain: acme.io
//! constructs:
//!   - kind: repository
//!     id: infra
//!     config: { name: acme-infra }
//!   - kind: environment
//!     id: dev
//!     config:
//!       name: acme
//!       environment: dev
//!       repository: { "$ref": acme/infra/repository, attribute: name }
//! resources:
//!   - kind: gcp_storage_bucket
//!     id: artifacts
//!     config:
//!       project: { "$ref": acme/dev/project/project, attribute: project_id }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use stackweave_common::config::ComposeSettings;
use stackweave_common::error::{Result, read_file};
use stackweave_common::types::Address;
use stackweave_compose::constructs::{
    Environment, EnvironmentConfig, Pipeline, PipelineConfig, Project, ProjectConfig, Repository,
    RepositoryConfig, ServiceAccount, ServiceAccountConfig,
};
use stackweave_compose::graph::Graph;
use stackweave_compose::manifest::Manifest;
use stackweave_compose::resource::ResourceSpec;
use stackweave_compose::stack::Stack;
use stackweave_compose::value::Config;

/// Parsed stack file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFile {
    /// Name of the root construct.
    pub name: String,
    /// Stack-wide settings.
    #[serde(default)]
    pub settings: ComposeSettings,
    /// Constructs composed under the root, in order.
    #[serde(default)]
    pub constructs: Vec<ConstructEntry>,
    /// Raw resources declared under the root after the constructs.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// One construct instantiation.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstructEntry {
    /// A cloud project.
    Project(Entry<ProjectConfig>),
    /// A service account with role bindings.
    ServiceAccount(Entry<ServiceAccountConfig>),
    /// A protected repository.
    Repository(Entry<RepositoryConfig>),
    /// A deployment environment.
    Environment(Entry<EnvironmentConfig>),
    /// A rendered pipeline file.
    Pipeline(Entry<PipelineConfig>),
}

/// Id, dependencies and config shared by every construct entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry<C> {
    /// Logical id under the root.
    pub id: String,
    /// Resources or constructs that must exist first.
    #[serde(default)]
    pub depends_on: Vec<Address>,
    /// Construct input.
    pub config: C,
}

/// A raw resource declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    /// Engine-facing resource type.
    pub kind: String,
    /// Logical id under the root.
    pub id: String,
    /// Resource properties; may embed `$ref` values.
    #[serde(default)]
    pub config: Config,
    /// Resources or constructs that must exist first.
    #[serde(default)]
    pub depends_on: Vec<Address>,
}

impl StackFile {
    /// Reads and parses a stack file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid stack file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        tracing::info!(path = %path.display(), "loading stack file");
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("invalid stack file {}", path.display()))
    }

    /// Parses stack file text (YAML, or JSON as a YAML subset).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid stack file.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Runs one composition pass over the file's contents.
    ///
    /// # Errors
    ///
    /// Returns the first composition error encountered.
    pub fn synth(self) -> Result<(Manifest, Graph)> {
        let mut stack = Stack::new(&self.name, self.settings)?;
        for entry in self.constructs {
            match entry {
                ConstructEntry::Project(e) => {
                    let _ = stack.compose::<Project>(&e.id, e.config, &e.depends_on)?;
                }
                ConstructEntry::ServiceAccount(e) => {
                    let _ = stack.compose::<ServiceAccount>(&e.id, e.config, &e.depends_on)?;
                }
                ConstructEntry::Repository(e) => {
                    let _ = stack.compose::<Repository>(&e.id, e.config, &e.depends_on)?;
                }
                ConstructEntry::Environment(e) => {
                    let _ = stack.compose::<Environment>(&e.id, e.config, &e.depends_on)?;
                }
                ConstructEntry::Pipeline(e) => {
                    let _ = stack.compose::<Pipeline>(&e.id, e.config, &e.depends_on)?;
                }
            }
        }
        for resource in self.resources {
            let mut spec = ResourceSpec::new(resource.kind.as_str(), resource.id).config(resource.config);
            for dependency in resource.depends_on {
                spec = spec.depends_on(dependency);
            }
            let _ = stack.declare(spec)?;
        }
        stack.synth_with_graph()
    }
}
