//! Opinionated construct library.
//!
//! - [`project::Project`]: a cloud project with enabled APIs.
//! - [`service_account::ServiceAccount`]: a service account and its role bindings.
//! - [`repository::Repository`]: a protected source repository with an admins team.
//! - [`environment::Environment`]: project, deployer and repository environment wired together.
//! - [`pipeline::Pipeline`]: a CI pipeline file rendered from a template.

pub mod environment;
pub mod pipeline;
pub mod project;
pub mod repository;
pub mod service_account;

use stackweave_common::error::{Result, StackweaveError};

pub use environment::{Environment, EnvironmentConfig, EnvironmentOutputs};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutputs};
pub use project::{Project, ProjectConfig, ProjectOutputs};
pub use repository::{Repository, RepositoryConfig, RepositoryOutputs, Visibility};
pub use service_account::{ServiceAccount, ServiceAccountConfig, ServiceAccountOutputs};

/// Fails with a configuration error naming `field` if `value` is blank.
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StackweaveError::configuration(field, "is required"));
    }
    Ok(())
}
