//! Deployment environment bundle.
//!
//! Wires a project, a deployer service account and a repository deployment
//! environment together. The environment's secrets carry the project id and
//! the deployer email, so pipelines in the repository can target the project.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackweave_common::constants;
use stackweave_common::error::Result;

use crate::construct::{Blueprint, Construct, compose};
use crate::context::CompositionContext;
use crate::naming::{self, NamingRules};
use crate::resource::{ResourceHandle, ResourceSpec, declare};
use crate::value::Value;

use super::project::{Project, ProjectConfig, ProjectOutputs};
use super::service_account::{ServiceAccount, ServiceAccountConfig, ServiceAccountOutputs};

/// Roles granted to the deployer when none are configured.
const DEFAULT_DEPLOYER_ROLES: &[&str] = &["roles/editor"];

/// Input of the [`Environment`] construct.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Base project name.
    pub name: String,
    /// Environment suffix; derived from `name` when absent.
    #[serde(default)]
    pub environment: Option<String>,
    /// Repository that deploys into this environment (literal name or reference).
    pub repository: Value,
    /// APIs enabled on the project.
    #[serde(default)]
    pub services: Vec<String>,
    /// Roles granted to the deployer service account.
    #[serde(default)]
    pub deployer_roles: Option<Vec<String>>,
    /// Role granted to the `{name}-admins` group when an org domain is set.
    #[serde(default)]
    pub admins_role: Option<String>,
    /// Restrict deployments to protected branches.
    #[serde(default = "default_protected_branches")]
    pub protected_branches: bool,
}

const fn default_protected_branches() -> bool {
    true
}

/// Outputs of the [`Environment`] construct.
#[derive(Debug, Clone)]
pub struct EnvironmentOutputs {
    /// The nested project.
    pub project: ProjectOutputs,
    /// The nested deployer service account.
    pub deployer: ServiceAccountOutputs,
    /// The repository deployment environment.
    pub environment: ResourceHandle,
}

/// Project, deployer and repository environment for one stage.
#[derive(Debug)]
pub struct Environment;

impl Blueprint for Environment {
    type Config = EnvironmentConfig;
    type Outputs = EnvironmentOutputs;
    const KIND: &'static str = "environment";

    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: EnvironmentConfig,
    ) -> Result<EnvironmentOutputs> {
        super::require("name", &config.name)?;
        let project = compose::<Project>(
            ctx,
            scope,
            "project",
            ProjectConfig {
                name: config.name.clone(),
                environment: config.environment.clone(),
                services: config.services.clone(),
                ..ProjectConfig::default()
            },
            &[],
        )?;

        let roles = config.deployer_roles.unwrap_or_else(|| {
            DEFAULT_DEPLOYER_ROLES
                .iter()
                .map(|r| (*r).to_string())
                .collect()
        });
        let deployer = compose::<ServiceAccount>(
            ctx,
            scope,
            "deployer",
            ServiceAccountConfig {
                name: "deployer".to_string(),
                project: project.project_ref(),
                display_name: Some(format!("{} deployer", project.project_id)),
                roles,
            },
            &[],
        )?;

        if let Some(domain) = ctx.settings().org_domain.clone() {
            // Group addresses are lower case.
            let rules = NamingRules {
                lowercase: true,
                ..NamingRules::repository(ctx.settings().separator)
            };
            let group = naming::derive(&config.name, constants::ADMINS_SUFFIX, &rules)?;
            let group = format!("group:{group}@{domain}");
            let _ = declare(
                ctx,
                scope,
                ResourceSpec::new("gcp_project_iam_member", "admins")
                    .set("project", project.project_ref())
                    .set("role", config.admins_role.as_deref().unwrap_or("roles/owner"))
                    .set("member", group),
            )?;
        }

        let environment = declare(
            ctx,
            scope,
            ResourceSpec::new("github_repository_environment", "environment")
                .set("repository", config.repository.clone())
                .set("environment", project.environment.as_str())
                .set(
                    "deployment_branch_policy",
                    Value::map([
                        ("protected_branches", config.protected_branches),
                        ("custom_branch_policies", !config.protected_branches),
                    ]),
                ),
        )?;

        for (id, secret_name, value) in [
            ("project-id-secret", "GCP_PROJECT_ID", project.project_ref()),
            ("deployer-secret", "GCP_SERVICE_ACCOUNT", deployer.email.clone()),
        ] {
            let _ = declare(
                ctx,
                scope,
                ResourceSpec::new("github_actions_environment_secret", id)
                    .set("repository", config.repository.clone())
                    .set("environment", environment.attr("environment"))
                    .set("secret_name", secret_name)
                    .set("plaintext_value", value),
            )?;
        }

        Ok(EnvironmentOutputs {
            project,
            deployer,
            environment,
        })
    }

    fn exports(outputs: &EnvironmentOutputs) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("project_id".to_string(), outputs.project.project_ref()),
            ("deployer_email".to_string(), outputs.deployer.email.clone()),
            (
                "environment".to_string(),
                Value::from(&outputs.project.environment),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackweave_common::config::ComposeSettings;
    use stackweave_common::error::StackweaveError;
    use stackweave_common::types::Address;

    fn config(name: &str, environment: Option<&str>) -> EnvironmentConfig {
        EnvironmentConfig {
            name: name.into(),
            environment: environment.map(Into::into),
            repository: Value::from("infra"),
            services: vec!["run.googleapis.com".into()],
            deployer_roles: None,
            admins_role: None,
            protected_branches: true,
        }
    }

    #[test]
    fn nests_project_and_deployer() {
        let mut ctx = CompositionContext::default();
        let mut root = Construct::root("acme").expect("root");
        let outputs = compose::<Environment>(&mut ctx, &mut root, "dev", config("acme", Some("dev")), &[])
            .expect("compose");

        assert_eq!(outputs.project.project_id, "acme-dev");
        assert_eq!(outputs.deployer.account_id, "service-deployer");
        let env = &root.children()[0];
        let child_ids: Vec<&str> = env.children().iter().map(Construct::id).collect();
        assert_eq!(child_ids, ["project", "deployer"]);
        assert_eq!(env.output("environment"), Some(&Value::from("dev")));
    }

    #[test]
    fn secrets_follow_project_and_deployer() {
        let mut ctx = CompositionContext::default();
        let mut root = Construct::root("acme").expect("root");
        let outputs = compose::<Environment>(&mut ctx, &mut root, "dev", config("acme", Some("dev")), &[])
            .expect("compose");
        let graph = ctx.finalize().expect("finalize");

        let project_secret = Address::new("acme/dev/project-id-secret");
        let deployer_secret = Address::new("acme/dev/deployer-secret");
        assert!(graph.has_edge(outputs.project.project.address(), &project_secret));
        assert!(graph.has_edge(outputs.deployer.account.address(), &deployer_secret));
        assert!(graph.has_edge(outputs.environment.address(), &deployer_secret));
        assert!(graph.has_edge(
            outputs.project.project.address(),
            outputs.deployer.account.address()
        ));
    }

    #[test]
    fn admins_group_bound_when_domain_configured() {
        let mut ctx = CompositionContext::new(ComposeSettings {
            org_domain: Some("acme.io".into()),
            ..ComposeSettings::default()
        });
        let mut root = Construct::root("acme").expect("root");
        let _ = compose::<Environment>(&mut ctx, &mut root, "dev", config("acme", Some("dev")), &[])
            .expect("compose");
        let admins = root.children()[0]
            .resources()
            .iter()
            .find(|r| r.logical_id == "admins")
            .expect("admins binding");
        assert_eq!(
            admins.config.get("member"),
            Some(&Value::from("group:acme-admins@acme.io"))
        );
        assert_eq!(admins.config.get("role"), Some(&Value::from("roles/owner")));
    }

    #[test]
    fn admins_group_name_is_normalized() {
        let mut ctx = CompositionContext::new(ComposeSettings {
            org_domain: Some("acme.io".into()),
            ..ComposeSettings::default()
        });
        let mut root = Construct::root("acme").expect("root");
        let _ = compose::<Environment>(&mut ctx, &mut root, "dev", config("Acme Corp", Some("dev")), &[])
            .expect("compose");
        let admins = root.children()[0]
            .resources()
            .iter()
            .find(|r| r.logical_id == "admins")
            .expect("admins binding");
        assert_eq!(
            admins.config.get("member"),
            Some(&Value::from("group:acme-corp-admins@acme.io"))
        );
    }

    #[test]
    fn missing_environment_surfaces_from_nested_project() {
        let mut ctx = CompositionContext::default();
        let mut root = Construct::root("acme").expect("root");
        let err = compose::<Environment>(&mut ctx, &mut root, "dev", config("acme", None), &[])
            .unwrap_err();
        assert!(matches!(err, StackweaveError::Configuration { ref field, .. } if field == "environment"));
        assert!(root.children().is_empty());
    }
}
