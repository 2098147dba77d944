//! Cloud project bundle.
//!
//! Declares the project itself and one service-enablement resource per API.
//! The project id is `{name}-{environment}`; when no environment is given,
//! the name must already end in `-{environment}`.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackweave_common::error::{Result, StackweaveError};

use crate::construct::{Blueprint, Construct};
use crate::context::CompositionContext;
use crate::naming::{self, NamingRules};
use crate::resource::{ResourceHandle, ResourceSpec, declare};
use crate::value::{Config, Value};

/// Input of the [`Project`] construct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Base name of the project.
    pub name: String,
    /// Deployment environment suffix (`dev`, `prod`).
    pub environment: Option<String>,
    /// Billing account; falls back to the stack settings.
    pub billing_account: Option<String>,
    /// Parent folder.
    pub folder_id: Option<String>,
    /// APIs to enable, e.g. `run.googleapis.com`.
    pub services: Vec<String>,
    /// Labels merged over the stack default labels.
    pub labels: Option<BTreeMap<String, String>>,
    /// Raw properties merged over the project defaults.
    pub overrides: Config,
}

/// Outputs of the [`Project`] construct.
#[derive(Debug, Clone)]
pub struct ProjectOutputs {
    /// The project resource.
    pub project: ResourceHandle,
    /// Derived project id, known at composition time.
    pub project_id: String,
    /// Deployment environment.
    pub environment: String,
    /// Project number, known once the project exists.
    pub number: Value,
}

impl ProjectOutputs {
    /// Project id as a reference, ordering consumers after the project.
    #[must_use]
    pub fn project_ref(&self) -> Value {
        self.project.attr("project_id")
    }
}

/// A cloud project with enabled services.
#[derive(Debug)]
pub struct Project;

impl Blueprint for Project {
    type Config = ProjectConfig;
    type Outputs = ProjectOutputs;
    const KIND: &'static str = "project";

    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: ProjectConfig,
    ) -> Result<ProjectOutputs> {
        super::require("name", &config.name)?;
        let settings = ctx.settings().clone();
        let rules = NamingRules::project_id(settings.separator);
        let (project_id, environment) =
            project_identity(&config.name, config.environment.as_deref(), &rules)?;

        let mut labels = settings.labels;
        labels.extend(config.labels.unwrap_or_default());
        let _ = labels
            .entry("environment".to_string())
            .or_insert_with(|| environment.clone());

        let project = declare(
            ctx,
            scope,
            ResourceSpec::new("gcp_project", "project")
                .default_value("auto_create_network", false)
                .default_value("deletion_policy", "PREVENT")
                .set("name", config.name.as_str())
                .set("project_id", project_id.as_str())
                .set_opt("billing_account", config.billing_account.or(settings.billing_account))
                .set_opt("folder_id", config.folder_id)
                .set("labels", Value::map(labels))
                .config(config.overrides),
        )?;

        let mut enabled = Vec::new();
        for service in &config.services {
            if enabled.contains(service) {
                continue;
            }
            let _ = declare(
                ctx,
                scope,
                ResourceSpec::new("gcp_project_service", format!("api-{service}"))
                    .default_value("disable_on_destroy", false)
                    .set("project", project.attr("project_id"))
                    .set("service", service.as_str()),
            )?;
            enabled.push(service.clone());
        }

        Ok(ProjectOutputs {
            number: project.attr("number"),
            project,
            project_id,
            environment,
        })
    }

    fn exports(outputs: &ProjectOutputs) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("project_id".to_string(), outputs.project_ref()),
            ("number".to_string(), outputs.number.clone()),
            ("environment".to_string(), Value::from(&outputs.environment)),
        ])
    }
}

/// Derives `(project_id, environment)` from the name and optional suffix.
fn project_identity(
    name: &str,
    environment: Option<&str>,
    rules: &NamingRules,
) -> Result<(String, String)> {
    match environment {
        Some(env) if env.trim().is_empty() => Err(StackweaveError::configuration(
            "environment",
            "must not be empty when given",
        )),
        Some(env) => {
            let env = naming::normalize(env, &NamingRules { min_len: 1, ..*rules })?;
            Ok((naming::derive(name, &env, rules)?, env))
        }
        None => {
            let derived = name
                .rsplit_once(rules.separator)
                .filter(|(base, suffix)| !base.is_empty() && !suffix.is_empty());
            let Some((_, suffix)) = derived else {
                return Err(StackweaveError::configuration(
                    "environment",
                    format!(
                        "not set, and project name \"{name}\" contains no '{}' to derive it from",
                        rules.separator
                    ),
                ));
            };
            let env = naming::normalize(suffix, &NamingRules { min_len: 1, ..*rules })?;
            Ok((naming::normalize(name, rules)?, env))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::compose;
    use stackweave_common::config::ComposeSettings;

    fn run(config: ProjectConfig) -> Result<(Construct, ProjectOutputs)> {
        let mut ctx = CompositionContext::new(ComposeSettings {
            billing_account: Some("billing-0001".into()),
            ..ComposeSettings::default()
        });
        let mut root = Construct::root("acme").expect("root");
        let outputs = compose::<Project>(&mut ctx, &mut root, "project", config, &[])?;
        Ok((root, outputs))
    }

    #[test]
    fn explicit_environment_suffixes_name() {
        let (root, outputs) = run(ProjectConfig {
            name: "acme".into(),
            environment: Some("dev".into()),
            ..ProjectConfig::default()
        })
        .expect("compose");
        assert_eq!(outputs.project_id, "acme-dev");
        assert_eq!(outputs.environment, "dev");
        let project = &root.children()[0].resources()[0];
        assert_eq!(project.config.get("project_id"), Some(&Value::from("acme-dev")));
        assert_eq!(
            project.config.get("billing_account"),
            Some(&Value::from("billing-0001"))
        );
    }

    #[test]
    fn environment_derived_from_separator() {
        let (_, outputs) = run(ProjectConfig {
            name: "acme-infra-prod".into(),
            ..ProjectConfig::default()
        })
        .expect("compose");
        assert_eq!(outputs.project_id, "acme-infra-prod");
        assert_eq!(outputs.environment, "prod");
    }

    #[test]
    fn name_without_separator_requires_environment() {
        let err = run(ProjectConfig {
            name: "acme".into(),
            ..ProjectConfig::default()
        })
        .unwrap_err();
        assert!(
            matches!(err, StackweaveError::Configuration { ref field, .. } if field == "environment"),
            "got: {err}"
        );
    }

    #[test]
    fn blank_environment_rejected() {
        let err = run(ProjectConfig {
            name: "acme".into(),
            environment: Some("  ".into()),
            ..ProjectConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("environment"));
    }

    #[test]
    fn services_reference_project_and_deduplicate() {
        let (root, _) = run(ProjectConfig {
            name: "acme".into(),
            environment: Some("dev".into()),
            services: vec![
                "run.googleapis.com".into(),
                "iam.googleapis.com".into(),
                "run.googleapis.com".into(),
            ],
            ..ProjectConfig::default()
        })
        .expect("compose");
        let resources = root.children()[0].resources();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[1].logical_id, "api-run.googleapis.com");
        assert_eq!(resources[1].references().len(), 1);
    }

    #[test]
    fn caller_labels_merge_over_defaults() {
        let (root, _) = run(ProjectConfig {
            name: "acme".into(),
            environment: Some("dev".into()),
            labels: Some(BTreeMap::from([
                ("team".to_string(), "core".to_string()),
                ("managed-by".to_string(), "platform".to_string()),
            ])),
            ..ProjectConfig::default()
        })
        .expect("compose");
        let labels = root.children()[0].resources()[0].config.get("labels");
        assert_eq!(
            labels,
            Some(&Value::map([
                ("environment", "dev"),
                ("managed-by", "platform"),
                ("team", "core"),
            ]))
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let (root, _) = run(ProjectConfig {
            name: "acme".into(),
            environment: Some("dev".into()),
            overrides: crate::value::config([("auto_create_network", true)]),
            ..ProjectConfig::default()
        })
        .expect("compose");
        let project = &root.children()[0].resources()[0];
        assert_eq!(project.config.get("auto_create_network"), Some(&Value::Bool(true)));
        assert_eq!(project.config.get("deletion_policy"), Some(&Value::from("PREVENT")));
    }
}
