//! Source repository bundle.
//!
//! Declares the repository, protection on its default branch, an admins team
//! with admin permission, and optionally a bootstrap pull request that
//! commits initial files. The pull request is only opened once branch
//! protection is in place, even though it reads nothing from the rule.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackweave_common::constants;
use stackweave_common::error::Result;
use stackweave_common::types::Address;

use crate::construct::{Blueprint, Construct};
use crate::context::CompositionContext;
use crate::naming::{self, NamingRules};
use crate::resource::{ResourceHandle, ResourceSpec, declare};
use crate::value::{Config, Value};

/// Repository visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to collaborators only.
    #[default]
    Private,
    /// Visible to the organization.
    Internal,
    /// Visible to everyone.
    Public,
}

impl Visibility {
    /// Engine-facing name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Internal => "internal",
            Self::Public => "public",
        }
    }
}

/// Input of the [`Repository`] construct.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Visibility, private by default.
    #[serde(default)]
    pub visibility: Visibility,
    /// Protected default branch.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Approvals required before merging into the default branch.
    #[serde(default = "default_approvals")]
    pub required_approvals: u32,
    /// Topics attached to the repository.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Files committed through the bootstrap pull request, path to content.
    #[serde(default)]
    pub bootstrap_files: BTreeMap<String, String>,
    /// Raw properties merged over the repository defaults.
    #[serde(default)]
    pub overrides: Config,
}

fn default_branch() -> String {
    constants::DEFAULT_BRANCH.to_string()
}

const fn default_approvals() -> u32 {
    1
}

impl RepositoryConfig {
    /// A private repository named `name` with default protection.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            visibility: Visibility::default(),
            default_branch: default_branch(),
            required_approvals: default_approvals(),
            topics: Vec::new(),
            bootstrap_files: BTreeMap::new(),
            overrides: Config::new(),
        }
    }
}

/// Outputs of the [`Repository`] construct.
#[derive(Debug, Clone)]
pub struct RepositoryOutputs {
    /// The repository resource.
    pub repository: ResourceHandle,
    /// Normalized repository name.
    pub name: String,
    /// Repository name as a reference, ordering consumers after creation.
    pub name_ref: Value,
    /// `owner/name`, known once the repository exists.
    pub full_name: Value,
    /// Branch protection on the default branch.
    pub branch_protection: ResourceHandle,
    /// Name of the admins team.
    pub admins_team: String,
    /// Bootstrap pull request, when bootstrap files were given.
    pub bootstrap_pull_request: Option<ResourceHandle>,
}

/// A protected repository with an admins team.
#[derive(Debug)]
pub struct Repository;

impl Blueprint for Repository {
    type Config = RepositoryConfig;
    type Outputs = RepositoryOutputs;
    const KIND: &'static str = "repository";

    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: RepositoryConfig,
    ) -> Result<RepositoryOutputs> {
        super::require("name", &config.name)?;
        super::require("default_branch", &config.default_branch)?;
        let rules = NamingRules::repository(ctx.settings().separator);
        let name = naming::normalize(&config.name, &rules)?;
        let admins_team = naming::derive(&name, constants::ADMINS_SUFFIX, &rules)?;

        let repository = declare(
            ctx,
            scope,
            ResourceSpec::new("github_repository", "repository")
                .default_value("auto_init", true)
                .default_value("has_issues", true)
                .default_value("delete_branch_on_merge", true)
                .default_value("vulnerability_alerts", true)
                .set("name", name.as_str())
                .set("visibility", config.visibility.as_str())
                .set_opt("description", config.description)
                .set(
                    "topics",
                    Value::List(config.topics.iter().map(Value::from).collect()),
                )
                .config(config.overrides),
        )?;

        let branch_protection = declare(
            ctx,
            scope,
            ResourceSpec::new("github_branch_protection", "default-branch")
                .default_value("enforce_admins", true)
                .default_value("allows_force_pushes", false)
                .set("repository_id", repository.attr("node_id"))
                .set("pattern", config.default_branch.as_str())
                .set(
                    "required_pull_request_reviews",
                    Value::map([
                        ("required_approving_review_count", Value::from(config.required_approvals)),
                        ("dismiss_stale_reviews", Value::Bool(true)),
                    ]),
                ),
        )?;

        let team = declare(
            ctx,
            scope,
            ResourceSpec::new("github_team", "admins")
                .default_value("privacy", "closed")
                .set("name", admins_team.as_str()),
        )?;
        let _ = declare(
            ctx,
            scope,
            ResourceSpec::new("github_team_repository", "admins-access")
                .set("team_id", team.attr("id"))
                .set("repository", repository.attr("name"))
                .set("permission", "admin"),
        )?;

        let bootstrap_pull_request = if config.bootstrap_files.is_empty() {
            None
        } else {
            Some(declare_bootstrap(
                ctx,
                scope,
                &repository,
                &branch_protection,
                &config.default_branch,
                &config.bootstrap_files,
            )?)
        };

        Ok(RepositoryOutputs {
            name_ref: repository.attr("name"),
            full_name: repository.attr("full_name"),
            repository,
            name,
            branch_protection,
            admins_team,
            bootstrap_pull_request,
        })
    }

    fn exports(outputs: &RepositoryOutputs) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("name".to_string(), outputs.name_ref.clone()),
            ("full_name".to_string(), outputs.full_name.clone()),
            ("admins_team".to_string(), Value::from(&outputs.admins_team)),
        ])
    }
}

fn declare_bootstrap(
    ctx: &mut CompositionContext,
    scope: &mut Construct,
    repository: &ResourceHandle,
    branch_protection: &ResourceHandle,
    base_branch: &str,
    files: &BTreeMap<String, String>,
) -> Result<ResourceHandle> {
    let branch = declare(
        ctx,
        scope,
        ResourceSpec::new("github_branch", "bootstrap-branch")
            .set("repository", repository.attr("name"))
            .set("branch", "stackweave/bootstrap")
            .set("source_branch", base_branch),
    )?;

    let mut committed: Vec<Address> = Vec::new();
    for (index, (path, content)) in files.iter().enumerate() {
        let file = declare(
            ctx,
            scope,
            ResourceSpec::new("github_repository_file", format!("bootstrap-file-{index}"))
                .default_value("overwrite_on_create", true)
                .set("repository", repository.attr("name"))
                .set("branch", branch.attr("branch"))
                .set("file", path.as_str())
                .set("content", content.as_str())
                .set("commit_message", format!("Add {path}")),
        )?;
        committed.push(file.address().clone());
    }

    let mut pull_request = ResourceSpec::new("github_pull_request", "bootstrap-pull-request")
        .set("base_repository", repository.attr("name"))
        .set("base_ref", base_branch)
        .set("head_ref", branch.attr("branch"))
        .set("title", "Bootstrap repository")
        .depends_on(branch_protection);
    for file in committed {
        pull_request = pull_request.depends_on(file);
    }
    declare(ctx, scope, pull_request)
}
