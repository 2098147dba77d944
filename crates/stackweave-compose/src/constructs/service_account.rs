//! Service account bundle: the account plus its project role bindings.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackweave_common::constants;
use stackweave_common::error::Result;

use crate::construct::{Blueprint, Construct};
use crate::context::CompositionContext;
use crate::naming::{self, NamingRules};
use crate::resource::{ResourceHandle, ResourceSpec, declare};
use crate::value::Value;

/// Input of the [`ServiceAccount`] construct.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAccountConfig {
    /// Short name; the account id becomes `service-{name}`.
    pub name: String,
    /// Project the account lives in (literal id or reference).
    pub project: Value,
    /// Human readable name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Project roles granted to the account, e.g. `roles/run.admin`.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Outputs of the [`ServiceAccount`] construct.
#[derive(Debug, Clone)]
pub struct ServiceAccountOutputs {
    /// The service account resource.
    pub account: ResourceHandle,
    /// Derived account id.
    pub account_id: String,
    /// Account email, known once the account exists.
    pub email: Value,
    /// Fully qualified account name, known once the account exists.
    pub name: Value,
}

impl ServiceAccountOutputs {
    /// IAM member string `serviceAccount:{email}`.
    #[must_use]
    pub fn member(&self) -> Value {
        Value::concat(["serviceAccount:".into(), self.email.clone()])
    }
}

/// A service account with role bindings on its project.
#[derive(Debug)]
pub struct ServiceAccount;

impl Blueprint for ServiceAccount {
    type Config = ServiceAccountConfig;
    type Outputs = ServiceAccountOutputs;
    const KIND: &'static str = "service_account";

    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: ServiceAccountConfig,
    ) -> Result<ServiceAccountOutputs> {
        super::require("name", &config.name)?;
        let rules = NamingRules::service_account(ctx.settings().separator);
        let account_id = naming::derive(constants::SERVICE_ACCOUNT_PREFIX, &config.name, &rules)?;
        let display_name = config
            .display_name
            .unwrap_or_else(|| format!("{} service account", config.name));

        let account = declare(
            ctx,
            scope,
            ResourceSpec::new("gcp_service_account", "account")
                .set("account_id", account_id.as_str())
                .set("display_name", display_name)
                .set("project", config.project.clone()),
        )?;
        let outputs = ServiceAccountOutputs {
            account_id,
            email: account.attr("email"),
            name: account.attr("name"),
            account,
        };

        let mut granted: Vec<&str> = Vec::new();
        for role in &config.roles {
            if granted.contains(&role.as_str()) {
                continue;
            }
            let _ = declare(
                ctx,
                scope,
                ResourceSpec::new("gcp_project_iam_member", binding_id(role))
                    .set("project", config.project.clone())
                    .set("role", role.as_str())
                    .set("member", outputs.member()),
            )?;
            granted.push(role);
        }
        Ok(outputs)
    }

    fn exports(outputs: &ServiceAccountOutputs) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("email".to_string(), outputs.email.clone()),
            ("name".to_string(), outputs.name.clone()),
        ])
    }
}

/// `roles/run.admin` becomes `iam-run.admin`.
fn binding_id(role: &str) -> String {
    let short = role.strip_prefix("roles/").unwrap_or(role);
    format!("iam-{}", short.replace('/', "-"))
}
