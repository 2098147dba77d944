//! CI pipeline file rendered from a template and committed to a repository.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackweave_common::error::Result;

use crate::construct::{Blueprint, Construct};
use crate::context::CompositionContext;
use crate::resource::{ResourceHandle, ResourceSpec, declare};
use crate::template;
use crate::value::Value;

/// Input of the [`Pipeline`] construct.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Target repository (literal name or reference).
    pub repository: Value,
    /// Path of the generated file inside the repository.
    #[serde(default = "default_path")]
    pub path: String,
    /// Template text with `${NAME}` placeholders.
    pub template: String,
    /// Values substituted into the template.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Branch receiving the commit; the repository default when absent.
    #[serde(default)]
    pub branch: Option<String>,
}

fn default_path() -> String {
    ".github/workflows/deploy.yml".to_string()
}

/// Outputs of the [`Pipeline`] construct.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    /// The committed file.
    pub file: ResourceHandle,
    /// Rendered file content.
    pub content: String,
}

/// A rendered CI pipeline file.
#[derive(Debug)]
pub struct Pipeline;

impl Blueprint for Pipeline {
    type Config = PipelineConfig;
    type Outputs = PipelineOutputs;
    const KIND: &'static str = "pipeline";

    fn build(
        ctx: &mut CompositionContext,
        scope: &mut Construct,
        config: PipelineConfig,
    ) -> Result<PipelineOutputs> {
        super::require("path", &config.path)?;
        let content = template::render(&config.template, &config.variables)?;
        let file = declare(
            ctx,
            scope,
            ResourceSpec::new("github_repository_file", "file")
                .default_value("overwrite_on_create", true)
                .set("repository", config.repository)
                .set("file", config.path.as_str())
                .set("content", content.as_str())
                .set("commit_message", format!("Update {}", config.path))
                .set_opt("branch", config.branch),
        )?;
        Ok(PipelineOutputs { file, content })
    }

    fn exports(outputs: &PipelineOutputs) -> BTreeMap<String, Value> {
        BTreeMap::from([("commit_sha".to_string(), outputs.file.attr("commit_sha"))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::compose;
    use crate::value::DeferredReference;
    use stackweave_common::types::Address;

    fn config(template: &str, vars: &[(&str, &str)]) -> PipelineConfig {
        PipelineConfig {
            repository: Value::Ref(DeferredReference::new(
                Address::new("acme/infra/repository"),
                "name",
            )),
            path: default_path(),
            template: template.into(),
            variables: vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            branch: None,
        }
    }

    #[test]
    fn renders_template_into_file_content() {
        let mut ctx = CompositionContext::default();
        let mut root = Construct::root("acme").expect("root");
        let outputs = compose::<Pipeline>(
            &mut ctx,
            &mut root,
            "deploy",
            config("project: ${PROJECT_ID}\n", &[("PROJECT_ID", "acme-dev")]),
            &[],
        )
        .expect("compose");
        assert_eq!(outputs.content, "project: acme-dev\n");
        let file = &root.children()[0].resources()[0];
        assert_eq!(file.config.get("content"), Some(&Value::from("project: acme-dev\n")));
        assert_eq!(file.references().len(), 1);
    }

    #[test]
    fn missing_variable_aborts_composition() {
        let mut ctx = CompositionContext::default();
        let mut root = Construct::root("acme").expect("root");
        let err = compose::<Pipeline>(&mut ctx, &mut root, "deploy", config("${REGION}", &[]), &[])
            .unwrap_err();
        assert!(err.to_string().contains("REGION"));
        assert!(root.children().is_empty());
    }
}
