//! `weave render` — Render a pipeline template with named variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use stackweave_common::error::{read_file, write_file};
use stackweave_compose::template;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the template file.
    pub template: PathBuf,

    /// Variable assignment `NAME=VALUE`; may be repeated.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
    pub vars: Vec<(String, String)>,

    /// Write the rendered text to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `render` command.
///
/// # Errors
///
/// Returns an error if the template cannot be read, a variable is missing,
/// or the output cannot be written.
pub fn execute(args: &RenderArgs) -> anyhow::Result<()> {
    let source = read_file(&args.template)?;
    let variables: BTreeMap<String, String> = args.vars.iter().cloned().collect();
    let rendered = template::render(&source, &variables)?;

    if let Some(ref out_path) = args.output {
        write_file(out_path, &rendered)?;
        println!("Rendered {} -> {}", args.template.display(), out_path.display());
    } else {
        print!("{rendered}");
    }

    Ok(())
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{raw}\""))?;
    if name.is_empty() {
        return Err(format!("empty variable name in \"{raw}\""));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use stackweave_common::error::StackweaveError;

    use super::*;

    #[test]
    fn parse_variable_splits_on_first_equals() {
        assert_eq!(
            parse_variable("URL=https://x?a=b"),
            Ok(("URL".to_string(), "https://x?a=b".to_string()))
        );
    }

    #[test]
    fn parse_variable_rejects_missing_equals() {
        assert!(parse_variable("PROJECT").is_err());
        assert!(parse_variable("=value").is_err());
    }

    #[test]
    fn render_writes_output_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("deploy.yml.tpl");
        let out = dir.path().join("deploy.yml");
        std::fs::write(&template, "project: ${PROJECT_ID}\ntoken: $${{ secrets.T }}\n")
            .expect("write");

        execute(&RenderArgs {
            template,
            vars: vec![("PROJECT_ID".into(), "acme-dev".into())],
            output: Some(out.clone()),
        })
        .expect("render");

        let rendered = std::fs::read_to_string(out).expect("read");
        assert_eq!(rendered, "project: acme-dev\ntoken: ${{ secrets.T }}\n");
    }

    #[test]
    fn render_reports_unreadable_template_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("absent.tpl");
        let err = execute(&RenderArgs {
            template: template.clone(),
            vars: Vec::new(),
            output: None,
        })
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StackweaveError>(),
            Some(StackweaveError::Io { path, .. }) if *path == template
        ));
    }

    #[test]
    fn render_fails_on_missing_variable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("t");
        std::fs::write(&template, "${MISSING}").expect("write");
        let err = execute(&RenderArgs {
            template,
            vars: Vec::new(),
            output: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("MISSING"), "got: {err}");
    }
}
