//! Named-variable substitution for generated files such as CI pipelines.
//!
//! Placeholders have the form `${NAME}`; `$${` produces a literal `${`, which
//! keeps pipeline expressions like `$${{ secrets.TOKEN }}` intact.

use std::collections::{BTreeMap, BTreeSet};

use regex::{Captures, Regex};
use stackweave_common::error::{Result, StackweaveError};

const PLACEHOLDER: &str = r"\$\$\{|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$\{";

fn placeholder_pattern() -> Result<Regex> {
    Regex::new(PLACEHOLDER).map_err(|e| StackweaveError::Template {
        message: e.to_string(),
    })
}

/// Renders `template`, substituting every `${NAME}` from `variables`.
///
/// # Errors
///
/// Returns [`StackweaveError::Template`] naming the first variable that is
/// missing, or the offset of a malformed placeholder.
pub fn render(template: &str, variables: &BTreeMap<String, String>) -> Result<String> {
    let pattern = placeholder_pattern()?;
    let mut failure = None;
    let rendered = pattern.replace_all(template, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        if whole == "$${" {
            return "${".to_string();
        }
        let Some(name) = caps.get(1) else {
            let offset = caps.get(0).map_or(0, |m| m.start());
            let _ = failure.get_or_insert_with(|| format!("malformed placeholder at byte {offset}"));
            return String::new();
        };
        variables.get(name.as_str()).cloned().unwrap_or_else(|| {
            let _ = failure
                .get_or_insert_with(|| format!("missing variable \"{}\"", name.as_str()));
            String::new()
        })
    });
    if let Some(message) = failure {
        return Err(StackweaveError::Template { message });
    }
    tracing::debug!(variables = variables.len(), "rendered template");
    Ok(rendered.into_owned())
}

/// Names of every variable referenced by `template`.
///
/// # Errors
///
/// Returns an error only if the placeholder pattern fails to compile.
pub fn variables(template: &str) -> Result<BTreeSet<String>> {
    let pattern = placeholder_pattern()?;
    Ok(pattern
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_named_variables() {
        let out = render(
            "project: ${PROJECT_ID}\nenv: ${ENVIRONMENT}\n",
            &vars(&[("PROJECT_ID", "acme-dev"), ("ENVIRONMENT", "dev")]),
        )
        .expect("render");
        assert_eq!(out, "project: acme-dev\nenv: dev\n");
    }

    #[test]
    fn escaped_placeholder_kept_literal() {
        let out = render("token: $${{ secrets.TOKEN }}", &vars(&[])).expect("render");
        assert_eq!(out, "token: ${{ secrets.TOKEN }}");
    }

    #[test]
    fn missing_variable_named_in_error() {
        let err = render("${PROJECT_ID}", &vars(&[])).unwrap_err();
        assert!(err.to_string().contains("PROJECT_ID"), "got: {err}");
    }

    #[test]
    fn malformed_placeholder_rejected() {
        let err = render("value: ${not closed", &vars(&[])).unwrap_err();
        assert!(err.to_string().contains("malformed"), "got: {err}");
    }

    #[test]
    fn plain_dollar_left_alone() {
        let out = render("cost: $5", &vars(&[])).expect("render");
        assert_eq!(out, "cost: $5");
    }

    #[test]
    fn variables_lists_unique_names() {
        let names = variables("${A} ${B} ${A} $${C}").expect("variables");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), ["A", "B"]);
    }
}
