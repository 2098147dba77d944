//! Formatted output helpers for CLI commands.
//!
//! Renders configuration values compactly, with deferred references shown
//! as `${address.attribute}` placeholders.

use stackweave_compose::value::Value;

/// Width of the heading underline.
const RULE_WIDTH: usize = 48;

/// Horizontal rule printed under headings.
#[must_use]
pub fn rule() -> String {
    "\u{2550}".repeat(RULE_WIDTH)
}

/// Formats a value on a single line.
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Ref(r) => format!("${{{}.{}}}", r.target, r.attribute),
        Value::Concat(c) => {
            let joined: String = c
                .parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => format_value(other),
                })
                .collect();
            format!("{joined:?}")
        }
        Value::List(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(entries) => {
            let entries: Vec<_> = entries
                .iter()
                .map(|(k, v)| format!("{k}: {}", format_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Pluralizes `noun` for `count` items (`1 resource`, `2 resources`).
#[must_use]
pub fn count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use stackweave_common::types::Address;
    use stackweave_compose::value::DeferredReference;

    use super::*;

    #[test]
    fn rule_has_fixed_width() {
        assert_eq!(rule().chars().count(), RULE_WIDTH);
    }

    #[test]
    fn format_value_quotes_strings() {
        assert_eq!(format_value(&Value::from("acme")), "\"acme\"");
        assert_eq!(format_value(&Value::Bool(true)), "true");
    }

    #[test]
    fn format_value_shows_references_as_placeholders() {
        let r = Value::Ref(DeferredReference::new(Address::new("acme/dev/project"), "project_id"));
        assert_eq!(format_value(&r), "${acme/dev/project.project_id}");
    }

    #[test]
    fn format_value_inlines_concat_parts() {
        let member = Value::concat([
            "serviceAccount:".into(),
            Value::Ref(DeferredReference::new(Address::new("acme/sa"), "email")),
        ]);
        assert_eq!(format_value(&member), "\"serviceAccount:${acme/sa.email}\"");
    }

    #[test]
    fn format_value_nests_collections() {
        let list = Value::List(vec![Value::Integer(1), Value::from("a")]);
        assert_eq!(format_value(&list), "[1, \"a\"]");
        let map = Value::map([("k", Value::Null)]);
        assert_eq!(format_value(&map), "{k: null}");
    }

    #[test]
    fn count_pluralizes() {
        assert_eq!(count(1, "resource"), "1 resource");
        assert_eq!(count(3, "stage"), "3 stages");
    }
}
