//! Default merging for resource configurations.

use crate::value::Config;

/// Merges caller `overrides` onto `defaults`.
///
/// Shallow and override-wins: every key present in `overrides` replaces the
/// default value entirely, including nested maps. Keys only present in
/// `defaults` are kept as-is.
#[must_use]
pub fn merge_config(defaults: &Config, overrides: &Config) -> Config {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        let _ = merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, config};

    #[test]
    fn override_replaces_default() {
        let defaults = config([("visibility", "private"), ("auto_init", "true")]);
        let overrides = config([("visibility", "public")]);
        let merged = merge_config(&defaults, &overrides);
        assert_eq!(merged.get("visibility"), Some(&Value::from("public")));
        assert_eq!(merged.get("auto_init"), Some(&Value::from("true")));
    }

    #[test]
    fn nested_maps_are_not_deep_merged() {
        let defaults = config([(
            "labels",
            Value::map([("managed-by", "stackweave"), ("team", "core")]),
        )]);
        let overrides = config([("labels", Value::map([("team", "billing")]))]);
        let merged = merge_config(&defaults, &overrides);
        assert_eq!(merged.get("labels"), Some(&Value::map([("team", "billing")])));
    }

    #[test]
    fn caller_only_keys_are_added() {
        let merged = merge_config(&Config::new(), &config([("name", "acme")]));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn explicit_null_override_wins() {
        let defaults = config([("folder_id", "123")]);
        let overrides = config([("folder_id", Value::Null)]);
        assert_eq!(
            merge_config(&defaults, &overrides).get("folder_id"),
            Some(&Value::Null)
        );
    }
}
