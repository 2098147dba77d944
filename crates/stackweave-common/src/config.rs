//! Settings shared by every construct in a composition pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Stack-wide composition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeSettings {
    /// Separator used when deriving identifiers from a base name.
    pub separator: char,
    /// Organization domain for group principals (`group:acme-admins@<domain>`).
    pub org_domain: Option<String>,
    /// Billing account attached to projects that do not name their own.
    pub billing_account: Option<String>,
    /// Labels applied to every labelled resource unless the caller replaces them.
    pub labels: BTreeMap<String, String>,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(
            constants::MANAGED_BY_LABEL.to_string(),
            constants::APP_NAME.to_string(),
        );
        Self {
            separator: constants::DEFAULT_SEPARATOR,
            org_domain: None,
            billing_account: None,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_stamp_managed_by_label() {
        let settings = ComposeSettings::default();
        assert_eq!(settings.separator, '-');
        assert_eq!(
            settings.labels.get("managed-by").map(String::as_str),
            Some("stackweave")
        );
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: ComposeSettings =
            serde_json::from_str(r#"{"org_domain": "acme.io"}"#).expect("deserialize");
        assert_eq!(settings.org_domain.as_deref(), Some("acme.io"));
        assert_eq!(settings.separator, '-');
        assert!(settings.billing_account.is_none());
    }
}
