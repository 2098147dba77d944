//! Configuration values and deferred references.
//!
//! A resource config is a flat map of property names to [`Value`]s. Values
//! are literals, nested lists and maps, or placeholders for outputs that only
//! exist once the producing resource has been materialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackweave_common::types::Address;

/// A resource configuration: property name to value, sorted by key.
pub type Config = BTreeMap<String, Value>;

/// Placeholder for "attribute `attribute` of the resource at `target`".
///
/// The reference only names its producer; it never owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeferredReference {
    /// Address of the producing resource.
    #[serde(rename = "$ref")]
    pub target: Address,
    /// Output attribute of the producer.
    pub attribute: String,
}

impl DeferredReference {
    /// Creates a reference to `attribute` of the resource at `target`.
    #[must_use]
    pub fn new(target: Address, attribute: impl Into<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
        }
    }
}

/// String built from literal parts and deferred references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Concat {
    /// Parts joined without a separator once resolved.
    #[serde(rename = "$concat")]
    pub parts: Vec<Value>,
}

/// A single configuration value.
///
/// Serialized untagged: literals map to their JSON form, references to
/// `{"$ref": ..., "attribute": ...}` and concatenations to `{"$concat": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    String(String),
    /// Output of another resource.
    Ref(DeferredReference),
    /// String interpolating references.
    Concat(Concat),
    /// Ordered list.
    List(Vec<Value>),
    /// Nested map.
    Map(Config),
}

impl Value {
    /// Builds a string value from literal and referenced parts.
    #[must_use]
    pub fn concat(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Concat(Concat {
            parts: parts.into_iter().collect(),
        })
    }

    /// Builds a map value from `(key, value)` pairs.
    #[must_use]
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(config(entries))
    }

    /// Returns every deferred reference embedded in this value, depth first.
    #[must_use]
    pub fn references(&self) -> Vec<&DeferredReference> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a DeferredReference>) {
        match self {
            Self::Ref(reference) => found.push(reference),
            Self::Concat(concat) => {
                for part in &concat.parts {
                    part.collect_references(found);
                }
            }
            Self::List(items) => {
                for item in items {
                    item.collect_references(found);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(found);
                }
            }
            Self::Null | Self::Bool(_) | Self::Integer(_) | Self::Float(_) | Self::String(_) => {}
        }
    }

    /// Returns `true` if the value contains no deferred reference.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.references().is_empty()
    }

    /// Returns the string literal, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the reference, if this is one.
    #[must_use]
    pub const fn as_reference(&self) -> Option<&DeferredReference> {
        match self {
            Self::Ref(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Collects every deferred reference in `config`, in key order.
#[must_use]
pub fn config_references(config: &Config) -> Vec<&DeferredReference> {
    config.values().flat_map(Value::references).collect()
}

/// Builds a [`Config`] from `(key, value)` pairs.
#[must_use]
pub fn config<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Config
where
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<DeferredReference> for Value {
    fn from(reference: DeferredReference) -> Self {
        Self::Ref(reference)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<Config> for Value {
    fn from(entries: Config) -> Self {
        Self::Map(entries)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(target: &str, attribute: &str) -> DeferredReference {
        DeferredReference::new(Address::new(target), attribute)
    }

    #[test]
    fn references_found_in_nested_values() {
        let value = Value::map([
            ("member", Value::concat(["serviceAccount:".into(), reference("app/sa", "email").into()])),
            ("projects", Value::List(vec![reference("app/project", "project_id").into()])),
        ]);
        let refs = value.references();
        assert_eq!(refs.len(), 2);
        assert!(refs.contains(&&reference("app/sa", "email")));
        assert!(refs.contains(&&reference("app/project", "project_id")));
        assert!(!value.is_literal());
    }

    #[test]
    fn literals_have_no_references() {
        let value = Value::map([("name", "acme")]);
        assert!(value.is_literal());
        assert_eq!(Value::from("x").as_str(), Some("x"));
    }

    #[test]
    fn reference_serializes_with_dollar_ref() {
        let json = serde_json::to_string(&Value::from(reference("app/sa", "email"))).expect("ser");
        assert_eq!(json, r#"{"$ref":"app/sa","attribute":"email"}"#);
    }

    #[test]
    fn untagged_yaml_distinguishes_maps_refs_and_concats() {
        let yaml = r#"
plain: {name: acme}
linked: {"$ref": "acme/project", attribute: project_id}
member: {"$concat": ["serviceAccount:", {"$ref": "acme/sa", attribute: email}]}
count: 3
enabled: true
missing: ~
"#;
        let parsed: Config = serde_yaml::from_str(yaml).expect("parse");
        assert!(matches!(parsed.get("plain"), Some(Value::Map(_))));
        assert_eq!(
            parsed.get("linked").and_then(Value::as_reference),
            Some(&reference("acme/project", "project_id"))
        );
        assert!(matches!(parsed.get("member"), Some(Value::Concat(_))));
        assert_eq!(parsed.get("count"), Some(&Value::Integer(3)));
        assert_eq!(parsed.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(parsed.get("missing"), Some(&Value::Null));
        assert_eq!(config_references(&parsed).len(), 2);
    }

    #[test]
    fn option_none_becomes_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }
}
