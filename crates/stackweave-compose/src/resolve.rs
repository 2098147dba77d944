//! Substitution of materialized outputs into deferred configs.
//!
//! The provisioning engine reports, for each created resource, the concrete
//! values of its output attributes. Before creating a consumer it resolves
//! the consumer's config against those values.

use std::collections::BTreeMap;

use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::Address;

use crate::value::{Config, Value};

/// Output attributes of materialized resources, keyed by address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedOutputs {
    values: BTreeMap<Address, BTreeMap<String, Value>>,
}

impl MaterializedOutputs {
    /// Creates an empty output table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `attribute = value` for the resource at `address`.
    pub fn insert(&mut self, address: Address, attribute: impl Into<String>, value: impl Into<Value>) {
        let _ = self
            .values
            .entry(address)
            .or_default()
            .insert(attribute.into(), value.into());
    }

    /// Looks up a materialized attribute.
    #[must_use]
    pub fn get(&self, address: &Address, attribute: &str) -> Option<&Value> {
        self.values.get(address).and_then(|attrs| attrs.get(attribute))
    }

    /// Returns `true` if any attribute is known for `address`.
    #[must_use]
    pub fn is_materialized(&self, address: &Address) -> bool {
        self.values.contains_key(address)
    }
}

/// Resolves every value in `config`.
///
/// # Errors
///
/// See [`resolve_value`].
pub fn resolve_config(config: &Config, outputs: &MaterializedOutputs) -> Result<Config> {
    config
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolve_value(value, outputs)?)))
        .collect()
}

/// Replaces references in `value` with their materialized values.
///
/// Concatenations become strings once every part is resolved.
///
/// # Errors
///
/// - [`StackweaveError::Unresolved`] if a referenced attribute is unknown.
/// - A configuration error if a concatenation part resolves to a list or map.
pub fn resolve_value(value: &Value, outputs: &MaterializedOutputs) -> Result<Value> {
    match value {
        Value::Ref(reference) => outputs
            .get(&reference.target, &reference.attribute)
            .cloned()
            .ok_or_else(|| StackweaveError::Unresolved {
                address: reference.target.clone(),
                attribute: reference.attribute.clone(),
            }),
        Value::Concat(concat) => {
            let mut joined = String::new();
            for part in &concat.parts {
                joined.push_str(&scalar_text(&resolve_value(part, outputs)?)?);
            }
            Ok(Value::String(joined))
        }
        Value::List(items) => items
            .iter()
            .map(|item| resolve_value(item, outputs))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Value::Map(entries) => resolve_config(entries, outputs).map(Value::Map),
        literal => Ok(literal.clone()),
    }
}

fn scalar_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Float(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(StackweaveError::configuration(
            "$concat",
            format!("cannot interpolate non-scalar value {other:?}"),
        )),
    }
}
