//! Point-in-time views of remote resources.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LedgerflowError, Result};

use super::ResourceKind;

/// An immutable view of a remote resource as of one fetch.
///
/// Snapshots are never updated in place: a fresh fetch produces a new
/// snapshot that replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    id: String,
    kind: ResourceKind,
    state: String,
    attributes: Map<String, Value>,
}

impl ResourceSnapshot {
    /// Create a snapshot with no attributes.
    pub fn new(kind: ResourceKind, id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Return a copy of this snapshot with one more attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Decode a snapshot from the ledger's JSON representation.
    ///
    /// `guid` becomes the id, `state` the state, and every other top-level
    /// field an attribute.
    pub fn from_json(kind: ResourceKind, value: Value) -> Result<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(LedgerflowError::transport(format!(
                    "expected a JSON object for {}, got {}",
                    kind,
                    json_type(&other)
                )))
            }
        };

        let id = match fields.remove("guid") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => {
                return Err(LedgerflowError::transport(format!(
                    "{} response is missing 'guid'",
                    kind
                )))
            }
        };

        let state = match fields.remove("state") {
            Some(Value::String(state)) => state,
            _ => {
                return Err(LedgerflowError::transport(format!(
                    "{} {} response is missing 'state'",
                    kind, id
                )))
            }
        };

        Ok(Self {
            id,
            kind,
            state,
            attributes: fields,
        })
    }

    /// Resource identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resource kind.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// State as of this fetch.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// All attributes other than id and state.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Raw attribute value.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// String attribute value.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    /// Amount attribute in integer subunits.
    ///
    /// Accepts a JSON integer or a string of decimal digits. Fractional
    /// numbers are rejected rather than rounded.
    pub fn attr_amount(&self, name: &str) -> Result<i128> {
        let value = self.attr(name).ok_or_else(|| {
            LedgerflowError::validation(format!("{} has no '{}' attribute", self.label(), name))
        })?;

        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from)),
            Value::String(s) => parse_integer(s),
            _ => None,
        };

        parsed.ok_or_else(|| {
            LedgerflowError::validation(format!(
                "{} attribute '{}' is not an integer amount: {}",
                self.label(),
                name,
                value
            ))
        })
    }

    /// Check if the current state is one of `states`.
    pub fn is_in(&self, states: &BTreeSet<String>) -> bool {
        states.contains(&self.state)
    }

    /// Short label, e.g. `trade 7f3a`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }

    /// Full description including state and attributes.
    pub fn describe(&self) -> String {
        let mut out = format!("{} in state '{}'", self.label(), self.state);
        if !self.attributes.is_empty() {
            let attrs: Vec<String> = self
                .attributes
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            out.push_str(&format!(" [{}]", attrs.join(", ")));
        }
        out
    }
}

fn parse_integer(s: &str) -> Option<i128> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
