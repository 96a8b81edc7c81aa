//! Parsed inbound webhook notification.
//!
//! Gateways deliver either JSON or form-encoded bodies. Both are normalized
//! into an ordered field map so that signature strings can be assembled by
//! iterating fields in ascending name order.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// How the notification body was encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

/// An inbound payment-status notification.
#[derive(Debug, Clone)]
pub struct Notification {
    kind: BodyKind,
    fields: BTreeMap<String, Value>,
    authorization: Option<String>,
}

impl Notification {
    /// Parse a JSON body. Bodies that are not a JSON object yield an empty
    /// field set; detection then rejects the notification outright.
    pub fn from_json(bytes: &[u8]) -> Self {
        let fields = match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            Ok(_) | Err(_) => {
                tracing::debug!("Notification body is not a JSON object");
                BTreeMap::new()
            }
        };
        Self {
            kind: BodyKind::Json,
            fields,
            authorization: None,
        }
    }

    /// Parse a form-encoded body. Malformed bodies yield an empty field set.
    pub fn from_form(bytes: &[u8]) -> Self {
        let fields = match serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes) {
            Ok(pairs) => pairs
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect(),
            Err(_) => {
                tracing::debug!("Notification body is not valid form data");
                BTreeMap::new()
            }
        };
        Self {
            kind: BodyKind::Form,
            fields,
            authorization: None,
        }
    }

    /// Attach the Authorization header value, used by gateways that sign
    /// out-of-band instead of in a body field.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn is_json(&self) -> bool {
        self.kind == BodyKind::Json
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Field rendered as a string, the way it would appear in a sign string.
    pub fn str_field(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(render_scalar)
    }

    /// Field coerced to an integer. Accepts JSON integers and decimal-digit
    /// strings, since form bodies carry everything as strings.
    pub fn int_field(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Field coerced to an exact decimal.
    pub fn decimal_field(&self, name: &str) -> Option<Decimal> {
        match self.fields.get(name)? {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s).ok(),
            _ => None,
        }
    }

    /// Assemble the canonical signing input: all field values (minus an
    /// optional excluded field) in ascending field-name order, joined with
    /// `separator`. The caller appends the secret and hashes.
    pub fn sign_string(&self, separator: char, exclude: Option<&str>) -> String {
        let mut out = String::new();
        for (name, value) in &self.fields {
            if exclude == Some(name.as_str()) {
                continue;
            }
            if !out.is_empty() {
                out.push(separator);
            }
            out.push_str(&render_scalar(value));
        }
        out
    }
}

/// Render a field value the way the gateways' reference implementations do
/// when concatenating: strings verbatim, numbers in decimal notation,
/// `true` as "1", `false` and `null` as "". Containers should never appear
/// in a signed payload; they fall back to their compact JSON text.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}
