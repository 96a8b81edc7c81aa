//! Schema validation for notification bodies.
//!
//! Each gateway declares the fields it expects as a slice of [`FieldRule`]s;
//! the pipeline checks presence and type before touching signatures. All
//! violations are collected and reported together, per field.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{KassaflowError, Result};
use crate::gateway::Notification;

/// Type constraint for a single notification field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integral value: a JSON integer, or a string of decimal digits.
    Integer,
    /// Exact decimal value: a JSON number, or a decimal-formatted string.
    Numeric,
    /// Any scalar with a non-empty rendering.
    Text,
}

/// One entry of a gateway's validation schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Validate a notification against a gateway schema.
///
/// Required fields must be present and non-empty; present fields must match
/// their type constraint. Fails with a single `Validation` error carrying
/// every violated field.
pub fn validate(notification: &Notification, rules: &[FieldRule]) -> Result<()> {
    let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();

    for rule in rules {
        let Some(value) = notification.get(rule.name) else {
            if rule.required {
                field_errors
                    .entry(rule.name.to_string())
                    .or_default()
                    .push(format!("The {} field is required", rule.name));
            }
            continue;
        };

        if rule.required && is_empty(value) {
            field_errors
                .entry(rule.name.to_string())
                .or_default()
                .push(format!("The {} field is required", rule.name));
            continue;
        }

        if let Some(message) = check_kind(value, rule.kind) {
            field_errors
                .entry(rule.name.to_string())
                .or_default()
                .push(format!("The {} field {}", rule.name, message));
        }
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(KassaflowError::validation(field_errors))
    }
}

fn is_empty(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

fn check_kind(value: &Value, kind: FieldKind) -> Option<&'static str> {
    match kind {
        FieldKind::Integer => {
            let ok = match value {
                Value::Number(n) => n.as_i64().is_some(),
                Value::String(s) => s.parse::<i64>().is_ok(),
                _ => false,
            };
            (!ok).then_some("must be an integer")
        }
        FieldKind::Numeric => {
            let ok = match value {
                Value::Number(n) => Decimal::from_str(&n.to_string()).is_ok(),
                Value::String(s) => Decimal::from_str(s).is_ok(),
                _ => false,
            };
            (!ok).then_some("must be numeric")
        }
        FieldKind::Text => {
            let ok = matches!(
                value,
                Value::String(_) | Value::Number(_) | Value::Bool(_)
            );
            (!ok).then_some("must be a scalar value")
        }
    }
}
