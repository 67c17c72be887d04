//! Amount input type for the API boundary

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Strict format Decimal - validates format during deserialization
///
/// Accepts a JSON string or number. Strings are checked for:
/// - `.5` (must be `0.5`)
/// - `5.` (must be `5.0` or `5`)
/// - scientific notation and a `+` prefix
/// - negative values and empty strings
///
/// Business limits (minimum amount, positivity) are checked by the service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrictDecimal(Decimal);

impl StrictDecimal {
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl std::ops::Deref for StrictDecimal {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

fn parse_strict(s: &str) -> Result<Decimal, String> {
    if s.is_empty() {
        return Err("Amount cannot be empty".into());
    }
    if s.starts_with('.') {
        return Err("Invalid format: use 0.5 not .5".into());
    }
    if s.ends_with('.') {
        return Err("Invalid format: use 5.0 not 5.".into());
    }
    if s.contains('e') || s.contains('E') {
        return Err("Invalid format: scientific notation not allowed".into());
    }
    if s.starts_with('+') {
        return Err("Invalid format: + prefix not allowed".into());
    }
    let d = Decimal::from_str(s).map_err(|e| format!("Invalid decimal: {}", e))?;
    if d.is_sign_negative() {
        return Err("Amount cannot be negative".into());
    }
    Ok(d)
}

impl<'de> Deserialize<'de> for StrictDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(s) => s.trim().to_string(),
            // Number's Display keeps the literal digits for finite floats
            RawAmount::Number(n) => n.to_string(),
        };
        parse_strict(&text).map(StrictDecimal).map_err(D::Error::custom)
    }
}

impl Serialize for StrictDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}
