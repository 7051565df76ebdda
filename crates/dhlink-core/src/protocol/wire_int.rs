// ============================================
// File: crates/dhlink-core/src/protocol/wire_int.rs
// ============================================
//! # Wire Integers
//!
//! Serde helpers for exchange values that may exceed 64 bits.
//!
//! Outbound values are written as plain JSON numbers with every digit
//! kept. Inbound values are accepted as JSON numbers or as strings
//! holding a decimal (or `0x` hex) integer.
//!
//! Use with `#[serde(with = "wire_int")]`, or `wire_int::option` for
//! optional fields.

use std::str::FromStr;

use num_bigint::BigUint;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Serializes a `BigUint` as a JSON number.
///
/// # Errors
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    let digits = value.to_str_radix(10);
    match Number::from_str(&digits) {
        Ok(number) => number.serialize(serializer),
        Err(_) => serializer.serialize_str(&digits),
    }
}

/// Deserializes a `BigUint` from a JSON number or integer string.
///
/// # Errors
/// Fails on negative, fractional or non-numeric input.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
    let value = Value::deserialize(deserializer)?;
    from_value(&value).map_err(D::Error::custom)
}

/// Extracts a non-negative integer from an already parsed JSON value.
///
/// # Errors
/// Returns a short reason suitable for an `Invalid parameters` reply.
pub fn from_value(value: &Value) -> Result<BigUint, String> {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            if text.starts_with('-') {
                return Err("must be non-negative".into());
            }
            BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| "must be an integer".into())
        }
        Value::String(text) => {
            if text.trim_start().starts_with('-') {
                return Err("must be non-negative".into());
            }
            parse_str(text).ok_or_else(|| format!("'{text}' is not an integer"))
        }
        _ => Err("must be an integer".into()),
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer.
#[must_use]
pub fn parse_str(text: &str) -> Option<BigUint> {
    let text = text.trim();
    let (digits, radix) = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
}

/// Same helpers for `Option<BigUint>` fields.
///
/// Pair with `#[serde(default)]` so a missing field reads as `None`.
pub mod option {
    use super::{BigUint, Deserialize, Deserializer, Serializer, Value};
    use serde::de::Error as _;

    /// Serializes `Some` as a JSON number and `None` as `null`.
    ///
    /// # Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &Option<BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes `null` as `None`, anything else as an integer.
    ///
    /// # Errors
    /// Fails on negative, fractional or non-numeric input.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigUint>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => super::from_value(&value).map(Some).map_err(D::Error::custom),
        }
    }
}

// ============================================
// Tests
// ============================================
