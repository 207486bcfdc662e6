//! Tolerant normalization of loosely-typed order rows.
//!
//! Upstream order data comes from hand-maintained tables and weakly typed
//! services: currency columns arrive as numbers, numeric strings, `""` or
//! `null` interchangeably. [`normalize`] turns such a [`RawRecord`] into a
//! [`CanonicalOrderStatus`] whose monetary fields are always finite numbers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// The only condition [`normalize`] reports to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The record has no usable `customerName`.
    #[error("order record has no customer name")]
    MissingIdentifier,
}

/// A weakly-typed order row keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classifies the value stored under `key`.
    pub fn field(&self, key: &str) -> RawValue<'_> {
        RawValue::classify(self.0.get(key))
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Shape of a single field lookup in a [`RawRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Missing,
    Null,
    EmptyString,
    /// A string that parses as a float once surrounding whitespace is trimmed.
    NumericString(&'a str, f64),
    Number(&'a Number),
    /// Any other string.
    Text(&'a str),
    /// Booleans, arrays and objects.
    Other(&'a Value),
}

impl<'a> RawValue<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None => RawValue::Missing,
            Some(Value::Null) => RawValue::Null,
            Some(Value::String(s)) if s.is_empty() => RawValue::EmptyString,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(parsed) => RawValue::NumericString(s, parsed),
                Err(_) => RawValue::Text(s),
            },
            Some(Value::Number(n)) => RawValue::Number(n),
            Some(other) => RawValue::Other(other),
        }
    }

    /// Monetary reading of the value. Never fails; anything unusable is `0.0`.
    pub fn to_amount(&self) -> f64 {
        let amount = match self {
            RawValue::Missing | RawValue::Null | RawValue::EmptyString => 0.0,
            RawValue::NumericString(_, parsed) => *parsed,
            RawValue::Number(n) => n.as_f64().unwrap_or(0.0),
            RawValue::Text(_) | RawValue::Other(_) => 0.0,
        };
        match amount.is_finite() {
            true => amount,
            false => 0.0,
        }
    }

    /// Text reading of the value; `None` is the absence marker.
    pub fn to_text(&self) -> Option<String> {
        match self {
            RawValue::Missing | RawValue::Null => None,
            RawValue::EmptyString => Some(String::new()),
            RawValue::NumericString(s, _) | RawValue::Text(s) => Some((*s).to_string()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Other(Value::Bool(b)) => Some(b.to_string()),
            RawValue::Other(_) => None,
        }
    }
}

/// Strict order status returned to website callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalOrderStatus {
    pub customer_name: String,
    pub customer_number: Option<String>,
    pub phone_number: Option<String>,
    pub species: Option<String>,
    pub board_type: Option<String>,
    pub order_date: Option<String>,
    pub ready_date: Option<String>,
    pub called_date: Option<String>,
    pub pickup_date: Option<String>,
    pub mount_price: f64,
    pub board_price: f64,
    pub deposit_cash: f64,
    pub deposit_check: f64,
    pub payment_cash: f64,
    pub payment_check: f64,
    pub balance: f64,
    pub last_updated_at: Option<String>,
}

impl From<&CanonicalOrderStatus> for RawRecord {
    fn from(status: &CanonicalOrderStatus) -> Self {
        match serde_json::to_value(status) {
            Ok(Value::Object(map)) => RawRecord(map),
            _ => RawRecord::new(),
        }
    }
}

/// Builds a [`CanonicalOrderStatus`] from a loosely-typed record.
///
/// Monetary fields fall back to `0.0` when absent, empty or unparsable.
/// Text and date fields pass through unchanged, with absent or null values
/// mapped to `None`. Only a missing `customerName` is reported as an error.
pub fn normalize(raw: &RawRecord) -> Result<CanonicalOrderStatus, NormalizeError> {
    let customer_name = raw
        .field("customerName")
        .to_text()
        .ok_or(NormalizeError::MissingIdentifier)?;

    let text = |key: &str| raw.field(key).to_text();
    let amount = |key: &str| raw.field(key).to_amount();

    Ok(CanonicalOrderStatus {
        customer_name,
        customer_number: text("customerNumber"),
        phone_number: text("phoneNumber"),
        species: text("species"),
        board_type: text("boardType"),
        order_date: text("orderDate"),
        ready_date: text("readyDate"),
        called_date: text("calledDate"),
        pickup_date: text("pickupDate"),
        mount_price: amount("mountPrice"),
        board_price: amount("boardPrice"),
        deposit_cash: amount("depositCash"),
        deposit_check: amount("depositCheck"),
        payment_cash: amount("paymentCash"),
        payment_check: amount("paymentCheck"),
        balance: amount("balance"),
        last_updated_at: text("lastUpdatedAt"),
    })
}
