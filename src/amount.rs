//! Transaction amounts in the smallest currency unit.
//!
//! Payment payloads carry amounts as bare digit strings. Stored order prices
//! are decimals, so [`Amount::from_price`] applies the conversion rules used
//! before a payment code is generated: negative prices clamp to zero and a
//! non-zero fractional part is rejected.

use crate::codec::is_digits;
use crate::error::{QrisError, Result};
use crate::tlv::MAX_VALUE_LEN;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated amount: ASCII digits only, at most 99 of them.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use rust_decimal::Decimal;
/// use qris_engine::Amount;
///
/// let amount = Amount::from_price(Decimal::from_str("15000.00").unwrap()).unwrap();
/// assert_eq!(amount.as_str(), "15000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount(String);

impl Amount {
    /// Validates a digit string.
    pub fn from_digits(digits: &str) -> Result<Self> {
        let trimmed = digits.trim();
        if !is_digits(trimmed) || trimmed.len() > MAX_VALUE_LEN {
            return Err(QrisError::InvalidAmount(digits.to_string()));
        }
        Ok(Amount(trimmed.to_string()))
    }

    /// Converts a decimal price into an amount.
    pub fn from_price(price: Decimal) -> Result<Self> {
        if price.is_sign_negative() {
            return Ok(Amount("0".to_string()));
        }

        let normalized = price.normalize();
        if normalized.scale() > 0 {
            return Err(QrisError::InvalidAmount(price.to_string()));
        }
        Self::from_digits(&normalized.to_string())
    }

    /// Parses either a digit string or a decimal price.
    pub fn parse_price(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if is_digits(trimmed) {
            return Self::from_digits(trimmed);
        }

        let price =
            Decimal::from_str(trimmed).map_err(|_| QrisError::InvalidAmount(input.to_string()))?;
        Self::from_price(price)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = QrisError;

    fn from_str(s: &str) -> Result<Self> {
        Amount::from_digits(s)
    }
}

impl AsRef<str> for Amount {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_digits(&s).map_err(serde::de::Error::custom)
    }
}
