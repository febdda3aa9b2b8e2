//! Static-to-dynamic payment payload transform.
//!
//! A static merchant payload carries no amount and may be paid any number of
//! times. The transform binds it to one amount (and optionally a fee) by
//! flipping the point-of-initiation method, splicing new fields in front of
//! the country code and recomputing the terminal checksum.
//!
//! The transform is a pure function: no state, no I/O, safe to call from any
//! number of threads.

use crate::crc::{self, CHECKSUM_LEN};
use crate::error::{QrisError, Result};
use crate::tlv::{self, tags, Lookup};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payloads shorter than this cannot hold a header and a checksum.
pub const MIN_PAYLOAD_LEN: usize = 8;

/// Point-of-initiation value of a reusable static code.
pub const STATIC_INITIATION: &str = "11";

/// Point-of-initiation value of a single-use dynamic code.
pub const DYNAMIC_INITIATION: &str = "12";

/// Country-code field the new fields are inserted in front of.
pub const COUNTRY_MARKER: &str = "5802ID";

const STATIC_INITIATION_FIELD: &str = "010211";
const DYNAMIC_INITIATION_FIELD: &str = "010212";

/// How a convenience fee is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FeeMode {
    /// Flat fee in the smallest currency unit.
    Fixed,
    /// Fee as a percentage of the amount.
    Percent,
}

impl FeeMode {
    /// Tip-indicator value announcing this kind of fee.
    fn indicator(self) -> &'static str {
        match self {
            FeeMode::Fixed => "02",
            FeeMode::Percent => "03",
        }
    }

    /// Tag carrying the fee magnitude.
    fn value_tag(self) -> &'static str {
        match self {
            FeeMode::Fixed => tags::FIXED_FEE,
            FeeMode::Percent => tags::PERCENTAGE_FEE,
        }
    }
}

impl FromStr for FeeMode {
    type Err = QrisError;

    /// Accepts `fixed`/`r` and `percent`/`p`, ignoring case and surrounding
    /// whitespace.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "r" => Ok(FeeMode::Fixed),
            "percent" | "p" => Ok(FeeMode::Percent),
            _ => Err(QrisError::InvalidFeeMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for FeeMode {
    type Error = QrisError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for FeeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeMode::Fixed => f.write_str("fixed"),
            FeeMode::Percent => f.write_str("percent"),
        }
    }
}

/// Optional fee attached to a dynamic payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSpec {
    pub mode: FeeMode,
    /// Digits only; a currency amount for `Fixed`, a percentage for `Percent`.
    pub value: String,
}

impl FeeSpec {
    pub fn new(mode: FeeMode, value: impl Into<String>) -> Self {
        FeeSpec {
            mode,
            value: value.into(),
        }
    }

    pub fn fixed(value: impl Into<String>) -> Self {
        Self::new(FeeMode::Fixed, value)
    }

    pub fn percent(value: impl Into<String>) -> Self {
        Self::new(FeeMode::Percent, value)
    }

    /// Encodes the fee block: a tip indicator followed by the magnitude field.
    ///
    /// The byte layout matches what deployed acquirers accept and must not be
    /// rearranged.
    fn encode(&self) -> Result<String> {
        let value = self.value.trim();
        if !is_digits(value) {
            return Err(QrisError::InvalidFee(self.value.clone()));
        }

        let mut block = tlv::encode(tags::TIP_INDICATOR, self.mode.indicator())?;
        tlv::write_field(&mut block, self.mode.value_tag(), value)
            .map_err(|_| QrisError::InvalidFee(self.value.clone()))?;
        Ok(block)
    }
}

/// Rewrites a static payment payload into a dynamic one bound to `amount`.
///
/// `amount` is in the smallest currency unit and must be digits only.
///
/// # Examples
///
/// ```
/// use qris_engine::codec::to_dynamic;
///
/// let body = "00020101021126160012ID.CO.TEST015802ID5904SHOP6304";
/// let static_payload = format!("{}{}", body, qris_engine::crc::checksum(body));
///
/// let dynamic = to_dynamic(&static_payload, "15000", None).unwrap();
/// assert!(dynamic.starts_with("000201010212"));
/// assert!(dynamic.contains("5405150005802ID"));
/// assert!(qris_engine::crc::verify(&dynamic));
/// ```
pub fn to_dynamic(static_payload: &str, amount: &str, fee: Option<&FeeSpec>) -> Result<String> {
    let payload = static_payload.trim();
    let amount = amount.trim();

    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(QrisError::InvalidPayload(format!(
            "expected at least {} characters, got {}",
            MIN_PAYLOAD_LEN,
            payload.len()
        )));
    }
    if !payload.is_ascii() {
        return Err(QrisError::InvalidPayload(
            "payload contains non-ASCII characters".to_string(),
        ));
    }
    if !is_digits(amount) {
        return Err(QrisError::InvalidAmount(amount.to_string()));
    }

    let amount_field = tlv::encode(tags::TRANSACTION_AMOUNT, amount)
        .map_err(|_| QrisError::InvalidAmount(amount.to_string()))?;
    let fee_block = fee.map(FeeSpec::encode).transpose()?.unwrap_or_default();

    // Keep the `6304` header, drop only the old checksum value.
    let unsigned = &payload[..payload.len() - CHECKSUM_LEN];
    let flipped = flip_initiation(unsigned);

    let split = locate_country_code(&flipped).ok_or(QrisError::MalformedPayload(
        "country code field 5802ID not found",
    ))?;
    let (head, tail) = flipped.split_at(split);

    let mut out = String::with_capacity(
        flipped.len() + amount_field.len() + fee_block.len() + CHECKSUM_LEN,
    );
    out.push_str(head);
    out.push_str(&amount_field);
    out.push_str(&fee_block);
    out.push_str(tail);

    let checksum = crc::checksum(&out);
    out.push_str(&checksum);

    debug!(
        "Bound payload to amount {} (fee: {}), checksum {}",
        amount,
        fee.map(|f| f.mode.to_string()).unwrap_or_else(|| "none".to_string()),
        checksum
    );
    Ok(out)
}

/// Switches the point-of-initiation method from static to dynamic.
///
/// The field is looked up among the top-level fields; only a payload that
/// does not walk cleanly falls back to the first literal `010211`.
fn flip_initiation(unsigned: &str) -> String {
    match tlv::lookup(unsigned, tags::POINT_OF_INITIATION) {
        Lookup::Found(field) if field.value == STATIC_INITIATION => {
            let start = field.end() - STATIC_INITIATION.len();
            let mut out = String::with_capacity(unsigned.len());
            out.push_str(&unsigned[..start]);
            out.push_str(DYNAMIC_INITIATION);
            out.push_str(&unsigned[field.end()..]);
            out
        }
        Lookup::Found(field) => {
            if field.value == DYNAMIC_INITIATION {
                warn!("Payload is already dynamic; amount will be added again");
            } else {
                warn!("Unexpected point-of-initiation value {:?}", field.value);
            }
            unsigned.to_string()
        }
        Lookup::Absent => {
            warn!("Payload has no point-of-initiation field");
            unsigned.to_string()
        }
        Lookup::Unparsable => {
            unsigned.replacen(STATIC_INITIATION_FIELD, DYNAMIC_INITIATION_FIELD, 1)
        }
    }
}

/// Byte offset of the top-level country-code field.
///
/// A literal `5802ID` is only trusted when the field walk breaks before tag
/// `58`; otherwise a marker nested inside a template would be split open.
fn locate_country_code(unsigned: &str) -> Option<usize> {
    match tlv::lookup(unsigned, tags::COUNTRY_CODE) {
        Lookup::Found(field) if field.value == "ID" => Some(field.offset),
        Lookup::Found(_) | Lookup::Absent => None,
        Lookup::Unparsable => unsigned.find(COUNTRY_MARKER),
    }
}

pub(crate) fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
