//! Order records for CSV batch input and output.

use crate::amount::Amount;
use crate::codec::{FeeMode, FeeSpec};
use crate::error::Result;
use crate::identifier::{Identifier, Namespace};
use serde::{Deserialize, Serialize};

/// Raw order row as read from CSV.
///
/// Everything except `amount` is optional so ragged rows still deserialize.
#[derive(Debug, Deserialize)]
pub struct OrderRecord {
    /// Public order code; allocated when empty
    #[serde(default)]
    pub order: Option<String>,

    /// Price in the smallest currency unit; a zero fraction is tolerated
    pub amount: String,

    /// `fixed`/`r` or `percent`/`p`; empty for no fee
    #[serde(default)]
    pub fee_mode: Option<String>,

    /// Fee magnitude, required when `fee_mode` is set
    #[serde(default)]
    pub fee_value: Option<String>,
}

impl OrderRecord {
    /// Validates the raw row into a payment request.
    pub fn parse(&self) -> Result<PaymentRequest> {
        let order = non_empty(&self.order)
            .map(|code| Identifier::parse(Namespace::Order, code))
            .transpose()?;

        let amount = Amount::parse_price(&self.amount)?;

        let fee = match non_empty(&self.fee_mode) {
            Some(mode) => {
                let mode: FeeMode = mode.parse()?;
                let value = non_empty(&self.fee_value).unwrap_or_default();
                Some(FeeSpec::new(mode, value))
            }
            None => None,
        };

        Ok(PaymentRequest { order, amount, fee })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A validated row ready for payload generation.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Code supplied by the input, if any.
    pub order: Option<Identifier>,
    pub amount: Amount,
    pub fee: Option<FeeSpec>,
}

/// A generated dynamic payload, one per accepted input row.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedPayment {
    pub order: Identifier,
    pub amount: Amount,
    pub payload: String,
}
