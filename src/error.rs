//! Error types for the payload codec and identifier allocator.

use crate::identifier::Namespace;
use crate::tlv::TlvError;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, QrisError>;

/// Errors that can occur while transforming payloads or minting identifiers.
#[derive(Error, Debug)]
pub enum QrisError {
    /// Static payload is too short or contains non-ASCII characters
    #[error("Invalid payment payload: {0}")]
    InvalidPayload(String),

    /// Amount is not a plain digit string
    #[error("Invalid amount {0:?}: expected digits only, without separators")]
    InvalidAmount(String),

    /// Fee value is not a plain digit string
    #[error("Invalid fee {0:?}: expected digits only, without separators")]
    InvalidFee(String),

    /// Fee mode is not one of the recognised kinds
    #[error("Invalid fee mode {0:?}: expected 'fixed' or 'percent'")]
    InvalidFeeMode(String),

    /// Payload lacks a field the transform needs to locate
    #[error("Malformed payment payload: {0}")]
    MalformedPayload(&'static str),

    /// Every candidate drawn for a namespace was already taken
    #[error("Identifier space exhausted for {namespace} after {attempts} attempts")]
    IdentifierSpaceExhausted { namespace: Namespace, attempts: u32 },

    /// Externally supplied identifier does not belong to its namespace
    #[error("Invalid {namespace} identifier {value:?}")]
    InvalidIdentifier { namespace: Namespace, value: String },

    /// Allocator configuration value could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// TLV structure error
    #[error("TLV error: {0}")]
    Tlv(#[from] TlvError),

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid order record
    #[error("Invalid order at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing command-line arguments
    #[error("Missing input file argument. Usage: qris-engine <static-payload-file> <orders.csv>")]
    MissingArgument,
}
