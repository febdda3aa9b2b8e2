//! # QRIS Engine
//!
//! Payment-payload codec and public identifier allocator for an order
//! tracking application.
//!
//! ## Components
//!
//! - **Payload codec** ([`codec`]): rewrites a static merchant QRIS payload into
//!   a dynamic one bound to a single amount, optionally with a fee, and
//!   recomputes the CRC-16/CCITT-FALSE checksum.
//! - **Identifier allocator** ([`identifier`]): mints short codes such as
//!   `OR7KQ2` that are unique per namespace, not sequential and free of
//!   look-alike characters.
//!
//! The two are independent; [`batch`] combines them for the CLI.
//!
//! ## Example
//!
//! ```
//! use qris_engine::{crc, to_dynamic, IdentifierAllocator, Namespace};
//! use std::collections::HashSet;
//!
//! let body = "00020101021126160012ID.CO.TEST015802ID5904SHOP6304";
//! let static_payload = format!("{}{}", body, crc::checksum(body));
//! let payload = to_dynamic(&static_payload, "15000", None).unwrap();
//! assert!(crc::verify(&payload));
//!
//! let mut taken: HashSet<String> = HashSet::new();
//! let code = IdentifierAllocator::new()
//!     .allocate(Namespace::Order, |candidate| taken.contains(candidate))
//!     .unwrap();
//! taken.insert(code.to_string());
//! ```

pub mod amount;
pub mod batch;
pub mod codec;
pub mod crc;
pub mod error;
pub mod identifier;
pub mod order;
pub mod tlv;

pub use amount::Amount;
pub use batch::QrisBatch;
pub use codec::{to_dynamic, FeeMode, FeeSpec};
pub use error::{QrisError, Result};
pub use identifier::{AllocatorConfig, Identifier, IdentifierAllocator, Namespace};
pub use order::{IssuedPayment, OrderRecord, PaymentRequest};
pub use tlv::{Field, Lookup, TlvError};
