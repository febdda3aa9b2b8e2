//! CSV batch driver: one dynamic payload per order row.
//!
//! Reads `order,amount,fee_mode,fee_value` rows, mints order codes for rows
//! without one and writes `order,amount,payload` rows in input order. Rows that
//! fail validation are logged at warn level and skipped.
//!
//! Two failures abort the whole batch instead: a static payload the transform
//! cannot work with (checked once, up front), and an exhausted identifier
//! space, which means the existence check or the configuration is broken and
//! every later row would fail the same way.

use crate::codec;
use crate::crc;
use crate::error::{QrisError, Result};
use crate::identifier::{Identifier, IdentifierAllocator, Namespace};
use crate::order::{IssuedPayment, OrderRecord, PaymentRequest};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, error, warn};
use std::collections::HashSet;
use std::io::{Read, Write};

/// Generates dynamic payloads for a batch of orders against one merchant's
/// static payload.
///
/// Order codes are unique within the batch: supplied codes that repeat an
/// earlier row are rejected, allocated codes are checked against every code
/// seen so far.
pub struct QrisBatch {
    /// Static merchant payload every row is derived from.
    static_payload: String,

    allocator: IdentifierAllocator,

    /// Order codes issued or reserved so far.
    issued: HashSet<Identifier>,

    /// Generated payloads in input order.
    payments: Vec<IssuedPayment>,
}

impl QrisBatch {
    /// Creates a batch for `static_payload`.
    ///
    /// Fails if the payload cannot be transformed at all. A payload whose
    /// checksum does not verify is accepted with a warning, since the
    /// transform recomputes it.
    pub fn new(static_payload: &str, allocator: IdentifierAllocator) -> Result<Self> {
        let static_payload = static_payload.trim().to_string();
        codec::to_dynamic(&static_payload, "0", None)?;
        if !crc::verify(&static_payload) {
            warn!("Static payload checksum does not verify; it will be recomputed");
        }

        Ok(QrisBatch {
            static_payload,
            allocator,
            issued: HashSet::new(),
            payments: Vec::new(),
        })
    }

    /// Processes order rows from a CSV reader.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<OrderRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => match self.process_record(&record, row_num) {
                    Ok(()) => {}
                    Err(e @ QrisError::IdentifierSpaceExhausted { .. }) => {
                        error!("Row {}: {}", row_num, e);
                        return Err(e);
                    }
                    Err(e) => warn!("Row {}: {}", row_num, e),
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    fn process_record(&mut self, record: &OrderRecord, row: usize) -> Result<()> {
        let request = record.parse()?;
        self.process_request(request, row)
    }

    /// Generates the payload for one validated request.
    fn process_request(&mut self, request: PaymentRequest, row: usize) -> Result<()> {
        let payload = codec::to_dynamic(
            &self.static_payload,
            request.amount.as_str(),
            request.fee.as_ref(),
        )?;

        let order = match request.order {
            Some(order) => {
                if self.issued.contains(&order) {
                    return Err(QrisError::InvalidRecord {
                        row,
                        message: format!("duplicate order code {}", order),
                    });
                }
                order
            }
            None => {
                let issued = &self.issued;
                self.allocator
                    .allocate(Namespace::Order, |candidate| issued.contains(candidate))?
            }
        };

        debug!("Row {}: Issued payload for order {}", row, order);
        self.issued.insert(order.clone());
        self.payments.push(IssuedPayment {
            order,
            amount: request.amount,
            payload,
        });
        Ok(())
    }

    /// Generated payloads in input order.
    pub fn payments(&self) -> &[IssuedPayment] {
        &self.payments
    }

    /// Writes `order,amount,payload` rows.
    pub fn write_output<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().from_writer(writer);

        for payment in &self.payments {
            csv_writer.serialize(payment)?;
        }
        if self.payments.is_empty() {
            csv_writer.write_record(["order", "amount", "payload"])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::AllocatorConfig;
    use std::io::Cursor;

    const STATIC: &str = "00020101021126660014ID.CO.QRIS.WWW01189360091530225914810215ID10200176114730303UMI5204581253033605802ID5916WARUNG JOKI KITA6015JAKARTA SELATAN61051295062070703A0163044EAF";

    fn process_csv_str(csv: &str) -> QrisBatch {
        let mut batch = QrisBatch::new(STATIC, IdentifierAllocator::new()).unwrap();
        batch.process_csv(Cursor::new(csv)).unwrap();
        batch
    }

    #[test]
    fn test_supplied_order_codes() {
        let csv = "order,amount,fee_mode,fee_value
OR7KQ2,15000,,
OR8ZZ9,20000,,";

        let batch = process_csv_str(csv);
        let payments = batch.payments();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].order.as_str(), "OR7KQ2");
        assert!(payments[0].payload.ends_with("686D"));
        assert_eq!(payments[1].amount.as_str(), "20000");
        assert!(crc::verify(&payments[1].payload));
    }

    #[test]
    fn test_allocates_missing_codes() {
        let csv = "order,amount
,100
,200
,300";

        let batch = process_csv_str(csv);
        let codes: HashSet<_> = batch.payments().iter().map(|p| p.order.clone()).collect();

        assert_eq!(codes.len(), 3);
        for code in &codes {
            assert!(Identifier::parse(Namespace::Order, code.as_str()).is_ok());
        }
    }

    #[test]
    fn test_duplicate_order_code_skipped() {
        let csv = "order,amount
OR7KQ2,100
or7kq2,200";

        let batch = process_csv_str(csv);
        assert_eq!(batch.payments().len(), 1);
        assert_eq!(batch.payments()[0].amount.as_str(), "100");
    }

    #[test]
    fn test_invalid_rows_skipped() {
        let csv = "order,amount,fee_mode,fee_value
,12.50,,
,100,tip,5
,100,fixed,abc
CT7KQ2,100,,
,100,fixed,500";

        let batch = process_csv_str(csv);
        assert_eq!(batch.payments().len(), 1);
        assert!(batch.payments()[0].payload.contains("5403100550202560350058"));
    }

    #[test]
    fn test_unusable_static_payload_rejected_up_front() {
        let foreign = STATIC.replace("5802ID", "5802MY");
        for payload in ["000201010211", "", foreign.as_str()] {
            assert!(QrisBatch::new(payload, IdentifierAllocator::new()).is_err());
        }
        assert!(matches!(
            QrisBatch::new("000201010211", IdentifierAllocator::new()),
            Err(QrisError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_exhausted_identifier_space_aborts_batch() {
        // One-character bodies leave 32 codes; 40 rows cannot all fit.
        let allocator = IdentifierAllocator::with_config(AllocatorConfig {
            max_attempts: 1,
            body_len: 1,
        })
        .unwrap();
        let mut batch = QrisBatch::new(STATIC, allocator).unwrap();

        let csv = format!("order,amount\n{}", ",1\n".repeat(40));
        let err = batch.process_csv(Cursor::new(csv)).unwrap_err();

        assert!(matches!(
            err,
            QrisError::IdentifierSpaceExhausted {
                namespace: Namespace::Order,
                attempts: 1
            }
        ));
        assert!(batch.payments().len() < 40);
    }

    #[test]
    fn test_whitespace_handling() {
        let csv = "order, amount, fee_mode, fee_value
OR7KQ2 , 15000 , , ";

        let batch = process_csv_str(csv);
        assert_eq!(batch.payments().len(), 1);
        assert!(batch.payments()[0].payload.ends_with("686D"));
    }

    #[test]
    fn test_output_format() {
        let csv = "order,amount
OR7KQ2,15000";

        let batch = process_csv_str(csv);
        let mut output = Vec::new();
        batch.write_output(&mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let mut lines = output_str.lines();
        assert_eq!(lines.next(), Some("order,amount,payload"));
        assert_eq!(
            lines.next(),
            Some("OR7KQ2,15000,00020101021226660014ID.CO.QRIS.WWW01189360091530225914810215ID10200176114730303UMI5204581253033605405150005802ID5916WARUNG JOKI KITA6015JAKARTA SELATAN61051295062070703A016304686D")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_batch_still_writes_header() {
        let batch = process_csv_str("order,amount\n");
        let mut output = Vec::new();
        batch.write_output(&mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "order,amount,payload\n");
    }
}
