//! Property-based tests for the payload codec.
//!
//! These tests use proptest to check checksum and framing invariants over
//! arbitrary amounts, fees and merchant names.

use proptest::prelude::*;
use qris_engine::codec::{to_dynamic, FeeMode, FeeSpec};
use qris_engine::{crc, tlv, QrisError};

fn static_payload(merchant: &str, city: &str) -> String {
    let mut body = String::new();
    for (tag, value) in [
        ("00", "01"),
        ("01", "11"),
        ("26", "0014ID.CO.QRIS.WWW0215ID1020017611473"),
        ("52", "5812"),
        ("53", "360"),
        ("58", "ID"),
        ("59", merchant),
        ("60", city),
    ] {
        tlv::write_field(&mut body, tag, value).unwrap();
    }
    body.push_str("6304");
    let checksum = crc::checksum(&body);
    body + &checksum
}

fn fee_strategy() -> impl Strategy<Value = Option<FeeSpec>> {
    prop_oneof![
        Just(None),
        "[0-9]{1,6}".prop_map(|v| Some(FeeSpec::new(FeeMode::Fixed, v))),
        "[0-9]{1,3}".prop_map(|v| Some(FeeSpec::new(FeeMode::Percent, v))),
    ]
}

proptest! {
    /// The trailing checksum always matches the rest of the output.
    #[test]
    fn checksum_round_trip(
        merchant in "[A-Z ]{1,25}",
        city in "[A-Z]{1,15}",
        amount in "[0-9]{1,13}",
        fee in fee_strategy(),
    ) {
        let input = static_payload(&merchant, &city);
        let output = to_dynamic(&input, &amount, fee.as_ref()).unwrap();

        prop_assert!(crc::verify(&output));
        let (body, tail) = output.split_at(output.len() - 4);
        prop_assert_eq!(crc::checksum(body), tail);
    }

    /// Output always parses as a complete TLV stream ending in the checksum.
    #[test]
    fn output_is_well_framed(
        merchant in "[A-Z ]{1,25}",
        amount in "[0-9]{1,13}",
        fee in fee_strategy(),
    ) {
        let input = static_payload(&merchant, "JAKARTA");
        let output = to_dynamic(&input, &amount, fee.as_ref()).unwrap();

        let fields = tlv::parse(&output).unwrap();
        prop_assert_eq!(fields.last().map(|f| f.tag), Some("63"));

        let amount_field = fields.iter().find(|f| f.tag == "54").unwrap();
        prop_assert_eq!(amount_field.value, amount.as_str());

        let expected_len = input.len() + 4 + amount.len()
            + fee.as_ref().map_or(0, |f| 6 + 4 + f.value.len());
        prop_assert_eq!(output.len(), expected_len);
    }

    /// Any amount containing a non-digit is rejected as an invalid amount.
    #[test]
    fn non_digit_amount_rejected(amount in "[0-9]{0,4}[a-zA-Z.,+_/-][0-9]{0,4}") {
        let input = static_payload("SHOP", "JAKARTA");
        let result = to_dynamic(&input, &amount, None);
        prop_assert!(
            matches!(result, Err(QrisError::InvalidAmount(_))),
            "{:?} gave {:?}",
            amount,
            result
        );
    }
}
