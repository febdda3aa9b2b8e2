//! Tag-length-value primitives for EMV merchant-presented payloads.
//!
//! Every field is a 2-digit decimal tag, a 2-digit zero-padded decimal length
//! and a value of exactly that many characters. Nested templates are returned
//! as opaque values; callers that care can run [`parse`] again on them.

use thiserror::Error;

/// Width of the tag and of the length prefix.
pub const HEADER_WIDTH: usize = 2;

/// Largest value a 2-digit length prefix can describe.
pub const MAX_VALUE_LEN: usize = 99;

/// Well-known top-level tags touched by the codec.
pub mod tags {
    pub const POINT_OF_INITIATION: &str = "01";
    pub const TRANSACTION_AMOUNT: &str = "54";
    pub const TIP_INDICATOR: &str = "55";
    pub const FIXED_FEE: &str = "56";
    pub const PERCENTAGE_FEE: &str = "57";
    pub const COUNTRY_CODE: &str = "58";
    pub const CRC: &str = "63";
}

/// Structural errors found while parsing a TLV stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlvError {
    /// Tag or length characters are not decimal digits
    #[error("malformed field header at offset {offset}")]
    BadHeader { offset: usize },

    /// Declared length runs past the end of the input
    #[error("field {tag} at offset {offset} declares {declared} characters but only {available} remain")]
    Truncated {
        tag: String,
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// Value does not fit a 2-digit length prefix
    #[error("value of {len} characters exceeds the 99-character field limit")]
    ValueTooLong { len: usize },
}

/// A single field borrowed from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Two-digit tag.
    pub tag: &'a str,
    /// Field value, `len()` characters long.
    pub value: &'a str,
    /// Byte offset of the tag within the parsed input.
    pub offset: usize,
}

impl<'a> Field<'a> {
    /// Total characters occupied by the field, header included.
    pub fn encoded_len(&self) -> usize {
        2 * HEADER_WIDTH + self.value.len()
    }

    /// Byte offset just past the end of the field.
    pub fn end(&self) -> usize {
        self.offset + self.encoded_len()
    }
}

/// Iterator over the top-level fields of a TLV stream.
///
/// Yields an error and then stops at the first structural problem. A trailing
/// remainder shorter than a field header is reported as truncated.
pub struct Fields<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<Field<'a>, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.input.len() {
            return None;
        }

        let result = self.read_field();
        match &result {
            Ok(field) => self.pos = field.end(),
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

impl<'a> Fields<'a> {
    fn read_field(&self) -> Result<Field<'a>, TlvError> {
        let offset = self.pos;
        let rest = &self.input.as_bytes()[offset..];
        let header = 2 * HEADER_WIDTH;

        if rest.len() < header {
            return Err(TlvError::Truncated {
                tag: String::from_utf8_lossy(&rest[..rest.len().min(HEADER_WIDTH)]).into_owned(),
                offset,
                declared: header,
                available: rest.len(),
            });
        }
        if !rest[..header].iter().all(u8::is_ascii_digit) {
            return Err(TlvError::BadHeader { offset });
        }

        let tag = &self.input[offset..offset + HEADER_WIDTH];
        let declared = usize::from(rest[2] - b'0') * 10 + usize::from(rest[3] - b'0');
        let available = rest.len() - header;
        let start = offset + header;

        if declared > available || !self.input.is_char_boundary(start + declared) {
            return Err(TlvError::Truncated {
                tag: tag.to_string(),
                offset,
                declared,
                available,
            });
        }

        Ok(Field {
            tag,
            value: &self.input[start..start + declared],
            offset,
        })
    }
}

/// Walks the top-level fields of `input`.
pub fn fields(input: &str) -> Fields<'_> {
    Fields {
        input,
        pos: 0,
        done: false,
    }
}

/// Parses `input` as a complete TLV stream.
///
/// Fails if any field is malformed or the input ends mid-field.
pub fn parse(input: &str) -> Result<Vec<Field<'_>>, TlvError> {
    fields(input).collect()
}

/// Outcome of looking up a top-level tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// First top-level field carrying the tag.
    Found(Field<'a>),
    /// The walk reached the end without meeting the tag.
    Absent,
    /// The walk broke on a malformed field before meeting the tag.
    Unparsable,
}

/// Looks up the first top-level field with the given tag.
///
/// A bare `6304` checksum header at the very end, as left behind when a
/// checksum value is stripped, counts as a clean end of stream.
pub fn lookup<'a>(input: &'a str, tag: &str) -> Lookup<'a> {
    for item in fields(input) {
        match item {
            Ok(field) if field.tag == tag => return Lookup::Found(field),
            Ok(_) => {}
            Err(TlvError::Truncated {
                tag: ref truncated,
                declared: 4,
                available: 0,
                ..
            }) if truncated == tags::CRC => return Lookup::Absent,
            Err(_) => return Lookup::Unparsable,
        }
    }
    Lookup::Absent
}

/// Encodes a single field.
pub fn encode(tag: &str, value: &str) -> Result<String, TlvError> {
    let mut out = String::with_capacity(2 * HEADER_WIDTH + value.len());
    write_field(&mut out, tag, value)?;
    Ok(out)
}

/// Appends an encoded field to `out`.
pub fn write_field(out: &mut String, tag: &str, value: &str) -> Result<(), TlvError> {
    debug_assert_eq!(tag.len(), HEADER_WIDTH, "tags are two characters");

    if value.len() > MAX_VALUE_LEN {
        return Err(TlvError::ValueTooLong { len: value.len() });
    }

    out.push_str(tag);
    out.push_str(&format!("{:02}", value.len()));
    out.push_str(value);
    Ok(())
}
