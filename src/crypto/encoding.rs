//! Low-level encodings used by libp2p key and peer ID formats.
//!
//! - Unsigned LEB128 varints
//! - The two protobuf field kinds the key messages use (varint, bytes)
//! - Multibase base36 (lowercase)

use super::KeyError;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Protobuf wire type for varint fields.
const WIRE_VARINT: u64 = 0;
/// Protobuf wire type for length-delimited fields.
const WIRE_BYTES: u64 = 2;

/// Appends `value` as an unsigned LEB128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads an unsigned LEB128 varint, returning the value and the bytes consumed.
pub fn read_varint(input: &[u8]) -> Result<(u64, usize), KeyError> {
    let mut value = 0u64;
    for (i, &byte) in input.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(KeyError::Malformed("truncated or overlong varint".into()))
}

/// Appends a protobuf varint field.
pub fn write_varint_field(out: &mut Vec<u8>, field: u64, value: u64) {
    write_varint(out, (field << 3) | WIRE_VARINT);
    write_varint(out, value);
}

/// Appends a protobuf length-delimited field.
pub fn write_bytes_field(out: &mut Vec<u8>, field: u64, value: &[u8]) {
    write_varint(out, (field << 3) | WIRE_BYTES);
    write_varint(out, value.len() as u64);
    out.extend_from_slice(value);
}

/// A decoded protobuf field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
}

/// Iterates over the fields of a protobuf message.
///
/// Only varint and length-delimited wire types are accepted; anything else is
/// reported as malformed since the key messages never use them.
pub fn read_fields(mut input: &[u8]) -> Result<Vec<(u64, FieldValue<'_>)>, KeyError> {
    let mut fields = Vec::new();

    while !input.is_empty() {
        let (key, used) = read_varint(input)?;
        input = &input[used..];

        let field = key >> 3;
        match key & 0x7 {
            WIRE_VARINT => {
                let (value, used) = read_varint(input)?;
                input = &input[used..];
                fields.push((field, FieldValue::Varint(value)));
            }
            WIRE_BYTES => {
                let (len, used) = read_varint(input)?;
                input = &input[used..];
                let len = usize::try_from(len)
                    .map_err(|_| KeyError::Malformed("field length overflow".into()))?;
                if input.len() < len {
                    return Err(KeyError::Malformed(format!(
                        "field {} claims {} bytes, {} available",
                        field,
                        len,
                        input.len()
                    )));
                }
                fields.push((field, FieldValue::Bytes(&input[..len])));
                input = &input[len..];
            }
            wire => {
                return Err(KeyError::Malformed(format!(
                    "unsupported wire type {} for field {}",
                    wire, field
                )))
            }
        }
    }

    Ok(fields)
}

/// Encodes bytes as lowercase base36 (without the multibase prefix).
///
/// Leading zero bytes are preserved as leading `'0'` characters.
pub fn base36_encode(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();

    // Base-256 to base-36 by repeated multiply-and-carry, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 2);
    for &byte in &bytes[zeros..] {
        let mut carry = u32::from(byte);
        for d in digits.iter_mut() {
            let val = u32::from(*d) * 256 + carry;
            *d = (val % 36) as u8;
            carry = val / 36;
        }
        while carry > 0 {
            digits.push((carry % 36) as u8);
            carry /= 36;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('0').take(zeros));
    out.extend(digits.iter().rev().map(|&d| BASE36_ALPHABET[d as usize] as char));
    out
}

/// Returns true if `c` can appear in a base36 string produced by [`base36_encode`].
pub fn is_base36_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_multi_byte() {
        let mut out = Vec::new();
        write_varint(&mut out, 300);
        assert_eq!(out, vec![0xac, 0x02]);
        assert_eq!(read_varint(&out).unwrap(), (300, 2));
    }

    #[test]
    fn test_varint_truncated() {
        assert!(read_varint(&[0x80, 0x80]).is_err());
        assert!(read_varint(&[]).is_err());
    }

    #[test]
    fn test_read_fields() {
        let mut msg = Vec::new();
        write_varint_field(&mut msg, 1, 2);
        write_bytes_field(&mut msg, 2, &[0xaa, 0xbb]);
        assert_eq!(msg, vec![0x08, 0x02, 0x12, 0x02, 0xaa, 0xbb]);

        let fields = read_fields(&msg).unwrap();
        assert_eq!(
            fields,
            vec![(1, FieldValue::Varint(2)), (2, FieldValue::Bytes(&[0xaa, 0xbb]))]
        );
    }

    #[test]
    fn test_read_fields_short_bytes() {
        assert!(read_fields(&[0x12, 0x05, 0x01]).is_err());
    }

    #[test]
    fn test_read_fields_rejects_fixed64() {
        assert!(read_fields(&[0x09, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_base36() {
        assert_eq!(base36_encode(&[]), "");
        assert_eq!(base36_encode(&[0]), "0");
        assert_eq!(base36_encode(&[35]), "z");
        assert_eq!(base36_encode(&[36]), "10");
        assert_eq!(base36_encode(&[0, 0, 36]), "0010");
        assert_eq!(base36_encode(&[0x01, 0x00]), "74");
    }

    #[test]
    fn test_base36_alphabet() {
        assert!(is_base36_char('0'));
        assert!(is_base36_char('z'));
        assert!(!is_base36_char('Z'));
        assert!(!is_base36_char('-'));
    }
}
