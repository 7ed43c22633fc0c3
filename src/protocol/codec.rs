//! OSC 1.0 binary codec.
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────────────┬─────────────────────┬──────────────────────┐
//! │ Address (string) │ Type tags (",ifsT") │ Arguments (big end.) │
//! │ NUL-padded to 4  │ NUL-padded to 4     │ each 4-byte aligned  │
//! └──────────────────┴─────────────────────┴──────────────────────┘
//! ```
//!
//! Bundles (`#bundle`, 8-byte timetag, then size-prefixed elements) are
//! flattened into their messages by [`decode_packet`]; the timetag is
//! ignored because Bitwig only sends immediate bundles.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::{Message, OscType};

// ============================================================================
// Constants
// ============================================================================

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Bundle marker, including its NUL terminator.
const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// OSC "immediately" timetag.
const IMMEDIATE_TIMETAG: u64 = 1;

/// Maximum nesting of bundles inside bundles.
const MAX_BUNDLE_DEPTH: usize = 8;

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a message into its OSC wire representation.
#[must_use]
pub fn encode(message: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_string(&mut buf, message.address());

    let mut tags = String::with_capacity(message.args().len() + 1);
    tags.push(',');
    tags.extend(message.args().iter().map(OscType::type_tag));
    write_string(&mut buf, &tags);

    for arg in message.args() {
        match arg {
            OscType::Int(value) => buf.extend_from_slice(&value.to_be_bytes()),
            OscType::Long(value) => buf.extend_from_slice(&value.to_be_bytes()),
            OscType::Float(value) => buf.extend_from_slice(&value.to_be_bytes()),
            OscType::Double(value) => buf.extend_from_slice(&value.to_be_bytes()),
            OscType::String(value) => write_string(&mut buf, value),
            OscType::Blob(bytes) => {
                let len = i32::try_from(bytes.len()).unwrap_or(i32::MAX);
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(bytes);
                pad(&mut buf);
            }
            OscType::Bool(_) | OscType::Nil => {}
        }
    }

    buf
}

/// Encodes messages into an immediate bundle.
#[must_use]
pub fn encode_bundle(messages: &[Message]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + messages.len() * 32);
    buf.extend_from_slice(BUNDLE_TAG);
    buf.extend_from_slice(&IMMEDIATE_TIMETAG.to_be_bytes());

    for message in messages {
        let element = encode(message);
        let len = i32::try_from(element.len()).unwrap_or(i32::MAX);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&element);
    }

    buf
}

/// Writes a NUL-terminated string padded to a 4-byte boundary.
fn write_string(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
    pad(buf);
}

/// Pads with NUL bytes to the next 4-byte boundary.
fn pad(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Rounds up to the next multiple of four.
#[inline]
const fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a single OSC message.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] when the bytes do not follow OSC
/// framing: unaligned length, missing `/`, unterminated or badly padded
/// strings, unknown type tags, truncated arguments, or trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    if bytes.len() % 4 != 0 {
        return Err(Error::malformed(format!(
            "length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    let mut reader = Reader::new(bytes);
    let address = reader.read_string()?;
    if !address.starts_with('/') {
        return Err(Error::malformed(format!(
            "address must start with '/': {address:?}"
        )));
    }

    // Pre-1.0 senders omit the type tag string entirely.
    if reader.is_empty() {
        return Ok(Message::bare(address));
    }

    let tags = reader.read_string()?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(Error::malformed(format!(
            "type tag string must start with ',': {tags:?}"
        )));
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscType::Int(i32::from_be_bytes(reader.read_array()?)),
            'h' => OscType::Long(i64::from_be_bytes(reader.read_array()?)),
            'f' => OscType::Float(f32::from_be_bytes(reader.read_array()?)),
            'd' => OscType::Double(f64::from_be_bytes(reader.read_array()?)),
            's' | 'S' => OscType::String(reader.read_string()?),
            'b' => OscType::Blob(reader.read_blob()?),
            'T' => OscType::Bool(true),
            'F' => OscType::Bool(false),
            'N' | 'I' => OscType::Nil,
            other => {
                return Err(Error::malformed(format!(
                    "unsupported type tag {other:?} in {address}"
                )));
            }
        };
        args.push(arg);
    }

    if !reader.is_empty() {
        return Err(Error::malformed(format!(
            "{} trailing bytes after arguments of {address}",
            reader.remaining()
        )));
    }

    Ok(Message::new(address, args))
}

/// Decodes a datagram that holds either one message or a bundle.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] if the datagram or any bundle element
/// is malformed. A bundle is rejected as a whole.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    decode_into(bytes, 0, &mut messages)?;
    Ok(messages)
}

fn decode_into(bytes: &[u8], depth: usize, out: &mut Vec<Message>) -> Result<()> {
    if !bytes.starts_with(BUNDLE_TAG) {
        out.push(decode(bytes)?);
        return Ok(());
    }

    if depth >= MAX_BUNDLE_DEPTH {
        return Err(Error::malformed("bundle nesting too deep"));
    }

    let mut reader = Reader::new(bytes);
    reader.skip(BUNDLE_TAG.len())?;
    let _timetag: [u8; 8] = reader.read_array()?;

    while !reader.is_empty() {
        let size = i32::from_be_bytes(reader.read_array()?);
        let size = usize::try_from(size)
            .ok()
            .filter(|size| *size > 0 && size % 4 == 0)
            .ok_or_else(|| Error::malformed(format!("invalid bundle element size {size}")))?;
        let element = reader.take(size)?;
        decode_into(element, depth + 1, out)?;
    }

    Ok(())
}

// ============================================================================
// Reader
// ============================================================================

/// Cursor over an OSC payload.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::malformed(format!(
                "truncated payload: need {len} bytes, {} left",
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn read_string(&mut self) -> Result<String> {
        let rest = &self.bytes[self.pos..];
        let nul = rest
            .iter()
            .position(|byte| *byte == 0)
            .ok_or_else(|| Error::malformed("unterminated string"))?;
        let value = std::str::from_utf8(&rest[..nul])
            .map_err(|e| Error::malformed(format!("string is not UTF-8: {e}")))?
            .to_string();

        let padded = self.take(padded_len(nul + 1))?;
        if padded[nul..].iter().any(|byte| *byte != 0) {
            return Err(Error::malformed("string padding is not NUL"));
        }

        Ok(value)
    }

    fn read_blob(&mut self) -> Result<Vec<u8>> {
        let len = i32::from_be_bytes(self.read_array()?);
        let len = usize::try_from(len)
            .map_err(|_| Error::malformed(format!("negative blob length {len}")))?;
        let padded = self.take(padded_len(len))?;
        Ok(padded[..len].to_vec())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_reference_bytes() {
        let message = Message::with_value("/play", 1_i32);
        let bytes = encode(&message);
        assert_eq!(
            bytes,
            vec![
                b'/', b'p', b'l', b'a', b'y', 0, 0, 0, // address
                b',', b'i', 0, 0, // tags
                0, 0, 0, 1, // int
            ]
        );
    }

    #[test]
    fn test_address_of_four_bytes_gets_full_pad_word() {
        let bytes = encode(&Message::bare("/abc"));
        assert_eq!(&bytes[..8], b"/abc\0\0\0\0");
    }

    #[test]
    fn test_decode_mixed_arguments() {
        let message = Message::new(
            "/browser/filter/1/item/2",
            vec![
                OscType::from("Delay"),
                OscType::Int(12),
                OscType::Float(0.5),
                OscType::Bool(true),
                OscType::Nil,
            ],
        );
        let decoded = decode(&encode(&message)).expect("decode");
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_decode_without_type_tags() {
        let decoded = decode(b"/refresh\0\0\0\0").expect("decode");
        assert_eq!(decoded, Message::bare("/refresh"));
    }

    #[test]
    fn test_reject_unaligned_length() {
        let mut bytes = encode(&Message::trigger("/play"));
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(Error::MalformedMessage { .. })));
    }

    #[test]
    fn test_reject_truncated_argument() {
        let mut bytes = encode(&Message::with_value("/tempo/raw", 120.0_f64));
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(decode(&bytes), Err(Error::MalformedMessage { .. })));
    }

    #[test]
    fn test_reject_unknown_type_tag() {
        let bytes = b"/x\0\0,q\0\0".to_vec();
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported type tag"));
    }

    #[test]
    fn test_reject_missing_slash() {
        let bytes = b"play\0\0\0\0,\0\0\0".to_vec();
        assert!(matches!(decode(&bytes), Err(Error::MalformedMessage { .. })));
    }

    #[test]
    fn test_reject_non_nul_padding() {
        let bytes = b"/ab\0,\0x\0".to_vec();
        assert!(matches!(decode(&bytes), Err(Error::MalformedMessage { .. })));
    }

    #[test]
    fn test_reject_trailing_bytes() {
        let mut bytes = encode(&Message::bare("/stop"));
        bytes.extend_from_slice(&[0, 0, 0, 7]);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_blob_round_trip() {
        let message = Message::new("/blob", vec![OscType::Blob(vec![1, 2, 3, 4, 5])]);
        assert_eq!(decode(&encode(&message)).expect("decode"), message);
    }

    #[test]
    fn test_decode_packet_flattens_bundle() {
        let first = Message::with_value("/browser/result/1/name", "EQ+");
        let second = Message::with_value("/browser/result/1/exists", 1_i32);
        let bytes = encode_bundle(&[first.clone(), second.clone()]);

        let messages = decode_packet(&bytes).expect("decode bundle");
        assert_eq!(messages, vec![first, second]);
    }

    #[test]
    fn test_decode_packet_single_message() {
        let message = Message::trigger("/stop");
        let messages = decode_packet(&encode(&message)).expect("decode");
        assert_eq!(messages, vec![message]);
    }

    #[test]
    fn test_reject_bundle_with_bad_element_size() {
        let mut bytes = encode_bundle(&[Message::trigger("/stop")]);
        // Corrupt the element size to something unaligned.
        bytes[16..20].copy_from_slice(&5_i32.to_be_bytes());
        assert!(decode_packet(&bytes).is_err());
    }
}
