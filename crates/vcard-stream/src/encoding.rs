//! Value transfer-encoding decoders.
//!
//! The parser hands Quoted-Printable values to consumers still in their
//! encoded text form (joined across soft line breaks); consumers that want
//! the raw bytes use [`decode_quoted_printable`]. BASE64 payloads are decoded
//! by the parser itself through [`decode_base64`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decodes Quoted-Printable text (RFC 2045) into raw bytes.
///
/// Lenient by design: vCard producers in the wild emit broken escapes, so an
/// `=` that is not followed by two hex digits or a line break is kept
/// literally instead of failing the whole value.
#[must_use]
pub fn decode_quoted_printable(text: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte != b'=' {
            result.push(byte);
            pos += 1;
            continue;
        }

        // Soft line break: "=\r\n" or "=\n".
        match bytes.get(pos + 1) {
            Some(&b'\r') if bytes.get(pos + 2) == Some(&b'\n') => {
                pos += 3;
                continue;
            }
            Some(&b'\n') => {
                pos += 2;
                continue;
            }
            _ => {}
        }

        match (hex_value(bytes.get(pos + 1)), hex_value(bytes.get(pos + 2))) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                pos += 3;
            }
            _ => {
                result.push(b'=');
                pos += 1;
            }
        }
    }

    result
}

/// Decodes a BASE64 payload, ignoring embedded whitespace.
///
/// Returns `None` (after logging a warning) when the payload is not valid
/// BASE64; callers keep the text form in that case.
#[must_use]
pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|ch| !ch.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact) {
        Ok(bytes) => Some(bytes),
        Err(error) => {
            tracing::warn!(%error, "BASE64 payload failed to decode");
            None
        }
    }
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    match *byte? {
        digit @ b'0'..=b'9' => Some(digit - b'0'),
        upper @ b'A'..=b'F' => Some(upper - b'A' + 10),
        lower @ b'a'..=b'f' => Some(lower - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_printable_plain() {
        assert_eq!(decode_quoted_printable("Hello, World!"), b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_escapes() {
        assert_eq!(decode_quoted_printable("H=C3=A9llo"), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable("=3D"), b"=");
        assert_eq!(decode_quoted_printable("a=20b"), b"a b");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        assert_eq!(decode_quoted_printable("Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable("Hello=\nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_broken_escape_kept() {
        assert_eq!(decode_quoted_printable("100=% sure"), b"100=% sure");
        assert_eq!(decode_quoted_printable("trailing="), b"trailing=");
    }

    #[test]
    fn test_base64() {
        assert_eq!(
            decode_base64("SGVsbG8sIFdvcmxkIQ==").unwrap(),
            b"Hello, World!"
        );
        // Whitespace from joined continuation lines is ignored.
        assert_eq!(
            decode_base64("SGVsbG8s IFdvcmxkIQ==").unwrap(),
            b"Hello, World!"
        );
        assert!(decode_base64("not base64!!").is_none());
    }
}
