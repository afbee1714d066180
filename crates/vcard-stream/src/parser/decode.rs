//! Value decoding, including multi-line continuation forms.
//!
//! Quoted-Printable soft breaks, BASE64 blocks and RFC 2425 folded lines all
//! continue a value across physical lines, so the decoder pulls further lines
//! from the [`LineSource`] itself. Quoted-Printable values are handed over
//! still in encoded form, joined across folds; decoding them to bytes is the
//! consumer's job (see [`crate::encoding`]).

use std::collections::HashSet;
use std::io::Read;

use crate::encoding::decode_base64;
use crate::error::{Error, Result};
use crate::parser::dissect::RawProperty;
use crate::parser::params::Encoding;
use crate::parser::source::LineSource;
use crate::profile::VersionProfile;

/// The decoded value of one property.
#[derive(Debug)]
pub(crate) enum PropertyValue {
    /// Plain or Quoted-Printable text, one value field.
    Text(String),
    /// The fields of a structured (ADR/ORG/N) property.
    List(Vec<String>),
    /// A BASE64 payload: the accumulated text plus its decoded bytes, when
    /// the payload decoded cleanly.
    Binary {
        text: String,
        bytes: Option<Vec<u8>>,
    },
    /// Accumulation was abandoned (allocation failure); consumers get a null
    /// value list.
    Dropped,
}

/// Decodes the value of a dissected property, pulling continuation lines as
/// needed. Returns `Ok(None)` for properties that produce no value event
/// (an ignored AGENT line).
pub(crate) fn decode_value<R: Read>(
    raw: &RawProperty,
    name_upper: &str,
    profile: &VersionProfile,
    source: &mut LineSource<R>,
    unknown_names: &mut HashSet<String>,
) -> Result<Option<PropertyValue>> {
    match name_upper {
        "ADR" | "ORG" | "N" => {
            // 2.1 does not allow Quoted-Printable here, but some devices emit
            // it anyway.
            let value = if raw.encoding.is_quoted_printable() {
                quoted_printable_value(source, &raw.raw_value)?
            } else {
                raw.raw_value.clone()
            };
            Ok(Some(PropertyValue::List(profile.split_structured(&value))))
        }
        "AGENT" => agent_value(&raw.raw_value),
        _ => {
            if !is_valid_property_name(profile, unknown_names, name_upper) {
                return Err(Error::UnknownProperty(name_upper.to_string()));
            }
            if name_upper == "VERSION" && raw.raw_value != profile.version() {
                return Err(Error::IncompatibleVersion {
                    found: raw.raw_value.clone(),
                    expected: profile.version().to_string(),
                });
            }
            match &raw.encoding {
                Encoding::QuotedPrintable => Ok(Some(PropertyValue::Text(
                    quoted_printable_value(source, &raw.raw_value)?,
                ))),
                Encoding::Base64 => base64_value(source, profile, &raw.raw_value),
                Encoding::SevenBit | Encoding::EightBit | Encoding::Extension(_) => Ok(Some(
                    PropertyValue::Text(plain_value(source, profile, &raw.raw_value)?),
                )),
            }
        }
    }
}

/// Real-world cards use names far outside the 2.1 set; warn once per
/// distinct offender and accept.
fn is_valid_property_name(
    profile: &VersionProfile,
    unknown_names: &mut HashSet<String>,
    name: &str,
) -> bool {
    if !(profile.is_known_property(name) || name.starts_with("X-"))
        && !unknown_names.contains(name)
    {
        unknown_names.insert(name.to_string());
        tracing::warn!(name, "property name unsupported by vCard 2.1");
    }
    true
}

/// 2.1 allows a whole vCard as the AGENT value, which this parser rejects.
/// Some devices emit AGENT lines with an empty or junk body instead; those
/// are ignored without a value event.
fn agent_value(raw_value: &str) -> Result<Option<PropertyValue>> {
    if raw_value.to_ascii_uppercase().contains("BEGIN:VCARD") {
        Err(Error::AgentNotSupported)
    } else {
        Ok(None)
    }
}

/// Joins a Quoted-Printable value across its soft-break continuation lines.
///
/// A segment line ends with `=`, possibly followed by transport padding
/// (RFC 2045: whitespace between the `=` and the CRLF). Segments are joined
/// with CRLF, padding removed; the first line whose trimmed form does not end
/// with `=` is the final segment.
fn quoted_printable_value<R: Read>(source: &mut LineSource<R>, first: &str) -> Result<String> {
    let Some(segment) = soft_break_segment(first) else {
        return Ok(first.to_string());
    };

    let mut joined = String::from(segment);
    joined.push_str("\r\n");
    loop {
        let Some(line) = source.read_line()? else {
            return Err(Error::UnexpectedEof(
                "stream ended inside a quoted-printable value".to_string(),
            ));
        };
        match soft_break_segment(&line) {
            Some(segment) => {
                joined.push_str(segment);
                joined.push_str("\r\n");
            }
            None => {
                joined.push_str(&line);
                break;
            }
        }
    }
    Ok(joined)
}

/// Returns the line up to and including its final `=` when the line is a
/// soft-break segment, `None` when it is a final segment.
fn soft_break_segment(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    trimmed.ends_with('=').then_some(trimmed)
}

/// Accumulates a BASE64 block.
///
/// The block ends at a blank line, or early when the lookahead already holds
/// the next property (producers routinely omit the blank terminator; BASE64
/// text cannot contain `:`, so a known name before a colon is unambiguous).
fn base64_value<R: Read>(
    source: &mut LineSource<R>,
    profile: &VersionProfile,
    first: &str,
) -> Result<Option<PropertyValue>> {
    let mut accumulated = String::new();
    if append_checked(&mut accumulated, first).is_err() {
        return Ok(Some(PropertyValue::Dropped));
    }

    loop {
        let next_is_property = {
            let Some(next) = source.peek_line()? else {
                return Err(Error::UnexpectedEof(
                    "stream ended inside a BASE64 value".to_string(),
                ));
            };
            match next.split_once(':') {
                Some((name, _)) if profile.is_known_property(name) => {
                    tracing::warn!(
                        line = next.trim(),
                        "next property found while reading a BASE64 value; missing blank terminator"
                    );
                    true
                }
                _ => false,
            }
        };
        if next_is_property {
            break;
        }

        let Some(line) = source.read_line()? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        if append_checked(&mut accumulated, &line).is_err() {
            return Ok(Some(PropertyValue::Dropped));
        }
    }

    let bytes = decode_base64(&accumulated);
    Ok(Some(PropertyValue::Binary {
        text: accumulated,
        bytes,
    }))
}

/// Appends with a fallible reservation, so a huge embedded payload degrades
/// to a dropped value instead of aborting the process.
fn append_checked(accumulated: &mut String, line: &str) -> std::result::Result<(), ()> {
    if accumulated.try_reserve(line.len()).is_err() {
        tracing::error!("allocation failed while accumulating BASE64 data");
        return Err(());
    }
    accumulated.push_str(line);
    Ok(())
}

/// Reads a plain-text value, resolving RFC 2425 folded continuation lines
/// (a single leading space) when the profile applies folding. Folding must
/// not eat the entry terminator, so a lookahead beginning with `END:VCARD`
/// stops it.
fn plain_value<R: Read>(
    source: &mut LineSource<R>,
    profile: &VersionProfile,
    first: &str,
) -> Result<String> {
    let mut folded: Option<String> = None;

    if profile.applies_line_folding() {
        loop {
            let continues = match source.peek_line()? {
                Some(next) => {
                    next.starts_with(' ')
                        && !next.to_ascii_uppercase().starts_with("END:VCARD")
                }
                None => false,
            };
            if !continues {
                break;
            }
            let Some(line) = source.read_line()? else {
                break;
            };
            folded
                .get_or_insert_with(|| first.to_string())
                .push_str(&line[1..]);
        }
    }

    let text = folded.unwrap_or_else(|| first.to_string());
    Ok(profile.unescape_text(&text).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;

    fn source(input: &[u8]) -> LineSource<&[u8]> {
        LineSource::new(input)
    }

    #[test]
    fn test_soft_break_segment() {
        assert_eq!(soft_break_segment("abc="), Some("abc="));
        assert_eq!(soft_break_segment("abc=  "), Some("abc="));
        assert_eq!(soft_break_segment("abc= \t "), Some("abc="));
        assert_eq!(soft_break_segment("abc"), None);
        assert_eq!(soft_break_segment("abc  "), None);
        assert_eq!(soft_break_segment(""), None);
    }

    #[test]
    fn test_quoted_printable_single_line() {
        let mut src = source(b"");
        let value = quoted_printable_value(&mut src, "no continuation").unwrap();
        assert_eq!(value, "no continuation");
    }

    #[test]
    fn test_quoted_printable_continuation() {
        let mut src = source(b"for all folk to come=\r\nto the aid\r\n");
        let value = quoted_printable_value(&mut src, "Now's the time =").unwrap();
        assert_eq!(
            value,
            "Now's the time =\r\nfor all folk to come=\r\nto the aid"
        );
    }

    #[test]
    fn test_quoted_printable_transport_padding() {
        let mut src = source(b"second line\r\n");
        let value = quoted_printable_value(&mut src, "padded=  ").unwrap();
        assert_eq!(value, "padded=\r\nsecond line");
    }

    #[test]
    fn test_quoted_printable_eof() {
        let mut src = source(b"");
        let err = quoted_printable_value(&mut src, "unterminated=").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_base64_blank_line_terminator() {
        let profile = VersionProfile::v21();
        let mut src = source(b"U29tZSBk\r\nYXRh\r\n\r\nTEL:1\r\n");
        let value = base64_value(&mut src, &profile, "").unwrap().unwrap();
        match value {
            PropertyValue::Binary { text, bytes } => {
                assert_eq!(text, "U29tZSBkYXRh");
                assert_eq!(bytes.unwrap(), b"Some data");
            }
            other => panic!("expected binary, got {other:?}"),
        }
        // The blank terminator is consumed; the next property is not.
        assert_eq!(src.read_line().unwrap().as_deref(), Some("TEL:1"));
    }

    #[test]
    fn test_base64_next_property_terminator() {
        let profile = VersionProfile::v21();
        let mut src = source(b"U29tZSBkYXRh\r\nTEL:1\r\n");
        let value = base64_value(&mut src, &profile, "").unwrap().unwrap();
        match value {
            PropertyValue::Binary { text, .. } => assert_eq!(text, "U29tZSBkYXRh"),
            other => panic!("expected binary, got {other:?}"),
        }
        // The detected property line stays unconsumed.
        assert_eq!(src.read_line().unwrap().as_deref(), Some("TEL:1"));
    }

    #[test]
    fn test_base64_eof() {
        let profile = VersionProfile::v21();
        let mut src = source(b"U29tZSBkYXRh\r\n");
        let err = base64_value(&mut src, &profile, "").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_base64_invalid_payload_keeps_text() {
        let profile = VersionProfile::v21();
        let mut src = source(b"!!!\r\n\r\nTEL:1\r\n");
        let value = base64_value(&mut src, &profile, "").unwrap().unwrap();
        match value {
            PropertyValue::Binary { text, bytes } => {
                assert_eq!(text, "!!!");
                assert!(bytes.is_none());
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_value_folding() {
        let profile = VersionProfile::v21();
        let mut src = source(b" <omega@example.com>\r\nEND:VCARD\r\n");
        let value = plain_value(&mut src, &profile, "\"Omega\"").unwrap();
        assert_eq!(value, "\"Omega\" <omega@example.com>");
        assert_eq!(src.read_line().unwrap().as_deref(), Some("END:VCARD"));
    }

    #[test]
    fn test_plain_value_multiple_folds() {
        let profile = VersionProfile::v21();
        let mut src = source(b" b\r\n  c\r\nTEL:1\r\n");
        let value = plain_value(&mut src, &profile, "a").unwrap();
        // Only the first space of each continuation line is stripped.
        assert_eq!(value, "a b c");
        assert_eq!(src.read_line().unwrap().as_deref(), Some("TEL:1"));
    }

    #[test]
    fn test_plain_value_not_folded() {
        let profile = VersionProfile::v21();
        let mut src = source(b"END:VCARD\r\n");
        let value = plain_value(&mut src, &profile, "plain").unwrap();
        assert_eq!(value, "plain");
        assert_eq!(src.read_line().unwrap().as_deref(), Some("END:VCARD"));
    }

    #[test]
    fn test_agent_value() {
        assert!(agent_value("").unwrap().is_none());
        assert!(agent_value("junk from some devices").unwrap().is_none());
        assert!(matches!(
            agent_value("BEGIN:VCARD"),
            Err(Error::AgentNotSupported)
        ));
        assert!(matches!(
            agent_value("begin:vcard..."),
            Err(Error::AgentNotSupported)
        ));
    }

    #[test]
    fn test_unknown_property_name_warned_once() {
        let profile = VersionProfile::v21();
        let mut unknown_names = HashSet::new();
        assert!(is_valid_property_name(&profile, &mut unknown_names, "FOO"));
        assert!(is_valid_property_name(&profile, &mut unknown_names, "FOO"));
        assert_eq!(unknown_names.len(), 1);
        assert!(is_valid_property_name(&profile, &mut unknown_names, "X-FOO"));
        assert_eq!(unknown_names.len(), 1);
    }
}
