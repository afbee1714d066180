//! Version profiles carrying the dialect rules of a vCard revision.
//!
//! vCard revisions differ in which names they recognise, whether parameters
//! may be double-quoted, how text values are escaped and whether RFC 2425
//! line folding applies. Rather than subclassing the parser per revision, a
//! [`VersionProfile`] value bundles those rules and the driver takes one as a
//! parameter.

use std::borrow::Cow;
use std::collections::HashSet;

/// Property names known to vCard 2.1.
///
/// `ADR`, `ORG`, `N` and `AGENT` are dispatched before name validation and
/// deliberately absent, matching how real-world 2.1 producers are handled.
const V21_PROPERTY_NAMES: &[&str] = &[
    "BEGIN", "END", "LOGO", "PHOTO", "LABEL", "FN", "TITLE", "SOUND", "VERSION", "TEL", "EMAIL",
    "TZ", "GEO", "NOTE", "URL", "BDAY", "ROLE", "REV", "UID", "KEY", "MAILER",
];

/// TYPE parameter values known to vCard 2.1.
const V21_TYPE_VALUES: &[&str] = &[
    "DOM", "INTL", "POSTAL", "PARCEL", "HOME", "WORK", "PREF", "VOICE", "FAX", "MSG", "CELL",
    "PAGER", "BBS", "MODEM", "CAR", "ISDN", "VIDEO", "AIM", "MSN", "TLX", "X400", "GIF", "CGM",
    "WMF", "BMP", "MET", "PMB", "DIB", "PICT", "TIFF", "PDF", "PS", "JPEG", "QTIME", "MPEG",
    "MPEG2", "AVI", "WAVE", "AIFF", "PCM", "X509", "PGP",
];

/// VALUE parameter values known to vCard 2.1.
const V21_VALUE_VALUES: &[&str] = &["INLINE", "URL", "CONTENT-ID", "CID"];

/// ENCODING parameter values accepted by vCard 2.1 (`X-` extensions are
/// accepted separately).
const V21_ENCODINGS: &[&str] = &["7BIT", "8BIT", "QUOTED-PRINTABLE", "BASE64", "B"];

/// The dialect rules of one vCard revision.
///
/// Only the 2.1 profile is provided; the seams (known-name sets, escape
/// rules, folding and quoting tolerances) are where a 3.0 profile would
/// differ.
#[derive(Debug, Clone)]
pub struct VersionProfile {
    version: &'static str,
    known_properties: HashSet<&'static str>,
    known_types: HashSet<&'static str>,
    known_values: HashSet<&'static str>,
    known_encodings: HashSet<&'static str>,
    allows_dquote_params: bool,
    applies_line_folding: bool,
}

impl VersionProfile {
    /// The vCard 2.1 profile.
    #[must_use]
    pub fn v21() -> Self {
        Self {
            version: "2.1",
            known_properties: V21_PROPERTY_NAMES.iter().copied().collect(),
            known_types: V21_TYPE_VALUES.iter().copied().collect(),
            known_values: V21_VALUE_VALUES.iter().copied().collect(),
            known_encodings: V21_ENCODINGS.iter().copied().collect(),
            // 3.0 allows double-quoted parameter values; 2.1 does not, but
            // real producers emit them anyway and we accept with a warning.
            allows_dquote_params: false,
            // RFC 2425 folding is a 3.0 rule that leaks into 2.1 output from
            // some devices, so the 2.1 profile resolves it while reading.
            applies_line_folding: true,
        }
    }

    /// The version string this profile expects in a VERSION property.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version
    }

    /// Returns true if `name` (any case) is a property name this revision
    /// defines.
    #[must_use]
    pub fn is_known_property(&self, name: &str) -> bool {
        self.known_properties
            .contains(name.to_ascii_uppercase().as_str())
    }

    /// Returns true if `value` (any case) is a TYPE value this revision
    /// defines.
    #[must_use]
    pub fn is_known_type(&self, value: &str) -> bool {
        self.known_types
            .contains(value.to_ascii_uppercase().as_str())
    }

    /// Returns true if `value` (any case) is a VALUE value this revision
    /// defines.
    #[must_use]
    pub fn is_known_value(&self, value: &str) -> bool {
        self.known_values
            .contains(value.to_ascii_uppercase().as_str())
    }

    /// Returns true if `value` is an accepted ENCODING value. Matching is
    /// case-sensitive: the 2.1 grammar spells these tokens in upper case.
    #[must_use]
    pub fn is_known_encoding(&self, value: &str) -> bool {
        self.known_encodings.contains(value)
    }

    /// Whether double-quoted parameter values are part of this revision's
    /// grammar. When false they are still accepted, with a warning.
    #[must_use]
    pub const fn allows_dquote_params(&self) -> bool {
        self.allows_dquote_params
    }

    /// Whether plain-text values resolve RFC 2425 folded continuation lines.
    #[must_use]
    pub const fn applies_line_folding(&self) -> bool {
        self.applies_line_folding
    }

    /// Unescapes a decoded text value. Identity in 2.1; a 3.0 profile would
    /// rewrite `\n` and friends here.
    #[must_use]
    pub fn unescape_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let _ = self;
        Cow::Borrowed(text)
    }

    /// Returns the unescaped form of `\` + `ch`, or `None` when the sequence
    /// must stay literal.
    ///
    /// The 2.1 grammar only escapes `;`, but `\\`, `\:` and `\,` circulate in
    /// the wild and are accepted too.
    #[must_use]
    pub fn unescape_character(&self, ch: char) -> Option<char> {
        let _ = self;
        matches!(ch, '\\' | ';' | ':' | ',').then_some(ch)
    }

    /// Splits a structured (ADR/ORG/N) value on unescaped semicolons.
    ///
    /// A backslash escapes the characters [`unescape_character`] recognises;
    /// any other escape sequence is kept literally. Empty fields are
    /// preserved, including a trailing one.
    ///
    /// [`unescape_character`]: VersionProfile::unescape_character
    #[must_use]
    pub fn split_structured(&self, value: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut chars = value.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.peek().copied() {
                    Some(next) => {
                        if let Some(unescaped) = self.unescape_character(next) {
                            current.push(unescaped);
                            chars.next();
                        } else {
                            current.push('\\');
                        }
                    }
                    None => current.push('\\'),
                }
            } else if ch == ';' {
                fields.push(std::mem::take(&mut current));
            } else {
                current.push(ch);
            }
        }
        fields.push(current);
        fields
    }
}

impl Default for VersionProfile {
    fn default() -> Self {
        Self::v21()
    }
}
