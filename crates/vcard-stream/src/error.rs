//! Error types for vCard parsing.
//!
//! Failures are reported by abrupt termination of [`parse`] with one of the
//! variants below; there is no partial-success return. Only
//! [`Error::InvalidComment`] is recovered by the parser itself (the offending
//! line is logged and skipped).
//!
//! [`parse`]: crate::VCardParser::parse

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing a vCard stream.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a card or a continued value.
    #[error("Unexpected end of stream: {0}")]
    UnexpectedEof(String),

    /// Expected `BEGIN:VCARD` was not found on non-empty input.
    #[error("Expected \"BEGIN:VCARD\" did not come (instead, {0:?} came)")]
    MissingBegin(String),

    /// `BEGIN:` or `END:` carried a value other than `VCARD`.
    #[error("Unknown {name} type: {value:?}")]
    UnknownBeginOrEnd {
        /// `BEGIN` or `END`, as it appeared on the line.
        name: String,
        /// The offending value after the colon.
        value: String,
    },

    /// ENCODING parameter value outside the accepted set.
    #[error("Unknown encoding: {0:?}")]
    UnknownEncoding(String),

    /// LANGUAGE parameter not of the form `xx-yy` with ASCII-letter sides.
    #[error("Invalid language: {0:?}")]
    InvalidLanguage(String),

    /// Parameter name not recognised and not an `X-` extension.
    #[error("Unknown parameter: {0:?}")]
    UnknownParam(String),

    /// Property name not recognised and not an `X-` extension.
    #[error("Unknown property name: {0:?}")]
    UnknownProperty(String),

    /// VERSION value does not match the parser's profile.
    #[error("Incompatible version: {found} != {expected}")]
    IncompatibleVersion {
        /// The version string found in the stream.
        found: String,
        /// The version string the active profile expects.
        expected: String,
    },

    /// AGENT property embedding a nested vCard.
    #[error("AGENT property with an embedded vCard is not supported")]
    AgentNotSupported,

    /// The line ended without the colon separating name and value.
    #[error("Invalid line: {0:?}")]
    InvalidLine(String),

    /// The line began with `#`. Recovered by the driver: logged and skipped.
    #[error("Invalid comment line")]
    InvalidComment,
}

impl Error {
    /// Returns true if the driver recovers from this error locally instead of
    /// aborting the parse.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidComment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(Error::InvalidComment.is_recoverable());
        assert!(!Error::AgentNotSupported.is_recoverable());
        assert!(!Error::InvalidLine(String::new()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::IncompatibleVersion {
            found: "3.0".to_string(),
            expected: "2.1".to_string(),
        };
        assert_eq!(err.to_string(), "Incompatible version: 3.0 != 2.1");

        let err = Error::UnknownBeginOrEnd {
            name: "BEGIN".to_string(),
            value: "VCALENDAR".to_string(),
        };
        assert!(err.to_string().contains("VCALENDAR"));
    }
}
