//! Parameter classification and per-property encoding state.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::parser::dissect::RawProperty;
use crate::profile::VersionProfile;

/// The transfer encoding of one property's value.
///
/// Every property starts at the 8BIT default; an ENCODING parameter replaces
/// it for that property only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Encoding {
    SevenBit,
    #[default]
    EightBit,
    QuotedPrintable,
    Base64,
    /// An accepted `X-` extension encoding, treated as plain text.
    Extension(String),
}

impl Encoding {
    /// Maps a validated ENCODING parameter value.
    fn from_param(value: &str) -> Self {
        match value {
            "7BIT" => Self::SevenBit,
            "8BIT" => Self::EightBit,
            "QUOTED-PRINTABLE" => Self::QuotedPrintable,
            "BASE64" | "B" => Self::Base64,
            other => Self::Extension(other.to_string()),
        }
    }

    pub(crate) fn is_quoted_printable(&self) -> bool {
        matches!(self, Self::QuotedPrintable)
    }
}

/// Classifies the parameter tokens of one line and updates the property's
/// encoding as a side effect.
///
/// The unknown-TYPE and unknown-VALUE sets live on the parser and span the
/// whole parse, so each distinct offender is warned about once.
pub(crate) struct ParameterHandler<'a> {
    profile: &'a VersionProfile,
    unknown_types: &'a mut HashSet<String>,
    unknown_values: &'a mut HashSet<String>,
}

impl<'a> ParameterHandler<'a> {
    pub(crate) fn new(
        profile: &'a VersionProfile,
        unknown_types: &'a mut HashSet<String>,
        unknown_values: &'a mut HashSet<String>,
    ) -> Self {
        Self {
            profile,
            unknown_types,
            unknown_values,
        }
    }

    pub(crate) fn profile(&self) -> &VersionProfile {
        self.profile
    }

    /// Handles one semicolon-delimited parameter token.
    ///
    /// A token without `=` is the 2.1 shorthand for an unnamed TYPE value.
    pub(crate) fn handle(&mut self, property: &mut RawProperty, token: &str) -> Result<()> {
        let Some((name, value)) = token.split_once('=') else {
            self.handle_type(property, token);
            return Ok(());
        };

        let name = name.trim().to_ascii_uppercase();
        let value = value.trim();
        match name.as_str() {
            "TYPE" => self.handle_type(property, value),
            "VALUE" => self.handle_value(property, value),
            "ENCODING" => self.handle_encoding(property, value)?,
            "CHARSET" => {
                // Real-world charsets are diverse; accept anything.
                property.push_param("CHARSET", value);
            }
            "LANGUAGE" => Self::handle_language(property, value)?,
            _ if name.starts_with("X-") => property.push_param(&name, value),
            _ => return Err(Error::UnknownParam(name)),
        }
        Ok(())
    }

    fn handle_type(&mut self, property: &mut RawProperty, value: &str) {
        if !(self.profile.is_known_type(value) || value.starts_with("X-"))
            && !self.unknown_types.contains(value)
        {
            self.unknown_types.insert(value.to_string());
            tracing::warn!(value, "TYPE unsupported by vCard 2.1");
        }
        property.push_param("TYPE", value);
    }

    fn handle_value(&mut self, property: &mut RawProperty, value: &str) {
        if !(self.profile.is_known_value(value)
            || value.starts_with("X-")
            || self.unknown_values.contains(value))
        {
            self.unknown_values.insert(value.to_string());
            tracing::warn!(value, "VALUE unsupported by vCard 2.1");
        }
        property.push_param("VALUE", value);
    }

    fn handle_encoding(&mut self, property: &mut RawProperty, value: &str) -> Result<()> {
        if self.profile.is_known_encoding(value) || value.starts_with("X-") {
            property.push_param("ENCODING", value);
            property.encoding = Encoding::from_param(value);
            Ok(())
        } else {
            Err(Error::UnknownEncoding(value.to_string()))
        }
    }

    /// See section 7.1 of RFC 1521: a language tag is two runs of ASCII
    /// letters joined by a hyphen.
    fn handle_language(property: &mut RawProperty, value: &str) -> Result<()> {
        let valid = match value.split_once('-') {
            Some((primary, sub)) => {
                !primary.is_empty()
                    && !sub.is_empty()
                    && primary.chars().all(|ch| ch.is_ascii_alphabetic())
                    && sub.chars().all(|ch| ch.is_ascii_alphabetic())
            }
            None => false,
        };
        if !valid {
            return Err(Error::InvalidLanguage(value.to_string()));
        }
        property.push_param("LANGUAGE", value);
        Ok(())
    }
}
