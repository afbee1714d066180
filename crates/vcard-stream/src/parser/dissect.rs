//! Splitting one logical line into groups, name, parameters and raw value.

use crate::error::{Error, Result};
use crate::parser::params::{Encoding, ParameterHandler};

/// The pieces of one property line, before value decoding.
#[derive(Debug, Default)]
pub(crate) struct RawProperty {
    pub(crate) groups: Vec<String>,
    /// Property name in original case.
    pub(crate) name: String,
    /// (name, value) pairs in order of appearance, names upper-cased,
    /// duplicates allowed.
    pub(crate) parameters: Vec<(String, String)>,
    /// Verbatim text after the first unquoted colon.
    pub(crate) raw_value: String,
    /// Transfer encoding for this property's value, 8BIT unless an ENCODING
    /// parameter said otherwise.
    pub(crate) encoding: Encoding,
}

impl RawProperty {
    pub(crate) fn push_param(&mut self, name: &str, value: &str) {
        self.parameters.push((name.to_string(), value.to_string()));
    }
}

#[derive(Clone, Copy)]
enum State {
    // Group and property-name runs share a state; a '.' closes a group, a
    // ':' or ';' closes the name.
    GroupOrName,
    Params,
    ParamsInDquote,
}

/// Dissects one logical line into a [`RawProperty`].
///
/// Fails with [`Error::InvalidComment`] when the line starts with `#`, and
/// with [`Error::InvalidLine`] when it ends without the value colon. The
/// first `:` outside double quotes terminates parameters regardless of any
/// preceding `;`.
pub(crate) fn dissect_line(line: &str, params: &mut ParameterHandler<'_>) -> Result<RawProperty> {
    if line.starts_with('#') {
        return Err(Error::InvalidComment);
    }

    let mut property = RawProperty::default();
    let mut state = State::GroupOrName;
    let mut token_start = 0;

    for (i, ch) in line.char_indices() {
        match state {
            State::GroupOrName => match ch {
                ':' => {
                    property.name = line[token_start..i].to_string();
                    property.raw_value = line[i + 1..].to_string();
                    return Ok(property);
                }
                '.' => {
                    let group = &line[token_start..i];
                    if group.is_empty() {
                        tracing::warn!("empty group found; ignoring");
                    } else {
                        property.groups.push(group.to_string());
                    }
                    token_start = i + 1;
                }
                ';' => {
                    property.name = line[token_start..i].to_string();
                    token_start = i + 1;
                    state = State::Params;
                }
                _ => {}
            },
            State::Params => match ch {
                '"' => {
                    if !params.profile().allows_dquote_params() {
                        tracing::warn!(
                            "double-quoted parameter value in vCard 2.1; silently allowing it"
                        );
                    }
                    state = State::ParamsInDquote;
                }
                ';' => {
                    params.handle(&mut property, &line[token_start..i])?;
                    token_start = i + 1;
                }
                ':' => {
                    params.handle(&mut property, &line[token_start..i])?;
                    property.raw_value = line[i + 1..].to_string();
                    return Ok(property);
                }
                _ => {}
            },
            State::ParamsInDquote => {
                if ch == '"' {
                    state = State::Params;
                }
            }
        }
    }

    Err(Error::InvalidLine(line.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;
    use crate::profile::VersionProfile;
    use std::collections::HashSet;

    fn dissect(line: &str) -> Result<RawProperty> {
        let profile = VersionProfile::v21();
        let mut unknown_types = HashSet::new();
        let mut unknown_values = HashSet::new();
        let mut params = ParameterHandler::new(&profile, &mut unknown_types, &mut unknown_values);
        dissect_line(line, &mut params)
    }

    #[test]
    fn test_name_and_value() {
        let property = dissect("FN:John Doe").unwrap();
        assert_eq!(property.name, "FN");
        assert_eq!(property.raw_value, "John Doe");
        assert!(property.groups.is_empty());
        assert!(property.parameters.is_empty());
    }

    #[test]
    fn test_empty_value() {
        let property = dissect("NOTE:").unwrap();
        assert_eq!(property.name, "NOTE");
        assert_eq!(property.raw_value, "");
    }

    #[test]
    fn test_case_preserved() {
        let property = dissect("begin:vcard").unwrap();
        assert_eq!(property.name, "begin");
        assert_eq!(property.raw_value, "vcard");
    }

    #[test]
    fn test_groups() {
        let property = dissect("item1.item2.EMAIL:a@b.example").unwrap();
        assert_eq!(property.groups, ["item1", "item2"]);
        assert_eq!(property.name, "EMAIL");
    }

    #[test]
    fn test_empty_group_dropped() {
        let property = dissect(".EMAIL:a@b.example").unwrap();
        assert!(property.groups.is_empty());
        assert_eq!(property.name, "EMAIL");
    }

    #[test]
    fn test_single_parameter() {
        let property = dissect("TEL;TYPE=HOME:1234").unwrap();
        assert_eq!(property.name, "TEL");
        assert_eq!(
            property.parameters,
            vec![("TYPE".to_string(), "HOME".to_string())]
        );
        assert_eq!(property.raw_value, "1234");
    }

    #[test]
    fn test_multiple_parameters() {
        let property = dissect("TEL;TYPE=HOME;TYPE=VOICE;CHARSET=UTF-8:1234").unwrap();
        assert_eq!(
            property.parameters,
            vec![
                ("TYPE".to_string(), "HOME".to_string()),
                ("TYPE".to_string(), "VOICE".to_string()),
                ("CHARSET".to_string(), "UTF-8".to_string()),
            ]
        );
    }

    #[test]
    fn test_unnamed_type_shorthand() {
        let property = dissect("TEL;CELL:1234").unwrap();
        assert_eq!(
            property.parameters,
            vec![("TYPE".to_string(), "CELL".to_string())]
        );
    }

    #[test]
    fn test_dquoted_param_hides_separators() {
        let property = dissect("X-APP;X-NOTE=\"a;b:c\":value").unwrap();
        assert_eq!(
            property.parameters,
            vec![("X-NOTE".to_string(), "\"a;b:c\"".to_string())]
        );
        assert_eq!(property.raw_value, "value");
    }

    #[test]
    fn test_first_colon_wins_in_value() {
        let property = dissect("URL:http://example.com:8080/x").unwrap();
        assert_eq!(property.raw_value, "http://example.com:8080/x");
    }

    #[test]
    fn test_dquote_in_value_is_plain_text() {
        let property = dissect("EMAIL:\"Omega\"").unwrap();
        assert_eq!(property.raw_value, "\"Omega\"");
    }

    #[test]
    fn test_comment_line() {
        assert!(matches!(dissect("# a comment"), Err(Error::InvalidComment)));
    }

    #[test]
    fn test_line_without_colon() {
        assert!(matches!(dissect("NO-VALUE-HERE"), Err(Error::InvalidLine(_))));
        assert!(matches!(dissect("NAME;TYPE=HOME"), Err(Error::InvalidLine(_))));
    }

    #[test]
    fn test_encoding_captured() {
        let property = dissect("NOTE;ENCODING=QUOTED-PRINTABLE:abc=").unwrap();
        assert!(property.encoding.is_quoted_printable());
        assert_eq!(property.raw_value, "abc=");
    }
}
