//! Decoded property data delivered to consumers.

/// One decoded vCard property, as delivered to
/// [`VCardConsumer::on_property_created`].
///
/// A property carries its name in original case, its group prefixes, its
/// parameters in order of appearance (names upper-cased, duplicates allowed)
/// and its decoded value: a single string for plain and Quoted-Printable
/// values, a field list for structured properties (ADR/ORG/N), plus the
/// decoded byte buffer for BASE64 values.
///
/// [`VCardConsumer::on_property_created`]: crate::VCardConsumer::on_property_created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCardProperty {
    name: String,
    groups: Vec<String>,
    parameters: Vec<(String, String)>,
    values: Vec<String>,
    bytes: Option<Vec<u8>>,
}

impl VCardProperty {
    pub(crate) fn new(
        name: String,
        groups: Vec<String>,
        parameters: Vec<(String, String)>,
    ) -> Self {
        Self {
            name,
            groups,
            parameters,
            values: Vec::new(),
            bytes: None,
        }
    }

    pub(crate) fn set_values(&mut self, values: Vec<String>) {
        self.values = values;
    }

    pub(crate) fn set_bytes(&mut self, bytes: Option<Vec<u8>>) {
        self.bytes = bytes;
    }

    /// The property name, in the case it appeared in the stream.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group prefixes, in order. Empty for ungrouped properties.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// The parameters as (name, value) pairs, in order of appearance.
    /// Names are upper-cased; duplicates are preserved.
    #[must_use]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// The first value of the parameter `name` (any case), if present.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(param, _)| param.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All values of the parameter `name` (any case), in order.
    #[must_use]
    pub fn parameter_values(&self, name: &str) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(param, _)| param.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// The decoded value fields. One element for ordinary properties, the
    /// semicolon-split fields for structured ones, empty when the value was
    /// dropped (AGENT, or a failed BASE64 accumulation).
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The first value field, or the empty string.
    #[must_use]
    pub fn value(&self) -> &str {
        self.values.first().map_or("", String::as_str)
    }

    /// The decoded BASE64 payload, when this property carried one and it
    /// decoded cleanly.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new)]
mod tests {
    use super::*;

    fn sample() -> VCardProperty {
        let mut property = VCardProperty::new(
            "EMAIL".to_string(),
            vec!["item1".to_string()],
            vec![
                ("TYPE".to_string(), "HOME".to_string()),
                ("TYPE".to_string(), "PREF".to_string()),
                ("CHARSET".to_string(), "UTF-8".to_string()),
            ],
        );
        property.set_values(vec!["jdoe@example.com".to_string()]);
        property
    }

    #[test]
    fn test_accessors() {
        let property = sample();
        assert_eq!(property.name(), "EMAIL");
        assert_eq!(property.groups(), ["item1".to_string()]);
        assert_eq!(property.value(), "jdoe@example.com");
        assert_eq!(property.values().len(), 1);
        assert!(property.bytes().is_none());
    }

    #[test]
    fn test_parameter_lookup() {
        let property = sample();
        assert_eq!(property.parameter("charset"), Some("UTF-8"));
        assert_eq!(property.parameter("TYPE"), Some("HOME"));
        assert_eq!(property.parameter_values("type"), ["HOME", "PREF"]);
        assert_eq!(property.parameter("ENCODING"), None);
    }

    #[test]
    fn test_empty_value() {
        let property = VCardProperty::new("AGENT".to_string(), Vec::new(), Vec::new());
        assert_eq!(property.value(), "");
        assert!(property.values().is_empty());
    }
}
