//! A consumer that materialises parse results into node trees.
//!
//! [`NodeBuilder`] listens on the fine-grained event API and builds one
//! [`CardNode`] per entry, with nested entries attached to their parent.
//! Unlike the raw events, node values are post-processed: Quoted-Printable
//! values are decoded to bytes, BASE64 values to their byte payload, and the
//! per-property CHARSET parameter is applied to turn intermediate text into
//! proper strings.

use crate::consumer::VCardEventConsumer;
use crate::encoding::{decode_base64, decode_quoted_printable};

/// One property of a [`CardNode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyNode {
    /// Property name, in original case.
    pub name: String,
    /// Group prefixes, in order.
    pub groups: Vec<String>,
    /// Parameters as (name, value) pairs, in order of appearance.
    pub params: Vec<(String, String)>,
    /// Decoded, charset-converted value fields.
    pub values: Vec<String>,
    /// The byte payload of a BASE64 property, when it decoded cleanly.
    pub bytes: Option<Vec<u8>>,
}

impl PropertyNode {
    /// The first value of the parameter `name` (any case), if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param, _)| param.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One parsed entry: its properties plus any nested entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardNode {
    /// Properties in source order. Properties of the parent that follow a
    /// nested entry appear after it was attached.
    pub properties: Vec<PropertyNode>,
    /// Entries that were nested inside this one.
    pub nested: Vec<CardNode>,
}

impl CardNode {
    /// The first property named `name` (any case), if present.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyNode> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }
}

/// Builds [`CardNode`] trees from fine-grained parser events.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    cards: Vec<CardNode>,
    stack: Vec<CardNode>,
    current: Option<PropertyNode>,
    pending_param: Option<String>,
}

impl NodeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The completed top-level cards, in source order.
    #[must_use]
    pub fn cards(&self) -> &[CardNode] {
        &self.cards
    }

    /// Takes the completed cards, leaving the builder empty.
    pub fn take(&mut self) -> Vec<CardNode> {
        std::mem::take(&mut self.cards)
    }

    fn convert_value(property: &PropertyNode, value: &str) -> (String, Option<Vec<u8>>) {
        let encoding = property.param("ENCODING").map(str::to_ascii_uppercase);
        match encoding.as_deref() {
            Some("BASE64" | "B") => (value.to_string(), decode_base64(value)),
            Some("QUOTED-PRINTABLE") => {
                let bytes = decode_quoted_printable(value);
                (recode(&bytes, property.param("CHARSET")), None)
            }
            _ => (
                recode(&intermediate_bytes(value), property.param("CHARSET")),
                None,
            ),
        }
    }
}

impl VCardEventConsumer for NodeBuilder {
    fn on_entry_started(&mut self) {
        self.stack.push(CardNode::default());
    }

    fn on_entry_ended(&mut self) {
        let Some(card) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.nested.push(card),
            None => self.cards.push(card),
        }
    }

    fn on_property_started(&mut self) {
        self.current = Some(PropertyNode::default());
        self.pending_param = None;
    }

    fn on_property_ended(&mut self) {
        let Some(property) = self.current.take() else {
            return;
        };
        if let Some(card) = self.stack.last_mut() {
            card.properties.push(property);
        }
    }

    fn on_property_group(&mut self, group: &str) {
        if let Some(property) = self.current.as_mut() {
            property.groups.push(group.to_string());
        }
    }

    fn on_property_name(&mut self, name: &str) {
        if let Some(property) = self.current.as_mut() {
            property.name = name.to_string();
        }
    }

    fn on_property_param_type(&mut self, name: &str) {
        self.pending_param = Some(name.to_string());
    }

    fn on_property_param_value(&mut self, value: &str) {
        let name = self.pending_param.take().unwrap_or_else(|| "TYPE".to_string());
        if let Some(property) = self.current.as_mut() {
            property.params.push((name, value.to_string()));
        }
    }

    fn on_property_values(&mut self, values: Option<&[String]>) {
        let Some(property) = self.current.as_mut() else {
            return;
        };
        let Some(values) = values else {
            // A dropped value list keeps the property with one empty field.
            property.values.push(String::new());
            return;
        };
        for value in values {
            let (text, bytes) = Self::convert_value(property, value);
            property.values.push(text);
            if bytes.is_some() {
                property.bytes = bytes;
            }
        }
    }
}

/// Recovers the bytes a value string stands for in the 8-bit-transparent
/// intermediate representation.
fn intermediate_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

/// Interprets raw value bytes in the property's charset. UTF-8 and the
/// 8-bit-transparent default are handled; anything else falls back to the
/// intermediate text with a warning.
fn recode(bytes: &[u8], charset: Option<&str>) -> String {
    let normalized = charset.map(str::to_ascii_uppercase);
    match normalized.as_deref() {
        Some("UTF-8" | "UTF8") => String::from_utf8_lossy(bytes).into_owned(),
        None | Some("ISO-8859-1" | "LATIN1" | "US-ASCII" | "ASCII") => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        Some(other) => {
            tracing::warn!(charset = other, "unsupported charset; keeping intermediate text");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}
