//! The streaming parser driver.
//!
//! The driver pulls lines from the [`source`], dissects each into a raw
//! property, decodes its value (which may itself pull continuation lines) and
//! pushes events to the registered consumers. Nested `BEGIN:VCARD` blocks
//! recurse; nesting is limited only by available stack.

mod decode;
mod dissect;
mod params;
mod source;

use std::collections::HashSet;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::consumer::{VCardConsumer, VCardEventConsumer};
use crate::error::{Error, Result};
use crate::parser::decode::{decode_value, PropertyValue};
use crate::parser::dissect::{dissect_line, RawProperty};
use crate::parser::params::ParameterHandler;
use crate::parser::source::LineSource;
use crate::profile::VersionProfile;
use crate::property::VCardProperty;

/// A clonable handle requesting cooperative termination of a running parse.
///
/// Safe to use from another thread. The parser consults the flag between
/// top-level entries only; a parse is not interrupted mid-property. Once
/// set, the flag stays set.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests termination at the next entry boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum Registered<'c> {
    Card(Box<dyn VCardConsumer + 'c>),
    Event(Box<dyn VCardEventConsumer + 'c>),
}

/// Streaming vCard parser.
///
/// Register any number of consumers, then feed a byte stream to
/// [`parse`](Self::parse). Events reach every consumer in registration
/// order. The parser owns the stream for the duration of the call and makes
/// forward progress only on the calling thread.
pub struct VCardParser<'c> {
    profile: VersionProfile,
    consumers: Vec<Registered<'c>>,
    lenient: bool,
    cancelled: Arc<AtomicBool>,
    unknown_names: HashSet<String>,
    unknown_values: HashSet<String>,
}

impl Default for VCardParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> VCardParser<'c> {
    /// Creates a parser with the vCard 2.1 profile.
    #[must_use]
    pub fn new() -> Self {
        Self::with_profile(VersionProfile::v21())
    }

    /// Creates a parser with the given version profile.
    #[must_use]
    pub fn with_profile(profile: VersionProfile) -> Self {
        Self {
            profile,
            consumers: Vec::new(),
            lenient: false,
            cancelled: Arc::new(AtomicBool::new(false)),
            unknown_names: HashSet::new(),
            unknown_values: HashSet::new(),
        }
    }

    /// In lenient mode, garbage lines before a `BEGIN:VCARD` are skipped and
    /// input without any card ends cleanly, instead of failing with
    /// [`Error::MissingBegin`].
    #[must_use]
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Registers a coarse consumer. Multiple consumers are permitted.
    pub fn add_consumer(&mut self, consumer: impl VCardConsumer + 'c) {
        self.consumers.push(Registered::Card(Box::new(consumer)));
    }

    /// Registers a legacy fine-grained consumer.
    pub fn add_event_consumer(&mut self, consumer: impl VCardEventConsumer + 'c) {
        self.consumers.push(Registered::Event(Box::new(consumer)));
    }

    /// Returns a handle for cancelling from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    /// Requests cooperative termination; see [`CancelHandle::cancel`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Parses the stream to completion, pushing events to the registered
    /// consumers.
    ///
    /// # Errors
    ///
    /// Fails with the first unrecovered [`Error`]; consumers will have seen
    /// every event emitted up to that point, but no end events are
    /// synthesised for an aborted parse.
    pub fn parse<R: Read>(&mut self, input: R) -> Result<()> {
        let mut source = LineSource::new(input);
        self.unknown_names.clear();
        self.unknown_values.clear();

        self.emit_vcard_started();
        self.parse_cards(&mut source)?;
        self.emit_vcard_ended();
        Ok(())
    }

    fn parse_cards<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<()> {
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                tracing::info!("cancel request received; exiting parse");
                return Ok(());
            }
            if !self.parse_one_card(source)? {
                return Ok(());
            }
        }
    }

    /// Parses one `BEGIN:VCARD` … `END:VCARD` block. Returns false at a
    /// clean end of stream.
    fn parse_one_card<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<bool> {
        if !self.read_begin_vcard(source)? {
            return Ok(false);
        }
        self.emit_entry_started();
        self.parse_items(source)?;
        self.emit_entry_ended();
        Ok(true)
    }

    /// Scans for the opening `BEGIN:VCARD`. Returns false at end of stream.
    fn read_begin_vcard<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<bool> {
        loop {
            let Some(line) = source.read_non_blank_line()? else {
                return Ok(false);
            };
            if is_begin_vcard(&line) {
                return Ok(true);
            }
            if !self.lenient {
                return Err(Error::MissingBegin(line));
            }
            tracing::debug!(line = line.trim(), "skipping garbage before BEGIN:VCARD");
        }
    }

    /// Parses items until the closing `END:VCARD`. Comment lines are logged
    /// and skipped; every other dissection error propagates.
    fn parse_items<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<()> {
        loop {
            match self.parse_item(source) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(Error::InvalidComment) => {
                    tracing::warn!("invalid line which looks like a comment; ignored");
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Parses one item. Returns true when the item was this entry's
    /// `END:VCARD`.
    fn parse_item<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<bool> {
        let Some(line) = source.read_non_blank_line()? else {
            return Err(Error::UnexpectedEof("reached end of buffer".to_string()));
        };

        let raw = {
            let mut params = ParameterHandler::new(
                &self.profile,
                &mut self.unknown_names,
                &mut self.unknown_values,
            );
            dissect_line(&line, &mut params)?
        };

        let name_upper = raw.name.to_ascii_uppercase();
        match name_upper.as_str() {
            "BEGIN" => {
                if raw.raw_value.eq_ignore_ascii_case("VCARD") {
                    self.parse_nested(source)?;
                } else {
                    return Err(Error::UnknownBeginOrEnd {
                        name: raw.name,
                        value: raw.raw_value,
                    });
                }
            }
            "END" => {
                if raw.raw_value.eq_ignore_ascii_case("VCARD") {
                    return Ok(true);
                }
                return Err(Error::UnknownBeginOrEnd {
                    name: raw.name,
                    value: raw.raw_value,
                });
            }
            _ => self.parse_property(source, &raw, &name_upper)?,
        }
        Ok(false)
    }

    fn parse_nested<R: Read>(&mut self, source: &mut LineSource<R>) -> Result<()> {
        self.emit_entry_started();
        self.parse_items(source)?;
        self.emit_entry_ended();
        Ok(())
    }

    fn parse_property<R: Read>(
        &mut self,
        source: &mut LineSource<R>,
        raw: &RawProperty,
        name_upper: &str,
    ) -> Result<()> {
        self.emit_property_started(raw);
        let value = decode_value(
            raw,
            name_upper,
            &self.profile,
            source,
            &mut self.unknown_names,
        )?;
        self.emit_property_value(raw, value);
        self.emit_property_ended();
        Ok(())
    }

    fn emit_vcard_started(&mut self) {
        for consumer in &mut self.consumers {
            match consumer {
                Registered::Card(c) => c.on_vcard_started(),
                Registered::Event(c) => c.on_vcard_started(),
            }
        }
    }

    fn emit_vcard_ended(&mut self) {
        for consumer in &mut self.consumers {
            match consumer {
                Registered::Card(c) => c.on_vcard_ended(),
                Registered::Event(c) => c.on_vcard_ended(),
            }
        }
    }

    fn emit_entry_started(&mut self) {
        for consumer in &mut self.consumers {
            match consumer {
                Registered::Card(c) => c.on_entry_started(),
                Registered::Event(c) => c.on_entry_started(),
            }
        }
    }

    fn emit_entry_ended(&mut self) {
        for consumer in &mut self.consumers {
            match consumer {
                Registered::Card(c) => c.on_entry_ended(),
                Registered::Event(c) => c.on_entry_ended(),
            }
        }
    }

    /// Opens the property on fine-grained consumers and delivers its
    /// group/name/parameter metadata, strictly before any value event.
    fn emit_property_started(&mut self, raw: &RawProperty) {
        for consumer in &mut self.consumers {
            let Registered::Event(c) = consumer else {
                continue;
            };
            c.on_property_started();
            for group in &raw.groups {
                c.on_property_group(group);
            }
            c.on_property_name(&raw.name);
            for (name, value) in &raw.parameters {
                c.on_property_param_type(name);
                c.on_property_param_value(value);
            }
        }
    }

    /// Delivers the decoded value: the values event on fine-grained
    /// consumers and the assembled property on coarse ones.
    fn emit_property_value(&mut self, raw: &RawProperty, value: Option<PropertyValue>) {
        let mut property = VCardProperty::new(
            raw.name.clone(),
            raw.groups.clone(),
            raw.parameters.clone(),
        );
        let mut dropped = false;
        let mut silent = false;
        match value {
            Some(PropertyValue::Text(text)) => property.set_values(vec![text]),
            Some(PropertyValue::List(fields)) => property.set_values(fields),
            Some(PropertyValue::Binary { text, bytes }) => {
                property.set_values(vec![text]);
                property.set_bytes(bytes);
            }
            Some(PropertyValue::Dropped) => dropped = true,
            None => silent = true,
        }

        for consumer in &mut self.consumers {
            match consumer {
                Registered::Card(c) => c.on_property_created(&property),
                Registered::Event(c) => {
                    if dropped {
                        c.on_property_values(None);
                    } else if !silent {
                        c.on_property_values(Some(property.values()));
                    }
                }
            }
        }
    }

    fn emit_property_ended(&mut self) {
        for consumer in &mut self.consumers {
            if let Registered::Event(c) = consumer {
                c.on_property_ended();
            }
        }
    }
}

/// Matches `BEGIN:VCARD` at card start, tolerating mixed case and whitespace
/// around the colon.
fn is_begin_vcard(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, value)) => {
            name.trim().eq_ignore_ascii_case("BEGIN") && value.trim().eq_ignore_ascii_case("VCARD")
        }
        None => false,
    }
}
