//! Event consumers driven by the parser.
//!
//! The parser pushes events in strict source order: `on_vcard_started`, then
//! per entry `on_entry_started` … `on_entry_ended` (nested entries fully
//! enclosed), then `on_vcard_ended`. Two consumer APIs coexist:
//!
//! - [`VCardConsumer`] is the coarse API: one [`on_property_created`] call per
//!   decoded property.
//! - [`VCardEventConsumer`] is the legacy fine-grained API: a property is
//!   delivered as `on_property_started`, its group/name/parameter metadata,
//!   its values, and `on_property_ended`.
//!
//! Both kinds can be registered on the same parser; events reach every
//! consumer in registration order.
//!
//! [`on_property_created`]: VCardConsumer::on_property_created

use crate::property::VCardProperty;

/// Consumer for decoded vCard entries and properties.
///
/// All methods have default no-op bodies, so implementors only override what
/// they care about.
pub trait VCardConsumer {
    /// Called once before any other event of a parse.
    fn on_vcard_started(&mut self) {}

    /// Called once after every other event of a successful parse. Always
    /// paired with [`on_vcard_started`](Self::on_vcard_started), including
    /// when the parse is cancelled.
    fn on_vcard_ended(&mut self) {}

    /// Called when a `BEGIN:VCARD` opens an entry, nested ones included.
    fn on_entry_started(&mut self) {}

    /// Called when the matching `END:VCARD` closes the entry.
    fn on_entry_ended(&mut self) {}

    /// Called once per successfully decoded property.
    fn on_property_created(&mut self, property: &VCardProperty) {
        let _ = property;
    }
}

/// Legacy fine-grained consumer, delivering each property as a sequence of
/// metadata events followed by its values.
///
/// For every `on_property_started` exactly one `on_property_ended` follows,
/// with all of that property's metadata and value events strictly in between.
pub trait VCardEventConsumer {
    /// Called once before any other event of a parse.
    fn on_vcard_started(&mut self) {}

    /// Called once after every other event of a successful parse.
    fn on_vcard_ended(&mut self) {}

    /// Called when a `BEGIN:VCARD` opens an entry, nested ones included.
    fn on_entry_started(&mut self) {}

    /// Called when the matching `END:VCARD` closes the entry.
    fn on_entry_ended(&mut self) {}

    /// Opens a property.
    fn on_property_started(&mut self) {}

    /// One call per group prefix, in order of appearance.
    fn on_property_group(&mut self, group: &str) {
        let _ = group;
    }

    /// The property name, in original case. Fires exactly once per property,
    /// before the value event.
    fn on_property_name(&mut self, name: &str) {
        let _ = name;
    }

    /// A parameter name (upper-cased). Always directly followed by the
    /// matching [`on_property_param_value`](Self::on_property_param_value).
    fn on_property_param_type(&mut self, name: &str) {
        let _ = name;
    }

    /// A parameter value, paired with the preceding param-type event.
    fn on_property_param_value(&mut self, value: &str) {
        let _ = value;
    }

    /// The decoded value fields. `None` when the value was dropped during a
    /// failed BASE64 accumulation.
    fn on_property_values(&mut self, values: Option<&[String]>) {
        let _ = values;
    }

    /// Closes the property opened by the last
    /// [`on_property_started`](Self::on_property_started).
    fn on_property_ended(&mut self) {}
}

impl<C: VCardConsumer + ?Sized> VCardConsumer for &mut C {
    fn on_vcard_started(&mut self) {
        (**self).on_vcard_started();
    }

    fn on_vcard_ended(&mut self) {
        (**self).on_vcard_ended();
    }

    fn on_entry_started(&mut self) {
        (**self).on_entry_started();
    }

    fn on_entry_ended(&mut self) {
        (**self).on_entry_ended();
    }

    fn on_property_created(&mut self, property: &VCardProperty) {
        (**self).on_property_created(property);
    }
}

impl<C: VCardEventConsumer + ?Sized> VCardEventConsumer for &mut C {
    fn on_vcard_started(&mut self) {
        (**self).on_vcard_started();
    }

    fn on_vcard_ended(&mut self) {
        (**self).on_vcard_ended();
    }

    fn on_entry_started(&mut self) {
        (**self).on_entry_started();
    }

    fn on_entry_ended(&mut self) {
        (**self).on_entry_ended();
    }

    fn on_property_started(&mut self) {
        (**self).on_property_started();
    }

    fn on_property_group(&mut self, group: &str) {
        (**self).on_property_group(group);
    }

    fn on_property_name(&mut self, name: &str) {
        (**self).on_property_name(name);
    }

    fn on_property_param_type(&mut self, name: &str) {
        (**self).on_property_param_type(name);
    }

    fn on_property_param_value(&mut self, value: &str) {
        (**self).on_property_param_value(value);
    }

    fn on_property_values(&mut self, values: Option<&[String]>) {
        (**self).on_property_values(values);
    }

    fn on_property_ended(&mut self) {
        (**self).on_property_ended();
    }
}

/// A no-op consumer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConsumer;

impl VCardConsumer for NoopConsumer {}

impl VCardEventConsumer for NoopConsumer {}

/// A consumer that logs events using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingConsumer;

impl VCardConsumer for LoggingConsumer {
    fn on_vcard_started(&mut self) {
        tracing::debug!("vCard stream started");
    }

    fn on_vcard_ended(&mut self) {
        tracing::debug!("vCard stream ended");
    }

    fn on_entry_started(&mut self) {
        tracing::debug!("entry started");
    }

    fn on_entry_ended(&mut self) {
        tracing::debug!("entry ended");
    }

    fn on_property_created(&mut self, property: &VCardProperty) {
        tracing::debug!(
            name = property.name(),
            values = property.values().len(),
            bytes = property.bytes().map(<[u8]>::len),
            "property"
        );
    }
}

/// An event recorded by [`CollectingConsumer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VCardEvent {
    /// `on_vcard_started`.
    Started,
    /// `on_vcard_ended`.
    Ended,
    /// `on_entry_started`.
    EntryStarted,
    /// `on_entry_ended`.
    EntryEnded,
    /// `on_property_created`, with the delivered property.
    PropertyCreated(VCardProperty),
}

/// A consumer that collects events for later inspection.
///
/// Useful for testing event order or for batch processing of parse results.
#[derive(Debug, Default, Clone)]
pub struct CollectingConsumer {
    /// Collected events, in delivery order.
    pub events: Vec<VCardEvent>,
}

impl CollectingConsumer {
    /// Creates a new collecting consumer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all collected events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Takes all collected events, leaving the consumer empty.
    pub fn take(&mut self) -> Vec<VCardEvent> {
        std::mem::take(&mut self.events)
    }

    /// The properties delivered so far, in order.
    #[must_use]
    pub fn properties(&self) -> Vec<&VCardProperty> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VCardEvent::PropertyCreated(property) => Some(property),
                _ => None,
            })
            .collect()
    }
}

impl VCardConsumer for CollectingConsumer {
    fn on_vcard_started(&mut self) {
        self.events.push(VCardEvent::Started);
    }

    fn on_vcard_ended(&mut self) {
        self.events.push(VCardEvent::Ended);
    }

    fn on_entry_started(&mut self) {
        self.events.push(VCardEvent::EntryStarted);
    }

    fn on_entry_ended(&mut self) {
        self.events.push(VCardEvent::EntryEnded);
    }

    fn on_property_created(&mut self, property: &VCardProperty) {
        self.events.push(VCardEvent::PropertyCreated(property.clone()));
    }
}
