//! # vcard-stream
//!
//! Streaming, event-driven vCard 2.1 parser.
//!
//! ## Features
//!
//! - **Push-style events**: register consumers, feed a byte stream, receive
//!   card/entry/property events in strict source order
//! - **Real-world tolerance**: mixed-case BEGIN/END, double-quoted
//!   parameters, unnamed TYPE shorthand, folded lines, missing BASE64
//!   terminators and other producer quirks are accepted
//! - **Continuation-aware decoding**: Quoted-Printable soft breaks, BASE64
//!   blocks and RFC 2425 folding are resolved while reading
//! - **Nested entries**: embedded BEGIN:VCARD blocks recurse, with entry
//!   events balanced like parentheses
//!
//! ## Quick Start
//!
//! ```
//! use vcard_stream::{CollectingConsumer, VCardEvent, VCardParser};
//!
//! let input: &[u8] = b"BEGIN:VCARD\r\nVERSION:2.1\r\nN:Doe;John;;;\r\nEND:VCARD\r\n";
//!
//! let mut collector = CollectingConsumer::new();
//! {
//!     let mut parser = VCardParser::new();
//!     parser.add_consumer(&mut collector);
//!     parser.parse(input)?;
//! }
//!
//! assert_eq!(collector.events.len(), 6);
//! let properties = collector.properties();
//! assert_eq!(properties[1].name(), "N");
//! assert_eq!(properties[1].values(), ["Doe", "John", "", "", ""]);
//! # Ok::<(), vcard_stream::Error>(())
//! ```
//!
//! ## Building node trees
//!
//! ```
//! use vcard_stream::{NodeBuilder, VCardParser};
//!
//! let input: &[u8] = b"BEGIN:VCARD\r\nFN:John Doe\r\nEND:VCARD\r\n";
//!
//! let mut builder = NodeBuilder::new();
//! {
//!     let mut parser = VCardParser::new();
//!     parser.add_event_consumer(&mut builder);
//!     parser.parse(input)?;
//! }
//!
//! let cards = builder.take();
//! assert_eq!(cards[0].property("FN").unwrap().values, ["John Doe"]);
//! # Ok::<(), vcard_stream::Error>(())
//! ```
//!
//! ## Cancellation
//!
//! ```ignore
//! let mut parser = VCardParser::new();
//! let handle = parser.cancel_handle();
//! // From another thread:
//! handle.cancel();
//! // The parse returns cleanly at the next entry boundary.
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod node;
mod parser;
mod profile;
mod property;

pub mod consumer;
pub mod encoding;

pub use consumer::{
    CollectingConsumer, LoggingConsumer, NoopConsumer, VCardConsumer, VCardEvent,
    VCardEventConsumer,
};
pub use error::{Error, Result};
pub use node::{CardNode, NodeBuilder, PropertyNode};
pub use parser::{CancelHandle, VCardParser};
pub use profile::VersionProfile;
pub use property::VCardProperty;
