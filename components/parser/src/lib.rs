//! Streaming XML tokenizer
//!
//! [`Reader`] splits a byte stream into [`Event`]s that borrow the raw bytes of each token
//! straight from its buffer. Events are classified, not validated: names, attributes and
//! references are only looked at when asked for with [`extract_name`], [`next_attribute`] or
//! [`unescape`].
//!
//! ```
//! use xsax::{EventKind, Reader};
//!
//! let mut reader = Reader::new(&b"<greeting lang=\"en\">Hi &amp; bye</greeting>"[..]);
//! let mut text = Vec::new();
//! loop {
//!     let event = reader.next_event()?;
//!     match event.kind() {
//!         EventKind::Text => text.extend_from_slice(xsax::unescape(event.into_bytes())?),
//!         EventKind::Eof => break,
//!         _ => {}
//!     }
//! }
//! assert_eq!(b"Hi & bye", &text[..]);
//! # Ok::<(), xsax::XmlError>(())
//! ```

mod arena;
pub mod error;
mod escape;
mod name;
mod reader;
pub mod swar;
pub mod token;

pub use error::XmlError;
pub use escape::{unescape, unescape_cow, MAX_REFERENCE_LEN};
pub use name::{extract_name, next_attribute, strip_self_closing, Attribute, Attributes, QName};
pub use reader::{Event, EventKind, Reader, ReaderConfig, DEFAULT_BUFFER_SIZE};
pub use token::Token;
