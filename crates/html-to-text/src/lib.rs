//! Convert HTML into equivalent Markdown-structured plain text.
//!
//! The converter is a single-pass streaming transducer: the html5ever
//! tokenizer emits tag, data, and entity events in document order, and an
//! emission state machine decides, per event, what text to write. No DOM is
//! built and the machine never looks past the event in hand.
//!
//! Headings become `#` runs, emphasis becomes `_`/`**` markers, lists get
//! indented bullets or numbers, blockquotes get `>` prefixes, preformatted
//! blocks keep their whitespace, and hyperlink/image targets are deferred
//! to a trailing footnote-style reference list.
//!
//! ```
//! use html_to_text::{convert, ConversionOptions};
//!
//! let text = convert(
//!     "<p>Hello <b>World</b></p>",
//!     &ConversionOptions::default(),
//! ).unwrap();
//! assert_eq!(text, "Hello **World**\n");
//! ```
//!
//! Typographic entities are approximated in ASCII by default (`&mdash;`
//! becomes `--`); set [`ConversionOptions::unicode`] to keep the literal
//! characters.

pub mod entities;

mod converter;
mod error;
mod options;
mod sink;

pub use converter::{convert, convert_to_writer};
pub use converter::emitter::{TagAttrs, TextEmitter};
pub use error::{ConversionError, Result};
pub use options::ConversionOptions;
pub use sink::{TextSink, WriteSink};
