//! Telegram message entities, to and from Markdown and HTML
//!
//! Telegram represents styled text as plain text plus a list of entities,
//! each a typed span addressed by offset and length in UTF-16 code units.
//! This library converts that model to and from the Markdown and HTML
//! dialects Telegram clients and bots speak.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `entity`: the [`Message`] / [`Entity`] model and its façade methods
//! - `utf16`: UTF-16 code-unit addressing for UTF-8 strings
//! - `markdown_parser`: Markdown to entities
//! - `markdown_writer`: entities to Markdown
//! - `html_parser`: HTML to entities, using html5ever
//! - `html_writer`: entities to HTML, in portable, Telegram and Bot API flavors
//! - `tdlib`: TDLib `formattedText` JSON to entities
//! - `escape`: escaping helpers shared by the writers
//! - `error`: error types
//!
//! # Examples
//!
//! ```rust
//! use telegram_entities::Message;
//!
//! let message = Message::from_markdown("*bold* and [link](https://t.me)").unwrap();
//! assert_eq!(message.text, "bold and link");
//! assert_eq!(
//!     message.to_html(false),
//!     r#"<b>bold</b> and <a href="https://t.me">link</a>"#
//! );
//!
//! let parsed = Message::from_html(&message.to_html(true)).unwrap();
//! assert_eq!(parsed, message);
//! ```
//!
//! # Logging
//!
//! Parse failures are reported through the `log` facade at `debug` level and
//! per-call summaries at `trace` level. No logger is installed here.

pub mod entity;
pub mod error;
pub mod escape;
pub mod html_parser;
pub mod html_writer;
pub mod markdown_parser;
pub mod markdown_writer;
pub mod tdlib;
pub mod utf16;

// Re-export main types for convenience
pub use entity::{Entity, EntityKind, Message};
pub use error::{ParseError, ValidationError};
pub use html_parser::{HtmlParser, parse_html};
pub use html_writer::{HtmlFlavor, render_html, to_bot_html};
pub use markdown_parser::parse_markdown;
pub use markdown_writer::to_markdown;
pub use tdlib::{FormattedText, parse_formatted_text};
