//! Telegram-style Markdown parser
//!
//! Turns Markdown source into a [`Message`]: plain text plus entities with
//! UTF-16 offsets.
//!
//! # Syntax
//!
//! | Source | Entity |
//! |---|---|
//! | `*bold*` | bold |
//! | `_italic_` | italic |
//! | `__underline__` | underline |
//! | `~strike~` | strikethrough |
//! | `\|\|spoiler\|\|` | spoiler |
//! | `` `code` `` | code |
//! | ```` ```lang\ncode``` ```` | pre, with optional language |
//! | `[text](url)` | text link, text mention or custom emoji |
//! | `![text](tg://emoji?id=1)` | custom emoji |
//! | `\x` | literal `x` |
//!
//! # Algorithm
//!
//! A single left-to-right scan. Runs of ordinary characters are copied to the
//! output while a UTF-16 length counter keeps pace. Style markers consult a
//! stack of open spans: a marker equal to the top of the stack closes that
//! span, any other marker opens a new one. Only the top of the stack can be
//! closed, so crossing markers end up unclosed and are reported.
//!
//! A closed span's length has the trailing spaces and line breaks of the
//! output removed, and spans that end up empty are dropped.
//!
//! # Examples
//!
//! ```rust
//! use telegram_entities::markdown_parser::parse_markdown;
//! use telegram_entities::{Entity, EntityKind};
//!
//! let message = parse_markdown("Hello *world*!").unwrap();
//! assert_eq!(message.text, "Hello world!");
//! assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 6, 5)]);
//!
//! assert!(parse_markdown("*unclosed").is_err());
//! ```

use log::{debug, trace};

use crate::entity::{Entity, EntityKind, Message};
use crate::error::ParseError;
use crate::utf16::utf16_len;

/// Characters that interrupt a literal run
const SPECIAL_CHARS: &[char] = &['*', '_', '~', '`', '[', ']', '|', '!', '\\'];

/// Markers that wrap text in a plain style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
}

impl Style {
    fn token(self) -> &'static str {
        match self {
            Style::Bold => "*",
            Style::Italic => "_",
            Style::Underline => "__",
            Style::Strikethrough => "~",
            Style::Spoiler => "||",
        }
    }

    fn kind(self) -> EntityKind {
        match self {
            Style::Bold => EntityKind::Bold,
            Style::Italic => EntityKind::Italic,
            Style::Underline => EntityKind::Underline,
            Style::Strikethrough => EntityKind::Strikethrough,
            Style::Spoiler => EntityKind::Spoiler,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Style(Style),
    /// `[`, or `![` when `image` is set
    Link { image: bool },
}

impl Marker {
    fn token(self) -> &'static str {
        match self {
            Marker::Style(style) => style.token(),
            Marker::Link { image: false } => "[",
            Marker::Link { image: true } => "![",
        }
    }
}

/// A span waiting for its closing marker
#[derive(Debug)]
struct OpenSpan {
    marker: Marker,
    /// Output length in UTF-16 units when the span opened
    start: usize,
    /// Output length in bytes when the span opened
    text_index: usize,
    /// Number of entities recorded before the span opened
    entity_count: usize,
}

struct MarkdownParser<'a> {
    source: &'a str,
    pos: usize,
    text: String,
    text_len: usize,
    entities: Vec<Entity>,
    stack: Vec<OpenSpan>,
}

/// Parse Telegram-style Markdown into a [`Message`]
///
/// Line endings are normalized to `\n` and the input is trimmed before
/// scanning; the resulting text is trimmed again. Entity offsets are not
/// adjusted for that final trim.
///
/// # Errors
///
/// - [`ParseError::UnclosedSpan`] when style or link markers remain open
/// - [`ParseError::UnclosedFence`] when a code span or block is not closed
/// - [`ParseError::UnclosedLink`] when a link target has no closing `)`
pub fn parse_markdown(markdown: &str) -> Result<Message, ParseError> {
    let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let source = normalized.trim_matches(is_strip_char);

    let message = MarkdownParser::new(source).run()?;
    trace!(
        "parsed markdown: {} units, {} entities",
        utf16_len(&message.text),
        message.entities.len()
    );
    Ok(message)
}

impl<'a> MarkdownParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            text: String::with_capacity(source.len()),
            text_len: 0,
            entities: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Message, ParseError> {
        let source = self.source;
        let bytes = source.as_bytes();

        loop {
            let rest = &source[self.pos..];
            let run = rest.find(SPECIAL_CHARS).unwrap_or(rest.len());
            let piece = &rest[..run];
            self.pos += run;

            if self.pos >= source.len() {
                self.push_text(piece);
                break;
            }

            let ch = bytes[self.pos];
            self.pos += 1;
            let next = bytes.get(self.pos).copied();

            let style = match ch {
                b'\\' => {
                    self.push_text(piece);
                    self.escape_next();
                    continue;
                }
                b'_' if next == Some(b'_') => {
                    self.pos += 1;
                    Style::Underline
                }
                b'_' => Style::Italic,
                b'*' => Style::Bold,
                b'~' => Style::Strikethrough,
                b'|' if next == Some(b'|') => {
                    self.pos += 1;
                    Style::Spoiler
                }
                b'!' if next == Some(b'[') => {
                    self.pos += 1;
                    self.open(piece, Marker::Link { image: true });
                    continue;
                }
                b'[' => {
                    self.open(piece, Marker::Link { image: false });
                    continue;
                }
                b']' => {
                    self.close_bracket(piece, next)?;
                    continue;
                }
                b'`' => {
                    self.push_text(piece);
                    self.code(next)?;
                    continue;
                }
                // a lone `|` or a `!` that does not start `![`
                _ => {
                    self.push_text(piece);
                    self.push_text(&source[self.pos - 1..self.pos]);
                    continue;
                }
            };

            let closes = matches!(
                self.stack.last(),
                Some(top) if top.marker == Marker::Style(style)
            );
            if !closes {
                self.open(piece, Marker::Style(style));
            } else if let Some(span) = self.stack.pop() {
                self.finish_span(piece, span.start, style.kind());
            }
        }

        if !self.stack.is_empty() {
            let markers = self
                .stack
                .iter()
                .map(|span| span.marker.token())
                .collect::<Vec<_>>()
                .join(", ");
            debug!("markdown has unclosed elements: {}", markers);
            return Err(ParseError::UnclosedSpan(markers));
        }

        Ok(Message::new(
            self.text.trim_matches(is_strip_char),
            self.entities,
        ))
    }

    fn push_text(&mut self, piece: &str) {
        self.text.push_str(piece);
        self.text_len += utf16_len(piece);
    }

    /// Copy the code point after a backslash verbatim
    fn escape_next(&mut self) {
        if let Some(ch) = self.source[self.pos..].chars().next() {
            self.text.push(ch);
            self.text_len += ch.len_utf16();
            self.pos += ch.len_utf8();
        }
    }

    fn open(&mut self, piece: &str, marker: Marker) {
        self.push_text(piece);
        self.stack.push(OpenSpan {
            marker,
            start: self.text_len,
            text_index: self.text.len(),
            entity_count: self.entities.len(),
        });
    }

    /// Append the last piece of a span and record its entity, minus trailing
    /// whitespace
    fn finish_span(&mut self, piece: &str, start: usize, kind: EntityKind) {
        self.push_text(piece);
        let length = (self.text_len - start).saturating_sub(trailing_whitespace(&self.text));
        if length > 0 {
            self.entities.push(Entity::new(kind, start, length));
        }
    }

    /// Handle `]`: close a link when it is on top of the stack and followed by
    /// `(`, otherwise emit literal text
    fn close_bracket(&mut self, piece: &str, next: Option<u8>) -> Result<(), ParseError> {
        let link_on_top = matches!(
            self.stack.last(),
            Some(top) if matches!(top.marker, Marker::Link { .. })
        );
        if !link_on_top {
            self.push_text(piece);
            self.push_text("]");
            return Ok(());
        }
        let Some(span) = self.stack.pop() else {
            return Ok(());
        };

        if next != Some(b'(') {
            // The brackets were literal after all: put the opener back where
            // it was and move everything recorded since then along with it.
            let opener = span.marker.token();
            let width = utf16_len(opener);
            self.text.insert_str(span.text_index, opener);
            self.text_len += width;
            for entity in &mut self.entities[span.entity_count..] {
                entity.offset += width;
            }
            self.push_text(piece);
            self.push_text("]");
            return Ok(());
        }

        self.pos += 1;
        let target = self.link_target()?;
        self.finish_span(piece, span.start, EntityKind::from_link_target(&target));
        Ok(())
    }

    /// Read a link target up to the first unescaped `)`
    fn link_target(&mut self) -> Result<String, ParseError> {
        let opened_at = self.pos;
        let Some((target, close)) = self.scan_until(")") else {
            debug!("unclosed link target at byte {}", opened_at);
            return Err(ParseError::UnclosedLink {
                position: opened_at,
            });
        };
        self.pos = close + 1;
        Ok(target)
    }

    /// Collect source from the current position up to `delimiter`, returning
    /// the unescaped content and the byte index of the delimiter.
    ///
    /// `\\` reads as one backslash and `\` + delimiter as the delimiter itself;
    /// any other backslash is kept.
    fn scan_until(&self, delimiter: &str) -> Option<(String, usize)> {
        let source = self.source;
        let lead = delimiter.chars().next()?;
        let mut content = String::new();
        let mut scan = self.pos;

        loop {
            let stop = source[scan..].find(['\\', lead])?;
            content.push_str(&source[scan..scan + stop]);
            scan += stop;

            let rest = &source[scan..];
            if rest.starts_with(delimiter) {
                return Some((content, scan));
            }
            if let Some(escaped) = rest.strip_prefix('\\') {
                if escaped.starts_with('\\') {
                    content.push('\\');
                    scan += 2;
                    continue;
                }
                if escaped.starts_with(delimiter) {
                    content.push_str(delimiter);
                    scan += 1 + delimiter.len();
                    continue;
                }
            }
            // a lone backslash, or a backtick short of a fence
            content.push_str(&rest[..1]);
            scan += 1;
        }
    }

    /// Handle a backtick: an inline code span, or a fenced block when three
    /// backticks appear in a row
    fn code(&mut self, next: Option<u8>) -> Result<(), ParseError> {
        let source = self.source;
        let bytes = source.as_bytes();

        let (token, language) = if next == Some(b'`') && bytes.get(self.pos + 1) == Some(&b'`') {
            self.pos += 2;
            let rest = &source[self.pos..];
            let lang_len = rest.find([' ', '\n']).unwrap_or(rest.len());
            let language = (lang_len > 0).then(|| rest[..lang_len].to_string());
            self.pos += lang_len;
            if bytes.get(self.pos) == Some(&b'\n') {
                self.pos += 1;
            }
            ("```", language)
        } else {
            ("`", None)
        };

        let opened_at = self.pos;
        let Some((content, close)) = self.scan_until(token) else {
            debug!("unclosed {} at byte {}", token, opened_at);
            return Err(ParseError::UnclosedFence {
                token,
                position: opened_at,
            });
        };
        self.pos = close + token.len();

        let start = self.text_len;
        self.push_text(&content);
        let length = utf16_len(&content).saturating_sub(trailing_whitespace(&content));
        if length > 0 {
            let kind = if token == "```" {
                EntityKind::Pre { language }
            } else {
                EntityKind::Code
            };
            self.entities.push(Entity::new(kind, start, length));
        }
        Ok(())
    }
}

/// Number of trailing space, CR and LF bytes
pub(crate) fn trailing_whitespace(text: &str) -> usize {
    text.bytes()
        .rev()
        .take_while(|b| matches!(b, b' ' | b'\r' | b'\n'))
        .count()
}

/// Characters removed by the final trim of parsed text
pub(crate) fn is_strip_char(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\u{0b}' || c == '\0'
}
