//! Message and entity model
//!
//! A [`Message`] owns its plain text and a list of [`Entity`] annotations.
//! Offsets and lengths are UTF-16 code units (see [`crate::utf16`]).
//!
//! The order of `entities` matters to the serializers when several entities
//! share a boundary, but no canonical order is required: parsers emit inner
//! spans before the spans that enclose them, callers may supply any order.
//!
//! Entities serialize in the shape the Bot API uses:
//!
//! ```rust
//! use telegram_entities::{Entity, EntityKind};
//!
//! let entity = Entity::new(EntityKind::Pre { language: Some("rust".into()) }, 0, 4);
//! let json = serde_json::to_string(&entity).unwrap();
//! assert_eq!(json, r#"{"type":"pre","language":"rust","offset":0,"length":4}"#);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ValidationError};
use crate::utf16::utf16_len;

/// The closed set of entity types, each with only the payload it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    /// `@username`
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    BankCardNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    TextLink {
        url: String,
    },
    /// Mention of a user without a username
    TextMention {
        user_id: i64,
    },
    CustomEmoji {
        custom_emoji_id: i64,
    },
    Blockquote,
    ExpandableBlockquote,
    MediaTimestamp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
}

impl EntityKind {
    /// Resolve a link target into the entity it denotes
    ///
    /// `mention:<id>` and `tg://user?id=<id>` become a [`EntityKind::TextMention`],
    /// `emoji:<digits>` and `tg://emoji?id=<id>` a [`EntityKind::CustomEmoji`];
    /// anything else is a plain [`EntityKind::TextLink`].
    ///
    /// ```rust
    /// use telegram_entities::EntityKind;
    ///
    /// assert_eq!(
    ///     EntityKind::from_link_target("tg://user?id=42"),
    ///     EntityKind::TextMention { user_id: 42 }
    /// );
    /// assert_eq!(
    ///     EntityKind::from_link_target("https://t.me"),
    ///     EntityKind::TextLink { url: "https://t.me".into() }
    /// );
    /// ```
    pub fn from_link_target(target: &str) -> Self {
        let user = target
            .strip_prefix("mention:")
            .or_else(|| target.strip_prefix("tg://user?id="));
        if let Some(id) = user.filter(|id| !id.is_empty()) {
            return EntityKind::TextMention {
                user_id: leading_int(id),
            };
        }

        let emoji = target
            .strip_prefix("emoji:")
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .or_else(|| {
                target
                    .strip_prefix("tg://emoji?id=")
                    .filter(|id| !id.is_empty())
            });
        if let Some(id) = emoji {
            return EntityKind::CustomEmoji {
                custom_emoji_id: leading_int(id),
            };
        }

        EntityKind::TextLink {
            url: target.to_string(),
        }
    }
}

/// A style or semantic annotation over a span of message text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(flatten)]
    pub kind: EntityKind,
    /// Start, in UTF-16 code units
    pub offset: usize,
    /// Length, in UTF-16 code units
    pub length: usize,
}

impl Entity {
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }

    /// First unit past the entity
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Plain text plus the entities that style it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Message {
    pub fn new(text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// Parse Telegram-style Markdown
    ///
    /// ```rust
    /// use telegram_entities::{EntityKind, Message};
    ///
    /// let message = Message::from_markdown("*bold _italic_ bold*").unwrap();
    /// assert_eq!(message.text, "bold italic bold");
    /// assert_eq!(message.entities[0].kind, EntityKind::Italic);
    /// assert_eq!(message.entities[1].kind, EntityKind::Bold);
    /// ```
    pub fn from_markdown(markdown: &str) -> Result<Self, ParseError> {
        crate::markdown_parser::parse_markdown(markdown)
    }

    /// Parse Telegram-style HTML
    pub fn from_html(html: &str) -> Result<Self, ParseError> {
        crate::html_parser::parse_html(html)
    }

    /// Render as HTML; `extended` selects Telegram-specific tags over portable
    /// `<span class="tg-…">` wrappers
    pub fn to_html(&self, extended: bool) -> String {
        let flavor = if extended {
            crate::html_writer::HtmlFlavor::Telegram
        } else {
            crate::html_writer::HtmlFlavor::Portable
        };
        crate::html_writer::render_html(self, flavor)
    }

    /// Render HTML for the Bot API `parse_mode: "HTML"`
    pub fn to_bot_html(&self) -> String {
        crate::html_writer::to_bot_html(self)
    }

    /// Render as Telegram-style Markdown
    pub fn to_markdown(&self) -> String {
        crate::markdown_writer::to_markdown(self)
    }

    /// Check that every entity lies inside the text and that no two entities
    /// partially overlap
    ///
    /// The serializers do not call this: they render whatever they are given,
    /// and crossing spans come out as mis-nested markup.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let text_len = utf16_len(&self.text);
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.end() > text_len {
                return Err(ValidationError::OutOfBounds { index });
            }
        }

        for (first, a) in self.entities.iter().enumerate() {
            for (second, b) in self.entities.iter().enumerate().skip(first + 1) {
                let crosses = (a.offset < b.offset && b.offset < a.end() && a.end() < b.end())
                    || (b.offset < a.offset && a.offset < b.end() && b.end() < a.end());
                if crosses {
                    return Err(ValidationError::Crossing { first, second });
                }
            }
        }

        Ok(())
    }
}

/// Integer value of the leading decimal digits of `value`, `0` if there are
/// none. Surrounding garbage is ignored: `"12ab"` is `12`.
pub(crate) fn leading_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let mut result: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        result = result
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }
    if negative { -result } else { result }
}
