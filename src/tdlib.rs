//! TDLib `formattedText` adapter
//!
//! TDLib describes styled text as a `formattedText` object whose entities
//! carry a `textEntityType*` object instead of a Bot API type string. This
//! module decodes that JSON and maps it onto [`Message`]; entity types with no
//! counterpart are dropped.
//!
//! ```rust
//! use telegram_entities::tdlib::FormattedText;
//! use telegram_entities::{Entity, EntityKind, Message};
//!
//! let json = r#"{
//!     "@type": "formattedText",
//!     "text": "hello",
//!     "entities": [
//!         {"@type": "textEntity", "offset": 0, "length": 5,
//!          "type": {"@type": "textEntityTypeBold"}}
//!     ]
//! }"#;
//! let message = Message::from(FormattedText::from_json(json).unwrap());
//! assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 0, 5)]);
//! ```

use serde::{Deserialize, Deserializer};

use crate::entity::{Entity, EntityKind, Message, leading_int};
use crate::error::ParseError;

/// A TDLib `formattedText` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormattedText {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<TextEntity>,
}

/// A TDLib `textEntity` object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextEntity {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
    /// `None` when `type` is missing or is not a `textEntityType*` object
    #[serde(rename = "type", default, deserialize_with = "entity_type")]
    pub kind: Option<TextEntityType>,
}

/// A TDLib `textEntityType*` object, with the payload fields any of them use
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextEntityType {
    /// `textEntityTypeBold`, `textEntityTypeTextUrl`, ...
    #[serde(rename = "@type", default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user_id: Option<JsonInt>,
    #[serde(default)]
    pub custom_emoji_id: Option<JsonInt>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub media_timestamp: Option<i64>,
}

/// An integer TDLib may send as a JSON number or, for 64-bit values, as a
/// decimal string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JsonInt {
    Number(i64),
    Text(String),
}

impl JsonInt {
    pub fn value(&self) -> i64 {
        match self {
            JsonInt::Number(value) => *value,
            JsonInt::Text(text) => leading_int(text),
        }
    }
}

impl FormattedText {
    /// Decode a `formattedText` JSON object
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidPayload`] when `json` is not a well-formed
    /// `formattedText` object.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::InvalidPayload(e.to_string()))
    }
}

impl TextEntity {
    /// The equivalent [`Entity`], or `None` for types without one
    pub fn to_entity(&self) -> Option<Entity> {
        let kind = self.kind.as_ref()?;
        let entity_kind = match kind.name.as_str() {
            "textEntityTypeMention" => EntityKind::Mention,
            "textEntityTypeHashtag" => EntityKind::Hashtag,
            "textEntityTypeCashtag" => EntityKind::Cashtag,
            "textEntityTypeBotCommand" => EntityKind::BotCommand,
            "textEntityTypeUrl" => EntityKind::Url,
            "textEntityTypeEmailAddress" => EntityKind::Email,
            "textEntityTypePhoneNumber" => EntityKind::PhoneNumber,
            "textEntityTypeBankCardNumber" => EntityKind::BankCardNumber,
            "textEntityTypeBold" => EntityKind::Bold,
            "textEntityTypeItalic" => EntityKind::Italic,
            "textEntityTypeUnderline" => EntityKind::Underline,
            "textEntityTypeStrikethrough" => EntityKind::Strikethrough,
            "textEntityTypeSpoiler" => EntityKind::Spoiler,
            "textEntityTypeCode" => EntityKind::Code,
            "textEntityTypePre" | "textEntityTypePreCode" => EntityKind::Pre {
                language: kind.language.clone().filter(|language| !language.is_empty()),
            },
            "textEntityTypeBlockQuote" => EntityKind::Blockquote,
            "textEntityTypeExpandableBlockQuote" => EntityKind::ExpandableBlockquote,
            "textEntityTypeTextUrl" => EntityKind::TextLink {
                url: kind.url.clone().unwrap_or_default(),
            },
            "textEntityTypeMentionName" => EntityKind::TextMention {
                user_id: kind.user_id.as_ref().map_or(0, JsonInt::value),
            },
            "textEntityTypeCustomEmoji" => EntityKind::CustomEmoji {
                custom_emoji_id: kind.custom_emoji_id.as_ref().map_or(0, JsonInt::value),
            },
            "textEntityTypeMediaTimestamp" => EntityKind::MediaTimestamp {
                timestamp: kind.media_timestamp,
            },
            _ => return None,
        };
        Some(Entity::new(entity_kind, self.offset, self.length))
    }
}

impl From<FormattedText> for Message {
    fn from(formatted: FormattedText) -> Self {
        let entities = formatted
            .entities
            .iter()
            .filter_map(TextEntity::to_entity)
            .collect();
        Message::new(formatted.text, entities)
    }
}

/// Decode a `formattedText` JSON object straight into a [`Message`]
pub fn parse_formatted_text(json: &str) -> Result<Message, ParseError> {
    FormattedText::from_json(json).map(Message::from)
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode `type` only when it is an object of the expected shape, so one bad
/// entity is dropped instead of failing the payload
fn entity_type<'de, D>(deserializer: D) -> Result<Option<TextEntityType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .filter(serde_json::Value::is_object)
        .and_then(|value| serde_json::from_value(value).ok()))
}
