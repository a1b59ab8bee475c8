//! Markdown serializer - renders a [`Message`] back to Telegram-style Markdown
//!
//! Every entity contributes an opening marker at its offset and a closing
//! marker at its end. Entities are visited by `(offset ascending, length
//! descending)`, openers are appended and closers prepended, so for a laminar
//! set of entities the outer span always wraps the inner one:
//!
//! ```rust
//! use telegram_entities::{Entity, EntityKind, Message};
//!
//! let message = Message::new(
//!     "test",
//!     vec![
//!         Entity::new(EntityKind::Italic, 0, 4),
//!         Entity::new(EntityKind::Bold, 0, 2),
//!     ],
//! );
//! assert_eq!(message.to_markdown(), "_*te*st_");
//! ```
//!
//! Text between markers is escaped so that the parser reads it back as
//! literal text. Inside code spans and fenced blocks only the closing
//! delimiter is escaped, because the parser copies everything else verbatim.
//!
//! Entity types without a Markdown form (hashtags, URLs, blockquotes, ...)
//! produce no markers; their text is still emitted.

use std::borrow::Cow;
use std::collections::BTreeMap;

use log::trace;

use crate::entity::{Entity, EntityKind, Message};
use crate::escape::{
    markdown_code_escape, markdown_codeblock_escape, markdown_escape, markdown_url_escape,
};
use crate::utf16::Utf16Cursor;

/// How a run of literal text is escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Code,
    Pre,
}

/// Render `message` as Markdown
pub fn to_markdown(message: &Message) -> String {
    let mut ordered: Vec<&Entity> = message.entities.iter().filter(|e| e.length > 0).collect();
    ordered.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.length.cmp(&a.length)));

    let mut insertions: BTreeMap<usize, String> = BTreeMap::new();
    let mut code_ranges = Vec::new();
    for entity in ordered {
        let Some((open, close)) = markers(&entity.kind) else {
            continue;
        };
        match entity.kind {
            EntityKind::Code => code_ranges.push((entity.offset, entity.end(), Context::Code)),
            EntityKind::Pre { .. } => code_ranges.push((entity.offset, entity.end(), Context::Pre)),
            _ => {}
        }

        insertions.entry(entity.offset).or_default().push_str(&open);
        insertions.entry(entity.end()).or_default().insert_str(0, &close);
    }

    let mut output = String::with_capacity(message.text.len() + insertions.len() * 4);
    let mut cursor = Utf16Cursor::new(&message.text);
    for (offset, insertion) in &insertions {
        let start = cursor.position();
        let segment = cursor.advance_to(*offset);
        output.push_str(&escape_segment(segment, context_at(start, &code_ranges)));
        output.push_str(insertion);
    }
    let start = cursor.position();
    output.push_str(&escape_segment(cursor.rest(), context_at(start, &code_ranges)));

    trace!(
        "rendered {} entities as {} bytes of markdown",
        message.entities.len(),
        output.len()
    );
    output
}

/// Opening and closing markers for an entity, if it has a Markdown form
fn markers(kind: &EntityKind) -> Option<(String, String)> {
    let pair = |open: &str, close: &str| Some((open.to_string(), close.to_string()));
    match kind {
        EntityKind::Bold => pair("*", "*"),
        EntityKind::Italic => pair("_", "_"),
        EntityKind::Underline => pair("__", "__"),
        EntityKind::Strikethrough => pair("~", "~"),
        EntityKind::Code => pair("`", "`"),
        EntityKind::Spoiler => pair("||", "||"),
        EntityKind::Pre { language } => Some((
            format!("```{}\n", language.as_deref().unwrap_or("")),
            "\n```".to_string(),
        )),
        EntityKind::TextLink { url } => {
            Some(("[".to_string(), format!("]({})", markdown_url_escape(url))))
        }
        EntityKind::TextMention { user_id } => {
            Some(("[".to_string(), format!("](tg://user?id={})", user_id)))
        }
        EntityKind::CustomEmoji { custom_emoji_id } => Some((
            "![".to_string(),
            format!("](tg://emoji?id={})", custom_emoji_id),
        )),
        _ => None,
    }
}

/// The escaping context of a run starting at `offset`
fn context_at(offset: usize, code_ranges: &[(usize, usize, Context)]) -> Context {
    code_ranges
        .iter()
        .find(|(start, end, _)| *start <= offset && offset < *end)
        .map_or(Context::Text, |(_, _, context)| *context)
}

fn escape_segment(segment: &str, context: Context) -> Cow<'_, str> {
    match context {
        Context::Text => markdown_escape(segment),
        Context::Code => markdown_code_escape(segment),
        Context::Pre => markdown_codeblock_escape(segment),
    }
}
