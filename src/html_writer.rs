//! HTML serializer
//!
//! Renders a [`Message`] as Telegram-style HTML. Each entity contributes an
//! opening tag at its offset and a closing tag at its end. Entities are visited
//! in list order: openers are appended to whatever is already queued at an
//! offset and closers are prepended, so of two entities sharing a start the
//! earlier-listed one opens outside, and of two sharing an end the
//! later-listed one closes first.
//!
//! Text between tags is HTML-escaped.
//!
//! # Flavors
//!
//! [`HtmlFlavor`] picks the tag vocabulary:
//!
//! - `Portable` wraps Telegram-only kinds in `<span class="tg-…">` and drops
//!   custom emoji and text mentions to plain text
//! - `Telegram` emits Telegram's own tags (`<tg-spoiler>`, `<tg-emoji>`, ...)
//! - `BotApi` is `Telegram` shaped for `parse_mode: "HTML"`: kinds the Bot API
//!   detects on its own lose their wrapper, and line breaks stay `\n`
//!
//! ```rust
//! use telegram_entities::html_writer::{render_html, HtmlFlavor};
//! use telegram_entities::{Entity, EntityKind, Message};
//!
//! let message = Message::new("secret", vec![Entity::new(EntityKind::Spoiler, 0, 6)]);
//! assert_eq!(
//!     render_html(&message, HtmlFlavor::Portable),
//!     r#"<span class="tg-spoiler">secret</span>"#
//! );
//! assert_eq!(
//!     render_html(&message, HtmlFlavor::Telegram),
//!     "<tg-spoiler>secret</tg-spoiler>"
//! );
//! ```

use std::collections::BTreeMap;

use log::trace;

use crate::entity::{Entity, EntityKind, Message};
use crate::escape::html_escape;
use crate::utf16::{Utf16Cursor, substr};

/// Tag vocabulary used by [`render_html`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlFlavor {
    /// Plain HTML; Telegram-only kinds become `<span class="tg-…">`
    #[default]
    Portable,
    /// Telegram's extended tags
    Telegram,
    /// Extended tags minus the wrappers the Bot API adds by itself, with
    /// literal newlines instead of `<br>`
    BotApi,
}

/// Render `message` as HTML in the given flavor
pub fn render_html(message: &Message, flavor: HtmlFlavor) -> String {
    let mut insertions: BTreeMap<usize, String> = BTreeMap::new();
    for entity in message.entities.iter().filter(|e| e.length > 0) {
        let Some((open, close)) = tags(entity, &message.text, flavor) else {
            continue;
        };
        insertions.entry(entity.offset).or_default().push_str(&open);
        insertions.entry(entity.end()).or_default().insert_str(0, &close);
    }

    let mut output = String::with_capacity(message.text.len() + insertions.len() * 8);
    let mut cursor = Utf16Cursor::new(&message.text);
    for (offset, insertion) in &insertions {
        push_text(&mut output, cursor.advance_to(*offset), flavor);
        output.push_str(insertion);
    }
    push_text(&mut output, cursor.rest(), flavor);

    trace!(
        "rendered {} entities as {:?} html",
        message.entities.len(),
        flavor
    );
    output
}

/// Render HTML for the Bot API `parse_mode: "HTML"`
///
/// Hashtags, cashtags, bot commands, media timestamps and bank card numbers
/// are left as plain text since the Bot API recognises them itself. Spoilers
/// and custom emoji keep their Telegram tags.
pub fn to_bot_html(message: &Message) -> String {
    render_html(message, HtmlFlavor::BotApi)
}

fn push_text(output: &mut String, run: &str, flavor: HtmlFlavor) {
    let escaped = html_escape(run);
    if flavor == HtmlFlavor::BotApi {
        output.push_str(&escaped);
    } else {
        output.push_str(&escaped.replace('\n', "<br>"));
    }
}

/// Opening and closing tag for an entity, `None` when the flavor renders it
/// as bare text
fn tags(entity: &Entity, text: &str, flavor: HtmlFlavor) -> Option<(String, String)> {
    let extended = flavor != HtmlFlavor::Portable;
    let pair = |open: &str, close: &str| Some((open.to_string(), close.to_string()));
    let anchor = |href: String| {
        Some((
            format!("<a href=\"{}\">", html_escape(&href)),
            "</a>".to_string(),
        ))
    };
    let span_text = || substr(text, entity.offset, Some(entity.length));

    match &entity.kind {
        EntityKind::Bold => pair("<b>", "</b>"),
        EntityKind::Italic => pair("<i>", "</i>"),
        EntityKind::Underline => pair("<u>", "</u>"),
        EntityKind::Strikethrough => pair("<s>", "</s>"),
        EntityKind::Code => pair("<code>", "</code>"),
        EntityKind::Pre { language } => match language.as_deref().filter(|l| !l.is_empty()) {
            Some(language) => Some((
                format!("<pre language=\"{}\">", html_escape(language)),
                "</pre>".to_string(),
            )),
            None => pair("<pre>", "</pre>"),
        },
        EntityKind::Blockquote => pair("<blockquote>", "</blockquote>"),
        EntityKind::ExpandableBlockquote if extended => {
            pair("<blockquote expandable>", "</blockquote>")
        }
        EntityKind::ExpandableBlockquote => {
            pair("<blockquote class=\"expandable\">", "</blockquote>")
        }
        EntityKind::TextLink { url } => anchor(url.clone()),
        EntityKind::Url => anchor(span_text().to_string()),
        EntityKind::Email => anchor(format!("mailto:{}", span_text())),
        EntityKind::PhoneNumber => anchor(format!("phone:{}", span_text())),
        EntityKind::Mention => {
            let username = span_text();
            anchor(format!(
                "https://t.me/{}",
                username.strip_prefix('@').unwrap_or(username)
            ))
        }
        EntityKind::TextMention { user_id } if extended => {
            anchor(format!("tg://user?id={}", user_id))
        }
        EntityKind::TextMention { .. } => None,
        EntityKind::CustomEmoji { custom_emoji_id } if extended => Some((
            format!("<tg-emoji emoji-id=\"{}\">", custom_emoji_id),
            "</tg-emoji>".to_string(),
        )),
        EntityKind::CustomEmoji { .. } => None,
        EntityKind::Spoiler => telegram_tag("tg-spoiler", flavor),
        EntityKind::Hashtag => auto_detected("tg-hashtag", flavor),
        EntityKind::Cashtag => auto_detected("tg-cashtag", flavor),
        EntityKind::BotCommand => auto_detected("tg-bot-command", flavor),
        EntityKind::BankCardNumber => auto_detected("tg-bank-card-number", flavor),
        EntityKind::MediaTimestamp { timestamp } => match (flavor, timestamp) {
            (HtmlFlavor::BotApi, _) => None,
            (HtmlFlavor::Telegram, Some(timestamp)) => Some((
                format!("<tg-media-timestamp timestamp=\"{}\">", timestamp),
                "</tg-media-timestamp>".to_string(),
            )),
            _ => telegram_tag("tg-media-timestamp", HtmlFlavor::Portable),
        },
    }
}

/// `<tg-x>` in the extended flavors, `<span class="tg-x">` otherwise
fn telegram_tag(tag: &str, flavor: HtmlFlavor) -> Option<(String, String)> {
    if flavor == HtmlFlavor::Portable {
        Some((format!("<span class=\"{}\">", tag), "</span>".to_string()))
    } else {
        Some((format!("<{}>", tag), format!("</{}>", tag)))
    }
}

/// Like [`telegram_tag`], but bare text for the Bot API
fn auto_detected(tag: &str, flavor: HtmlFlavor) -> Option<(String, String)> {
    if flavor == HtmlFlavor::BotApi {
        None
    } else {
        telegram_tag(tag, flavor)
    }
}
