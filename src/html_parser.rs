//! HTML extractor using html5ever
//!
//! Turns Telegram-style HTML into a [`Message`]. The markup is parsed with
//! html5ever, which follows the WHATWG parsing algorithm, so unclosed or
//! misnested tags are repaired the way a browser would repair them instead of
//! being rejected.
//!
//! # Supported markup
//!
//! | Element | Entity |
//! |---|---|
//! | `b`, `strong` | bold |
//! | `i`, `em` | italic |
//! | `u`, `ins` | underline |
//! | `s`, `strike`, `del` | strikethrough |
//! | `code` | code |
//! | `pre language="…"` | pre |
//! | `tg-spoiler`, `spoiler`, `span class="tg-spoiler"` | spoiler |
//! | `tg-emoji emoji-id="…"`, `emoji id="…"` | custom emoji |
//! | `tg-hashtag`, `tg-cashtag`, `tg-bot-command`, `tg-bank-card-number` and their `span class="tg-…"` forms | auto-detected kinds |
//! | `tg-media-timestamp timestamp="…"` (or `data-timestamp`) | media timestamp |
//! | `blockquote`, `blockquote expandable` | (expandable) blockquote |
//! | `a href="…"` | text link, text mention or custom emoji |
//!
//! Any other element contributes its text but no entity.
//!
//! # Examples
//!
//! ```rust
//! use telegram_entities::html_parser::parse_html;
//! use telegram_entities::{Entity, EntityKind};
//!
//! let message = parse_html("<b>bold <i>italic</i></b><br>next").unwrap();
//! assert_eq!(message.text, "bold italic\nnext");
//! assert_eq!(
//!     message.entities,
//!     vec![
//!         Entity::new(EntityKind::Italic, 5, 6),
//!         Entity::new(EntityKind::Bold, 0, 11),
//!     ]
//! );
//! ```
//!
//! # Configuration
//!
//! Element nesting is limited to [`DEFAULT_MAX_DEPTH`] levels below `<body>`;
//! [`HtmlParser::with_max_depth`] changes the limit.

use std::borrow::Cow;
use std::sync::OnceLock;

use html5ever::Attribute;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::{debug, trace};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::entity::{Entity, EntityKind, Message, leading_int};
use crate::error::ParseError;
use crate::markdown_parser::{is_strip_char, trailing_whitespace};
use crate::utf16::utf16_len;

/// Maximum element nesting below `<body>`
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// HTML to [`Message`] extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlParser {
    max_depth: usize,
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse HTML with the default [`HtmlParser`]
pub fn parse_html(html: &str) -> Result<Message, ParseError> {
    HtmlParser::new().parse(html)
}

impl HtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor that rejects elements nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Extract text and entities from `html`
    ///
    /// `<br>` tags in any spelling become `\n` before parsing. The resulting
    /// text is trimmed; entity offsets are shifted to match the trimmed text.
    ///
    /// # Errors
    ///
    /// [`ParseError::NestingTooDeep`] when elements nest deeper than the
    /// configured limit.
    pub fn parse(&self, html: &str) -> Result<Message, ParseError> {
        let html = replace_line_breaks(html);
        let dom = parse_document(RcDom::default(), Default::default()).one(html.trim());

        let mut extraction = Extraction {
            text: String::with_capacity(html.len()),
            entities: Vec::new(),
            max_depth: self.max_depth,
        };
        if let Some(body) = find_element(&dom.document, "body") {
            extraction.visit_children(&body, 0, 1)?;
        }

        let message = extraction.finish();
        trace!(
            "parsed html: {} units, {} entities",
            utf16_len(&message.text),
            message.entities.len()
        );
        Ok(message)
    }
}

/// Rewrite `<br>`, `<br/>` and `<br />` (any case) to `\n`
fn replace_line_breaks(html: &str) -> Cow<'_, str> {
    static BR_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = BR_REGEX.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").ok());
    match regex.as_ref() {
        Some(regex) => regex.replace_all(html, "\n"),
        None => Cow::Borrowed(html),
    }
}

/// Depth-first search for the first element called `tag`
fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = node.data
        && name.local.as_ref() == tag
    {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

struct Extraction {
    text: String,
    entities: Vec<Entity>,
    max_depth: usize,
}

impl Extraction {
    /// Append the text under `node` and record its entities. Returns the
    /// number of UTF-16 units appended, before any trimming.
    fn visit(&mut self, node: &Handle, offset: usize, depth: usize) -> Result<usize, ParseError> {
        match node.data {
            NodeData::Text { ref contents } => {
                let contents = contents.borrow();
                self.text.push_str(&contents);
                Ok(utf16_len(&contents))
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                if depth > self.max_depth {
                    debug!("html nesting exceeds {} levels", self.max_depth);
                    return Err(ParseError::NestingTooDeep(self.max_depth));
                }

                let tag = name.local.as_ref();
                if tag == "br" {
                    self.text.push('\n');
                    return Ok(1);
                }

                let kind = element_kind(tag, &attrs.borrow());
                let length = self.visit_children(node, offset, depth + 1)?;
                if let Some(kind) = kind {
                    let trimmed = length.saturating_sub(trailing_whitespace(&self.text));
                    if trimmed > 0 {
                        self.entities.push(Entity::new(kind, offset, trimmed));
                    }
                }
                Ok(length)
            }
            // comments, doctypes and processing instructions carry no text
            _ => Ok(0),
        }
    }

    fn visit_children(
        &mut self,
        node: &Handle,
        offset: usize,
        depth: usize,
    ) -> Result<usize, ParseError> {
        let mut length = 0;
        for child in node.children.borrow().iter() {
            length += self.visit(child, offset + length, depth)?;
        }
        Ok(length)
    }

    /// Trim the text and move entities along with it
    fn finish(self) -> Message {
        let leading = self.text.len() - self.text.trim_start_matches(is_strip_char).len();
        let text = self.text.trim_matches(is_strip_char);
        let text_len = utf16_len(text);

        // strip characters are ASCII, so bytes and units agree
        let entities = self
            .entities
            .into_iter()
            .filter_map(|entity| {
                let offset = entity.offset.saturating_sub(leading);
                let end = entity.end().saturating_sub(leading).min(text_len);
                (end > offset).then(|| Entity::new(entity.kind, offset, end - offset))
            })
            .collect();

        Message::new(text, entities)
    }
}

/// Entity produced by an element, if any
fn element_kind(tag: &str, attrs: &[Attribute]) -> Option<EntityKind> {
    let kind = match tag {
        "b" | "strong" => EntityKind::Bold,
        "i" | "em" => EntityKind::Italic,
        "u" | "ins" => EntityKind::Underline,
        "s" | "strike" | "del" => EntityKind::Strikethrough,
        "code" => EntityKind::Code,
        "pre" => EntityKind::Pre {
            language: attribute(attrs, "language")
                .filter(|language| !language.is_empty())
                .map(str::to_string),
        },
        "tg-spoiler" | "spoiler" => EntityKind::Spoiler,
        "tg-emoji" => EntityKind::CustomEmoji {
            custom_emoji_id: leading_int(attribute(attrs, "emoji-id").unwrap_or_default()),
        },
        "emoji" => EntityKind::CustomEmoji {
            custom_emoji_id: leading_int(attribute(attrs, "id").unwrap_or_default()),
        },
        "tg-hashtag" => EntityKind::Hashtag,
        "tg-cashtag" => EntityKind::Cashtag,
        "tg-bot-command" => EntityKind::BotCommand,
        "tg-media-timestamp" => media_timestamp(attrs),
        "tg-bank-card-number" => EntityKind::BankCardNumber,
        "blockquote" => {
            if attribute(attrs, "expandable").is_some() || has_class(attrs, "expandable") {
                EntityKind::ExpandableBlockquote
            } else {
                EntityKind::Blockquote
            }
        }
        "a" => EntityKind::from_link_target(attribute(attrs, "href").unwrap_or_default()),
        "span" => return span_kind(attrs),
        _ => return None,
    };
    Some(kind)
}

/// `<span class="tg-…">`: the first recognised class wins
fn span_kind(attrs: &[Attribute]) -> Option<EntityKind> {
    attribute(attrs, "class")?
        .split_ascii_whitespace()
        .find_map(|class| match class {
            "tg-spoiler" => Some(EntityKind::Spoiler),
            "tg-hashtag" => Some(EntityKind::Hashtag),
            "tg-cashtag" => Some(EntityKind::Cashtag),
            "tg-bot-command" => Some(EntityKind::BotCommand),
            "tg-media-timestamp" => Some(media_timestamp(attrs)),
            "tg-bank-card-number" => Some(EntityKind::BankCardNumber),
            _ => None,
        })
}

fn media_timestamp(attrs: &[Attribute]) -> EntityKind {
    EntityKind::MediaTimestamp {
        timestamp: attribute(attrs, "timestamp")
            .or_else(|| attribute(attrs, "data-timestamp"))
            .map(leading_int),
    }
}

fn attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| &*attr.value)
}

fn has_class(attrs: &[Attribute], class: &str) -> bool {
    attribute(attrs, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(html: &str) -> Message {
        parse_html(html).expect("html should parse")
    }

    #[test]
    fn test_simple_tags() {
        let cases = [
            ("<b>test</b>", EntityKind::Bold),
            ("<strong>test</strong>", EntityKind::Bold),
            ("<i>test</i>", EntityKind::Italic),
            ("<em>test</em>", EntityKind::Italic),
            ("<u>test</u>", EntityKind::Underline),
            ("<s>test</s>", EntityKind::Strikethrough),
            ("<del>test</del>", EntityKind::Strikethrough),
            ("<code>test</code>", EntityKind::Code),
            ("<tg-spoiler>test</tg-spoiler>", EntityKind::Spoiler),
            ("<span class=\"tg-spoiler\">test</span>", EntityKind::Spoiler),
            ("<tg-hashtag>test</tg-hashtag>", EntityKind::Hashtag),
            ("<span class=\"tg-cashtag\">test</span>", EntityKind::Cashtag),
            ("<tg-bot-command>test</tg-bot-command>", EntityKind::BotCommand),
            ("<tg-bank-card-number>test</tg-bank-card-number>", EntityKind::BankCardNumber),
            ("<blockquote>test</blockquote>", EntityKind::Blockquote),
        ];
        for (html, kind) in cases {
            let message = parse(html);
            assert_eq!(message.text, "test", "input: {html}");
            assert_eq!(message.entities, vec![Entity::new(kind, 0, 4)], "input: {html}");
        }
    }

    #[test]
    fn test_pre_language() {
        let message = parse("<pre language=\"php\">test</pre>");
        assert_eq!(
            message.entities,
            vec![Entity::new(
                EntityKind::Pre {
                    language: Some("php".to_string())
                },
                0,
                4
            )]
        );

        let message = parse("<pre>test</pre>");
        assert_eq!(message.entities[0].kind, EntityKind::Pre { language: None });
    }

    #[test]
    fn test_links() {
        let message = parse("<a href=\"https://example.com\">test</a>");
        assert_eq!(
            message.entities,
            vec![Entity::new(
                EntityKind::TextLink {
                    url: "https://example.com".to_string()
                },
                0,
                4
            )]
        );

        let message = parse("<a href=\"tg://user?id=12345\">test</a>");
        assert_eq!(
            message.entities[0].kind,
            EntityKind::TextMention { user_id: 12345 }
        );

        let message = parse("<a>test</a>");
        assert_eq!(
            message.entities[0].kind,
            EntityKind::TextLink { url: String::new() }
        );
    }

    #[test]
    fn test_custom_emoji() {
        let message = parse("<tg-emoji emoji-id=\"12345\">test</tg-emoji>");
        assert_eq!(
            message.entities,
            vec![Entity::new(
                EntityKind::CustomEmoji {
                    custom_emoji_id: 12345
                },
                0,
                4
            )]
        );

        let message = parse("<emoji id=\"77x\">👍</emoji>");
        assert_eq!(
            message.entities,
            vec![Entity::new(EntityKind::CustomEmoji { custom_emoji_id: 77 }, 0, 2)]
        );
    }

    #[test]
    fn test_media_timestamp() {
        let message = parse("<tg-media-timestamp timestamp=\"90\">1:30</tg-media-timestamp>");
        assert_eq!(
            message.entities[0].kind,
            EntityKind::MediaTimestamp {
                timestamp: Some(90)
            }
        );

        let message =
            parse("<span class=\"tg-media-timestamp\" data-timestamp=\"5\">0:05</span>");
        assert_eq!(
            message.entities[0].kind,
            EntityKind::MediaTimestamp { timestamp: Some(5) }
        );

        let message = parse("<span class=\"tg-media-timestamp\">0:05</span>");
        assert_eq!(
            message.entities[0].kind,
            EntityKind::MediaTimestamp { timestamp: None }
        );
    }

    #[test]
    fn test_expandable_blockquote() {
        for html in [
            "<blockquote expandable>quote</blockquote>",
            "<blockquote class=\"expandable\">quote</blockquote>",
        ] {
            assert_eq!(
                parse(html).entities,
                vec![Entity::new(EntityKind::ExpandableBlockquote, 0, 5)],
                "input: {html}"
            );
        }
    }

    #[test]
    fn test_line_breaks() {
        for html in ["<b>test</b><br>test", "<b>test</b><br/>test", "<b>test</b><BR />test"] {
            let message = parse(html);
            assert_eq!(message.text, "test\ntest", "input: {html}");
            assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 0, 4)]);
        }
    }

    #[test]
    fn test_nested() {
        let message = parse("<b>bold <i>italic</i> bold</b>");
        assert_eq!(message.text, "bold italic bold");
        assert_eq!(
            message.entities,
            vec![
                Entity::new(EntityKind::Italic, 5, 6),
                Entity::new(EntityKind::Bold, 0, 16),
            ]
        );
    }

    #[test]
    fn test_unknown_tags_pass_through() {
        let message = parse("<div>a<span class=\"other\">b</span><!-- note -->c</div>");
        assert_eq!(message.text, "abc");
        assert!(message.entities.is_empty());
    }

    #[test]
    fn test_character_references_are_decoded() {
        let message = parse("<b>&lt;tag&gt; &amp; &quot;</b>");
        assert_eq!(message.text, "<tag> & \"");
        assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 0, 9)]);
    }

    #[test]
    fn test_trailing_whitespace_excluded_from_entity() {
        let message = parse("<b>bold </b>after");
        assert_eq!(message.text, "bold after");
        assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 0, 4)]);

        let message = parse("a<i>  </i>b");
        assert_eq!(message.text, "a  b");
        assert!(message.entities.is_empty());
    }

    #[test]
    fn test_leading_whitespace_shifts_entities() {
        let message = parse("<b> x</b> <i>y</i>");
        assert_eq!(message.text, "x y");
        assert_eq!(
            message.entities,
            vec![
                Entity::new(EntityKind::Bold, 0, 1),
                Entity::new(EntityKind::Italic, 2, 1),
            ]
        );
    }

    #[test]
    fn test_utf16_offsets() {
        let message = parse("👍 <b>ok</b>");
        assert_eq!(message.text, "👍 ok");
        assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 3, 2)]);
    }

    #[test]
    fn test_malformed_markup_is_repaired() {
        let message = parse("<b>unclosed");
        assert_eq!(message.text, "unclosed");
        assert_eq!(message.entities, vec![Entity::new(EntityKind::Bold, 0, 8)]);
    }

    #[test]
    fn test_nesting_limit() {
        let html = "<div><div><div><div>deep</div></div></div></div>";
        assert_eq!(
            HtmlParser::with_max_depth(3).parse(html),
            Err(ParseError::NestingTooDeep(3))
        );
        assert_eq!(HtmlParser::with_max_depth(4).parse(html).unwrap().text, "deep");
        assert_eq!(HtmlParser::new().max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_empty_input() {
        let message = parse("");
        assert_eq!(message, Message::default());
        assert_eq!(parse("   \n ").text, "");
    }

    proptest! {
        #[test]
        fn prop_arbitrary_markup_never_panics(html in "[<>/a-z \"=&;#0-9]{0,80}") {
            let message = parse_html(&html).unwrap();
            let text_len = utf16_len(&message.text);
            for entity in &message.entities {
                prop_assert!(entity.length > 0);
                prop_assert!(entity.end() <= text_len);
            }
        }
    }
}
