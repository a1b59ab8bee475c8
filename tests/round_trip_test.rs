//! Round trips between the entity model and its text formats
//!
//! Property tests render a message with one entity, or with one entity nested
//! inside another, parse the output back and expect the same message.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use telegram_entities::{Entity, EntityKind, Message};

/// Words joined by `separator`, with one entity covering words `from..=to`
fn build(words: &[String], separator: &str, from: usize, to: usize, kind: EntityKind) -> Message {
    let text = words.join(separator);
    Message::new(text, vec![span(words, separator, (from, to), kind)])
}

/// An entity covering words `from..=to`
fn span(words: &[String], separator: &str, (from, to): (usize, usize), kind: EntityKind) -> Entity {
    let offset: usize = words[..from]
        .iter()
        .map(|w| w.encode_utf16().count() + separator.encode_utf16().count())
        .sum();
    let length = words[from..=to].join(separator).encode_utf16().count();
    Entity::new(kind, offset, length)
}

fn word_range(count: usize) -> impl Strategy<Value = (usize, usize)> {
    (0..count).prop_flat_map(move |from| (Just(from), from..count))
}

/// An outer word range of at least two words and an inner range strictly
/// inside it, sharing the start, the end or neither
fn nested_ranges(count: usize) -> impl Strategy<Value = ((usize, usize), (usize, usize))> {
    (0..count - 1)
        .prop_flat_map(move |from| (Just(from), from + 1..count))
        .prop_flat_map(|(from, to)| {
            let inner = (from..=to)
                .prop_flat_map(move |inner_from| (Just(inner_from), inner_from..=to))
                .prop_filter("inner range must be shorter", move |&inner| {
                    inner != (from, to)
                });
            (Just((from, to)), inner)
        })
}

fn style_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::Bold),
        Just(EntityKind::Italic),
        Just(EntityKind::Underline),
        Just(EntityKind::Strikethrough),
        Just(EntityKind::Spoiler),
        Just(EntityKind::TextLink {
            url: "https://example.com/a_(b)".to_string()
        }),
    ]
}

/// An outer and an inner kind whose markers stay apart when they touch.
/// `_` next to `__` reads back as a different split, and equal kinds would
/// close each other.
fn nested_kinds() -> impl Strategy<Value = (EntityKind, EntityKind)> {
    (style_kind(), prop_oneof![style_kind(), Just(EntityKind::Code)]).prop_filter(
        "markers must be distinguishable",
        |(outer, inner)| {
            let italic_and_underline = matches!(
                (outer, inner),
                (EntityKind::Italic, EntityKind::Underline)
                    | (EntityKind::Underline, EntityKind::Italic)
            );
            outer != inner && !italic_and_underline
        },
    )
}

fn markdown_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::Bold),
        Just(EntityKind::Italic),
        Just(EntityKind::Underline),
        Just(EntityKind::Strikethrough),
        Just(EntityKind::Spoiler),
        Just(EntityKind::Code),
        Just(EntityKind::TextLink {
            url: "https://example.com/a_(b)".to_string()
        }),
        Just(EntityKind::TextMention { user_id: 42 }),
        Just(EntityKind::CustomEmoji {
            custom_emoji_id: 5368324170671202286
        }),
    ]
}

fn html_kind() -> impl Strategy<Value = EntityKind> {
    prop_oneof![
        Just(EntityKind::Bold),
        Just(EntityKind::Italic),
        Just(EntityKind::Underline),
        Just(EntityKind::Strikethrough),
        Just(EntityKind::Spoiler),
        Just(EntityKind::Code),
        Just(EntityKind::Pre {
            language: Some("rust".to_string())
        }),
        Just(EntityKind::Blockquote),
        Just(EntityKind::ExpandableBlockquote),
        Just(EntityKind::TextLink {
            url: "https://example.com/?a=1&b=\"2\"".to_string()
        }),
        Just(EntityKind::TextMention { user_id: 42 }),
        Just(EntityKind::CustomEmoji {
            custom_emoji_id: 12345
        }),
        Just(EntityKind::Hashtag),
        Just(EntityKind::Cashtag),
        Just(EntityKind::BotCommand),
        Just(EntityKind::BankCardNumber),
        Just(EntityKind::MediaTimestamp {
            timestamp: Some(90)
        }),
    ]
}

proptest! {
    #[test]
    fn prop_markdown_round_trip(
        (words, (from, to)) in prop::collection::vec("[a-zA-Z0-9.,!#()+=|{}<>-]{1,6}", 1..6)
            .prop_flat_map(|words| {
                let count = words.len();
                (Just(words), word_range(count))
            }),
        kind in markdown_kind(),
    ) {
        let message = build(&words, " ", from, to, kind);
        let markdown = message.to_markdown();
        let parsed = Message::from_markdown(&markdown).unwrap();
        prop_assert_eq!(parsed, message, "markdown: {}", markdown);
    }

    #[test]
    fn prop_nested_markdown_round_trip(
        (words, (outer_range, inner_range)) in prop::collection::vec("[a-zA-Z0-9.,!#()+=|{}<>\\\\-]{1,6}", 2..7)
            .prop_flat_map(|words| {
                let count = words.len();
                (Just(words), nested_ranges(count))
            }),
        (outer, inner) in nested_kinds(),
    ) {
        // the inner span closes first, so the parser records it first
        let message = Message::new(
            words.join(" "),
            vec![
                span(&words, " ", inner_range, inner),
                span(&words, " ", outer_range, outer),
            ],
        );
        let markdown = message.to_markdown();
        let parsed = Message::from_markdown(&markdown).unwrap();
        prop_assert_eq!(parsed, message, "markdown: {}", markdown);
    }

    #[test]
    fn prop_html_round_trip(
        (words, (from, to)) in prop::collection::vec("[a-zA-Z0-9<>&\"'*_ñ👍]{1,6}", 1..6)
            .prop_flat_map(|words| {
                let count = words.len();
                (Just(words), word_range(count))
            }),
        separator in prop::sample::select(vec![" ", "\n", ", "]),
        kind in html_kind(),
    ) {
        let message = build(&words, separator, from, to, kind);
        let html = message.to_html(true);
        let parsed = Message::from_html(&html).unwrap();
        prop_assert_eq!(parsed, message, "html: {}", html);
    }

    #[test]
    fn prop_plain_text_survives_markdown_escaping(text in "[ -~]{0,40}") {
        let message = Message::new(text.trim(), vec![]);
        let parsed = Message::from_markdown(&message.to_markdown()).unwrap();
        prop_assert_eq!(parsed, message);
    }
}

#[test]
fn test_markdown_html_markdown() {
    let original = "*bold _italic_ bold* and `code` with [a link](https://t.me)";
    let message = Message::from_markdown(original).unwrap();
    let through_html = Message::from_html(&message.to_html(true)).unwrap();
    assert_eq!(through_html, message);
    assert_eq!(through_html.to_markdown(), original);
}

#[test]
fn test_html_markdown_html() {
    let original = "<b>bold <i>italic</i> bold</b> <tg-spoiler>hidden</tg-spoiler>";
    let message = Message::from_html(original).unwrap();
    let through_markdown = Message::from_markdown(&message.to_markdown()).unwrap();
    assert_eq!(through_markdown.text, message.text);
    assert_eq!(through_markdown.to_html(true), original);
}

#[test]
fn test_spans_sharing_a_start_round_trip() {
    let words: Vec<String> = ["one", "two", "three"].map(String::from).to_vec();
    let link = EntityKind::TextLink {
        url: "https://t.me".to_string(),
    };
    let pairs = [
        (EntityKind::Bold, link.clone()),
        (link, EntityKind::Bold),
        (EntityKind::Spoiler, EntityKind::Code),
        (EntityKind::Underline, EntityKind::Strikethrough),
    ];
    for (outer, inner) in pairs {
        let message = Message::new(
            words.join(" "),
            vec![
                span(&words, " ", (0, 1), inner),
                span(&words, " ", (0, 2), outer),
            ],
        );
        let markdown = message.to_markdown();
        assert_eq!(Message::from_markdown(&markdown).unwrap(), message, "markdown: {markdown}");
    }
}

#[test]
fn test_code_escapes_round_trip() {
    let message = Message::new(
        "a`b and x```y",
        vec![
            Entity::new(EntityKind::Code, 0, 3),
            Entity::new(EntityKind::Pre { language: None }, 8, 5),
        ],
    );
    let markdown = message.to_markdown();
    assert_eq!(markdown, "`a\\`b` and ```\nx\\```y\n```");
    let parsed = Message::from_markdown(&markdown).unwrap();
    assert_eq!(parsed.text, "a`b and x```y");
    assert_eq!(parsed.entities, message.entities);
}
