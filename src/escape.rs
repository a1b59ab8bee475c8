//! Escaping for the HTML and Markdown writers

use std::borrow::Cow;

/// Characters the Markdown parser treats specially, plus the MarkdownV2
/// punctuation Telegram requires to be escaped
const MARKDOWN_SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape `&`, `<`, `>`, `"` and `'`
///
/// Safe for text runs and for quoted attribute values. The apostrophe becomes
/// `&#39;`.
pub fn html_escape(text: &str) -> Cow<'_, str> {
    let escaped = ::html_escape::encode_double_quoted_attribute(text);
    if escaped.contains('\'') {
        Cow::Owned(escaped.replace('\'', "&#39;"))
    } else {
        escaped
    }
}

/// Backslash-escape every Markdown special character
pub fn markdown_escape(text: &str) -> Cow<'_, str> {
    if !text.contains(MARKDOWN_SPECIAL) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}

/// Escape backslashes and backticks inside an inline code span
pub fn markdown_code_escape(text: &str) -> Cow<'_, str> {
    escape_token(text, "`")
}

/// Escape backslashes and triple backticks inside a fenced block
pub fn markdown_codeblock_escape(text: &str) -> Cow<'_, str> {
    escape_token(text, "```")
}

/// Escape backslashes and `)` inside a link target
pub fn markdown_url_escape(text: &str) -> Cow<'_, str> {
    escape_token(text, ")")
}

/// Backslash-escape `\` and `token`, in that order, so the parser can read
/// `\\` as one backslash and `\` + token as a literal token
fn escape_token<'a>(text: &'a str, token: &str) -> Cow<'a, str> {
    if !text.contains('\\') && !text.contains(token) {
        return Cow::Borrowed(text);
    }
    let escaped = text.replace('\\', "\\\\");
    Cow::Owned(escaped.replace(token, &format!("\\{}", token)))
}
