//! UTF-16 code-unit addressing for UTF-8 strings
//!
//! Telegram measures entity offsets and lengths in UTF-16 code units: every
//! code point above U+FFFF occupies two units (a surrogate pair), everything
//! else one. Rust strings are UTF-8, so every component that touches an offset
//! goes through this module.
//!
//! A code point belongs to a unit range when its *first* unit falls inside the
//! range. Ranges therefore never split a character, and adjacent ranges
//! partition the text without losing anything.
//!
//! # Examples
//!
//! ```rust
//! use telegram_entities::utf16::{substr, utf16_len};
//!
//! assert_eq!(utf16_len("👍"), 2);
//! assert_eq!(utf16_len("🇺🇦"), 4);
//! assert_eq!(substr("a👍a👍", 3, None), "a👍");
//! ```

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index of the first code point whose first unit is at or after `units`
///
/// Returns `text.len()` when `units` is past the end.
pub fn byte_index(text: &str, units: usize) -> usize {
    let mut position = 0;
    for (index, ch) in text.char_indices() {
        if position >= units {
            return index;
        }
        position += ch.len_utf16();
    }
    text.len()
}

/// Substring addressed in UTF-16 units
///
/// `length` of `None` takes everything after `start`. Requests reaching past
/// the end are clipped rather than rejected.
pub fn substr(text: &str, start: usize, length: Option<usize>) -> &str {
    let from = byte_index(text, start);
    let to = match length {
        Some(length) => from + byte_index(&text[from..], length),
        None => text.len(),
    };
    &text[from..to]
}

/// Split `text` into consecutive windows of `size` UTF-16 units
///
/// A window emits the code points starting inside it, so a surrogate pair
/// straddling a boundary stays whole and the following window may come out
/// empty.
pub fn split(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    if size == 0 {
        return chunks;
    }

    let total = utf16_len(text);
    let mut cursor = Utf16Cursor::new(text);
    let mut window_end = 0;
    while window_end < total {
        window_end += size;
        chunks.push(cursor.advance_to(window_end));
    }
    chunks
}

/// Replace `length` units at `start` with `replacement`
///
/// `length` of `None` replaces everything after `start`.
pub fn substr_replace(
    text: &str,
    replacement: &str,
    start: usize,
    length: Option<usize>,
) -> String {
    let from = byte_index(text, start);
    let tail = match length {
        Some(length) => &text[from + byte_index(&text[from..], length)..],
        None => "",
    };

    let mut result = String::with_capacity(from + replacement.len() + tail.len());
    result.push_str(&text[..from]);
    result.push_str(replacement);
    result.push_str(tail);
    result
}

/// Forward-only cursor over a string, addressed in UTF-16 units
///
/// Serializers walk insertion points in ascending order; the cursor keeps
/// that walk linear in the length of the text instead of rescanning from the
/// start for every slice.
#[derive(Debug, Clone)]
pub struct Utf16Cursor<'a> {
    text: &'a str,
    byte: usize,
    unit: usize,
}

impl<'a> Utf16Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            unit: 0,
        }
    }

    /// Current position in UTF-16 units
    pub fn position(&self) -> usize {
        self.unit
    }

    /// Return the text from the current position up to unit `target`, and
    /// move there. Targets behind the cursor yield an empty slice.
    pub fn advance_to(&mut self, target: usize) -> &'a str {
        let start = self.byte;
        let mut end = start;
        let mut unit = self.unit;
        for ch in self.text[start..].chars() {
            if unit >= target {
                break;
            }
            unit += ch.len_utf16();
            end += ch.len_utf8();
        }
        self.byte = end;
        self.unit = unit;
        &self.text[start..end]
    }

    /// Everything from the current position to the end
    pub fn rest(&mut self) -> &'a str {
        let start = self.byte;
        self.unit += utf16_len(&self.text[start..]);
        self.byte = self.text.len();
        &self.text[start..]
    }
}
