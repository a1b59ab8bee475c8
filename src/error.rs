//! Error types for parsing and entity validation

use std::fmt;

/// Errors that can occur while turning Markdown, HTML or TDLib payloads into a
/// [`Message`](crate::entity::Message)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// One or more Markdown spans were opened but never closed.
    /// Holds the still-open markers, innermost last, joined with `", "`.
    UnclosedSpan(String),
    /// A code span or fenced block has no matching closing token
    UnclosedFence {
        /// The delimiter that was opened (`` ` `` or ```` ``` ````)
        token: &'static str,
        /// Byte position in the normalized input where the content started
        position: usize,
    },
    /// A `[text](` link has no closing `)`
    UnclosedLink {
        /// Byte position in the normalized input where the target started
        position: usize,
    },
    /// HTML elements nest deeper than the configured limit
    NestingTooDeep(usize),
    /// A structured payload could not be decoded
    InvalidPayload(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnclosedSpan(markers) => {
                write!(f, "Found unclosed markdown elements {}", markers)
            }
            ParseError::UnclosedFence { token, position } => {
                write!(f, "Unclosed {} opened @ pos {}", token, position)
            }
            ParseError::UnclosedLink { position } => {
                write!(f, "Unclosed ) opened @ pos {}", position)
            }
            ParseError::NestingTooDeep(limit) => {
                write!(f, "HTML nesting exceeds maximum depth of {}", limit)
            }
            ParseError::InvalidPayload(msg) => write!(f, "Invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Problems found by [`Message::validate`](crate::entity::Message::validate)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The entity at `index` ends past the end of the text
    OutOfBounds { index: usize },
    /// The entities at `first` and `second` partially overlap
    Crossing { first: usize, second: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfBounds { index } => {
                write!(f, "Entity #{} extends past the end of the text", index)
            }
            ValidationError::Crossing { first, second } => {
                write!(f, "Entities #{} and #{} partially overlap", first, second)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
