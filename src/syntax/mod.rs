//! Concrete-syntax front ends for the supported annotation languages.
//!
//! Both front ends produce lossless rowan trees; the converters in
//! [`crate::convert`] consume them and never look at source text directly.

pub mod cds;
pub mod markup;

use rowan::TextRange;

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextSize};
