use thiserror::Error;

use crate::base::{Position, Range};

/// Caller-contract violations reported by the document editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The element's ranges don't match the text; the caller must re-parse.
    #[error("stale target: expected `{expected}` at {range}, found `{found}`")]
    StaleTarget {
        expected: String,
        found: String,
        range: Range,
    },

    #[error("position {position} is outside the document")]
    PositionOutOfBounds { position: Position },

    #[error("range {range} does not map to the document text")]
    InvalidRange { range: Range },
}
