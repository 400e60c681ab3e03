//! Foundation types for the annotation toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Range`] - Editor positions (UTF-16 columns)
//! - [`TextRange`], [`TextSize`] - Byte offsets from the concrete syntax trees
//! - [`LineIndex`] - Offset/position conversion
//! - Range predicates and indentation helpers
//!
//! This module has NO dependencies on other crate modules.

mod position;
mod span;

pub use position::{
    get_indent_level, indent, is_before, position_contained, position_contained_strict,
    range_contained,
};
pub use span::{LineIndex, Position, Range, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
