//! Document editing: format-preserving edits for markup annotation files.
//!
//! Edits are computed from the ranges of an already converted document
//! (see [`crate::convert::markup`]) and returned as plain [`TextEdit`]
//! values; applying them to a buffer is up to the caller.
//!
//! ```ignore
//! let editor = DocumentEditor::new(text, PrintOptions::default());
//! let edit = editor.insert(target, &new_element)?;
//! let updated = edit.apply(text)?;
//! ```

mod edit;
mod error;
mod printer;
#[cfg(feature = "interchange")]
pub mod protocol;

pub use edit::{DocumentEditor, TextEdit};
pub use error::EditError;
pub use printer::{PrintOptions, print_element};
