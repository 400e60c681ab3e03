//! Rowan-based parser for CDS annotation sources
//!
//! Covers the annotation subset of CDS: `annotate` statements carrying
//! annotation assignments on an entity and on its elements.
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree
//!     ↓
//! ast → typed wrappers (Annotate, Assignment, Value, ...)
//!     ↓
//! convert::cds → annotation term tree
//! ```

mod lexer;
mod parser;
mod syntax_kind;

pub mod ast;

pub use ast::*;
pub use lexer::{Lexer, Token, tokenize};
pub use parser::{Parse, parse};
pub use syntax_kind::{CdsLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
