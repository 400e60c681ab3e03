//! Rowan-based parser for the markup (XML) annotation syntax
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos, content/tag modes) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (lossless, keeps whitespace and comments)
//!     ↓
//! convert::markup → generic AST with editor positions
//! ```

mod lexer;
mod parser;
mod syntax_kind;

pub use lexer::{Lexer, Token, tokenize};
pub use parser::{Parse, parse};
pub use syntax_kind::{MarkupLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
