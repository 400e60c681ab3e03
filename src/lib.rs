//! # odata-annotation-base
//!
//! Core library for OData annotation sources: parsing, normalization into
//! a syntax-independent term tree, metadata path resolution and
//! format-preserving edits.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → Document editor (printer, insert/replace edits)
//!   ↓
//! convert  → Markup CST → generic AST → term tree; CDS CST → term tree
//!   ↓
//! hir      → Aliases, metadata, path resolution, vocabulary, term tree
//!   ↓
//! ast      → Generic element/attribute/text tree
//!   ↓
//! syntax   → Lexers + lossless CSTs (markup, CDS)
//!   ↓
//! base     → Primitives (Position, Range, LineIndex)
//! ```

/// Foundation types: Position, Range, LineIndex
pub mod base;

/// Concrete syntax: logos lexers and rowan trees for markup and CDS
pub mod syntax;

/// Generic AST shared by all source syntaxes
pub mod ast;

/// Semantic model: aliases, metadata, vocabulary, term tree, diagnostics
pub mod hir;

/// Syntax-specific converters
pub mod convert;

/// Document editor
pub mod ide;

// Re-export commonly needed items
pub use base::{LineIndex, Position, Range, TextRange, TextSize};
pub use convert::{ConvertContext, convert_cds_text, convert_markup_text};
pub use hir::{AliasInformation, Diagnostic, MetadataService, Severity, TermTree, VocabularyService};
pub use ide::{DocumentEditor, EditError, PrintOptions, TextEdit};
