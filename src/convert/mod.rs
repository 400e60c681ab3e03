//! Syntax-specific converters.
//!
//! ```text
//! markup CST ──markup::convert──→ generic AST ──annotations::convert──→ TermTree
//! CDS CST ─────cds::convert───────────────────────────────────────────→ TermTree
//! ```
//!
//! Converters never fail: malformed constructs become diagnostics and the
//! rest of the document is still converted.

pub mod annotations;
pub mod cds;
pub mod markup;

use crate::ast::Document;
use crate::base::{LineIndex, Range};
use crate::hir::alias::AliasInformation;
use crate::hir::diagnostics::DiagnosticCollector;
use crate::hir::terms::{Primitive, TermTree};
use crate::hir::vocabulary::{Constraints, PropertyDefinition, TermDefinition, VocabularyService};

pub use annotations::term_to_element;
pub use markup::MarkupConversion;

/// Inputs shared by the converters.
#[derive(Clone)]
pub struct ConvertContext<'a> {
    pub vocabulary: &'a dyn VocabularyService,
    pub aliases: AliasInformation,
}

impl<'a> ConvertContext<'a> {
    /// A context using the vocabulary's default aliases.
    pub fn new(vocabulary: &'a dyn VocabularyService) -> Self {
        Self {
            vocabulary,
            aliases: vocabulary.default_aliases(),
        }
    }

    /// Use `aliases`, falling back to the vocabulary defaults for aliases
    /// they don't define.
    pub fn with_aliases(mut self, aliases: AliasInformation) -> Self {
        let defaults = std::mem::replace(&mut self.aliases, aliases);
        self.aliases.merge(&defaults);
        self
    }
}

impl std::fmt::Debug for ConvertContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertContext")
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// A markup document and the annotations it carries.
#[derive(Clone, Debug, Default)]
pub struct MarkupAnnotations {
    pub document: Document,
    /// Terms plus the diagnostics and paths of both conversion steps
    pub tree: TermTree,
}

/// Parse markup text and convert it into the generic AST and a term tree.
pub fn convert_markup_text(text: &str, context: &ConvertContext<'_>) -> MarkupAnnotations {
    let parse = crate::syntax::markup::parse(text);
    let line_index = LineIndex::new(text);
    let conversion = markup::convert(&parse, &line_index);

    let mut tree = annotations::convert(&conversion.document, context);
    let mut diagnostics = conversion.diagnostics;
    diagnostics.append(&mut tree.diagnostics);
    tree.diagnostics = diagnostics;
    tree.path_set.extend(&conversion.path_set);

    MarkupAnnotations {
        document: conversion.document,
        tree,
    }
}

/// Parse CDS text and convert it into a term tree.
pub fn convert_cds_text(text: &str, context: &ConvertContext<'_>) -> TermTree {
    let parse = crate::syntax::cds::parse(text);
    let line_index = LineIndex::new(text);
    cds::convert(&parse, &line_index, context)
}

// ============================================================================
// Shared value typing and checks
// ============================================================================

/// What the vocabulary expects at a value position.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Expected<'v> {
    pub type_name: Option<&'v str>,
    pub is_collection: bool,
    pub constraints: Option<&'v Constraints>,
}

impl<'v> Expected<'v> {
    pub fn of_term(definition: &'v TermDefinition) -> Self {
        Self {
            type_name: Some(definition.type_name.as_str()),
            is_collection: definition.is_collection,
            constraints: Some(&definition.constraints),
        }
    }

    pub fn of_property(definition: &'v PropertyDefinition) -> Self {
        Self {
            type_name: Some(definition.type_name.as_str()),
            is_collection: definition.is_collection,
            constraints: Some(&definition.constraints),
        }
    }

    /// Expectation for the items of a collection.
    pub fn item(self) -> Self {
        Self {
            is_collection: false,
            ..self
        }
    }
}

/// Report an enum member (`ns.Type/Member`) its enum type doesn't define.
pub(crate) fn check_enum_member(
    vocabulary: &dyn VocabularyService,
    member: &str,
    range: Range,
    diagnostics: &mut DiagnosticCollector,
) {
    let Some((type_name, name)) = member.split_once('/') else {
        return;
    };
    let Some(definition) = vocabulary.enum_type(type_name) else {
        return;
    };
    if !definition.has_member(name) {
        let allowed: Vec<String> = definition
            .members
            .iter()
            .map(|m| format!("{}/{}", type_name, m))
            .collect();
        diagnostics.value_not_allowed(range, member, &allowed);
    }
}

/// Report a primitive outside the allowed values of its term or property.
pub(crate) fn check_allowed(
    value: &Primitive,
    range: Range,
    constraints: Option<&Constraints>,
    diagnostics: &mut DiagnosticCollector,
) {
    let Some(constraints) = constraints else {
        return;
    };
    let text = value.to_text();
    if !constraints.allows(&text) {
        diagnostics.value_not_allowed(range, &text, &constraints.allowed_values);
    }
}
