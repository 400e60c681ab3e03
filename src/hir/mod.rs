//! Semantic layer: names, metadata, vocabularies and the term tree.
//!
//! - [`alias`] - alias ↔ namespace mapping and name canonicalization
//! - [`metadata`] - metadata service interface, store and memoizing cache
//! - [`resolve`] - path base resolution, batched path and target resolution
//! - [`vocabulary`] - term/type definitions with facets and constraints
//! - [`terms`] - the syntax-independent annotation term tree
//! - [`diagnostics`] - diagnostics collected during conversion

pub mod alias;
pub mod diagnostics;
pub mod metadata;
pub mod resolve;
pub mod terms;
pub mod vocabulary;

pub use alias::{AliasInformation, ResolvedName, get_segment_without_alias, resolve_name, to_aliased_name};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use metadata::{CachedMetadataService, MetadataElement, MetadataService, MetadataStore, TargetKind};
pub use resolve::{
    TargetResolution, canonical_path, get_path_base_metadata_element, resolve_paths, resolve_targets,
};
pub use terms::{
    Collection, PathExpression, PathKind, PathSet, Primitive, PrimitiveValue, PropertyValue, Record,
    Term, TermTree, Value,
};
pub use vocabulary::{
    ComplexTypeDefinition, Constraints, EnumTypeDefinition, Facets, PropertyDefinition,
    TermDefinition, VocabularyRegistry, VocabularyService, path_kind_of_type,
};
