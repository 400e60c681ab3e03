//! Vocabulary model: term and type definitions used to interpret values.
//!
//! The vocabulary service is supplied by the caller. [`VocabularyRegistry`]
//! is a plain in-memory implementation.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::alias::AliasInformation;
use super::terms::PathKind;

// ============================================================================
// FACETS AND CONSTRAINTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Facets {
    pub is_nullable: bool,
    pub precision: Option<u32>,
}

impl Default for Facets {
    fn default() -> Self {
        Self {
            is_nullable: true,
            precision: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Allowed primitive or enum values; empty means unconstrained
    pub allowed_values: Vec<String>,
    /// Terms an annotation path may point to
    pub allowed_terms: Vec<String>,
    /// Qualified type name the annotated element must have
    pub requires_type: Option<String>,
}

impl Constraints {
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.is_empty() || self.allowed_values.iter().any(|v| v == value)
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A vocabulary term, e.g. `com.sap.vocabularies.UI.v1.LineItem`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDefinition {
    /// Canonical qualified name
    pub name: SmolStr,
    /// Canonical element type (`Edm.String`, `...UI.v1.DataFieldAbstract`)
    pub type_name: SmolStr,
    pub is_collection: bool,
    pub facets: Facets,
    pub constraints: Constraints,
}

impl TermDefinition {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_collection: false,
            facets: Facets::default(),
            constraints: Constraints::default(),
        }
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub name: SmolStr,
    pub type_name: SmolStr,
    pub is_collection: bool,
    pub facets: Facets,
    pub constraints: Constraints,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_collection: false,
            facets: Facets::default(),
            constraints: Constraints::default(),
        }
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.facets.is_nullable = false;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplexTypeDefinition {
    pub name: SmolStr,
    pub base_type: Option<SmolStr>,
    pub is_abstract: bool,
    pub properties: IndexMap<SmolStr, PropertyDefinition>,
}

impl ComplexTypeDefinition {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            is_abstract: false,
            properties: IndexMap::new(),
        }
    }

    pub fn with_base(mut self, base_type: impl Into<SmolStr>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.insert(property.name.clone(), property);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumTypeDefinition {
    pub name: SmolStr,
    pub is_flags: bool,
    pub members: Vec<SmolStr>,
}

impl EnumTypeDefinition {
    pub fn new<I, S>(name: impl Into<SmolStr>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            is_flags: false,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_member(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

/// Path expression kind for the built-in path types (`Edm.PropertyPath`, ...).
pub fn path_kind_of_type(type_name: &str) -> Option<PathKind> {
    type_name.strip_prefix("Edm.").and_then(PathKind::from_name)
}

// ============================================================================
// SERVICE
// ============================================================================

/// Read-only access to vocabulary definitions by canonical name.
pub trait VocabularyService: Send + Sync {
    fn term(&self, name: &str) -> Option<&TermDefinition>;

    fn complex_type(&self, name: &str) -> Option<&ComplexTypeDefinition>;

    fn enum_type(&self, name: &str) -> Option<&EnumTypeDefinition>;

    /// Complex types whose base chain includes `name`.
    fn derived_types(&self, name: &str) -> Vec<&ComplexTypeDefinition>;

    /// Aliases of the known vocabularies (`UI`, `Common`, ...).
    fn default_aliases(&self) -> AliasInformation;

    /// Property lookup along the base type chain.
    fn property(&self, type_name: &str, property: &str) -> Option<&PropertyDefinition> {
        let mut current = self.complex_type(type_name);
        let mut seen = 0usize;
        while let Some(definition) = current {
            if let Some(found) = definition.properties.get(property) {
                return Some(found);
            }
            // guard against cyclic base types
            seen += 1;
            if seen > 32 {
                return None;
            }
            current = definition
                .base_type
                .as_deref()
                .and_then(|base| self.complex_type(base));
        }
        None
    }

    /// Property lookup that also searches derived types; used for records of
    /// an abstract type written without an explicit type.
    fn property_in_hierarchy(&self, type_name: &str, property: &str) -> Option<&PropertyDefinition> {
        self.property(type_name, property).or_else(|| {
            self.derived_types(type_name)
                .into_iter()
                .find_map(|derived| derived.properties.get(property))
        })
    }
}

/// In-memory vocabulary definitions.
#[derive(Clone, Debug, Default)]
pub struct VocabularyRegistry {
    terms: IndexMap<SmolStr, TermDefinition>,
    complex_types: IndexMap<SmolStr, ComplexTypeDefinition>,
    enum_types: IndexMap<SmolStr, EnumTypeDefinition>,
    aliases: AliasInformation,
}

impl VocabularyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vocabulary namespace and its conventional alias.
    pub fn with_vocabulary(mut self, alias: &str, namespace: &str) -> Self {
        self.aliases.insert(alias, namespace);
        self
    }

    pub fn with_term(mut self, term: TermDefinition) -> Self {
        self.terms.insert(term.name.clone(), term);
        self
    }

    pub fn with_complex_type(mut self, complex_type: ComplexTypeDefinition) -> Self {
        self.complex_types.insert(complex_type.name.clone(), complex_type);
        self
    }

    pub fn with_enum_type(mut self, enum_type: EnumTypeDefinition) -> Self {
        self.enum_types.insert(enum_type.name.clone(), enum_type);
        self
    }

    fn derives_from(&self, definition: &ComplexTypeDefinition, ancestor: &str) -> bool {
        let mut base = definition.base_type.as_deref();
        let mut depth = 0;
        while let Some(name) = base {
            if name == ancestor {
                return true;
            }
            depth += 1;
            if depth > 32 {
                return false;
            }
            base = self.complex_types.get(name).and_then(|d| d.base_type.as_deref());
        }
        false
    }
}

impl VocabularyService for VocabularyRegistry {
    fn term(&self, name: &str) -> Option<&TermDefinition> {
        self.terms.get(name)
    }

    fn complex_type(&self, name: &str) -> Option<&ComplexTypeDefinition> {
        self.complex_types.get(name)
    }

    fn enum_type(&self, name: &str) -> Option<&EnumTypeDefinition> {
        self.enum_types.get(name)
    }

    fn derived_types(&self, name: &str) -> Vec<&ComplexTypeDefinition> {
        self.complex_types
            .values()
            .filter(|definition| self.derives_from(definition, name))
            .collect()
    }

    fn default_aliases(&self) -> AliasInformation {
        self.aliases.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UI: &str = "com.sap.vocabularies.UI.v1";

    fn registry() -> VocabularyRegistry {
        VocabularyRegistry::new()
            .with_vocabulary("UI", UI)
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.DataFieldAbstract"))
                    .abstract_type()
                    .with_property(PropertyDefinition::new("Label", "Edm.String")),
            )
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.DataField"))
                    .with_base(format!("{UI}.DataFieldAbstract"))
                    .with_property(PropertyDefinition::new("Value", "Edm.PrimitiveType")),
            )
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.DataFieldForAction"))
                    .with_base(format!("{UI}.DataFieldAbstract"))
                    .with_property(PropertyDefinition::new("Action", "Common.QualifiedName")),
            )
    }

    #[test]
    fn test_property_follows_base_type() {
        let vocab = registry();
        let label = vocab.property(&format!("{UI}.DataField"), "Label");
        assert_eq!(label.map(|p| p.type_name.as_str()), Some("Edm.String"));
        assert!(vocab.property(&format!("{UI}.DataField"), "Action").is_none());
    }

    #[test]
    fn test_property_in_hierarchy_searches_derived() {
        let vocab = registry();
        let abstract_name = format!("{UI}.DataFieldAbstract");
        assert!(vocab.property(&abstract_name, "Value").is_none());
        assert!(vocab.property_in_hierarchy(&abstract_name, "Value").is_some());
        assert_eq!(vocab.derived_types(&abstract_name).len(), 2);
    }

    #[test]
    fn test_cyclic_base_types_terminate() {
        let vocab = VocabularyRegistry::new()
            .with_complex_type(ComplexTypeDefinition::new("A").with_base("B"))
            .with_complex_type(ComplexTypeDefinition::new("B").with_base("A"));
        assert!(vocab.property("A", "x").is_none());
        assert!(vocab.derived_types("C").is_empty());
    }

    #[test]
    fn test_path_kind_of_type() {
        assert_eq!(path_kind_of_type("Edm.PropertyPath"), Some(PathKind::PropertyPath));
        assert_eq!(path_kind_of_type("Edm.AnnotationPath"), Some(PathKind::AnnotationPath));
        assert_eq!(path_kind_of_type("Edm.String"), None);
        assert_eq!(path_kind_of_type("PropertyPath"), None);
    }

    #[test]
    fn test_constraints_allow() {
        let open = Constraints::default();
        assert!(open.allows("anything"));
        let closed = Constraints {
            allowed_values: vec!["A".into(), "B".into()],
            ..Constraints::default()
        };
        assert!(closed.allows("B"));
        assert!(!closed.allows("C"));
    }
}
