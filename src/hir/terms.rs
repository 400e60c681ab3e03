//! Annotation term tree.
//!
//! The syntax-independent result of converting annotation sources: terms
//! applied to targets, with nested records, collections, paths and
//! primitive values.

use indexmap::IndexSet;
use smol_str::SmolStr;

use super::diagnostics::Diagnostic;
use crate::ast::MultilineType;
use crate::base::Range;

// ============================================================================
// TREE
// ============================================================================

/// Output of one conversion pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermTree {
    pub terms: Vec<Term>,
    pub diagnostics: Vec<Diagnostic>,
    /// Every distinct path expression found, in first-seen order
    pub path_set: PathSet,
}

impl TermTree {
    pub fn terms_for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.terms.iter().filter(move |t| t.target == target)
    }

    /// Find a term by canonical name (and qualifier) on any target.
    pub fn find(&self, qualified_name: &str, qualifier: Option<&str>) -> Option<&Term> {
        self.terms
            .iter()
            .find(|t| t.qualified_name == qualified_name && t.qualifier.as_deref() == qualifier)
    }

    /// Distinct targets, in first-seen order.
    pub fn targets(&self) -> IndexSet<&str> {
        self.terms.iter().map(|t| t.target.as_str()).collect()
    }
}

/// A term applied to a target: `@UI.LineItem#q: [...]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    /// Canonical target path (`CatalogService.Books/title`)
    pub target: String,
    pub target_range: Range,
    /// The term name as written (`UI.LineItem`)
    pub name: String,
    /// Canonical term name (`com.sap.vocabularies.UI.v1.LineItem`)
    pub qualified_name: String,
    pub qualifier: Option<String>,
    pub range: Range,
    pub name_range: Range,
    /// `None` for terms written without a value (default value applies)
    pub value: Option<Value>,
    /// Annotations on the annotation itself
    pub annotations: Vec<Term>,
}

impl Term {
    pub fn new(target: impl Into<String>, name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            target_range: Range::default(),
            name: name.into(),
            qualified_name: qualified_name.into(),
            qualifier: None,
            range: Range::default(),
            name_range: Range::default(),
            value: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// All path expressions below this term, depth first.
    pub fn paths(&self) -> Vec<&PathExpression> {
        let mut out = Vec::new();
        if let Some(value) = &self.value {
            value.collect_paths(&mut out);
        }
        for nested in &self.annotations {
            out.extend(nested.paths());
        }
        out
    }
}

// ============================================================================
// VALUES
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Primitive(PrimitiveValue),
    Path(PathExpression),
    Record(Record),
    Collection(Collection),
}

impl Value {
    pub fn range(&self) -> Range {
        match self {
            Value::Primitive(p) => p.range,
            Value::Path(p) => p.range,
            Value::Record(r) => r.range,
            Value::Collection(c) => c.range,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(&p.value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathExpression> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a PathExpression>) {
        match self {
            Value::Primitive(_) => {}
            Value::Path(p) => out.push(p),
            Value::Record(r) => {
                for property in &r.properties {
                    property.value.collect_paths(out);
                }
                for nested in &r.annotations {
                    out.extend(nested.paths());
                }
            }
            Value::Collection(c) => {
                for item in &c.items {
                    item.collect_paths(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    String(String),
    Bool(bool),
    Int(i64),
    /// Decimal and floating point literals, kept as written
    Decimal(String),
    /// Canonical enum member (`com.sap.vocabularies.UI.v1.ImportanceType/High`)
    EnumMember(String),
    Null,
}

impl Primitive {
    /// The value as it appears in an attribute (`Bool="true"`, `Int="42"`).
    pub fn to_text(&self) -> String {
        match self {
            Primitive::String(s) | Primitive::Decimal(s) | Primitive::EnumMember(s) => s.clone(),
            Primitive::Bool(b) => b.to_string(),
            Primitive::Int(i) => i.to_string(),
            Primitive::Null => String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveValue {
    pub value: Primitive,
    pub range: Range,
    /// Set for strings written as multi-line literals
    pub multiline_type: Option<MultilineType>,
}

impl PrimitiveValue {
    pub fn new(value: Primitive, range: Range) -> Self {
        Self {
            value,
            range,
            multiline_type: None,
        }
    }
}

/// Kind of a path expression; matches the EDM expression names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    Path,
    PropertyPath,
    NavigationPropertyPath,
    AnnotationPath,
    ModelElementPath,
}

impl PathKind {
    pub const ALL: [PathKind; 5] = [
        PathKind::Path,
        PathKind::PropertyPath,
        PathKind::NavigationPropertyPath,
        PathKind::AnnotationPath,
        PathKind::ModelElementPath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PathKind::Path => "Path",
            PathKind::PropertyPath => "PropertyPath",
            PathKind::NavigationPropertyPath => "NavigationPropertyPath",
            PathKind::AnnotationPath => "AnnotationPath",
            PathKind::ModelElementPath => "ModelElementPath",
        }
    }

    pub fn from_name(name: &str) -> Option<PathKind> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathExpression {
    pub kind: PathKind,
    /// Segments separated by `/`
    pub path: String,
    pub range: Range,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// Canonical record type, when written or implied by the term type
    pub type_name: Option<String>,
    pub properties: Vec<PropertyValue>,
    pub annotations: Vec<Term>,
    pub range: Range,
}

impl Record {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyValue {
    pub name: SmolStr,
    pub value: Value,
    pub range: Range,
    pub name_range: Range,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    pub items: Vec<Value>,
    pub range: Range,
}

// ============================================================================
// PATH SET
// ============================================================================

/// Distinct path expressions in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSet(IndexSet<String>);

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the path was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.0.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn extend(&mut self, other: &PathSet) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<S: Into<String>> FromIterator<S> for PathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
