//! Typed AST wrappers over the untyped CDS CST.
//!
//! Each struct wraps a SyntaxNode and provides methods to access children.

use super::syntax_kind::SyntaxKind;
use super::{SyntaxNode, SyntaxToken};

/// Trait for AST nodes that wrap a SyntaxNode
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

// ============================================================================
// Helper macros
// ============================================================================

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn first_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

/// Concatenate the significant tokens of a node (drops trivia).
fn significant_text(node: &SyntaxNode) -> String {
    node.descendants_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !t.kind().is_trivia())
        .map(|t| t.text().to_string())
        .collect()
}

// ============================================================================
// Root
// ============================================================================

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn statements(&self) -> impl Iterator<Item = Annotate> + '_ {
        self.0.children().filter_map(Annotate::cast)
    }
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(Annotate, ANNOTATE);

impl Annotate {
    pub fn target(&self) -> Option<TargetName> {
        self.0.children().find_map(TargetName::cast)
    }

    /// Annotations written directly on the target, in source order.
    /// Grouped annotations `@( ... )` are flattened.
    pub fn assignments(&self) -> Vec<Assignment> {
        collect_assignments(&self.0)
    }

    pub fn element_blocks(&self) -> impl Iterator<Item = ElementBlock> + '_ {
        self.0.children().filter_map(ElementBlock::cast)
    }
}

fn collect_assignments(node: &SyntaxNode) -> Vec<Assignment> {
    let mut out = Vec::new();
    for child in node.children() {
        match child.kind() {
            SyntaxKind::ANNOTATION_ASSIGNMENT => out.extend(Assignment::cast(child)),
            SyntaxKind::ANNOTATION_GROUP => {
                out.extend(child.children().filter_map(Assignment::cast));
            }
            _ => {}
        }
    }
    out
}

ast_node!(TargetName, TARGET_NAME);

impl TargetName {
    /// The dotted name without trivia, e.g. `CatalogService.Books`
    pub fn text(&self) -> String {
        significant_text(&self.0)
    }
}

ast_node!(ElementBlock, ELEMENT_BLOCK);

impl ElementBlock {
    pub fn entries(&self) -> impl Iterator<Item = ElementEntry> + '_ {
        self.0.children().filter_map(ElementEntry::cast)
    }
}

ast_node!(ElementEntry, ELEMENT_ENTRY);

impl ElementEntry {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        collect_assignments(&self.0)
    }
}

// ============================================================================
// Annotations
// ============================================================================

ast_node!(Assignment, ANNOTATION_ASSIGNMENT);

impl Assignment {
    pub fn name(&self) -> Option<AnnotationName> {
        self.0.children().find_map(AnnotationName::cast)
    }

    pub fn value(&self) -> Option<Value> {
        self.0.children().find_map(Value::cast)
    }
}

ast_node!(AnnotationName, ANNOTATION_NAME);

impl AnnotationName {
    /// Name segments (`UI`, `LineItem`, ...) as tokens
    pub fn segments(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    pub fn qualifier(&self) -> Option<Qualifier> {
        self.0.children().find_map(Qualifier::cast)
    }
}

ast_node!(Qualifier, QUALIFIER);

impl Qualifier {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }
}

// ============================================================================
// Values
// ============================================================================

/// Any annotation value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Record(Record),
    Collection(Collection),
    Path(PathValue),
    Enum(EnumValue),
    Literal(Literal),
}

impl Value {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::RECORD => Some(Self::Record(Record(node))),
            SyntaxKind::COLLECTION => Some(Self::Collection(Collection(node))),
            SyntaxKind::PATH_VALUE => Some(Self::Path(PathValue(node))),
            SyntaxKind::ENUM_VALUE => Some(Self::Enum(EnumValue(node))),
            SyntaxKind::LITERAL => Some(Self::Literal(Literal(node))),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Record(n) => n.syntax(),
            Self::Collection(n) => n.syntax(),
            Self::Path(n) => n.syntax(),
            Self::Enum(n) => n.syntax(),
            Self::Literal(n) => n.syntax(),
        }
    }
}

ast_node!(Record, RECORD);

/// A member of a record: a property or a nested annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordMember {
    Property(RecordProperty),
    Annotation(Assignment),
}

impl Record {
    pub fn members(&self) -> impl Iterator<Item = RecordMember> + '_ {
        self.0.children().filter_map(|child| match child.kind() {
            SyntaxKind::RECORD_PROPERTY => Some(RecordMember::Property(RecordProperty(child))),
            SyntaxKind::ANNOTATION_ASSIGNMENT => Some(RecordMember::Annotation(Assignment(child))),
            _ => None,
        })
    }
}

ast_node!(RecordProperty, RECORD_PROPERTY);

impl RecordProperty {
    /// Property name segments; more than one for flattened keys (`Title.Value`)
    pub fn name_segments(&self) -> Vec<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect()
    }

    pub fn value(&self) -> Option<Value> {
        self.0.children().find_map(Value::cast)
    }
}

ast_node!(Collection, COLLECTION);

impl Collection {
    pub fn items(&self) -> impl Iterator<Item = Value> + '_ {
        self.0.children().filter_map(Value::cast)
    }
}

ast_node!(PathValue, PATH_VALUE);

impl PathValue {
    /// The path with navigation written as `/`, e.g. `author.name` → `author/name`
    pub fn path(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .map(|t| t.text().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

ast_node!(EnumValue, ENUM_VALUE);

impl EnumValue {
    pub fn member(&self) -> Option<SyntaxToken> {
        first_token(&self.0, SyntaxKind::IDENT)
    }
}

ast_node!(Literal, LITERAL);

impl Literal {
    /// The literal's token (for negative numbers, the number token)
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind().is_literal())
    }

    pub fn is_negative(&self) -> bool {
        first_token(&self.0, SyntaxKind::MINUS).is_some()
    }
}
