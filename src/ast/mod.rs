//! Generic AST shared by every concrete syntax.
//!
//! Converters in [`crate::convert`] produce these trees; the document editor
//! in [`crate::ide`] consumes them. Nodes are plain values with editor
//! ranges and no references back into the source text.
//!
//! Invariants kept by the converters:
//! - a node's `range` contains the ranges of all its descendants;
//! - siblings in `content` are ordered and never overlap.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Range;

/// A child of an element: either a nested element or character data.
///
/// Attributes live in [`Element::attributes`] and never appear here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn range(&self) -> Range {
        match self {
            Node::Element(e) => e.range,
            Node::Text(t) => t.range,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// A borrowed view over any node kind, for exhaustive traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyNode<'a> {
    Element(&'a Element),
    Attribute(&'a Attribute),
    Text(&'a Text),
}

impl<'a> AnyNode<'a> {
    pub fn range(self) -> Range {
        match self {
            AnyNode::Element(e) => e.range,
            AnyNode::Attribute(a) => a.range,
            AnyNode::Text(t) => t.range,
        }
    }

    /// Direct children: attributes first (in source order), then content.
    pub fn children(self) -> Vec<AnyNode<'a>> {
        match self {
            AnyNode::Element(e) => e
                .attributes
                .values()
                .map(AnyNode::Attribute)
                .chain(e.content.iter().map(AnyNode::from))
                .collect(),
            AnyNode::Attribute(_) | AnyNode::Text(_) => Vec::new(),
        }
    }
}

impl<'a> From<&'a Node> for AnyNode<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Element(e) => AnyNode::Element(e),
            Node::Text(t) => AnyNode::Text(t),
        }
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// An element with a local name, optional namespace and ordered attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Local name, without prefix
    pub name: SmolStr,
    /// Namespace URI the prefix resolved to
    pub namespace: Option<SmolStr>,
    /// The prefix as written (`edmx` in `edmx:Reference`)
    pub namespace_alias: Option<SmolStr>,
    /// Attributes keyed by their name as written, unique per element
    pub attributes: IndexMap<SmolStr, Attribute>,
    pub content: Vec<Node>,
    /// From `<` of the start tag to `>` of the end tag
    pub range: Range,
    /// The qualified name in the start tag
    pub name_range: Range,
    /// Between the start and end tags; `None` for self-closing elements
    pub content_range: Option<Range>,
}

impl Element {
    /// A detached element, typically a fragment to be inserted by the editor.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            namespace_alias: None,
            attributes: IndexMap::new(),
            content: Vec::new(),
            range: Range::default(),
            name_range: Range::default(),
            content_range: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<SmolStr>, alias: Option<&str>) -> Self {
        self.namespace = Some(namespace.into());
        self.namespace_alias = alias.map(SmolStr::new);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        let attribute = Attribute::new(name, value);
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.content.push(child.into());
        self
    }

    /// `prefix:name`, or the bare name when no prefix is set.
    pub fn qualified_name(&self) -> String {
        match &self.namespace_alias {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, self.name),
            _ => self.name.to_string(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|a| a.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(Node::as_element)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// Concatenated text content of the direct text children.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(Node::as_text)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn is_self_closing(&self) -> bool {
        self.content_range.is_none()
    }

    /// Depth-first pre-order walk over this element and all nested elements.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children: Vec<_> = current.child_elements().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

// ============================================================================
// ATTRIBUTE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    /// Unescaped value
    pub value: String,
    /// From the name to the closing quote
    pub range: Range,
    pub name_range: Range,
    /// Inside the quotes
    pub value_range: Range,
}

impl Attribute {
    pub fn new(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            range: Range::default(),
            name_range: Range::default(),
            value_range: Range::default(),
        }
    }
}

// ============================================================================
// TEXT
// ============================================================================

/// How a multi-line text value was written in its source syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultilineType {
    /// `` `...` `` with escape sequences
    Plain,
    /// ```` ```...``` ```` with indentation stripping
    Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    /// Unescaped text
    pub text: String,
    pub range: Range,
    pub multiline_type: Option<MultilineType>,
    /// Ranges of the individual source fragments when the text was split
    /// (CDATA sections, comments between runs)
    pub fragment_ranges: Vec<Range>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            range: Range::default(),
            multiline_type: None,
            fragment_ranges: Vec::new(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Top-level content of a parsed document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub content: Vec<Node>,
    pub range: Range,
}

impl Document {
    /// The first top-level element.
    pub fn root(&self) -> Option<&Element> {
        self.content.iter().find_map(Node::as_element)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(Node::as_element)
    }
}
