//! Markup CST → generic AST.
//!
//! Structural re-shaping only: every element, attribute and text run of
//! the concrete tree becomes a generic node with its exact editor range.
//! Namespace prefixes are resolved against the `xmlns` declarations in
//! scope and character data is unescaped.

use rowan::{NodeOrToken, TextRange, TextSize};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::ast::{Attribute, Document, Element, Node, Text};
use crate::base::LineIndex;
use crate::hir::diagnostics::{Diagnostic, DiagnosticCollector};
use crate::hir::terms::{PathKind, PathSet};
use crate::syntax::markup::{Parse, SyntaxKind, SyntaxNode, SyntaxToken};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Result of converting a markup document.
#[derive(Clone, Debug, Default)]
pub struct MarkupConversion {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    /// Path expressions and annotation targets found in the document
    pub path_set: PathSet,
}

/// Convert a parsed markup document into the generic AST.
pub fn convert(parse: &Parse, line_index: &LineIndex) -> MarkupConversion {
    let mut converter = Converter {
        line_index,
        diagnostics: DiagnosticCollector::new(),
        path_set: PathSet::new(),
        scopes: Vec::new(),
        elements: 0,
    };
    converter.diagnostics.syntax_errors(&parse.errors, line_index);

    let root = parse.syntax();
    let document = Document {
        content: converter.convert_content(&root),
        range: line_index.range(root.text_range()),
    };

    tracing::debug!(
        elements = converter.elements,
        diagnostics = converter.diagnostics.len(),
        paths = converter.path_set.len(),
        "converted markup document"
    );

    MarkupConversion {
        document,
        diagnostics: converter.diagnostics.into_vec(),
        path_set: converter.path_set,
    }
}

struct Converter<'a> {
    line_index: &'a LineIndex,
    diagnostics: DiagnosticCollector,
    path_set: PathSet,
    /// `xmlns` declarations per open element; the empty prefix is the default namespace
    scopes: Vec<FxHashMap<SmolStr, SmolStr>>,
    elements: usize,
}

impl Converter<'_> {
    fn range(&self, range: TextRange) -> crate::base::Range {
        self.line_index.range(range)
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Convert the children of a DOCUMENT or CONTENT node.
    ///
    /// Adjacent TEXT and CDATA tokens form one text node; comments and
    /// processing instructions between them do not split the run.
    fn convert_content(&mut self, parent: &SyntaxNode) -> Vec<Node> {
        let mut content = Vec::new();
        let mut run: Vec<(String, TextRange)> = Vec::new();

        for child in parent.children_with_tokens() {
            match child {
                NodeOrToken::Token(token) => match token.kind() {
                    SyntaxKind::TEXT => {
                        let text = self.unescape(&token);
                        run.push((text, token.text_range()));
                    }
                    SyntaxKind::CDATA => {
                        run.push((cdata_inner(token.text()).to_string(), token.text_range()));
                    }
                    _ => {}
                },
                NodeOrToken::Node(node) if node.kind() == SyntaxKind::ELEMENT => {
                    self.flush_text(&mut run, &mut content);
                    if let Some(element) = self.convert_element(&node) {
                        content.push(Node::Element(element));
                    }
                }
                NodeOrToken::Node(node) => {
                    tracing::trace!(kind = ?node.kind(), "skipping node in content");
                }
            }
        }
        self.flush_text(&mut run, &mut content);

        if content.iter().any(|n| matches!(n, Node::Element(_))) {
            content.retain(|n| !matches!(n, Node::Text(t) if t.is_whitespace()));
        }
        content
    }

    fn flush_text(&mut self, run: &mut Vec<(String, TextRange)>, content: &mut Vec<Node>) {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return;
        };
        let range = TextRange::new(first.1.start(), last.1.end());
        let fragment_ranges = if run.len() > 1 {
            run.iter().map(|(_, r)| self.range(*r)).collect()
        } else {
            Vec::new()
        };
        let text: String = run.drain(..).map(|(text, _)| text).collect();

        content.push(Node::Text(Text {
            text,
            range: self.range(range),
            multiline_type: None,
            fragment_ranges,
        }));
    }

    fn unescape(&mut self, token: &SyntaxToken) -> String {
        match quick_xml::escape::unescape(token.text()) {
            Ok(text) => text.into_owned(),
            Err(err) => {
                self.diagnostics.add(
                    Diagnostic::error(self.range(token.text_range()), format!("invalid escape: {}", err))
                        .with_code(crate::hir::codes::PARSE_ERROR),
                );
                token.text().to_string()
            }
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn convert_element(&mut self, node: &SyntaxNode) -> Option<Element> {
        let start_tag = node.children().find(|n| n.kind() == SyntaxKind::START_TAG)?;
        let Some(name_token) = first_token(&start_tag, SyntaxKind::NAME) else {
            tracing::trace!("skipping element without a name");
            return None;
        };
        self.elements += 1;

        let attribute_nodes: Vec<_> = start_tag
            .children()
            .filter(|n| n.kind() == SyntaxKind::ATTRIBUTE)
            .collect();

        // Declarations on this element are in scope for its own name
        let mut scope = FxHashMap::default();
        for attribute in &attribute_nodes {
            if let Some((name, value)) = attribute_parts(attribute) {
                let name = name.text();
                if name == "xmlns" {
                    scope.insert(SmolStr::new(""), SmolStr::new(string_inner(value.text())));
                } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                    scope.insert(SmolStr::new(prefix), SmolStr::new(string_inner(value.text())));
                }
            }
        }
        self.scopes.push(scope);

        let name_range = self.range(name_token.text_range());
        let (prefix, local) = split_qualified(name_token.text());
        let namespace = match prefix {
            Some(prefix) => {
                let namespace = self.namespace_for(prefix);
                if namespace.is_none() {
                    self.diagnostics.unknown_namespace_prefix(name_range, prefix);
                }
                namespace
            }
            None => self.namespace_for(""),
        };

        let mut element = Element::new(local);
        element.namespace = namespace;
        element.namespace_alias = prefix.map(SmolStr::new);
        element.range = self.range(node.text_range());
        element.name_range = name_range;

        for attribute_node in &attribute_nodes {
            let Some(attribute) = self.convert_attribute(attribute_node) else {
                continue;
            };
            if element.attributes.contains_key(&attribute.name) {
                self.diagnostics.duplicate_attribute(attribute.name_range, &attribute.name);
                continue;
            }
            element.attributes.insert(attribute.name.clone(), attribute);
        }

        let closed_by_angle = start_tag
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .last()
            .is_some_and(|t| t.kind() == SyntaxKind::R_ANGLE);

        if closed_by_angle {
            let end = node
                .children()
                .find(|n| n.kind() == SyntaxKind::END_TAG)
                .map(|end_tag| end_tag.text_range().start())
                .unwrap_or_else(|| node.text_range().end());
            element.content_range = Some(self.range(TextRange::new(start_tag.text_range().end(), end)));
            if let Some(content) = node.children().find(|n| n.kind() == SyntaxKind::CONTENT) {
                element.content = self.convert_content(&content);
            }
        }

        self.scopes.pop();
        self.collect_paths(&element);
        Some(element)
    }

    fn convert_attribute(&mut self, node: &SyntaxNode) -> Option<Attribute> {
        let Some((name, value)) = attribute_parts(node) else {
            tracing::trace!(range = ?node.text_range(), "skipping attribute without value");
            return None;
        };

        let (prefix, _) = split_qualified(name.text());
        if let Some(prefix) = prefix.filter(|p| *p != "xmlns") {
            if self.namespace_for(prefix).is_none() {
                self.diagnostics
                    .unknown_namespace_prefix(self.range(name.text_range()), prefix);
            }
        }

        let raw = string_inner(value.text());
        let value_range = value.text_range();
        let one = TextSize::from(1);
        let inner = if value_range.len() >= TextSize::from(2) {
            TextRange::new(value_range.start() + one, value_range.end() - one)
        } else {
            value_range
        };
        let unescaped = match quick_xml::escape::unescape(raw) {
            Ok(text) => text.into_owned(),
            Err(err) => {
                self.diagnostics.add(
                    Diagnostic::error(self.range(inner), format!("invalid escape: {}", err))
                        .with_code(crate::hir::codes::PARSE_ERROR),
                );
                raw.to_string()
            }
        };

        Some(Attribute {
            name: SmolStr::new(name.text()),
            value: unescaped,
            range: self.range(TextRange::new(name.text_range().start(), value_range.end())),
            name_range: self.range(name.text_range()),
            value_range: self.range(inner),
        })
    }

    fn namespace_for(&self, prefix: &str) -> Option<SmolStr> {
        if prefix == "xml" {
            return Some(SmolStr::new(XML_NAMESPACE));
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix).cloned())
    }

    // =========================================================================
    // Path set
    // =========================================================================

    fn collect_paths(&mut self, element: &Element) {
        if PathKind::from_name(&element.name).is_some() {
            let text = element.text();
            let path = text.trim();
            if !path.is_empty() {
                self.path_set.insert(path);
            }
        }
        for attribute in element.attributes.values() {
            if PathKind::from_name(&attribute.name).is_some() && !attribute.value.is_empty() {
                self.path_set.insert(attribute.value.as_str());
            }
        }
        if element.name == "Annotations" {
            if let Some(target) = element.attribute_value("Target") {
                self.path_set.insert(target);
            }
        }
    }
}

fn first_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

/// Name and value tokens of an ATTRIBUTE node; `None` when the value is missing.
fn attribute_parts(node: &SyntaxNode) -> Option<(SyntaxToken, SyntaxToken)> {
    let name = first_token(node, SyntaxKind::NAME)?;
    let value = first_token(node, SyntaxKind::STRING)?;
    Some((name, value))
}

fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn string_inner(quoted: &str) -> &str {
    let bytes = quoted.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        &quoted[1..quoted.len() - 1]
    } else {
        quoted
    }
}

fn cdata_inner(text: &str) -> &str {
    text.strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Range;
    use crate::syntax::markup::parse;

    fn convert_text(text: &str) -> MarkupConversion {
        convert(&parse(text), &LineIndex::new(text))
    }

    #[test]
    fn test_text_child_keeps_whitespace() {
        let result = convert_text("<a>  abc </a>");
        let a = result.document.root().unwrap();
        assert_eq!(a.name, "a");
        assert_eq!(a.range, Range::from_coords(0, 0, 0, 13));
        assert_eq!(a.content.len(), 1);
        let text = a.content[0].as_text().unwrap();
        assert_eq!(text.text, "  abc ");
        assert_eq!(text.range, Range::from_coords(0, 3, 0, 9));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_ranges_and_namespaces() {
        let text = "<edmx:Edmx xmlns:edmx=\"urn:edmx\" Version=\"4.0\">\n  <edmx:Reference Uri=\"/x\"/>\n</edmx:Edmx>";
        let result = convert_text(text);
        let edmx = result.document.root().unwrap();

        assert_eq!(edmx.namespace.as_deref(), Some("urn:edmx"));
        assert_eq!(edmx.namespace_alias.as_deref(), Some("edmx"));
        assert_eq!(edmx.name_range, Range::from_coords(0, 1, 0, 10));
        assert_eq!(edmx.content_range, Some(Range::from_coords(0, 47, 2, 0)));

        let version = edmx.attribute("Version").unwrap();
        assert_eq!(version.value, "4.0");
        assert_eq!(version.name_range, Range::from_coords(0, 33, 0, 40));
        assert_eq!(version.value_range, Range::from_coords(0, 42, 0, 45));
        assert_eq!(version.range, Range::from_coords(0, 33, 0, 46));

        // whitespace between child elements is dropped
        assert_eq!(edmx.content.len(), 1);
        let reference = edmx.child_elements().next().unwrap();
        assert_eq!(reference.qualified_name(), "edmx:Reference");
        assert!(reference.is_self_closing());
        assert_eq!(reference.range, Range::from_coords(1, 2, 1, 28));
    }

    #[test]
    fn test_unescape_and_cdata_merge() {
        let result = convert_text("<a>x &amp; <!-- c --><![CDATA[<y>]]></a>");
        let a = result.document.root().unwrap();
        let text = a.content[0].as_text().unwrap();
        assert_eq!(text.text, "x & <y>");
        assert_eq!(text.fragment_ranges.len(), 2);
        assert_eq!(a.content.len(), 1);
    }

    #[test]
    fn test_attribute_value_unescaped() {
        let result = convert_text("<a b=\"x &lt; y\"/>");
        let a = result.document.root().unwrap();
        assert_eq!(a.attribute_value("b"), Some("x < y"));
    }

    #[test]
    fn test_unknown_prefix_and_duplicates() {
        let result = convert_text("<p:a b=\"1\" b=\"2\"/>");
        let codes: Vec<_> = result
            .diagnostics
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect();
        assert_eq!(codes, vec!["E0102", "E0103"]);
        let a = result.document.root().unwrap();
        assert_eq!(a.attribute_value("b"), Some("1"));
    }

    #[test]
    fn test_attribute_without_value_is_skipped() {
        let result = convert_text("<a b c=\"1\"/>");
        let a = result.document.root().unwrap();
        assert!(a.attribute("b").is_none());
        assert_eq!(a.attribute_value("c"), Some("1"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("E0101"));
    }

    #[test]
    fn test_malformed_element_keeps_rest() {
        let result = convert_text("<a><b></a>");
        let a = result.document.root().unwrap();
        assert_eq!(a.child_elements().next().map(|b| b.name.as_str()), Some("b"));
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_path_set() {
        let text = r#"<Annotations Target="S.Books"><Annotation Term="UI.Facets" Path="a/b"><PropertyPath>c</PropertyPath><PropertyPath> c </PropertyPath></Annotation></Annotations>"#;
        let result = convert_text(text);
        assert_eq!(result.path_set.iter().collect::<Vec<_>>(), vec!["c", "a/b", "S.Books"]);
    }
}
