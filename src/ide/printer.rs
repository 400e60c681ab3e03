//! Serialization of generic AST elements into markup text.

use quick_xml::escape::{escape, partial_escape};

use crate::ast::{Element, Node};
use crate::base::indent;

/// Formatting options for generated markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "camelCase"))]
pub struct PrintOptions {
    /// Spaces per indentation level (also the width of a tab in the source)
    pub tab_width: u32,
    pub use_tabs: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            use_tabs: false,
        }
    }
}

impl PrintOptions {
    pub fn indent(&self, levels: usize) -> String {
        indent(self.tab_width, self.use_tabs, levels)
    }
}

/// Print an element at the given indentation level.
///
/// The first line is indented too. Elements are always written as an
/// open/close pair, never self-closed. Text-only content stays on the tag
/// line; element content goes one level deeper, one child per line, and
/// whitespace-only text between child elements is dropped.
pub fn print_element(element: &Element, options: &PrintOptions, level: usize) -> String {
    let mut printer = Printer {
        options,
        out: String::new(),
    };
    printer.element(element, level);
    printer.out
}

struct Printer<'a> {
    options: &'a PrintOptions,
    out: String,
}

impl Printer<'_> {
    fn element(&mut self, element: &Element, level: usize) {
        let name = element.qualified_name();
        self.out.push_str(&self.options.indent(level));
        self.out.push('<');
        self.out.push_str(&name);
        for attribute in element.attributes.values() {
            self.out.push(' ');
            self.out.push_str(&attribute.name);
            self.out.push_str("=\"");
            self.out.push_str(&escape(attribute.value.as_str()));
            self.out.push('"');
        }
        self.out.push('>');

        if element.child_elements().next().is_none() {
            self.out.push_str(&partial_escape(element.text().as_str()));
        } else {
            for child in &element.content {
                match child {
                    Node::Element(child) => {
                        self.out.push('\n');
                        self.element(child, level + 1);
                    }
                    Node::Text(text) if text.is_whitespace() => {}
                    Node::Text(text) => {
                        self.out.push('\n');
                        self.out.push_str(&self.options.indent(level + 1));
                        self.out.push_str(&partial_escape(text.text.trim()));
                    }
                }
            }
            self.out.push('\n');
            self.out.push_str(&self.options.indent(level));
        }

        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }
}
