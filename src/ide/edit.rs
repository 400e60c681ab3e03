//! Format-preserving edits on markup documents.
//!
//! The editor works from the ranges recorded in the generic AST and never
//! re-parses the document. Every operation yields a single [`TextEdit`];
//! text outside its range stays byte-for-byte unchanged.

use quick_xml::escape::escape;
use text_size::{TextRange, TextSize};

use super::error::EditError;
use super::printer::{PrintOptions, print_element};
use crate::ast::Element;
use crate::base::{LineIndex, Position, Range, get_indent_level};

/// A single textual replacement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "interchange", serde(rename_all = "camelCase"))]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    /// Pure insertion at `position`.
    pub fn insert(position: Position, new_text: impl Into<String>) -> Self {
        Self {
            range: Range::point(position),
            new_text: new_text.into(),
        }
    }

    pub fn replace(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Splice the edit into `text`.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        let range = LineIndex::new(text)
            .text_range(self.range)
            .ok_or(EditError::InvalidRange { range: self.range })?;
        let start = usize::from(range.start());
        let end = usize::from(range.end());

        let mut out = String::with_capacity(text.len() - (end - start) + self.new_text.len());
        out.push_str(&text[..start]);
        out.push_str(&self.new_text);
        out.push_str(&text[end..]);
        Ok(out)
    }
}

/// Produces edits against one version of a document's text.
///
/// Elements passed in must come from converting this same text; the
/// editor checks each target's name at its recorded range and reports
/// [`EditError::StaleTarget`] when it doesn't match.
#[derive(Debug)]
pub struct DocumentEditor<'t> {
    text: &'t str,
    line_index: LineIndex,
    options: PrintOptions,
}

impl<'t> DocumentEditor<'t> {
    pub fn new(text: &'t str, options: PrintOptions) -> Self {
        Self {
            text,
            line_index: LineIndex::new(text),
            options,
        }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    /// Insert `element` as the last child of `target`, immediately before
    /// its end tag.
    ///
    /// - an end tag on a line of its own gets the new element on the line above;
    /// - an end tag sharing a line with content is moved to a new line;
    /// - empty or whitespace-only content is replaced;
    /// - a self-closing target has `/>` expanded into an explicit end tag.
    pub fn insert(&self, target: &Element, element: &Element) -> Result<TextEdit, EditError> {
        self.check_target(target)?;
        let level = self.indent_level(target);
        let printed = print_element(element, &self.options, level + 1);
        let closing_indent = self.options.indent(level);

        let edit = match target.content_range {
            Some(content) if self.slice(content)?.trim().is_empty() => {
                TextEdit::replace(content, format!("\n{}\n{}", printed, closing_indent))
            }
            Some(content) => {
                let end_tag = content.end;
                let line_start = Position::new(end_tag.line, 0);
                let own_line = end_tag.line > content.start.line
                    && self.slice(Range::new(line_start, end_tag))?.trim().is_empty();
                if own_line {
                    TextEdit::insert(line_start, format!("{}\n", printed))
                } else {
                    TextEdit::insert(end_tag, format!("\n{}\n{}", printed, closing_indent))
                }
            }
            None => {
                let tag_end = self.self_closing_end(target)?;
                TextEdit::replace(
                    tag_end,
                    format!(">\n{}\n{}</{}>", printed, closing_indent, target.qualified_name()),
                )
            }
        };

        tracing::debug!(range = %edit.range, target = %target.qualified_name(), "insert edit");
        Ok(edit)
    }

    /// Replace `target` (tags and content) with `element`.
    pub fn replace(&self, target: &Element, element: &Element) -> Result<TextEdit, EditError> {
        self.check_target(target)?;
        let level = self.indent_level(target);
        let printed = print_element(element, &self.options, level);
        let leading = self.options.indent(level);
        let new_text = printed.strip_prefix(leading.as_str()).unwrap_or(&printed);

        let edit = TextEdit::replace(target.range, new_text);
        tracing::debug!(range = %edit.range, target = %target.qualified_name(), "replace edit");
        Ok(edit)
    }

    /// Set an attribute value, replacing the existing value or appending
    /// the attribute after the last one.
    pub fn set_attribute(&self, element: &Element, name: &str, value: &str) -> Result<TextEdit, EditError> {
        self.check_target(element)?;
        let value = escape(value);

        let edit = match element.attribute(name) {
            Some(attribute) => TextEdit::replace(attribute.value_range, value.into_owned()),
            None => {
                let anchor = element
                    .attributes
                    .values()
                    .map(|a| a.range.end)
                    .max()
                    .unwrap_or(element.name_range.end);
                TextEdit::insert(anchor, format!(" {}=\"{}\"", name, value))
            }
        };

        tracing::debug!(range = %edit.range, attribute = name, "set attribute edit");
        Ok(edit)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn text_range(&self, range: Range) -> Result<TextRange, EditError> {
        let start = self.offset(range.start, range)?;
        let end = self.offset(range.end, range)?;
        if start > end {
            return Err(EditError::InvalidRange { range });
        }
        Ok(TextRange::new(start, end))
    }

    fn offset(&self, position: Position, range: Range) -> Result<TextSize, EditError> {
        if let Some(offset) = self.line_index.offset(position) {
            return Ok(offset);
        }
        // the next column resolves only when `position` splits a surrogate pair
        let next = Position::new(position.line, position.character.saturating_add(1));
        match self.line_index.offset(next) {
            Some(_) => Err(EditError::InvalidRange { range }),
            None => Err(EditError::PositionOutOfBounds { position }),
        }
    }

    fn slice(&self, range: Range) -> Result<&'t str, EditError> {
        let range = self.text_range(range)?;
        let text: &'t str = self.text;
        Ok(&text[range])
    }

    /// The element's name must still be at its recorded position.
    fn check_target(&self, element: &Element) -> Result<(), EditError> {
        let expected = element.qualified_name();
        let found = self.slice(element.name_range)?;
        if found != expected {
            return Err(EditError::StaleTarget {
                expected,
                found: found.to_string(),
                range: element.name_range,
            });
        }
        self.text_range(element.range)?;
        Ok(())
    }

    /// The `/>` closing a self-closing element.
    fn self_closing_end(&self, element: &Element) -> Result<Range, EditError> {
        let end = element.range.end;
        let start = Position::new(end.line, end.character.saturating_sub(2));
        let range = Range::new(start, end);
        let found = self.slice(range)?;
        if found != "/>" {
            return Err(EditError::StaleTarget {
                expected: "/>".to_string(),
                found: found.to_string(),
                range,
            });
        }
        Ok(range)
    }

    /// Indentation level of the line holding the element's start tag.
    ///
    /// Tabs count as `tab_width` columns; an unknown level counts as 0.
    fn indent_level(&self, element: &Element) -> usize {
        let start = element.range.start;
        let column = match (
            self.line_index.offset(Position::new(start.line, 0)),
            self.line_index.offset(start),
        ) {
            (Some(line_start), Some(offset)) => self.text[TextRange::new(line_start, offset)]
                .chars()
                .map(|c| if c == '\t' { i64::from(self.options.tab_width) } else { 1 })
                .sum(),
            _ => i64::from(start.character),
        };
        let level = get_indent_level(column, self.options.tab_width);
        usize::try_from(level).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Document, Text};
    use crate::convert::markup;
    use crate::syntax::markup::parse;

    const EDMX: &str = "http://docs.oasis-open.org/odata/ns/edmx";

    fn document(text: &str) -> Document {
        markup::convert(&parse(text), &LineIndex::new(text)).document
    }

    fn editor(text: &str) -> DocumentEditor<'_> {
        DocumentEditor::new(text, PrintOptions::default())
    }

    #[test]
    fn test_insert_after_last_child() {
        let text = "<edmx:Edmx xmlns:edmx=\"http://docs.oasis-open.org/odata/ns/edmx\" Version=\"4.0\">\n    <edmx:DataServices/>\n</edmx:Edmx>";
        let doc = document(text);
        let root = doc.root().unwrap();
        let reference = Element::new("Reference")
            .with_namespace(EDMX, Some("edmx"))
            .with_attribute("Uri", "/vocab");

        let edit = editor(text).insert(root, &reference).unwrap();
        assert_eq!(edit.range, Range::from_coords(2, 0, 2, 0));
        assert_eq!(edit.new_text, "    <edmx:Reference Uri=\"/vocab\"></edmx:Reference>\n");
        assert_eq!(
            edit.apply(text).unwrap(),
            "<edmx:Edmx xmlns:edmx=\"http://docs.oasis-open.org/odata/ns/edmx\" Version=\"4.0\">\n    <edmx:DataServices/>\n    <edmx:Reference Uri=\"/vocab\"></edmx:Reference>\n</edmx:Edmx>"
        );
    }

    #[test]
    fn test_insert_before_end_tag_on_content_line() {
        let text = "<a><b/></a>";
        let doc = document(text);
        let edit = editor(text).insert(doc.root().unwrap(), &Element::new("c")).unwrap();
        assert_eq!(edit.range, Range::from_coords(0, 7, 0, 7));
        assert_eq!(edit.apply(text).unwrap(), "<a><b/>\n    <c></c>\n</a>");
    }

    #[test]
    fn test_insert_after_trailing_comment() {
        let text = "<a>\n    <b/> <!-- note -->\n</a>";
        let doc = document(text);
        let edit = editor(text).insert(doc.root().unwrap(), &Element::new("c")).unwrap();
        assert_eq!(
            edit.apply(text).unwrap(),
            "<a>\n    <b/> <!-- note -->\n    <c></c>\n</a>"
        );
    }

    #[test]
    fn test_insert_after_text_content() {
        let text = "<a>\n    note</a>";
        let doc = document(text);
        let edit = editor(text).insert(doc.root().unwrap(), &Element::new("c")).unwrap();
        assert_eq!(edit.apply(text).unwrap(), "<a>\n    note\n    <c></c>\n</a>");
    }

    #[test]
    fn test_insert_into_self_closing() {
        let text = "<Annotations Target=\"S.Books\"/>";
        let doc = document(text);
        let target = doc.root().unwrap();
        let annotation = Element::new("Annotation").with_attribute("Term", "UI.Hidden");

        let edit = editor(text).insert(target, &annotation).unwrap();
        assert_eq!(edit.range, Range::from_coords(0, 29, 0, 31));
        assert_eq!(
            edit.apply(text).unwrap(),
            "<Annotations Target=\"S.Books\">\n    <Annotation Term=\"UI.Hidden\"></Annotation>\n</Annotations>"
        );
    }

    #[test]
    fn test_insert_into_whitespace_content() {
        let text = "<Annotations Target=\"S.Books\">\n</Annotations>";
        let doc = document(text);
        let target = doc.root().unwrap();
        let annotation = Element::new("Annotation").with_attribute("Term", "UI.Hidden");

        let edit = editor(text).insert(target, &annotation).unwrap();
        assert_eq!(
            edit.apply(text).unwrap(),
            "<Annotations Target=\"S.Books\">\n    <Annotation Term=\"UI.Hidden\"></Annotation>\n</Annotations>"
        );
    }

    #[test]
    fn test_insert_uses_target_indentation() {
        let text = "<Root>\n    <Annotations Target=\"A\">\n        <Annotation Term=\"X\"/>\n    </Annotations>\n</Root>";
        let doc = document(text);
        let target = doc.root().unwrap().child_elements().next().unwrap();
        let annotation = Element::new("Annotation")
            .with_attribute("Term", "Y")
            .with_child(Element::new("String").with_child(Text::new("v")));

        let edit = editor(text).insert(target, &annotation).unwrap();
        assert_eq!(
            edit.apply(text).unwrap(),
            "<Root>\n    <Annotations Target=\"A\">\n        <Annotation Term=\"X\"/>\n        <Annotation Term=\"Y\">\n            <String>v</String>\n        </Annotation>\n    </Annotations>\n</Root>"
        );
    }

    #[test]
    fn test_tab_indented_target() {
        let text = "<Root>\n\t<Annotations Target=\"A\"/>\n</Root>";
        let doc = document(text);
        let target = doc.root().unwrap().child_elements().next().unwrap();
        let options = PrintOptions {
            tab_width: 4,
            use_tabs: true,
        };

        let edit = DocumentEditor::new(text, options)
            .insert(target, &Element::new("Annotation"))
            .unwrap();
        assert_eq!(edit.new_text, ">\n\t\t<Annotation></Annotation>\n\t</Annotations>");
    }

    #[test]
    fn test_replace_element() {
        let text = "<Annotations Target=\"A\">\n    <Annotation Term=\"X\"/>\n</Annotations>";
        let doc = document(text);
        let old = doc.root().unwrap().child_elements().next().unwrap();
        let new = Element::new("Annotation")
            .with_attribute("Term", "X")
            .with_attribute("Bool", "false");

        let edit = editor(text).replace(old, &new).unwrap();
        assert_eq!(
            edit.apply(text).unwrap(),
            "<Annotations Target=\"A\">\n    <Annotation Term=\"X\" Bool=\"false\"></Annotation>\n</Annotations>"
        );
    }

    #[test]
    fn test_set_attribute() {
        let text = "<Annotation Term=\"UI.Hidden\"/>";
        let doc = document(text);
        let element = doc.root().unwrap();
        let editor = editor(text);

        let replaced = editor.set_attribute(element, "Term", "UI.Label").unwrap();
        assert_eq!(replaced.apply(text).unwrap(), "<Annotation Term=\"UI.Label\"/>");

        let added = editor.set_attribute(element, "String", "a & b").unwrap();
        assert_eq!(
            added.apply(text).unwrap(),
            "<Annotation Term=\"UI.Hidden\" String=\"a &amp; b\"/>"
        );
    }

    #[test]
    fn test_stale_target_is_rejected() {
        let original = "<Annotations Target=\"A\"/>";
        let doc = document(original);
        let target = doc.root().unwrap();

        let changed = "<Annotation Target=\"A\"/>";
        let result = editor(changed).insert(target, &Element::new("Annotation"));
        assert!(matches!(result, Err(EditError::StaleTarget { .. })));

        let truncated = "<Annot";
        let result = editor(truncated).insert(target, &Element::new("Annotation"));
        assert!(matches!(result, Err(EditError::PositionOutOfBounds { .. })));
    }

    #[test]
    fn test_split_surrogate_pair_is_an_error() {
        let edit = TextEdit::insert(Position::new(0, 2), "x");
        assert_eq!(edit.apply("<😀>"), Err(EditError::InvalidRange { range: edit.range }));

        let doc = document("<a/>");
        let result = editor("<😀/>").insert(doc.root().unwrap(), &Element::new("b"));
        assert!(matches!(result, Err(EditError::InvalidRange { .. })));
    }

    #[test]
    fn test_apply_rejects_out_of_range_edit() {
        let edit = TextEdit::insert(Position::new(3, 0), "x");
        assert_eq!(
            edit.apply("one line"),
            Err(EditError::InvalidRange { range: edit.range })
        );
    }
}
