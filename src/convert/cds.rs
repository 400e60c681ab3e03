//! CDS annotation CST → annotation term tree.
//!
//! CDS has no element/attribute structure, so this converter goes straight
//! to terms. Names are interpreted through the vocabulary:
//!
//! - `@UI.HeaderInfo.TypeName: 'Book'` is the term `UI.HeaderInfo` with the
//!   flattened property path `TypeName`; flattened assignments to the same
//!   term, target and qualifier are merged into one record.
//! - a string where the vocabulary expects a path type becomes a path
//!   expression; `#High` becomes a member of the expected enum type.
//! - dotted paths (`author.name`) are written with `/` in the term tree.

use rowan::TextRange;

use crate::base::{LineIndex, Range};
use crate::hir::alias::{AliasInformation, resolve_name};
use crate::hir::diagnostics::DiagnosticCollector;
use crate::hir::resolve::canonical_path;
use crate::hir::terms::{
    Collection, PathExpression, PathKind, PathSet, Primitive, PrimitiveValue, PropertyValue, Record,
    Term, TermTree, Value,
};
use crate::hir::vocabulary::{VocabularyService, path_kind_of_type};
use crate::ast::MultilineType;
use crate::syntax::cds::{self, AstNode, Parse, SourceFile, SyntaxKind, SyntaxToken};

use super::{ConvertContext, Expected, check_allowed, check_enum_member};

/// Convert a parsed CDS source into a term tree.
pub fn convert(parse: &Parse, line_index: &LineIndex, context: &ConvertContext<'_>) -> TermTree {
    let mut converter = CdsConverter {
        vocabulary: context.vocabulary,
        aliases: &context.aliases,
        line_index,
        diagnostics: DiagnosticCollector::new(),
        path_set: PathSet::new(),
        terms: Vec::new(),
    };
    converter.diagnostics.syntax_errors(&parse.errors, line_index);

    if let Some(file) = SourceFile::cast(parse.syntax()) {
        for statement in file.statements() {
            converter.convert_statement(&statement);
        }
    }

    tracing::debug!(
        terms = converter.terms.len(),
        diagnostics = converter.diagnostics.len(),
        paths = converter.path_set.len(),
        "converted CDS annotations"
    );

    TermTree {
        terms: converter.terms,
        diagnostics: converter.diagnostics.into_vec(),
        path_set: converter.path_set,
    }
}

struct CdsConverter<'a> {
    vocabulary: &'a dyn VocabularyService,
    aliases: &'a AliasInformation,
    line_index: &'a LineIndex,
    diagnostics: DiagnosticCollector,
    path_set: PathSet,
    terms: Vec<Term>,
}

impl<'a> CdsConverter<'a> {
    fn range(&self, range: TextRange) -> Range {
        self.line_index.range(range)
    }

    fn token_segments(&self, tokens: &[SyntaxToken]) -> Vec<(String, Range)> {
        tokens
            .iter()
            .map(|t| (t.text().to_string(), self.range(t.text_range())))
            .collect()
    }

    // =========================================================================
    // Statements and terms
    // =========================================================================

    fn convert_statement(&mut self, statement: &cds::Annotate) {
        let Some(target_name) = statement.target() else {
            tracing::trace!("skipping annotate statement without target");
            return;
        };
        let target = canonical_path(&target_name.text(), self.aliases);
        let target_range = self.range(target_name.syntax().text_range());

        for assignment in statement.assignments() {
            if let Some(term) = self.convert_term(&assignment, &target, target_range) {
                self.push_term(term);
            }
        }

        for block in statement.element_blocks() {
            for entry in block.entries() {
                let Some(element) = entry.name() else {
                    continue;
                };
                let element_target = format!("{}/{}", target, element.text());
                let element_range = self.range(element.text_range());
                for assignment in entry.assignments() {
                    if let Some(term) = self.convert_term(&assignment, &element_target, element_range) {
                        self.push_term(term);
                    }
                }
            }
        }
    }

    /// Add a term, merging it into an earlier one for the same target,
    /// term and qualifier.
    fn push_term(&mut self, term: Term) {
        let existing = self.terms.iter_mut().find(|t| {
            t.target == term.target && t.qualified_name == term.qualified_name && t.qualifier == term.qualifier
        });
        let Some(existing) = existing else {
            self.terms.push(term);
            return;
        };

        existing.range = existing.range.cover(term.range);
        existing.annotations.extend(term.annotations);
        match (&mut existing.value, term.value) {
            (Some(Value::Record(into)), Some(Value::Record(from))) => merge_records(into, from),
            (slot, Some(value)) => *slot = Some(value),
            (_, None) => {}
        }
    }

    /// Look up the term named by an assignment and convert its value.
    ///
    /// The longest name prefix that is a vocabulary term wins; remaining
    /// segments form a flattened property path.
    fn convert_term(&mut self, assignment: &cds::Assignment, target: &str, target_range: Range) -> Option<Term> {
        let name = assignment.name()?;
        let tokens = name.segments();
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return None;
        };
        let name_range = self.range(TextRange::new(first.text_range().start(), last.text_range().end()));
        let segments = self.token_segments(&tokens);
        let texts: Vec<&str> = segments.iter().map(|(text, _)| text.as_str()).collect();

        let vocabulary = self.vocabulary;
        let found = (2..=texts.len()).rev().find_map(|n| {
            let written = texts[..n].join(".");
            let qualified = resolve_name(&written, self.aliases).q_name;
            vocabulary
                .term(&qualified)
                .map(|definition| (n, written, qualified, definition))
        });
        let Some((n, written, qualified_name, definition)) = found else {
            self.diagnostics.unknown_term(name_range, &texts.join("."));
            return None;
        };

        let range = self.range(assignment.syntax().text_range());
        let expected = Expected::of_term(definition);
        let value = if n == segments.len() {
            assignment.value().and_then(|v| self.convert_value(&v, expected))
        } else {
            let type_name = expected.type_name;
            self.build_property(type_name, &segments[n..], assignment.value(), range)
                .map(|property| {
                    Value::Record(Record {
                        type_name: type_name.map(str::to_string),
                        properties: vec![property],
                        annotations: Vec::new(),
                        range,
                    })
                })
        };

        let mut term = Term::new(target, written, qualified_name);
        term.target_range = target_range;
        term.qualifier = name
            .qualifier()
            .and_then(|q| q.name())
            .map(|t| t.text().to_string());
        term.range = range;
        term.name_range = name_range;
        term.value = value;
        Some(term)
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn convert_value(&mut self, value: &cds::Value, expected: Expected<'a>) -> Option<Value> {
        let range = self.range(value.syntax().text_range());
        match value {
            cds::Value::Literal(literal) => self.convert_literal(literal, range, expected),
            cds::Value::Enum(member) => {
                let name = member.member()?;
                let primitive = match expected.type_name {
                    Some(type_name) if self.vocabulary.enum_type(type_name).is_some() => {
                        let canonical = format!("{}/{}", type_name, name.text());
                        check_enum_member(self.vocabulary, &canonical, range, &mut self.diagnostics);
                        Primitive::EnumMember(canonical)
                    }
                    _ => Primitive::EnumMember(name.text().to_string()),
                };
                check_allowed(&primitive, range, expected.constraints, &mut self.diagnostics);
                Some(Value::Primitive(PrimitiveValue::new(primitive, range)))
            }
            cds::Value::Path(path) => {
                let kind = expected
                    .type_name
                    .and_then(path_kind_of_type)
                    .unwrap_or(PathKind::Path);
                Some(self.path(kind, path.path(), range))
            }
            cds::Value::Record(record) => Some(Value::Record(self.convert_record(record, range, expected))),
            cds::Value::Collection(collection) => {
                let item = expected.item();
                let items = collection
                    .items()
                    .filter_map(|v| self.convert_value(&v, item))
                    .collect();
                Some(Value::Collection(Collection { items, range }))
            }
        }
    }

    fn path(&mut self, kind: PathKind, path: String, range: Range) -> Value {
        self.path_set.insert(path.as_str());
        Value::Path(PathExpression { kind, path, range })
    }

    fn convert_literal(&mut self, literal: &cds::Literal, range: Range, expected: Expected<'a>) -> Option<Value> {
        let token = literal.token()?;
        let text = token.text();
        let mut multiline_type = None;

        let primitive = match token.kind() {
            SyntaxKind::STRING | SyntaxKind::UNTERMINATED_STRING => {
                let value = unquote(text);
                if let Some(kind) = expected.type_name.and_then(path_kind_of_type) {
                    return Some(self.path(kind, value, range));
                }
                Primitive::String(value)
            }
            SyntaxKind::MULTILINE_STRING => {
                multiline_type = Some(MultilineType::Plain);
                Primitive::String(unescape_backtick(text))
            }
            SyntaxKind::TEXT_BLOCK => {
                multiline_type = Some(MultilineType::Block);
                Primitive::String(dedent_text_block(text))
            }
            SyntaxKind::NUMBER => {
                let number = if literal.is_negative() {
                    format!("-{}", text)
                } else {
                    text.to_string()
                };
                match number.parse::<i64>() {
                    Ok(value) => Primitive::Int(value),
                    Err(_) => Primitive::Decimal(number),
                }
            }
            SyntaxKind::TRUE_KW => Primitive::Bool(true),
            SyntaxKind::FALSE_KW => Primitive::Bool(false),
            SyntaxKind::NULL_KW => Primitive::Null,
            _ => return None,
        };

        check_allowed(&primitive, range, expected.constraints, &mut self.diagnostics);
        Some(Value::Primitive(PrimitiveValue {
            value: primitive,
            range,
            multiline_type,
        }))
    }

    fn convert_record(&mut self, record: &cds::Record, range: Range, expected: Expected<'a>) -> Record {
        let members: Vec<_> = record.members().collect();

        // `$Type` overrides the type implied by the term or property
        let explicit_type = members.iter().find_map(|member| match member {
            cds::RecordMember::Property(property) if is_type_key(property) => match property.value() {
                Some(cds::Value::Literal(literal)) => literal
                    .token()
                    .map(|t| resolve_name(&unquote(t.text()), self.aliases).q_name),
                Some(cds::Value::Path(path)) => Some(resolve_name(&path.path().replace('/', "."), self.aliases).q_name),
                _ => None,
            },
            _ => None,
        });
        let type_name = explicit_type.or_else(|| expected.type_name.map(str::to_string));

        let mut result = Record {
            type_name,
            properties: Vec::new(),
            annotations: Vec::new(),
            range,
        };

        for member in members {
            match member {
                cds::RecordMember::Property(property) if is_type_key(&property) => {}
                cds::RecordMember::Property(property) => {
                    let tokens = property.name_segments();
                    let segments = self.token_segments(&tokens);
                    let property_range = self.range(property.syntax().text_range());
                    let type_name = result.type_name.clone();
                    if let Some(value) =
                        self.build_property(type_name.as_deref(), &segments, property.value(), property_range)
                    {
                        merge_property(&mut result.properties, value);
                    }
                }
                cds::RecordMember::Annotation(assignment) => {
                    if let Some(term) = self.convert_term(&assignment, "", Range::default()) {
                        result.annotations.push(term);
                    }
                }
            }
        }
        result
    }

    /// Build a property from a (possibly flattened) name path and its value.
    fn build_property(
        &mut self,
        record_type: Option<&str>,
        segments: &[(String, Range)],
        value: Option<cds::Value>,
        range: Range,
    ) -> Option<PropertyValue> {
        let ((name, name_range), rest) = segments.split_first()?;
        let vocabulary = self.vocabulary;

        let definition = record_type.and_then(|t| vocabulary.property_in_hierarchy(t, name));
        if let Some(type_name) = record_type {
            if definition.is_none() && vocabulary.complex_type(type_name).is_some() {
                self.diagnostics.unknown_property(*name_range, name, type_name);
            }
        }
        let expected = definition.map(Expected::of_property).unwrap_or_default();

        let value = if rest.is_empty() {
            self.convert_value(&value?, expected)?
        } else {
            let nested = self.build_property(expected.type_name, rest, value, range)?;
            Value::Record(Record {
                type_name: expected.type_name.map(str::to_string),
                properties: vec![nested],
                annotations: Vec::new(),
                range,
            })
        };

        Some(PropertyValue {
            name: name.as_str().into(),
            value,
            range,
            name_range: *name_range,
        })
    }
}

fn is_type_key(property: &cds::RecordProperty) -> bool {
    let segments = property.name_segments();
    segments.len() == 1 && segments[0].text() == "$Type"
}

fn merge_property(properties: &mut Vec<PropertyValue>, property: PropertyValue) {
    let Some(existing) = properties.iter_mut().find(|p| p.name == property.name) else {
        properties.push(property);
        return;
    };
    existing.range = existing.range.cover(property.range);
    match (&mut existing.value, property.value) {
        (Value::Record(into), Value::Record(from)) => merge_records(into, from),
        (slot, value) => *slot = value,
    }
}

fn merge_records(into: &mut Record, from: Record) {
    into.range = into.range.cover(from.range);
    if into.type_name.is_none() {
        into.type_name = from.type_name;
    }
    for property in from.properties {
        merge_property(&mut into.properties, property);
    }
    into.annotations.extend(from.annotations);
}

// ============================================================================
// String literals
// ============================================================================

/// `'it''s'` → `it's`; also accepts an unterminated literal.
fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('\'').unwrap_or(text);
    let inner = inner.strip_suffix('\'').unwrap_or(inner);
    inner.replace("''", "'")
}

/// `` `a\nb` `` with escape sequences resolved.
fn unescape_backtick(text: &str) -> String {
    let inner = text
        .strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// ```` ``` ```` blocks: the line break after the opening fence and the
/// trailing whitespace line are dropped, and the common indentation of the
/// remaining lines is removed.
fn dedent_text_block(text: &str) -> String {
    let inner = text
        .strip_prefix("```")
        .and_then(|t| t.strip_suffix("```"))
        .unwrap_or(text);
    let inner = inner.strip_prefix("\r\n").or_else(|| inner.strip_prefix('\n')).unwrap_or(inner);

    let mut lines: Vec<&str> = inner.lines().collect();
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| &l[indent_width(l).min(indent)..])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Leading spaces and tabs, in bytes. Other whitespace is content.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::vocabulary::{
        ComplexTypeDefinition, EnumTypeDefinition, PropertyDefinition, TermDefinition, VocabularyRegistry,
    };
    use rstest::rstest;

    const UI: &str = "com.sap.vocabularies.UI.v1";

    fn vocabulary() -> VocabularyRegistry {
        VocabularyRegistry::new()
            .with_vocabulary("UI", UI)
            .with_term(TermDefinition::new(format!("{UI}.LineItem"), format!("{UI}.DataFieldAbstract")).collection())
            .with_term(TermDefinition::new(format!("{UI}.HeaderInfo"), format!("{UI}.HeaderInfoType")))
            .with_term(TermDefinition::new(format!("{UI}.Hidden"), "Core.Tag"))
            .with_term(TermDefinition::new(format!("{UI}.PresentationVariant"), "Edm.AnnotationPath"))
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.DataFieldAbstract"))
                    .abstract_type()
                    .with_property(PropertyDefinition::new("Label", "Edm.String"))
                    .with_property(PropertyDefinition::new("Importance", format!("{UI}.ImportanceType"))),
            )
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.DataField"))
                    .with_base(format!("{UI}.DataFieldAbstract"))
                    .with_property(PropertyDefinition::new("Value", "Edm.PrimitiveType")),
            )
            .with_complex_type(
                ComplexTypeDefinition::new(format!("{UI}.HeaderInfoType"))
                    .with_property(PropertyDefinition::new("TypeName", "Edm.String"))
                    .with_property(PropertyDefinition::new("TypeNamePlural", "Edm.String"))
                    .with_property(PropertyDefinition::new("Title", format!("{UI}.DataField"))),
            )
            .with_enum_type(EnumTypeDefinition::new(format!("{UI}.ImportanceType"), ["High", "Medium", "Low"]))
    }

    fn convert_text(text: &str) -> TermTree {
        let vocabulary = vocabulary();
        let context = ConvertContext::new(&vocabulary);
        convert(&cds::parse(text), &LineIndex::new(text), &context)
    }

    #[test]
    fn test_line_item() {
        let tree = convert_text(
            "annotate S.Books with @UI.LineItem: [{ Value: author.name, Label: 'Author', Importance: #High }];",
        );
        assert!(tree.diagnostics.is_empty(), "{:?}", tree.diagnostics);
        let term = &tree.terms[0];
        assert_eq!(term.target, "S.Books");
        assert_eq!(term.qualified_name, format!("{UI}.LineItem"));

        let record = term.value.as_ref().and_then(Value::as_collection).unwrap().items[0]
            .as_record()
            .unwrap();
        assert_eq!(record.property("Value").and_then(|p| p.value.as_path()).map(|p| p.path.as_str()), Some("author/name"));
        assert_eq!(
            record.property("Importance").and_then(|p| p.value.as_primitive()),
            Some(&Primitive::EnumMember(format!("{UI}.ImportanceType/High")))
        );
        assert!(tree.path_set.contains("author/name"));
    }

    #[test]
    fn test_flattened_assignments_merge() {
        let tree = convert_text(
            "annotate S.Books with @UI.HeaderInfo.TypeName: 'Book' @UI.HeaderInfo.TypeNamePlural: 'Books' @UI.HeaderInfo.Title.Value: title;",
        );
        assert!(tree.diagnostics.is_empty(), "{:?}", tree.diagnostics);
        assert_eq!(tree.terms.len(), 1);

        let record = tree.terms[0].value.as_ref().and_then(Value::as_record).unwrap();
        assert_eq!(record.type_name.as_deref(), Some(format!("{UI}.HeaderInfoType").as_str()));
        let names: Vec<_> = record.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["TypeName", "TypeNamePlural", "Title"]);

        let title = record.property("Title").and_then(|p| p.value.as_record()).unwrap();
        assert_eq!(title.type_name.as_deref(), Some(format!("{UI}.DataField").as_str()));
        assert!(title.property("Value").is_some());
    }

    #[test]
    fn test_unknown_term_is_reported_and_skipped() {
        let text = "annotate S.Books with @UI.Hidden @UI.Bogus: 1 @UI.LineItem: [];";
        let tree = convert_text(text);
        assert_eq!(tree.diagnostics.len(), 1);
        assert_eq!(tree.diagnostics[0].code.as_deref(), Some("W0201"));
        assert_eq!(tree.diagnostics[0].range, Range::from_coords(0, 34, 0, 42));
        assert_eq!(tree.terms.len(), 2);
    }

    #[test]
    fn test_elements_qualifiers_and_paths() {
        let tree = convert_text(
            "annotate S.Books with { title @UI.Hidden; } @UI.PresentationVariant #q: 'to_Author/@UI.LineItem';",
        );
        assert!(tree.diagnostics.is_empty(), "{:?}", tree.diagnostics);
        assert_eq!(tree.terms[0].target, "S.Books");
        assert_eq!(tree.terms[0].qualifier.as_deref(), Some("q"));
        assert_eq!(
            tree.terms[0].value.as_ref().and_then(Value::as_path).map(|p| p.kind),
            Some(PathKind::AnnotationPath)
        );
        assert_eq!(tree.terms[1].target, "S.Books/title");
    }

    #[test]
    fn test_unknown_property_and_enum_member() {
        let tree = convert_text("annotate S.Books with @UI.LineItem: [{ Bogus: 1, Importance: #Huge }];");
        let codes: Vec<_> = tree.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec!["W0202", "W0203"]);
    }

    #[test]
    fn test_explicit_record_type() {
        let tree = convert_text("annotate S.Books with @UI.LineItem: [{ $Type: 'UI.DataField', Value: title }];");
        let record = tree.terms[0].value.as_ref().and_then(Value::as_collection).unwrap().items[0]
            .as_record()
            .unwrap();
        assert_eq!(record.type_name.as_deref(), Some(format!("{UI}.DataField").as_str()));
        assert_eq!(record.properties.len(), 1);
    }

    #[rstest]
    #[case("'it''s'", "it's")]
    #[case("'open", "open")]
    fn test_unquote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unquote(input), expected);
    }

    #[test]
    fn test_multiline_strings() {
        assert_eq!(unescape_backtick("`a\\nb\\``"), "a\nb`");
        assert_eq!(dedent_text_block("```\n    first\n      second\n  ```"), "first\n  second");
    }

    #[rstest]
    #[case("```\n\u{3000}x\n y\n```", "\u{3000}x\n y")]
    #[case("```\n  \u{a0}x\n  y\n```", "\u{a0}x\ny")]
    #[case("```\n  x\n\u{3000}\n  y\n```", "x\n\u{3000}\ny")]
    fn test_text_block_keeps_non_ascii_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dedent_text_block(input), expected);
    }

    #[test]
    fn test_text_block_with_wide_space_converts() {
        let tree = convert_text("annotate S.Books with @UI.HeaderInfo.TypeName: ```\n\u{3000}x\n y\n```;");
        let record = tree.terms[0].value.as_ref().and_then(Value::as_record).unwrap();
        assert_eq!(
            record.property("TypeName").and_then(|p| p.value.as_primitive()),
            Some(&Primitive::String("\u{3000}x\n y".into()))
        );
    }

    #[test]
    fn test_numbers() {
        let tree = convert_text("annotate S.Books with @UI.LineItem: [-3, 2.5];");
        let items = &tree.terms[0].value.as_ref().and_then(Value::as_collection).unwrap().items;
        assert_eq!(items[0].as_primitive(), Some(&Primitive::Int(-3)));
        assert_eq!(items[1].as_primitive(), Some(&Primitive::Decimal("2.5".into())));
    }
}
