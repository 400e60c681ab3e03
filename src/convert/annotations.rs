//! Generic AST (EDMX markup) ↔ annotation term tree.
//!
//! `Annotations/Annotation` elements are normalized into [`Term`]s; both
//! the attribute notation (`<Annotation Term="X" String="v"/>`) and the
//! element notation (`<Annotation Term="X"><String>v</String></Annotation>`)
//! are understood. [`term_to_element`] goes the other way and produces a
//! fragment for the document editor.

use crate::ast::{Element, Text};
use crate::base::Range;
use crate::hir::alias::{AliasInformation, resolve_name, to_aliased_name};
use crate::hir::diagnostics::DiagnosticCollector;
use crate::hir::resolve::canonical_path;
use crate::hir::terms::{
    Collection, PathExpression, PathKind, PathSet, Primitive, PrimitiveValue, PropertyValue, Record,
    Term, TermTree, Value,
};
use crate::hir::vocabulary::VocabularyService;

use super::{ConvertContext, Expected, check_allowed, check_enum_member};

/// Convert every `Annotations` block of a document into terms.
pub fn convert(document: &crate::ast::Document, context: &ConvertContext<'_>) -> TermTree {
    let mut aliases = document
        .root()
        .map(AliasInformation::from_document)
        .unwrap_or_default();
    aliases.merge(&context.aliases);

    let mut converter = AnnotationConverter {
        vocabulary: context.vocabulary,
        aliases: &aliases,
        diagnostics: DiagnosticCollector::new(),
        path_set: PathSet::new(),
    };

    let mut terms = Vec::new();
    for root in document.elements() {
        for block in root.descendants() {
            if block.name != "Annotations" {
                continue;
            }
            let Some(target) = block.attribute("Target") else {
                tracing::trace!(range = %block.range, "skipping Annotations without Target");
                continue;
            };
            let canonical = canonical_path(&target.value, &aliases);
            for annotation in block.children_named("Annotation") {
                if let Some(term) = converter.convert_annotation(annotation, &canonical, target.value_range) {
                    terms.push(term);
                }
            }
        }
    }

    tracing::debug!(
        terms = terms.len(),
        diagnostics = converter.diagnostics.len(),
        "converted markup annotations"
    );

    TermTree {
        terms,
        diagnostics: converter.diagnostics.into_vec(),
        path_set: converter.path_set,
    }
}

struct AnnotationConverter<'a> {
    vocabulary: &'a dyn VocabularyService,
    aliases: &'a AliasInformation,
    diagnostics: DiagnosticCollector,
    path_set: PathSet,
}

impl<'a> AnnotationConverter<'a> {
    fn convert_annotation(&mut self, element: &Element, target: &str, target_range: Range) -> Option<Term> {
        let Some(term_name) = element.attribute("Term") else {
            tracing::trace!(range = %element.range, "skipping Annotation without Term");
            return None;
        };

        let qualified_name = resolve_name(&term_name.value, self.aliases).q_name;
        let vocabulary = self.vocabulary;
        let definition = vocabulary.term(&qualified_name);
        if definition.is_none() {
            self.diagnostics.unknown_term(term_name.value_range, &term_name.value);
        }
        let expected = definition.map(Expected::of_term).unwrap_or_default();

        let mut term = Term::new(target, term_name.value.clone(), qualified_name);
        term.target_range = target_range;
        term.qualifier = element.attribute_value("Qualifier").map(str::to_string);
        term.range = element.range;
        term.name_range = term_name.value_range;
        term.value = self.value_of(element, expected);
        term.annotations = self.nested_annotations(element);
        Some(term)
    }

    fn nested_annotations(&mut self, element: &Element) -> Vec<Term> {
        element
            .children_named("Annotation")
            .filter_map(|nested| self.convert_annotation(nested, "", Range::default()))
            .collect()
    }

    /// Value of an Annotation or PropertyValue, attribute notation first.
    fn value_of(&mut self, element: &Element, expected: Expected<'a>) -> Option<Value> {
        for attribute in element.attributes.values() {
            if let Some(value) = self.expression(&attribute.name, &attribute.value, attribute.value_range, expected) {
                return Some(value);
            }
        }
        element
            .child_elements()
            .filter(|child| child.name != "Annotation")
            .find_map(|child| self.element_expression(child, expected))
    }

    fn element_expression(&mut self, element: &Element, expected: Expected<'a>) -> Option<Value> {
        match element.name.as_str() {
            "Record" => Some(Value::Record(self.record(element, expected))),
            "Collection" => {
                let item = expected.item();
                let items = element
                    .child_elements()
                    .filter_map(|child| self.element_expression(child, item))
                    .collect();
                Some(Value::Collection(Collection {
                    items,
                    range: element.range,
                }))
            }
            "Null" => Some(Value::Primitive(PrimitiveValue::new(Primitive::Null, element.range))),
            "String" => {
                // strings keep surrounding whitespace, everything else is trimmed
                let text = element.text();
                self.expression("String", &text, element.range, expected)
            }
            name => {
                let text = element.text();
                let value = self.expression(name, text.trim(), element.range, expected);
                if value.is_none() {
                    tracing::trace!(name, "unsupported expression element");
                }
                value
            }
        }
    }

    /// A constant or path expression given by its EDM expression name.
    fn expression(&mut self, kind: &str, text: &str, range: Range, expected: Expected<'a>) -> Option<Value> {
        if let Some(path_kind) = PathKind::from_name(kind) {
            self.path_set.insert(text);
            return Some(Value::Path(PathExpression {
                kind: path_kind,
                path: text.to_string(),
                range,
            }));
        }

        let primitive = match kind {
            "String" | "Date" | "DateTimeOffset" | "TimeOfDay" | "Duration" | "Guid" | "Binary" => {
                Primitive::String(text.to_string())
            }
            "Bool" => match text {
                "true" => Primitive::Bool(true),
                "false" => Primitive::Bool(false),
                other => {
                    // anything else stays as written
                    let allowed = ["true".to_string(), "false".to_string()];
                    self.diagnostics.value_not_allowed(range, other, &allowed);
                    return Some(Value::Primitive(PrimitiveValue::new(Primitive::String(other.to_string()), range)));
                }
            },
            "Int" => match text.parse::<i64>() {
                Ok(value) => Primitive::Int(value),
                Err(_) => Primitive::Decimal(text.to_string()),
            },
            "Decimal" | "Float" => Primitive::Decimal(text.to_string()),
            "EnumMember" => {
                let members: Vec<String> = text
                    .split_whitespace()
                    .map(|member| resolve_name(member, self.aliases).q_name)
                    .collect();
                for member in &members {
                    check_enum_member(self.vocabulary, member, range, &mut self.diagnostics);
                }
                Primitive::EnumMember(members.join(" "))
            }
            _ => return None,
        };
        check_allowed(&primitive, range, expected.constraints, &mut self.diagnostics);
        Some(Value::Primitive(PrimitiveValue::new(primitive, range)))
    }

    fn record(&mut self, element: &Element, expected: Expected<'a>) -> Record {
        let type_name = element
            .attribute_value("Type")
            .map(|t| resolve_name(t, self.aliases).q_name)
            .or_else(|| expected.type_name.map(str::to_string));
        let vocabulary = self.vocabulary;
        let known_type = type_name
            .as_deref()
            .is_some_and(|t| vocabulary.complex_type(t).is_some());

        let mut properties = Vec::new();
        for property_value in element.children_named("PropertyValue") {
            let Some(name) = property_value.attribute("Property") else {
                tracing::trace!(range = %property_value.range, "skipping PropertyValue without Property");
                continue;
            };
            let definition = type_name
                .as_deref()
                .and_then(|t| vocabulary.property_in_hierarchy(t, &name.value));
            if known_type && definition.is_none() {
                self.diagnostics.unknown_property(
                    name.value_range,
                    &name.value,
                    type_name.as_deref().unwrap_or_default(),
                );
            }
            let expected = definition.map(Expected::of_property).unwrap_or_default();
            let Some(value) = self.value_of(property_value, expected) else {
                tracing::trace!(property = %name.value, "PropertyValue without value");
                continue;
            };
            properties.push(PropertyValue {
                name: name.value.as_str().into(),
                value,
                range: property_value.range,
                name_range: name.value_range,
            });
        }

        Record {
            type_name,
            properties,
            annotations: self.nested_annotations(element),
            range: element.range,
        }
    }
}

// ============================================================================
// TERM → ELEMENT
// ============================================================================

/// Build an `Annotation` element for a term, with names in aliased form.
///
/// Primitive and path values use the attribute notation; records and
/// collections become child elements.
pub fn term_to_element(term: &Term, aliases: &AliasInformation) -> Element {
    let mut element =
        Element::new("Annotation").with_attribute("Term", to_aliased_name(&term.qualified_name, aliases));
    if let Some(qualifier) = &term.qualifier {
        element = element.with_attribute("Qualifier", qualifier.as_str());
    }
    if let Some(value) = &term.value {
        element = with_value(element, value, aliases);
    }
    for nested in &term.annotations {
        element = element.with_child(term_to_element(nested, aliases));
    }
    element
}

fn with_value(element: Element, value: &Value, aliases: &AliasInformation) -> Element {
    match value {
        Value::Primitive(p) if p.multiline_type.is_none() && p.value != Primitive::Null => {
            element.with_attribute(primitive_kind(&p.value), primitive_text(&p.value, aliases))
        }
        Value::Path(path) => element.with_attribute(path.kind.as_str(), path.path.as_str()),
        other => element.with_child(value_element(other, aliases)),
    }
}

fn value_element(value: &Value, aliases: &AliasInformation) -> Element {
    match value {
        Value::Primitive(p) if p.value == Primitive::Null => Element::new("Null"),
        Value::Primitive(p) => {
            let mut text = Text::new(primitive_text(&p.value, aliases));
            text.multiline_type = p.multiline_type;
            Element::new(primitive_kind(&p.value)).with_child(text)
        }
        Value::Path(path) => Element::new(path.kind.as_str()).with_child(Text::new(path.path.as_str())),
        Value::Record(record) => {
            let mut element = Element::new("Record");
            if let Some(type_name) = &record.type_name {
                element = element.with_attribute("Type", to_aliased_name(type_name, aliases));
            }
            for property in &record.properties {
                let property_value = Element::new("PropertyValue").with_attribute("Property", property.name.as_str());
                element = element.with_child(with_value(property_value, &property.value, aliases));
            }
            for nested in &record.annotations {
                element = element.with_child(term_to_element(nested, aliases));
            }
            element
        }
        Value::Collection(collection) => collection
            .items
            .iter()
            .fold(Element::new("Collection"), |element, item| {
                element.with_child(value_element(item, aliases))
            }),
    }
}

fn primitive_kind(value: &Primitive) -> &'static str {
    match value {
        Primitive::String(_) => "String",
        Primitive::Bool(_) => "Bool",
        Primitive::Int(_) => "Int",
        Primitive::Decimal(_) => "Decimal",
        Primitive::EnumMember(_) => "EnumMember",
        Primitive::Null => "Null",
    }
}

fn primitive_text(value: &Primitive, aliases: &AliasInformation) -> String {
    match value {
        Primitive::EnumMember(members) => members
            .split_whitespace()
            .map(|member| to_aliased_name(member, aliases))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::markup;
    use crate::base::LineIndex;
    use crate::hir::vocabulary::{
        ComplexTypeDefinition, EnumTypeDefinition, PropertyDefinition, TermDefinition, VocabularyRegistry,
    };
    use crate::syntax::markup::parse;

    const UI: &str = "com.sap.vocabularies.UI.v1";

    fn vocabulary() -> VocabularyRegistry {
        VocabularyRegistry::new()
            .with_vocabulary("UI", UI)
            .with_term(TermDefinition::new(format!("{UI}.LineItem"), format!("{UI}.DataFieldAbstract")).collection())
            .with_term(TermDefinition::new(format!("{UI}.Hidden"), "Core.Tag"))
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
            .with_enum_type(EnumTypeDefinition::new(format!("{UI}.ImportanceType"), ["High", "Medium", "Low"]))
    }

    fn convert_text(text: &str) -> TermTree {
        let vocabulary = vocabulary();
        let context = ConvertContext::new(&vocabulary);
        let conversion = markup::convert(&parse(text), &LineIndex::new(text));
        convert(&conversion.document, &context)
    }

    #[test]
    fn test_attribute_and_element_notation() {
        let tree = convert_text(
            r#"<Annotations Target="S.Books/title">
  <Annotation Term="UI.Hidden" Bool="true"/>
  <Annotation Term="UI.LineItem" Qualifier="q">
    <Collection>
      <Record Type="UI.DataField">
        <PropertyValue Property="Value" Path="title"/>
        <PropertyValue Property="Importance" EnumMember="UI.ImportanceType/High"/>
      </Record>
    </Collection>
  </Annotation>
</Annotations>"#,
        );
        assert!(tree.diagnostics.is_empty(), "{:?}", tree.diagnostics);
        assert_eq!(tree.terms.len(), 2);

        let hidden = &tree.terms[0];
        assert_eq!(hidden.target, "S.Books/title");
        assert_eq!(hidden.qualified_name, format!("{UI}.Hidden"));
        assert_eq!(hidden.value.as_ref().and_then(Value::as_primitive), Some(&Primitive::Bool(true)));

        let line_item = &tree.terms[1];
        assert_eq!(line_item.qualifier.as_deref(), Some("q"));
        let collection = line_item.value.as_ref().and_then(Value::as_collection).unwrap();
        let record = collection.items[0].as_record().unwrap();
        assert_eq!(record.type_name.as_deref(), Some(format!("{UI}.DataField").as_str()));
        assert_eq!(record.property("Value").and_then(|p| p.value.as_path()).map(|p| p.path.as_str()), Some("title"));
        assert_eq!(
            record.property("Importance").and_then(|p| p.value.as_primitive()),
            Some(&Primitive::EnumMember(format!("{UI}.ImportanceType/High")))
        );
        assert!(tree.path_set.contains("title"));
    }

    #[test]
    fn test_malformed_bool_is_reported() {
        let tree = convert_text(
            r#"<Annotations Target="S.Books">
  <Annotation Term="UI.Hidden" Bool="yes"/>
  <Annotation Term="UI.Hidden" Qualifier="q"><Bool>false</Bool></Annotation>
</Annotations>"#,
        );
        assert_eq!(tree.diagnostics.len(), 1);
        assert_eq!(tree.diagnostics[0].code.as_deref(), Some("W0203"));
        assert_eq!(
            tree.terms[0].value.as_ref().and_then(Value::as_primitive),
            Some(&Primitive::String("yes".into()))
        );
        assert_eq!(tree.terms[1].value.as_ref().and_then(Value::as_primitive), Some(&Primitive::Bool(false)));
    }

    #[test]
    fn test_unknown_term_and_property() {
        let tree = convert_text(
            r#"<Annotations Target="S.Books">
  <Annotation Term="UI.Nope" String="x"/>
  <Annotation Term="UI.LineItem"><Collection><Record Type="UI.DataField"><PropertyValue Property="Bogus" String="y"/></Record></Collection></Annotation>
</Annotations>"#,
        );
        let codes: Vec<_> = tree.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec!["W0201", "W0202"]);
        // the unknown term is still converted
        assert_eq!(tree.terms.len(), 2);
    }

    #[test]
    fn test_invalid_enum_member() {
        let tree = convert_text(
            r#"<Annotations Target="S.Books"><Annotation Term="UI.LineItem"><Collection><Record><PropertyValue Property="Importance" EnumMember="UI.ImportanceType/Huge"/></Record></Collection></Annotation></Annotations>"#,
        );
        assert_eq!(tree.diagnostics.len(), 1);
        assert_eq!(tree.diagnostics[0].code.as_deref(), Some("W0203"));
    }

    #[test]
    fn test_term_to_element_uses_aliases() {
        let aliases = AliasInformation::new().with_alias("UI", UI);
        let record = Record {
            type_name: Some(format!("{UI}.DataField")),
            properties: vec![PropertyValue {
                name: "Value".into(),
                value: Value::Path(PathExpression {
                    kind: PathKind::Path,
                    path: "title".into(),
                    range: Range::default(),
                }),
                range: Range::default(),
                name_range: Range::default(),
            }],
            ..Record::default()
        };
        let term = Term::new("S.Books", "UI.LineItem", format!("{UI}.LineItem")).with_value(Value::Collection(
            Collection {
                items: vec![Value::Record(record)],
                range: Range::default(),
            },
        ));

        let element = term_to_element(&term, &aliases);
        assert_eq!(element.attribute_value("Term"), Some("UI.LineItem"));
        let collection = element.child_elements().next().unwrap();
        assert_eq!(collection.name, "Collection");
        let record = collection.child_elements().next().unwrap();
        assert_eq!(record.attribute_value("Type"), Some("UI.DataField"));
        let property = record.child_elements().next().unwrap();
        assert_eq!(property.attribute_value("Property"), Some("Value"));
        assert_eq!(property.attribute_value("Path"), Some("title"));
    }
}
