//! Shared fixtures: a small slice of the UI/Common/Core vocabularies and a
//! bookshop service's metadata.
#![allow(dead_code)]

use annotation::ast::Document;
use annotation::base::LineIndex;
use annotation::convert::markup;
use annotation::hir::{
    ComplexTypeDefinition, Constraints, EnumTypeDefinition, MetadataElement, MetadataStore,
    PropertyDefinition, TargetKind, TermDefinition, VocabularyRegistry,
};
use annotation::syntax::markup::parse;
use once_cell::sync::Lazy;

pub const UI: &str = "com.sap.vocabularies.UI.v1";
pub const COMMON: &str = "com.sap.vocabularies.Common.v1";
pub const CORE: &str = "Org.OData.Core.V1";

pub static VOCABULARY: Lazy<VocabularyRegistry> = Lazy::new(|| {
    VocabularyRegistry::new()
        .with_vocabulary("UI", UI)
        .with_vocabulary("Common", COMMON)
        .with_vocabulary("Core", CORE)
        // UI
        .with_term(TermDefinition::new(format!("{UI}.LineItem"), format!("{UI}.DataFieldAbstract")).collection())
        .with_term(TermDefinition::new(format!("{UI}.HeaderInfo"), format!("{UI}.HeaderInfoType")))
        .with_term(TermDefinition::new(format!("{UI}.Hidden"), format!("{CORE}.Tag")))
        .with_term(TermDefinition::new(format!("{UI}.Importance"), format!("{UI}.ImportanceType")))
        .with_term(TermDefinition::new(format!("{UI}.PresentationVariant"), format!("{UI}.PresentationVariantType")))
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{UI}.DataFieldAbstract"))
                .abstract_type()
                .with_property(PropertyDefinition::new("Label", "Edm.String"))
                .with_property(PropertyDefinition::new("Criticality", "Edm.PrimitiveType"))
                .with_property(PropertyDefinition::new("IconUrl", "Edm.String")),
        )
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{UI}.DataField"))
                .with_base(format!("{UI}.DataFieldAbstract"))
                .with_property(PropertyDefinition::new("Value", "Edm.PrimitiveType").not_null()),
        )
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{UI}.DataFieldForAnnotation"))
                .with_base(format!("{UI}.DataFieldAbstract"))
                .with_property(PropertyDefinition::new("Target", "Edm.AnnotationPath")),
        )
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{UI}.HeaderInfoType"))
                .with_property(PropertyDefinition::new("TypeName", "Edm.String"))
                .with_property(PropertyDefinition::new("TypeNamePlural", "Edm.String"))
                .with_property(PropertyDefinition::new("Title", format!("{UI}.DataFieldAbstract"))),
        )
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{UI}.PresentationVariantType"))
                .with_property(PropertyDefinition::new("Visualizations", "Edm.AnnotationPath").collection())
                .with_property(PropertyDefinition::new("SortOrder", format!("{COMMON}.SortOrderType")).collection()),
        )
        .with_enum_type(EnumTypeDefinition::new(format!("{UI}.ImportanceType"), ["High", "Medium", "Low"]))
        // Common
        .with_term(TermDefinition::new(format!("{COMMON}.Label"), "Edm.String"))
        .with_term(TermDefinition::new(format!("{COMMON}.Text"), "Edm.String"))
        .with_term(
            TermDefinition::new(format!("{COMMON}.FieldControl"), format!("{COMMON}.FieldControlType")),
        )
        .with_complex_type(
            ComplexTypeDefinition::new(format!("{COMMON}.SortOrderType"))
                .with_property(PropertyDefinition::new("Property", "Edm.PropertyPath"))
                .with_property(PropertyDefinition::new("Descending", "Edm.Boolean")),
        )
        .with_enum_type(EnumTypeDefinition::new(
            format!("{COMMON}.FieldControlType"),
            ["Mandatory", "Optional", "ReadOnly", "Inapplicable", "Hidden"],
        ))
        // Core
        .with_term(TermDefinition::new(format!("{CORE}.Description"), "Edm.String"))
        .with_term(TermDefinition::new(format!("{CORE}.Immutable"), format!("{CORE}.Tag")))
        .with_term(
            TermDefinition::new(format!("{CORE}.OptimisticConcurrency"), "Edm.PropertyPath").collection(),
        )
        .with_term(TermDefinition::new(format!("{CORE}.MediaType"), "Edm.String").with_constraints(Constraints {
            allowed_values: vec!["image/png".into(), "image/jpeg".into(), "application/pdf".into()],
            ..Constraints::default()
        }))
});

pub static METADATA: Lazy<MetadataStore> = Lazy::new(|| {
    MetadataStore::new()
        .with(MetadataElement::entity_type("CatalogService.Books"))
        .with(MetadataElement::property("CatalogService.Books/ID", "Edm.Int32"))
        .with(MetadataElement::property("CatalogService.Books/title", "Edm.String"))
        .with(MetadataElement::property("CatalogService.Books/stock", "Edm.Int32"))
        .with(MetadataElement::navigation_property("CatalogService.Books/author", "CatalogService.Authors"))
        .with(MetadataElement::entity_type("CatalogService.Authors"))
        .with(MetadataElement::property("CatalogService.Authors/name", "Edm.String"))
        .with(MetadataElement::complex_type("CatalogService.Address"))
        .with(MetadataElement::action("CatalogService.submitOrder"))
        .with(MetadataElement::new("CatalogService.EntityContainer", TargetKind::EntityContainer))
        .with(MetadataElement::new("CatalogService.EntityContainer/Books", TargetKind::EntitySet))
        .with(MetadataElement::new(
            "CatalogService.EntityContainer/submitOrder",
            TargetKind::ActionImport,
        ))
});

/// Convert markup text into the generic AST.
pub fn markup_document(text: &str) -> Document {
    markup::convert(&parse(text), &LineIndex::new(text)).document
}

/// An EDMX document with one empty `Annotations` block for `target`.
pub fn edmx_with_annotations(target: &str) -> String {
    format!(
        r#"<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
    <edmx:Reference Uri="/vocabularies/UI.xml">
        <edmx:Include Namespace="{UI}" Alias="UI"/>
    </edmx:Reference>
    <edmx:DataServices>
        <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="local">
            <Annotations Target="{target}">
            </Annotations>
        </Schema>
    </edmx:DataServices>
</edmx:Edmx>"#
    )
}
