//! Alias and qualified-name resolution.
//!
//! A document may refer to a namespace through a short alias
//! (`UI` for `com.sap.vocabularies.UI.v1`). [`AliasInformation`] holds the
//! mapping for one document; the functions here rewrite names between the
//! aliased and the canonical form.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::ast::Element;

/// Alias ↔ namespace mapping of one document.
///
/// Several aliases may point at the same namespace; [`alias_for`](Self::alias_for)
/// returns the first one registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasInformation {
    /// alias → namespace
    aliases: FxHashMap<SmolStr, SmolStr>,
    /// namespace → alias
    namespaces: FxHashMap<SmolStr, SmolStr>,
}

impl AliasInformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for `namespace`.
    pub fn insert(&mut self, alias: impl Into<SmolStr>, namespace: impl Into<SmolStr>) {
        let alias = alias.into();
        let namespace = namespace.into();
        self.namespaces.entry(namespace.clone()).or_insert_with(|| alias.clone());
        self.aliases.insert(alias, namespace);
    }

    pub fn with_alias(mut self, alias: impl Into<SmolStr>, namespace: impl Into<SmolStr>) -> Self {
        self.insert(alias, namespace);
        self
    }

    pub fn namespace_for(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(SmolStr::as_str)
    }

    pub fn alias_for(&self, namespace: &str) -> Option<&str> {
        self.namespaces.get(namespace).map(SmolStr::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Add all entries of `other` that don't clash with existing aliases.
    pub fn merge(&mut self, other: &AliasInformation) {
        for (alias, namespace) in &other.aliases {
            if !self.aliases.contains_key(alias) {
                self.insert(alias.clone(), namespace.clone());
            }
        }
    }

    /// Collect namespace declarations from an EDMX document root.
    ///
    /// Reads `Reference/Include` (`Namespace`, `Alias`) and `Schema`
    /// (`Namespace`, `Alias`) elements anywhere below `root`. A schema
    /// namespace is also registered under its own name so that canonical
    /// names round-trip.
    pub fn from_document(root: &Element) -> Self {
        let mut info = Self::new();
        for element in root.descendants() {
            if element.name != "Include" && element.name != "Schema" {
                continue;
            }
            let Some(namespace) = element.attribute_value("Namespace") else {
                continue;
            };
            if let Some(alias) = element.attribute_value("Alias") {
                info.insert(alias, namespace);
            }
            if element.name == "Schema" {
                info.namespaces
                    .entry(SmolStr::new(namespace))
                    .or_insert_with(|| SmolStr::new(namespace));
            }
        }
        tracing::trace!(aliases = info.aliases.len(), "collected document aliases");
        info
    }
}

/// Result of [`resolve_name`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedName {
    /// Canonical qualified name (namespace substituted for the alias)
    pub q_name: String,
    /// Namespace part, when the name has one
    pub namespace: Option<String>,
    /// Part after the namespace
    pub name: String,
}

/// Resolve a possibly aliased qualified name to its canonical form.
///
/// The name is split at its first `.`; if the prefix is a known alias it is
/// replaced by the namespace. Unknown prefixes leave the name unchanged.
/// Resolving an already canonical name is a no-op.
pub fn resolve_name(name: &str, aliases: &AliasInformation) -> ResolvedName {
    let Some((prefix, rest)) = name.split_once('.') else {
        return ResolvedName {
            q_name: name.to_string(),
            namespace: None,
            name: name.to_string(),
        };
    };

    if let Some(namespace) = aliases.namespace_for(prefix) {
        return ResolvedName {
            q_name: format!("{}.{}", namespace, rest),
            namespace: Some(namespace.to_string()),
            name: rest.to_string(),
        };
    }

    // Canonical names: the namespace is everything up to the last dot
    match name.rsplit_once('.') {
        Some((namespace, local)) => ResolvedName {
            q_name: name.to_string(),
            namespace: Some(namespace.to_string()),
            name: local.to_string(),
        },
        None => ResolvedName {
            q_name: name.to_string(),
            namespace: None,
            name: name.to_string(),
        },
    }
}

/// Rewrite a canonical qualified name into its aliased form.
///
/// The longest namespace prefix with a registered alias wins; names without
/// one are returned unchanged.
pub fn to_aliased_name(name: &str, aliases: &AliasInformation) -> String {
    let mut split = name.len();
    while let Some(dot) = name[..split].rfind('.') {
        let (namespace, rest) = name.split_at(dot);
        if let Some(alias) = aliases.alias_for(namespace) {
            return format!("{}{}", alias, rest);
        }
        split = dot;
    }
    name.to_string()
}

/// Canonicalize one path segment.
///
/// - `@UI.LineItem#q` → `@<namespace>.LineItem#q` (the part after `@`)
/// - `Service.Type` → resolved as a whole
/// - navigation property names are never aliased and pass through
pub fn get_segment_without_alias(aliases: &AliasInformation, segment: &str) -> String {
    if let Some(at) = segment.find('@') {
        let (head, term) = segment.split_at(at);
        let term = &term[1..];
        let resolved = resolve_name(term, aliases);
        return format!("{}@{}", head, resolved.q_name);
    }
    if segment.contains('.') {
        return resolve_name(segment, aliases).q_name;
    }
    segment.to_string()
}
