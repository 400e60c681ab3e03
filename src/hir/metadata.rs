//! Metadata model consumed by path resolution.
//!
//! The metadata service is an external collaborator; this module defines
//! the interface the resolver needs ([`MetadataService`]), a plain
//! in-memory implementation ([`MetadataStore`]) and a memoizing wrapper
//! ([`CachedMetadataService`]).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

// ============================================================================
// TARGET KINDS
// ============================================================================

/// EDM kind of a metadata element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Action,
    Function,
    ActionImport,
    FunctionImport,
    EntityContainer,
    EntitySet,
    Singleton,
    EntityType,
    ComplexType,
    Property,
    NavigationProperty,
    Parameter,
    Other,
}

impl TargetKind {
    /// Actions, functions and their imports. These act as path bases for
    /// their own parameters.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            Self::Action | Self::Function | Self::ActionImport | Self::FunctionImport
        )
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::Action => "Action",
            Self::Function => "Function",
            Self::ActionImport => "ActionImport",
            Self::FunctionImport => "FunctionImport",
            Self::EntityContainer => "EntityContainer",
            Self::EntitySet => "EntitySet",
            Self::Singleton => "Singleton",
            Self::EntityType => "EntityType",
            Self::ComplexType => "ComplexType",
            Self::Property => "Property",
            Self::NavigationProperty => "NavigationProperty",
            Self::Parameter => "Parameter",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

// ============================================================================
// METADATA ELEMENT
// ============================================================================

/// A metadata element addressed by its path (`CatalogService.Books/title`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataElement {
    pub path: SmolStr,
    pub name: SmolStr,
    pub kind: TargetKind,
    pub is_entity_type: bool,
    pub is_complex_type: bool,
    /// Any structured type (entity, complex or a property typed by one)
    pub structured_type: bool,
    /// `Edm.String`, `CatalogService.Author`, ...
    pub edm_type: Option<SmolStr>,
    pub is_collection: bool,
}

impl MetadataElement {
    pub fn new(path: impl Into<SmolStr>, kind: TargetKind) -> Self {
        let path = path.into();
        let name = path
            .rsplit(['/', '.'])
            .next()
            .map(SmolStr::new)
            .unwrap_or_else(|| path.clone());
        Self {
            path,
            name,
            kind,
            is_entity_type: kind == TargetKind::EntityType,
            is_complex_type: kind == TargetKind::ComplexType,
            structured_type: matches!(kind, TargetKind::EntityType | TargetKind::ComplexType),
            edm_type: None,
            is_collection: false,
        }
    }

    pub fn entity_type(path: impl Into<SmolStr>) -> Self {
        Self::new(path, TargetKind::EntityType)
    }

    pub fn complex_type(path: impl Into<SmolStr>) -> Self {
        Self::new(path, TargetKind::ComplexType)
    }

    pub fn property(path: impl Into<SmolStr>, edm_type: impl Into<SmolStr>) -> Self {
        Self::new(path, TargetKind::Property).with_type(edm_type)
    }

    pub fn navigation_property(path: impl Into<SmolStr>, target_type: impl Into<SmolStr>) -> Self {
        let mut element = Self::new(path, TargetKind::NavigationProperty).with_type(target_type);
        element.structured_type = true;
        element
    }

    pub fn action(path: impl Into<SmolStr>) -> Self {
        Self::new(path, TargetKind::Action)
    }

    pub fn function(path: impl Into<SmolStr>) -> Self {
        Self::new(path, TargetKind::Function)
    }

    pub fn with_type(mut self, edm_type: impl Into<SmolStr>) -> Self {
        self.edm_type = Some(edm_type.into());
        self
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn structured(mut self) -> Self {
        self.structured_type = true;
        self
    }

    /// Can serve as the base of a relative annotation path.
    pub fn is_path_base(&self) -> bool {
        self.is_entity_type || self.is_complex_type || self.structured_type || self.kind.is_callable()
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Read-only per-path access to service metadata.
pub trait MetadataService: Send + Sync {
    fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>>;

    /// EDM kinds the element at `path` can be annotated as. Empty for
    /// unknown paths.
    fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind>;
}

impl<S: MetadataService + ?Sized> MetadataService for &S {
    fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>> {
        (**self).metadata_element(path)
    }

    fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind> {
        (**self).edm_target_kinds(path)
    }
}

impl<S: MetadataService + ?Sized> MetadataService for Arc<S> {
    fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>> {
        (**self).metadata_element(path)
    }

    fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind> {
        (**self).edm_target_kinds(path)
    }
}

/// In-memory metadata keyed by path, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    elements: IndexMap<SmolStr, Arc<MetadataElement>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: MetadataElement) {
        self.elements.insert(element.path.clone(), Arc::new(element));
    }

    pub fn with(mut self, element: MetadataElement) -> Self {
        self.insert(element);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(SmolStr::as_str)
    }
}

impl MetadataService for MetadataStore {
    fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>> {
        self.elements.get(path).cloned()
    }

    fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind> {
        self.elements
            .get(path)
            .map(|element| vec![element.kind])
            .unwrap_or_default()
    }
}

// ============================================================================
// MEMOIZING WRAPPER
// ============================================================================

/// Memoizes element lookups of an inner service.
///
/// Thread-safe via internal locking; misses (`None`) are cached as well.
pub struct CachedMetadataService<S> {
    inner: S,
    elements: RwLock<FxHashMap<SmolStr, Option<Arc<MetadataElement>>>>,
}

impl<S: MetadataService> CachedMetadataService<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            elements: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached lookups (hits and misses).
    pub fn cached_len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn clear(&self) {
        self.elements.write().clear();
    }
}

impl<S: MetadataService> MetadataService for CachedMetadataService<S> {
    fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>> {
        // Fast path: already looked up (read lock)
        {
            let cache = self.elements.read();
            if let Some(entry) = cache.get(path) {
                return entry.clone();
            }
        }

        let mut cache = self.elements.write();

        // Double-check after acquiring write lock
        if let Some(entry) = cache.get(path) {
            return entry.clone();
        }

        tracing::trace!(path, "metadata cache miss");
        let element = self.inner.metadata_element(path);
        cache.insert(SmolStr::new(path), element.clone());
        element
    }

    fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind> {
        self.inner.edm_target_kinds(path)
    }
}

impl<S> fmt::Debug for CachedMetadataService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedMetadataService")
            .field("cached", &self.elements.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        store: MetadataStore,
        calls: AtomicUsize,
    }

    impl MetadataService for CountingService {
        fn metadata_element(&self, path: &str) -> Option<Arc<MetadataElement>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.store.metadata_element(path)
        }

        fn edm_target_kinds(&self, path: &str) -> Vec<TargetKind> {
            self.store.edm_target_kinds(path)
        }
    }

    #[test]
    fn test_element_constructors() {
        let books = MetadataElement::entity_type("CatalogService.Books");
        assert_eq!(books.name, "Books");
        assert!(books.is_entity_type && books.structured_type && books.is_path_base());

        let title = MetadataElement::property("CatalogService.Books/title", "Edm.String");
        assert_eq!(title.name, "title");
        assert!(!title.is_path_base());

        assert!(MetadataElement::action("CatalogService.submit").is_path_base());
    }

    #[test]
    fn test_store_lookup() {
        let store = MetadataStore::new().with(MetadataElement::entity_type("S.Books"));
        assert!(store.metadata_element("S.Books").is_some());
        assert!(store.metadata_element("S.Authors").is_none());
        assert_eq!(store.edm_target_kinds("S.Books"), vec![TargetKind::EntityType]);
        assert!(store.edm_target_kinds("S.Authors").is_empty());
    }

    #[test]
    fn test_cache_memoizes_hits_and_misses() {
        let service = CachedMetadataService::new(CountingService {
            store: MetadataStore::new().with(MetadataElement::entity_type("S.Books")),
            calls: AtomicUsize::new(0),
        });

        for _ in 0..3 {
            assert!(service.metadata_element("S.Books").is_some());
            assert!(service.metadata_element("S.Nope").is_none());
        }

        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cached_len(), 2);
        service.clear();
        assert_eq!(service.cached_len(), 0);
    }

    #[test]
    fn test_callable_kinds() {
        assert!(TargetKind::FunctionImport.is_callable());
        assert!(!TargetKind::EntitySet.is_callable());
        assert_eq!(TargetKind::ActionImport.to_string(), "ActionImport");
    }
}
