//! Path resolution against service metadata.
//!
//! A navigation path (`Books/author/@UI.LineItem`) is walked segment by
//! segment. Each growing prefix is looked up in the metadata service; the
//! walk stops at the first element that can serve as a path base.
//!
//! Segments past the base are often property names that are not
//! registered as metadata elements on their own, so the walk never
//! requires every segment to resolve.

use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::alias::{AliasInformation, get_segment_without_alias};
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::metadata::{MetadataElement, MetadataService};
use super::terms::{PathSet, TermTree};

/// Find the element a path is based on.
///
/// 1. A single leading `/` is stripped and the rest split on `/`.
/// 2. With `aliases`, every segment is de-aliased on its own.
/// 3. Prefixes `s1`, `s1/s2`, ... are looked up in order.
/// 4. The first resolved element that is an entity, complex or structured
///    type, or a callable (action, function or their imports), is returned.
/// 5. Otherwise the last resolved element is returned, or `None` when no
///    prefix resolved at all.
pub fn get_path_base_metadata_element<M>(
    metadata: &M,
    target_path: &str,
    aliases: Option<&AliasInformation>,
) -> Option<Arc<MetadataElement>>
where
    M: MetadataService + ?Sized,
{
    let path = target_path.strip_prefix('/').unwrap_or(target_path);

    let mut prefix = String::with_capacity(path.len());
    let mut most_specific: Option<Arc<MetadataElement>> = None;

    // empty segments are kept so that `A//B` never resolves as `A/B`
    for (index, segment) in path.split('/').enumerate() {
        let segment = match aliases {
            Some(aliases) => get_segment_without_alias(aliases, segment),
            None => segment.to_string(),
        };
        if index > 0 {
            prefix.push('/');
        }
        prefix.push_str(&segment);

        let Some(element) = metadata.metadata_element(&prefix) else {
            tracing::trace!(prefix = %prefix, "path prefix not in metadata");
            continue;
        };

        if element.is_path_base() || is_callable_target(metadata, &prefix) {
            tracing::trace!(prefix = %prefix, kind = %element.kind, "path base found");
            return Some(element);
        }
        most_specific = Some(element);
    }

    most_specific
}

fn is_callable_target<M>(metadata: &M, path: &str) -> bool
where
    M: MetadataService + ?Sized,
{
    metadata
        .edm_target_kinds(path)
        .into_iter()
        .any(|kind| kind.is_callable())
}

/// Resolve every path of a path set to its base element.
///
/// Relative paths are resolved below `base` when one is given. Results are
/// keyed by the path as it appears in the set, in the set's order.
pub fn resolve_paths<M>(
    metadata: &M,
    paths: &PathSet,
    base: Option<&str>,
    aliases: Option<&AliasInformation>,
) -> IndexMap<String, Option<Arc<MetadataElement>>>
where
    M: MetadataService + ?Sized,
{
    let paths: Vec<&str> = paths.iter().collect();
    tracing::debug!(count = paths.len(), "resolving path set");

    let resolved: Vec<(String, Option<Arc<MetadataElement>>)> = paths
        .par_iter()
        .map(|path| {
            let full = match base {
                Some(base) if !path.starts_with('/') => format!("{}/{}", base, path),
                _ => path.to_string(),
            };
            (path.to_string(), get_path_base_metadata_element(metadata, &full, aliases))
        })
        .collect();

    resolved.into_iter().collect()
}

/// Targets of a term tree resolved against the metadata.
#[derive(Clone, Debug, Default)]
pub struct TargetResolution {
    /// Exact element per distinct target, in first-seen order
    pub targets: IndexMap<String, Option<Arc<MetadataElement>>>,
    /// One `W0101` per unknown target
    pub diagnostics: Vec<Diagnostic>,
}

impl TargetResolution {
    pub fn element(&self, target: &str) -> Option<&Arc<MetadataElement>> {
        self.targets.get(target).and_then(Option::as_ref)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter(|(_, element)| element.is_none())
            .map(|(target, _)| target.as_str())
    }
}

/// Look up the target of every term, once per distinct target.
pub fn resolve_targets<M>(
    tree: &TermTree,
    metadata: &M,
    aliases: Option<&AliasInformation>,
) -> TargetResolution
where
    M: MetadataService + ?Sized,
{
    let mut resolution = TargetResolution::default();
    let mut collector = DiagnosticCollector::new();
    let mut seen = FxHashSet::default();

    for term in &tree.terms {
        if !seen.insert(term.target.as_str()) {
            continue;
        }
        let canonical = match aliases {
            Some(aliases) => canonical_path(&term.target, aliases),
            None => term.target.clone(),
        };
        let element = metadata.metadata_element(&canonical);
        if element.is_none() {
            collector.unknown_target(term.target_range, &term.target);
        }
        resolution.targets.insert(term.target.clone(), element);
    }

    resolution.diagnostics = collector.into_vec();
    tracing::debug!(
        targets = resolution.targets.len(),
        unknown = resolution.diagnostics.len(),
        "resolved term targets"
    );
    resolution
}

/// De-alias every segment of a path.
pub fn canonical_path(path: &str, aliases: &AliasInformation) -> String {
    path.split('/')
        .map(|segment| get_segment_without_alias(aliases, segment))
        .collect::<Vec<_>>()
        .join("/")
}
