//! Dependency resolution.
//!
//! Every loose edge of an enabled variant is bound to exactly one variant of
//! its target module. The variations requested from the target are the
//! source's inherited variations, with the `link` axis replaced by what the
//! edge's tag needs and a `version` added for `name#version` references.
//! A requested axis only constrains targets that carry it.

use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::consts::PREBUILT_PREFIX;
use crate::graph::{DepEdge, DependencyGraph, Variant, VariantId};
use crate::mutator::prebuilt::PREBUILT_SELECTED_PROPERTY;
use crate::mutator::version::latest_version;
use crate::props::PropertyMapExt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
  #[error("dependency \"{dependency}\" of \"{module}\" missing variant: {reason} (from variant \"{variant}\")")]
  MissingVariant {
    module: String,
    variant: String,
    dependency: String,
    reason: String,
  },

  #[error("dependency \"{dependency}\" of \"{module}\" variant \"{variant}\" is ambiguous: {}", candidates.join(", "))]
  AmbiguousVariant {
    module: String,
    variant: String,
    dependency: String,
    candidates: Vec<String>,
  },

  #[error("module \"{module}\" variant \"{variant}\" depends on disabled module \"{dependency}\" variant \"{target_variant}\"")]
  DependsOnDisabled {
    module: String,
    variant: String,
    dependency: String,
    target_variant: String,
  },
}

/// Variations an edge requests from its target, in the source's axis order.
pub fn requested_variations(source: &Variant, edge: &DepEdge) -> Vec<(String, String)> {
  let mut requested: Vec<(String, String)> = source
    .variations
    .iter()
    .filter(|v| !v.local)
    .map(|v| (v.axis.clone(), v.value.clone()))
    .collect();
  requested.push(("link".to_string(), edge.tag.link_variation().to_string()));
  if let Some(version) = &edge.reference.version {
    requested.push(("version".to_string(), version.clone()));
  }
  requested
}

fn matches(candidate: &Variant, axis: &str, value: &str) -> bool {
  // An explicit version is never satisfied by a target without one.
  if axis == "version" {
    return candidate.variation(axis) == Some(value);
  }
  candidate.variation(axis).is_none_or(|v| v == value)
}

enum Selection<'a> {
  Found(&'a Variant),
  Missing(String),
  Ambiguous(Vec<String>),
}

/// Pick the variant of `target` satisfying `requested`.
fn select<'a>(graph: &'a DependencyGraph, target: &str, requested: &[(String, String)], versioned: bool) -> Selection<'a> {
  if !graph.has_module(target) {
    return Selection::Missing("undefined module".to_string());
  }

  let mut candidates: Vec<&Variant> = graph.variants_of(target).collect();
  if candidates.is_empty() {
    return Selection::Missing("module has no variants".to_string());
  }

  for (axis, value) in requested {
    let remaining: Vec<&Variant> = candidates
      .iter()
      .copied()
      .filter(|c| matches(c, axis, value))
      .collect();
    if remaining.is_empty() {
      let mut available: Vec<&str> = Vec::new();
      for value in candidates.iter().filter_map(|c| c.variation(axis)) {
        if !available.contains(&value) {
          available.push(value);
        }
      }
      let available = if available.is_empty() {
        "none".to_string()
      } else {
        available.join(", ")
      };
      return Selection::Missing(format!(
        "no variant with {}:{} (available: {})",
        axis, value, available
      ));
    }
    candidates = remaining;
  }

  // Unversioned references to a library with stubs get the latest stub.
  if !versioned {
    let latest = latest_version(
      candidates
        .iter()
        .filter_map(|c| c.variation("version"))
        .filter(|v| !v.is_empty()),
    );
    if let Some(latest) = latest {
      candidates.retain(|c| c.variation("version") == Some(latest));
    }
  }

  match candidates.as_slice() {
    [single] => Selection::Found(single),
    _ => Selection::Ambiguous(candidates.iter().map(|c| c.name()).collect()),
  }
}

/// Resolve a single edge of `source`.
pub fn resolve_edge(graph: &DependencyGraph, source: &Variant, edge: &DepEdge) -> Result<VariantId, ResolveError> {
  let requested = requested_variations(source, edge);
  let versioned = edge.reference.version.is_some();
  let name = edge.reference.name.as_str();

  let prebuilt = format!("{}{}", PREBUILT_PREFIX, name);
  let mut selection = None;
  if graph.has_module(&prebuilt) {
    let from_prebuilt = select(graph, &prebuilt, &requested, versioned);
    match from_prebuilt {
      Selection::Found(candidate) if candidate.props.flag(PREBUILT_SELECTED_PROPERTY) => {
        trace!(dependency = %edge.reference, prebuilt = %candidate.qualified_name(), "using prebuilt");
        selection = Some(Selection::Found(candidate));
      }
      Selection::Found(candidate) if !graph.has_module(name) => {
        selection = Some(Selection::Missing(format!(
          "prebuilt \"{}\" variant \"{}\" has no usable srcs",
          prebuilt,
          candidate.name()
        )));
      }
      other if !graph.has_module(name) => selection = Some(other),
      _ => {}
    }
  }
  let selection = selection.unwrap_or_else(|| select(graph, name, &requested, versioned));

  match selection {
    Selection::Found(target) if !target.enabled => Err(ResolveError::DependsOnDisabled {
      module: source.module_name().to_string(),
      variant: source.name(),
      dependency: target.module_name().to_string(),
      target_variant: target.name(),
    }),
    Selection::Found(target) => Ok(target.id),
    Selection::Missing(reason) => Err(ResolveError::MissingVariant {
      module: source.module_name().to_string(),
      variant: source.name(),
      dependency: edge.reference.to_string(),
      reason,
    }),
    Selection::Ambiguous(candidates) => Err(ResolveError::AmbiguousVariant {
      module: source.module_name().to_string(),
      variant: source.name(),
      dependency: edge.reference.to_string(),
      candidates,
    }),
  }
}

/// Bind every loose edge of every enabled variant.
///
/// Bindings are computed in parallel against the unmodified graph and
/// committed afterwards. Any error leaves the graph untouched.
pub fn resolve(graph: &mut DependencyGraph) -> Result<(), Vec<ResolveError>> {
  let sources: Vec<VariantId> = graph.variants().filter(|v| v.enabled).map(|v| v.id).collect();
  let skipped = graph.variant_count() - sources.len();
  if skipped > 0 {
    debug!(skipped, "not resolving edges of disabled variants");
  }

  let results: Vec<(VariantId, usize, Result<VariantId, ResolveError>)> = {
    let graph = &*graph;
    sources
      .par_iter()
      .flat_map_iter(|id| {
        let source = graph.variant(*id);
        source
          .into_iter()
          .flat_map(|source| source.deps.iter().enumerate().map(move |(index, edge)| (source, index, edge)))
          .filter(|(_, _, edge)| !edge.is_bound())
          .map(|(source, index, edge)| (source.id, index, resolve_edge(graph, source, edge)))
          .collect::<Vec<_>>()
      })
      .collect()
  };

  let mut errors = Vec::new();
  let mut bindings = Vec::new();
  for (source, index, result) in results {
    match result {
      Ok(target) => bindings.push((source, index, target)),
      Err(err) => errors.push(err),
    }
  }
  if !errors.is_empty() {
    return Err(errors);
  }

  let bound = bindings.len();
  for (source, index, target) in bindings {
    if let Some(edge) = graph.variant_mut(source).and_then(|v| v.deps.get_mut(index)) {
      edge.target = Some(target);
    }
  }
  info!(edges = bound, "dependencies resolved");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::Variation;
  use crate::module::kind::{LibraryKind, ModuleKind};
  use crate::module::{DepRef, DepTag, ModuleInfo};
  use crate::props::PropertyMap;
  use crate::util::testutil::props;
  use serde_json::json;

  fn variations(axes: &[(&str, &str, bool)]) -> Vec<Variation> {
    axes
      .iter()
      .map(|(axis, value, local)| Variation {
        axis: axis.to_string(),
        value: value.to_string(),
        local: *local,
      })
      .collect()
  }

  fn add(graph: &mut DependencyGraph, name: &str, variants: &[Vec<Variation>]) -> Vec<VariantId> {
    let index = graph.modules().count();
    graph
      .add_module(ModuleInfo {
        name: name.to_string(),
        module_type: "cc_library".into(),
        kind: ModuleKind::Library(LibraryKind {
          static_lib: true,
          shared_lib: true,
          prebuilt: false,
        }),
        props: PropertyMap::new(),
        index,
      })
      .unwrap();
    variants
      .iter()
      .map(|v| graph.add_variant(name, v.clone(), PropertyMap::new()).unwrap())
      .collect()
  }

  fn lib_variants(arch: &str, versions: &[&str]) -> Vec<Vec<Variation>> {
    let mut out = vec![variations(&[("arch", arch, false), ("link", "static", true)])];
    if versions.is_empty() {
      out.push(variations(&[("arch", arch, false), ("link", "shared", true)]));
    }
    for version in versions {
      out.push(variations(&[
        ("arch", arch, false),
        ("link", "shared", true),
        ("version", version, true),
      ]));
    }
    out
  }

  fn binary(graph: &mut DependencyGraph, deps: &[(DepTag, &str)]) -> VariantId {
    let id = add(graph, "bin", &[variations(&[("arch", "arm64", false)])])[0];
    for (tag, reference) in deps {
      graph.add_edge(id, *tag, reference.parse::<DepRef>().unwrap()).unwrap();
    }
    id
  }

  #[test]
  fn unversioned_reference_binds_latest_stub() {
    let mut graph = DependencyGraph::new();
    let foo = add(&mut graph, "libfoo", &lib_variants("arm64", &["", "1", "2", "3"]));
    let bin = binary(&mut graph, &[(DepTag::Shared, "libfoo"), (DepTag::Shared, "libfoo#1")]);
    resolve(&mut graph).unwrap();

    let deps = &graph.variant(bin).unwrap().deps;
    assert_eq!(deps[0].target, Some(foo[4]));
    assert_eq!(deps[1].target, Some(foo[2]));
    assert_eq!(graph.variant(foo[4]).unwrap().variation("version"), Some("3"));
  }

  #[test]
  fn static_reference_ignores_versions() {
    let mut graph = DependencyGraph::new();
    let foo = add(&mut graph, "libfoo", &lib_variants("arm64", &["", "1"]));
    let bin = binary(&mut graph, &[(DepTag::Static, "libfoo")]);
    resolve(&mut graph).unwrap();
    assert_eq!(graph.variant(bin).unwrap().deps[0].target, Some(foo[0]));
  }

  #[test]
  fn missing_version_names_the_axis() {
    let mut graph = DependencyGraph::new();
    add(&mut graph, "libfoo", &lib_variants("arm64", &["", "1"]));
    binary(&mut graph, &[(DepTag::Shared, "libfoo#7")]);
    let errors = resolve(&mut graph).unwrap_err();
    assert_eq!(errors.len(), 1);
    let message = errors[0].to_string();
    assert!(message.starts_with("dependency \"libfoo#7\" of \"bin\" missing variant"), "{message}");
    assert!(message.contains("no variant with version:7 (available: , 1)"), "{message}");
  }

  #[test]
  fn mismatched_arch_is_missing_variant() {
    let mut graph = DependencyGraph::new();
    add(&mut graph, "libfoo", &lib_variants("arm", &[]));
    binary(&mut graph, &[(DepTag::Shared, "libfoo"), (DepTag::Shared, "libundefined")]);
    let errors = resolve(&mut graph).unwrap_err();
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("no variant with arch:arm64 (available: arm)"));
    assert!(messages[1].contains("dependency \"libundefined\" of \"bin\" missing variant: undefined module"));
  }

  #[test]
  fn disabled_target_is_an_error() {
    let mut graph = DependencyGraph::new();
    let foo = add(&mut graph, "libfoo", &lib_variants("arm64", &[]));
    graph.variant_mut(foo[1]).unwrap().props = props(json!({"enabled": false}));
    graph.variant_mut(foo[1]).unwrap().refresh_enabled();
    binary(&mut graph, &[(DepTag::Shared, "libfoo")]);
    let errors = resolve(&mut graph).unwrap_err();
    assert_eq!(
      errors,
      vec![ResolveError::DependsOnDisabled {
        module: "bin".into(),
        variant: "arm64".into(),
        dependency: "libfoo".into(),
        target_variant: "arm64_shared".into(),
      }]
    );
  }

  #[test]
  fn disabled_sources_are_not_resolved() {
    let mut graph = DependencyGraph::new();
    let bin = binary(&mut graph, &[(DepTag::Shared, "libundefined")]);
    graph.variant_mut(bin).unwrap().enabled = false;
    resolve(&mut graph).unwrap();
    assert!(!graph.variant(bin).unwrap().deps[0].is_bound());
  }
}
