//! The configuration pipeline.
//!
//! [`Configurator`] owns the module type registry, the mutator chain and the
//! policy checks. [`Configurator::configure`] turns module definitions into
//! a fully resolved [`ConfiguredGraph`] in four phases:
//!
//! 1. Definitions: type lookup, schema checks, `defaults` inheritance.
//! 2. Mutation: the mutator chain splits modules into variants.
//! 3. Resolution: every dependency edge is bound to one variant.
//! 4. Policy: boundary checks over the resolved graph.
//!
//! Each phase reports all of its errors at once. A failed phase stops the
//! pipeline and no graph is returned.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::graph::topo::VariantDag;
use crate::graph::{DepEdge, DependencyGraph, Variant, VariantId};
use crate::link::{LinkOrder, compute_link_orders, find_static_cycles};
use crate::module::registry::ModuleTypeRegistry;
use crate::module::validate::{check_schema, check_vndk};
use crate::module::{ConfigError, DepRef, DepTag, ModuleDef, ModuleInfo};
use crate::mutator::{MutatorChain, MutatorError};
use crate::policy::{PolicyCheck, PolicyViolation, builtin_checks, run_checks};
use crate::props::PropertyMapExt;
use crate::props::defaults::{DefaultsDecl, resolve_defaults};
use crate::resolve::{ResolveError, resolve};
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// Pipeline phase an error batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Definitions,
  Mutation,
  Resolution,
  Policy,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Definitions => "definitions",
      Self::Mutation => "mutation",
      Self::Resolution => "resolution",
      Self::Policy => "policy",
    };
    write!(f, "{}", name)
  }
}

/// Coarse classification of a [`ConfigureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
  Configuration,
  Mutator,
  MissingVariant,
  DependsOnDisabledModule,
  AmbiguousVariant,
  BoundaryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigureError {
  #[error(transparent)]
  Configuration(#[from] ConfigError),

  #[error(transparent)]
  Mutator(#[from] MutatorError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  BoundaryPolicy(#[from] PolicyViolation),
}

impl ConfigureError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Configuration(_) => ErrorKind::Configuration,
      Self::Mutator(_) => ErrorKind::Mutator,
      Self::Resolve(ResolveError::MissingVariant { .. }) => ErrorKind::MissingVariant,
      Self::Resolve(ResolveError::AmbiguousVariant { .. }) => ErrorKind::AmbiguousVariant,
      Self::Resolve(ResolveError::DependsOnDisabled { .. }) => ErrorKind::DependsOnDisabledModule,
      Self::BoundaryPolicy(_) => ErrorKind::BoundaryPolicy,
    }
  }
}

/// Every error of the phase that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} failed with {} error(s)", errors.len())]
pub struct ConfigureErrors {
  pub phase: Phase,
  pub errors: Vec<ConfigureError>,
}

impl ConfigureErrors {
  fn new<E: Into<ConfigureError>>(phase: Phase, errors: Vec<E>) -> Self {
    Self {
      phase,
      errors: errors.into_iter().map(Into::into).collect(),
    }
  }
}

/// Problems that do not stop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum ConfigureWarning {
  #[error("cyclic static dependency: {}", variants.join(" -> "))]
  CyclicStaticDependency { variants: Vec<String> },
}

/// The registration context: module types, passes and checks.
pub struct Configurator {
  registry: ModuleTypeRegistry,
  chain: MutatorChain,
  checks: Vec<Box<dyn PolicyCheck>>,
}

impl Default for Configurator {
  fn default() -> Self {
    Self::builtin()
  }
}

impl Configurator {
  pub fn new(registry: ModuleTypeRegistry, chain: MutatorChain, checks: Vec<Box<dyn PolicyCheck>>) -> Self {
    Self {
      registry,
      chain,
      checks,
    }
  }

  /// Builtin `cc_*` module types, mutator chain and policy checks.
  pub fn builtin() -> Self {
    Self::new(ModuleTypeRegistry::builtin(), MutatorChain::builtin(), builtin_checks())
  }

  pub fn registry(&self) -> &ModuleTypeRegistry {
    &self.registry
  }

  pub fn chain(&self) -> &MutatorChain {
    &self.chain
  }

  pub fn check_names(&self) -> Vec<&'static str> {
    self.checks.iter().map(|c| c.name()).collect()
  }

  /// Configure `defs` for `config`.
  pub fn configure(&self, defs: Vec<ModuleDef>, config: &Config) -> Result<ConfiguredGraph, ConfigureErrors> {
    let mut graph = self
      .instantiate(defs)
      .map_err(|errors| ConfigureErrors::new(Phase::Definitions, errors))?;
    info!(modules = graph.modules().count(), "definitions loaded");

    self
      .chain
      .run(&mut graph, config)
      .map_err(|errors| ConfigureErrors::new(Phase::Mutation, errors))?;

    resolve(&mut graph).map_err(|errors| ConfigureErrors::new(Phase::Resolution, errors))?;

    let violations = run_checks(&self.checks, &graph);
    if !violations.is_empty() {
      return Err(ConfigureErrors::new(Phase::Policy, violations));
    }
    info!(checks = self.checks.len(), "policy checks passed");

    let dag = VariantDag::from_graph(&graph);
    let topo = dag.topological_order(&graph);
    let link_orders = compute_link_orders(&graph, &topo);
    let warnings = find_static_cycles(&graph, &dag)
      .into_iter()
      .map(|variants| ConfigureWarning::CyclicStaticDependency { variants })
      .collect();

    Ok(ConfiguredGraph {
      graph,
      topo,
      link_orders,
      warnings,
    })
  }

  /// Validate definitions, apply `defaults` and create one variant per
  /// module.
  fn instantiate(&self, defs: Vec<ModuleDef>) -> Result<DependencyGraph, Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut declared = Vec::new();
    let mut decls = BTreeMap::new();
    let mut seen = HashSet::new();

    for (index, def) in defs.into_iter().enumerate() {
      let Some(declared_name) = def.name() else {
        errors.push(ConfigError::MissingName {
          module_type: def.module_type,
          index,
        });
        continue;
      };
      let Some(module_type) = self.registry.get(&def.module_type) else {
        errors.push(ConfigError::UnknownModuleType {
          module: declared_name.to_string(),
          module_type: def.module_type.clone(),
        });
        continue;
      };
      let name = module_type.module_name(declared_name);
      if !seen.insert(name.clone()) {
        errors.push(ConfigError::DuplicateModule { module: name });
        continue;
      }

      let mut props = def.props;
      errors.extend(check_schema(&name, &module_type.schema, &mut props));
      decls.insert(
        name.clone(),
        DefaultsDecl {
          is_defaults: module_type.kind.is_defaults(),
          props,
        },
      );
      declared.push((name, module_type, index));
    }

    let (mut resolved, defaults_errors) = resolve_defaults(&decls);
    errors.extend(defaults_errors.into_iter().map(ConfigError::from));

    let mut graph = DependencyGraph::new();
    for (name, module_type, index) in declared {
      if module_type.kind.is_defaults() {
        continue;
      }
      let Some(props) = resolved.remove(&name) else {
        continue;
      };
      errors.extend(check_vndk(&name, &props));

      let info = ModuleInfo {
        name: name.clone(),
        module_type: module_type.name.clone(),
        kind: module_type.kind,
        props: props.clone(),
        index,
      };
      if let Err(err) = graph.add_module(info) {
        debug!(module = %name, error = %err, "skipping module");
        continue;
      }
      let id = match graph.add_variant(&name, Vec::new(), props.clone()) {
        Ok(id) => id,
        Err(err) => {
          debug!(module = %name, error = %err, "skipping module");
          continue;
        }
      };
      if let Some(variant) = graph.variant_mut(id) {
        // Malformed references were already reported by the checks above.
        if variant.add_list_deps(&props).is_err() {
          continue;
        }
        variant.apply_excludes(&props);
        if let Some(Ok(base)) = props.string("vndk.extends").map(str::parse::<DepRef>) {
          variant.deps.push(DepEdge::loose(DepTag::VndkExt, base));
        }
      }
    }

    if errors.is_empty() { Ok(graph) } else { Err(errors) }
  }
}

/// Sorted module names of each VNDK list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VndkLists {
  pub core: Vec<String>,
  pub sp: Vec<String>,
  pub llndk: Vec<String>,
  pub private: Vec<String>,
}

/// A fully resolved variant graph, ready for generators.
#[derive(Debug)]
pub struct ConfiguredGraph {
  graph: DependencyGraph,
  topo: Vec<VariantId>,
  link_orders: BTreeMap<VariantId, LinkOrder>,
  warnings: Vec<ConfigureWarning>,
}

impl ConfiguredGraph {
  pub fn graph(&self) -> &DependencyGraph {
    &self.graph
  }

  /// Modules in declaration order. Defaults modules are not included.
  pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleInfo>> {
    self.graph.modules()
  }

  pub fn variants_of(&self, module: &str) -> impl Iterator<Item = &Variant> {
    self.graph.variants_of(module)
  }

  pub fn variant(&self, id: VariantId) -> Option<&Variant> {
    self.graph.variant(id)
  }

  /// Look a variant up by module and variant name (`android_arm64_core_shared`).
  pub fn find_variant(&self, module: &str, name: &str) -> Option<&Variant> {
    self.graph.find_variant(module, name)
  }

  /// Enabled variants, dependencies first.
  pub fn topological(&self) -> &[VariantId] {
    &self.topo
  }

  /// Bound dependencies of `id`, in declaration order.
  pub fn deps(&self, id: VariantId) -> Vec<(&DepEdge, &Variant)> {
    let Some(variant) = self.graph.variant(id) else {
      return Vec::new();
    };
    variant
      .deps
      .iter()
      .filter_map(|edge| Some((edge, self.graph.variant(edge.target?)?)))
      .collect()
  }

  pub fn deps_with_tag(&self, id: VariantId, tag: DepTag) -> Vec<&Variant> {
    self
      .deps(id)
      .into_iter()
      .filter(|(edge, _)| edge.tag == tag)
      .map(|(_, target)| target)
      .collect()
  }

  /// Static link order of an enabled variant.
  pub fn link_order(&self, id: VariantId) -> Option<&LinkOrder> {
    self.link_orders.get(&id)
  }

  pub fn warnings(&self) -> &[ConfigureWarning] {
    &self.warnings
  }

  pub fn vndk_lists(&self) -> VndkLists {
    let mut core = BTreeSet::new();
    let mut sp = BTreeSet::new();
    let mut llndk = BTreeSet::new();
    let mut private = BTreeSet::new();

    for module in self.graph.modules() {
      let props = &module.props;
      let name = module.name.clone();
      let vendor_private = props.lookup("vendor_available").and_then(|v| v.as_bool()) == Some(false);
      if props.lookup("llndk").is_some() {
        if props.flag("llndk.private") {
          private.insert(name.clone());
        }
        llndk.insert(name);
      } else if props.flag("vndk.enabled") && props.string("vndk.extends").is_none() {
        if vendor_private {
          private.insert(name.clone());
        }
        if props.flag("vndk.support_system_process") {
          sp.insert(name);
        } else {
          core.insert(name);
        }
      }
    }

    VndkLists {
      core: core.into_iter().collect(),
      sp: sp.into_iter().collect(),
      llndk: llndk.into_iter().collect(),
      private: private.into_iter().collect(),
    }
  }

  /// Serializable view of the whole graph: modules, variants, bindings and
  /// link orders.
  pub fn summary(&self) -> GraphSummary {
    let name_of = |id: VariantId| self.graph.variant(id).map(Variant::qualified_name).unwrap_or_default();

    let modules = self
      .graph
      .modules()
      .map(|module| ModuleSummary {
        name: module.name.clone(),
        module_type: module.module_type.clone(),
        variants: self
          .graph
          .variants_of(&module.name)
          .map(|variant| VariantSummary {
            name: variant.name(),
            enabled: variant.enabled,
            deps: variant
              .deps
              .iter()
              .map(|edge| DepSummary {
                tag: edge.tag,
                reference: edge.reference.to_string(),
                target: edge.target.map(name_of),
              })
              .collect(),
            link_order: self
              .link_order(variant.id)
              .map(|order| order.link_line.iter().copied().map(name_of).collect())
              .unwrap_or_default(),
          })
          .collect(),
      })
      .collect();

    GraphSummary {
      modules,
      vndk: self.vndk_lists(),
      warnings: self.warnings.clone(),
    }
  }

  /// Fingerprint of [`Self::summary`]. Identical inputs give identical
  /// fingerprints.
  pub fn fingerprint(&self) -> Result<ObjectHash, HashError> {
    self.summary().compute_hash()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
  pub modules: Vec<ModuleSummary>,
  pub vndk: VndkLists,
  pub warnings: Vec<ConfigureWarning>,
}

impl Hashable for GraphSummary {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
  pub name: String,
  pub module_type: String,
  pub variants: Vec<VariantSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
  pub name: String,
  pub enabled: bool,
  pub deps: Vec<DepSummary>,
  pub link_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepSummary {
  pub tag: DepTag,
  pub reference: String,
  pub target: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{cc_library, configure_vendor, def};
  use serde_json::json;

  fn configure(defs: Vec<ModuleDef>) -> Result<ConfiguredGraph, ConfigureErrors> {
    Configurator::builtin().configure(defs, &Config::default())
  }

  #[test]
  fn definition_errors_are_batched() {
    let err = configure(vec![
      def("cc_library", json!({ "srcs": ["a.c"] })),
      def("cc_frobnicate", json!({ "name": "libfrob" })),
      cc_library("libdup", &[], &[]),
      cc_library("libdup", &[], &[]),
      def("cc_library", json!({ "name": "libbad", "colour": "red" })),
    ])
    .unwrap_err();

    assert_eq!(err.phase, Phase::Definitions);
    assert_eq!(err.errors.len(), 4, "{:?}", err.errors);
    assert!(err.errors.iter().all(|e| e.kind() == ErrorKind::Configuration));
  }

  #[test]
  fn defaults_are_inherited_and_not_instantiated() {
    let graph = configure(vec![
      def("cc_defaults", json!({ "name": "common", "shared_libs": ["libbar"], "cflags": ["-Wall"] })),
      def("cc_library", json!({ "name": "libfoo", "defaults": ["common"], "cflags": ["-O2"] })),
      cc_library("libbar", &[], &[]),
    ])
    .unwrap();

    assert!(graph.variants_of("common").next().is_none());
    let info = graph.modules().find(|m| m.name == "libfoo").unwrap();
    assert_eq!(info.props.strings("cflags"), ["-Wall", "-O2"]);
    assert_eq!(info.props.strings("shared_libs"), ["libbar"]);
  }

  #[test]
  fn libraries_split_per_arch_and_link() {
    let graph = configure(vec![cc_library("libfoo", &[], &[])]).unwrap();
    let names: Vec<String> = graph.variants_of("libfoo").map(Variant::name).collect();
    assert_eq!(
      names,
      [
        "android_arm64_core_static",
        "android_arm64_core_shared",
        "android_arm_core_static",
        "android_arm_core_shared",
      ]
    );
  }

  #[test]
  fn every_enabled_edge_is_bound() {
    let graph = configure(vec![
      cc_library("liba", &["libb"], &["libc"]),
      cc_library("libb", &[], &[]),
      cc_library("libc", &["libb"], &[]),
    ])
    .unwrap();

    for module in ["liba", "libb", "libc"] {
      for variant in graph.variants_of(module) {
        assert!(variant.deps.iter().all(DepEdge::is_bound), "{}", variant.qualified_name());
      }
    }

    let liba = graph.find_variant("liba", "android_arm64_core_shared").unwrap();
    let shared = graph.deps_with_tag(liba.id, DepTag::Shared);
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].name(), "android_arm64_core_shared");
  }

  #[test]
  fn vndk_lists_are_sorted_by_class() {
    let graph = configure_vendor(vec![
      def("cc_library", json!({ "name": "libvndk", "vendor_available": true, "vndk": { "enabled": true } })),
      def(
        "cc_library",
        json!({ "name": "libvndk_sp", "vendor_available": true, "vndk": { "enabled": true, "support_system_process": true } }),
      ),
      def("cc_library", json!({ "name": "libvndkprivate", "vendor_available": false, "vndk": { "enabled": true } })),
      def("cc_library", json!({ "name": "libllndk", "llndk": { "symbol_file": "libllndk.map.txt" } })),
    ])
    .unwrap();

    let lists = graph.vndk_lists();
    assert_eq!(lists.core, ["libvndk", "libvndkprivate"]);
    assert_eq!(lists.sp, ["libvndk_sp"]);
    assert_eq!(lists.llndk, ["libllndk"]);
    assert_eq!(lists.private, ["libvndkprivate"]);
  }

  #[test]
  fn fingerprint_is_stable() {
    let defs = || {
      vec![
        cc_library("liba", &["libb", "libc"], &[]),
        cc_library("libb", &["libc"], &[]),
        cc_library("libc", &[], &[]),
      ]
    };
    let first = configure(defs()).unwrap().fingerprint().unwrap();
    let second = configure(defs()).unwrap().fingerprint().unwrap();
    assert_eq!(first, second);
  }
}
