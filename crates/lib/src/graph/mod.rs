//! The variant graph.
//!
//! Variants live in an arena indexed by [`VariantId`]. Removing a variant
//! leaves a tombstone so ids handed out earlier never alias a different
//! variant. Each module keeps the ordered list of its live variants; when a
//! variant is split its clones take its position in that list.

pub mod topo;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::module::{DepRef, DepTag, ModuleInfo};
use crate::props::{PropertyError, PropertyMap, PropertyMapExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VariantId(pub usize);

impl fmt::Display for VariantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// One `(axis, value)` pair of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Variation {
  pub axis: String,
  pub value: String,
  /// Local variations are not requested from dependencies.
  pub local: bool,
}

/// A dependency edge. `target` is `None` until the resolver binds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepEdge {
  pub tag: DepTag,
  pub reference: DepRef,
  pub target: Option<VariantId>,
}

impl DepEdge {
  pub fn loose(tag: DepTag, reference: DepRef) -> Self {
    Self {
      tag,
      reference,
      target: None,
    }
  }

  pub fn is_bound(&self) -> bool {
    self.target.is_some()
  }
}

#[derive(Debug, Clone)]
pub struct Variant {
  pub id: VariantId,
  pub module: Arc<ModuleInfo>,
  pub variations: Vec<Variation>,
  pub props: PropertyMap,
  pub deps: Vec<DepEdge>,
  pub enabled: bool,
}

impl Variant {
  pub fn module_name(&self) -> &str {
    &self.module.name
  }

  /// Variation values joined with `_`, skipping empty values
  /// (e.g. `android_arm64_core_shared_1`).
  pub fn name(&self) -> String {
    self
      .variations
      .iter()
      .filter(|v| !v.value.is_empty())
      .map(|v| v.value.as_str())
      .collect::<Vec<_>>()
      .join("_")
  }

  /// `module:variant`, for messages and summaries.
  pub fn qualified_name(&self) -> String {
    format!("{}:{}", self.module.name, self.name())
  }

  pub fn variation(&self, axis: &str) -> Option<&str> {
    self
      .variations
      .iter()
      .find(|v| v.axis == axis)
      .map(|v| v.value.as_str())
  }

  /// Re-derive the enabled flag from the `enabled` property.
  pub fn refresh_enabled(&mut self) {
    self.enabled = self.props.flag_or("enabled", true);
  }

  /// Add loose edges for every dependency list present in `props`. Stops at
  /// the first entry that is not a valid reference.
  pub fn add_list_deps(&mut self, props: &PropertyMap) -> Result<(), PropertyError> {
    for (property, tag) in DepTag::LIST_PROPERTIES {
      for entry in props.strings(property) {
        let reference = entry
          .parse::<DepRef>()
          .map_err(|message| PropertyError::InvalidEntry {
            path: property.to_string(),
            message,
          })?;
        self.deps.push(DepEdge::loose(tag, reference));
      }
    }
    Ok(())
  }

  /// Apply `exclude_*_libs` found in `props`: drop the named entries from the
  /// variant's dependency lists and their loose edges.
  pub fn apply_excludes(&mut self, props: &PropertyMap) {
    for (property, tag) in DepTag::EXCLUDE_PROPERTIES {
      let excluded = props.strings(property);
      if excluded.is_empty() {
        continue;
      }
      self
        .deps
        .retain(|edge| edge.is_bound() || edge.tag != tag || !excluded.contains(&edge.reference.name));
      if let Some(crate::props::PropertyValue::List(entries)) = self.props.get_mut(tag.property()) {
        entries.retain(|entry| {
          let name = entry.split_once('#').map_or(entry.as_str(), |(name, _)| name);
          !excluded.iter().any(|e| e == name)
        });
      }
    }
  }
}

/// Traversal direction relative to dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  /// Dependencies before their dependents.
  BottomUp,
  /// Dependents before their dependencies.
  TopDown,
}

/// Result of a guarded depth-first traversal.
#[derive(Debug, Clone, Default)]
pub struct TopoOrder {
  pub order: Vec<VariantId>,
  /// Edges that closed a cycle, as `(from, to)`.
  pub back_edges: Vec<(VariantId, VariantId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
  #[error("module \"{module}\" is already in the graph")]
  DuplicateModule { module: String },

  #[error("module \"{module}\" is not in the graph")]
  UnknownModule { module: String },

  #[error("variant {id} does not exist")]
  UnknownVariant { id: VariantId },
}

#[derive(Debug)]
struct ModuleEntry {
  info: Arc<ModuleInfo>,
  variants: Vec<VariantId>,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
  variants: Vec<Option<Variant>>,
  modules: HashMap<String, ModuleEntry>,
  order: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  InStack,
  Done,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_module(&mut self, info: ModuleInfo) -> Result<Arc<ModuleInfo>, GraphError> {
    if self.modules.contains_key(&info.name) {
      return Err(GraphError::DuplicateModule { module: info.name });
    }
    let info = Arc::new(info);
    self.order.push(info.name.clone());
    self.modules.insert(
      info.name.clone(),
      ModuleEntry {
        info: info.clone(),
        variants: Vec::new(),
      },
    );
    Ok(info)
  }

  pub fn module(&self, name: &str) -> Option<&Arc<ModuleInfo>> {
    self.modules.get(name).map(|entry| &entry.info)
  }

  pub fn has_module(&self, name: &str) -> bool {
    self.modules.contains_key(name)
  }

  /// Modules in declaration order.
  pub fn modules(&self) -> impl Iterator<Item = &Arc<ModuleInfo>> {
    self.order.iter().filter_map(|name| self.module(name))
  }

  /// Append a variant with no dependencies to `module`.
  pub fn add_variant(
    &mut self,
    module: &str,
    variations: Vec<Variation>,
    props: PropertyMap,
  ) -> Result<VariantId, GraphError> {
    let entry = self.modules.get_mut(module).ok_or_else(|| GraphError::UnknownModule {
      module: module.to_string(),
    })?;
    let id = VariantId(self.variants.len());
    let mut variant = Variant {
      id,
      module: entry.info.clone(),
      variations,
      props,
      deps: Vec::new(),
      enabled: true,
    };
    variant.refresh_enabled();
    entry.variants.push(id);
    self.variants.push(Some(variant));
    Ok(id)
  }

  /// Remove a variant, leaving a tombstone in the arena.
  pub fn remove_variant(&mut self, id: VariantId) -> Option<Variant> {
    let variant = self.variants.get_mut(id.0)?.take()?;
    if let Some(entry) = self.modules.get_mut(&variant.module.name) {
      entry.variants.retain(|v| *v != id);
    }
    Some(variant)
  }

  /// Replace `id` with `replacements`, which take its position in the
  /// module's variant list. Returns the ids assigned to the replacements.
  pub fn replace_variant(&mut self, id: VariantId, replacements: Vec<Variant>) -> Result<Vec<VariantId>, GraphError> {
    let original = self.remove_variant_keep_slot(id)?;
    let mut ids = Vec::with_capacity(replacements.len());
    let mut clones = Vec::with_capacity(replacements.len());
    for mut variant in replacements {
      let new_id = VariantId(self.variants.len() + clones.len());
      variant.id = new_id;
      ids.push(new_id);
      clones.push(Some(variant));
    }
    self.variants.extend(clones);

    let entry = self
      .modules
      .get_mut(&original.module)
      .ok_or_else(|| GraphError::UnknownModule {
        module: original.module.clone(),
      })?;
    entry.variants.splice(original.position..original.position + 1, ids.iter().copied());
    Ok(ids)
  }

  fn remove_variant_keep_slot(&mut self, id: VariantId) -> Result<RemovedSlot, GraphError> {
    let variant = self
      .variants
      .get_mut(id.0)
      .and_then(Option::take)
      .ok_or(GraphError::UnknownVariant { id })?;
    let module = variant.module.name.clone();
    let position = self
      .modules
      .get(&module)
      .and_then(|entry| entry.variants.iter().position(|v| *v == id))
      .ok_or_else(|| GraphError::UnknownModule { module: module.clone() })?;
    Ok(RemovedSlot { module, position })
  }

  pub fn add_edge(&mut self, from: VariantId, tag: DepTag, reference: DepRef) -> Result<(), GraphError> {
    let variant = self.variant_mut(from).ok_or(GraphError::UnknownVariant { id: from })?;
    variant.deps.push(DepEdge::loose(tag, reference));
    Ok(())
  }

  pub fn variant(&self, id: VariantId) -> Option<&Variant> {
    self.variants.get(id.0).and_then(Option::as_ref)
  }

  pub fn variant_mut(&mut self, id: VariantId) -> Option<&mut Variant> {
    self.variants.get_mut(id.0).and_then(Option::as_mut)
  }

  /// Ids of the live variants of `module`, in module order.
  pub fn variant_ids_of(&self, module: &str) -> &[VariantId] {
    self.modules.get(module).map_or(&[], |entry| entry.variants.as_slice())
  }

  pub fn variants_of(&self, module: &str) -> impl Iterator<Item = &Variant> {
    self.variant_ids_of(module).iter().filter_map(|id| self.variant(*id))
  }

  /// Find the variant of `module` called `name`.
  pub fn find_variant(&self, module: &str, name: &str) -> Option<&Variant> {
    self.variants_of(module).find(|v| v.name() == name)
  }

  /// Every live variant, modules in declaration order.
  pub fn variants(&self) -> impl Iterator<Item = &Variant> {
    self.order.iter().flat_map(|name| self.variants_of(name))
  }

  pub fn variant_count(&self) -> usize {
    self.modules.values().map(|entry| entry.variants.len()).sum()
  }

  /// Call `f` for each direct dependency of `id`.
  ///
  /// Bound edges visit their target; loose edges visit every live variant of
  /// the named module.
  pub fn visit_direct_deps<'a>(&'a self, id: VariantId, mut f: impl FnMut(&'a DepEdge, &'a Variant)) {
    let Some(variant) = self.variant(id) else {
      return;
    };
    for edge in &variant.deps {
      match edge.target {
        Some(target) => {
          if let Some(dep) = self.variant(target) {
            f(edge, dep);
          }
        }
        None => {
          for dep in self.variants_of(&edge.reference.name) {
            f(edge, dep);
          }
        }
      }
    }
  }

  /// Depth-first traversal over all live variants.
  ///
  /// Roots are taken in declaration order. An edge back into the current
  /// DFS stack is recorded in `back_edges` and not followed.
  pub fn topological_variants(&self, direction: Direction) -> TopoOrder {
    let mut marks: HashMap<VariantId, Mark> = HashMap::new();
    let mut topo = TopoOrder::default();
    for variant in self.variants() {
      if !marks.contains_key(&variant.id) {
        self.topo_visit(variant.id, &mut marks, &mut topo);
      }
    }
    if direction == Direction::TopDown {
      topo.order.reverse();
    }
    topo
  }

  /// Post-order walk from `root` on an explicit stack; chain depth does not
  /// grow the call stack.
  fn topo_visit(&self, root: VariantId, marks: &mut HashMap<VariantId, Mark>, topo: &mut TopoOrder) {
    marks.insert(root, Mark::InStack);
    let mut stack = vec![(root, self.direct_dep_ids(root), 0usize)];

    while let Some((id, deps, next)) = stack.last_mut() {
      let id = *id;
      let Some(&dep) = deps.get(*next) else {
        stack.pop();
        marks.insert(id, Mark::Done);
        topo.order.push(id);
        continue;
      };
      *next += 1;

      match marks.get(&dep) {
        Some(Mark::InStack) => {
          debug!(from = %id, to = %dep, "cycle detected in dependency graph");
          topo.back_edges.push((id, dep));
        }
        Some(Mark::Done) => {}
        None => {
          marks.insert(dep, Mark::InStack);
          stack.push((dep, self.direct_dep_ids(dep), 0));
        }
      }
    }
  }

  fn direct_dep_ids(&self, id: VariantId) -> Vec<VariantId> {
    let mut deps = Vec::new();
    self.visit_direct_deps(id, |_, dep| deps.push(dep.id));
    deps
  }
}

struct RemovedSlot {
  module: String,
  position: usize,
}
