//! The variant mutator chain.
//!
//! Each pass looks at every variant that exists when the pass starts and
//! either keeps it (optionally patching its properties) or splits it into
//! one clone per value of the pass's axis. Evaluation runs on the rayon
//! pool for parallel passes; the results are committed by a single serial
//! merge in traversal order, so the graph is only ever mutated from one
//! thread and every run produces the same graph.

pub mod arch;
pub mod image;
pub mod link;
pub mod os;
pub mod prebuilt;
pub mod test_per_src;
pub mod version;
pub mod vndk;

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::graph::{DependencyGraph, Direction, GraphError, Variant, VariantId, Variation};
use crate::props::value::merge_maps;
use crate::props::{PropertyError, PropertyMap, PropertyValue};

/// The axis a pass splits along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
  pub name: &'static str,
  /// Local axes are not requested from dependencies.
  pub local: bool,
}

impl Axis {
  pub const fn inherited(name: &'static str) -> Self {
    Self { name, local: false }
  }

  pub const fn local(name: &'static str) -> Self {
    Self { name, local: true }
  }
}

/// Property changes applied to a variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
  /// Merged with the variant's properties (lists append). Dependency lists
  /// found here add edges and `exclude_*_libs` remove them.
  pub merge: PropertyMap,
  /// Top-level properties replaced outright.
  pub replace: PropertyMap,
  /// Drop every dependency edge of the variant.
  pub clear_deps: bool,
}

impl Patch {
  pub fn merging(merge: PropertyMap) -> Self {
    Self {
      merge,
      ..Default::default()
    }
  }

  pub fn replacing(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
    self.replace.insert(key.to_string(), value.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.merge.is_empty() && self.replace.is_empty() && !self.clear_deps
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
  pub value: String,
  pub patch: Patch,
}

impl Split {
  pub fn new(value: impl Into<String>, patch: Patch) -> Self {
    Self {
      value: value.into(),
      patch,
    }
  }

  pub fn plain(value: impl Into<String>) -> Self {
    Self::new(value, Patch::default())
  }
}

/// What a pass does with one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
  Keep(Patch),
  /// Replace the variant with one clone per split. No splits removes it.
  Split(Vec<Split>),
}

impl Mutation {
  pub fn unchanged() -> Self {
    Self::Keep(Patch::default())
  }
}

/// Read-only view handed to every `mutate` call of a pass.
pub struct MutatorContext<'a> {
  pub config: &'a Config,
  /// The graph as it was when the pass started.
  pub graph: &'a DependencyGraph,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutatorError {
  #[error("{mutator}: module \"{module}\" variant \"{variant}\": duplicate variation \"{value}\"")]
  DuplicateVariation {
    mutator: &'static str,
    module: String,
    variant: String,
    value: String,
  },

  #[error("{mutator}: module \"{module}\" variant \"{variant}\": {message}")]
  InvalidProperty {
    mutator: &'static str,
    module: String,
    variant: String,
    message: String,
  },

  #[error("{mutator}: module \"{module}\" variant \"{variant}\": {source}")]
  Property {
    mutator: &'static str,
    module: String,
    variant: String,
    #[source]
    source: PropertyError,
  },

  #[error("{mutator}: cannot split without an axis")]
  NoAxis { mutator: &'static str },

  #[error(transparent)]
  Graph(#[from] GraphError),
}

impl MutatorError {
  pub fn invalid(mutator: &'static str, variant: &Variant, message: impl Into<String>) -> Self {
    Self::InvalidProperty {
      mutator,
      module: variant.module_name().to_string(),
      variant: variant.name(),
      message: message.into(),
    }
  }

  pub fn property(mutator: &'static str, variant: &Variant, source: PropertyError) -> Self {
    Self::Property {
      mutator,
      module: variant.module_name().to_string(),
      variant: variant.name(),
      source,
    }
  }
}

/// One pass of the chain. Implementations are stateless.
pub trait Mutator: Send + Sync {
  fn name(&self) -> &'static str;

  /// Axis this pass splits along; passes without one may only keep variants.
  fn axis(&self) -> Option<Axis> {
    None
  }

  /// Order variants are evaluated and committed in. Every builtin pass runs
  /// bottom-up.
  fn direction(&self) -> Direction {
    Direction::BottomUp
  }

  /// Whether variants may be evaluated concurrently.
  fn parallel(&self) -> bool {
    true
  }

  fn mutate(&self, variant: &Variant, ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError>;
}

/// Apply `patch` to `variant`.
pub fn apply_patch(variant: &mut Variant, patch: &Patch) -> Result<(), PropertyError> {
  if patch.clear_deps {
    variant.deps.clear();
  }
  merge_maps(&mut variant.props, &patch.merge, "")?;
  for (key, value) in &patch.replace {
    variant.props.insert(key.clone(), value.clone());
  }
  if !patch.clear_deps {
    variant.add_list_deps(&patch.merge)?;
  }
  variant.apply_excludes(&patch.merge);
  variant.refresh_enabled();
  Ok(())
}

/// Ordered list of passes.
#[derive(Default)]
pub struct MutatorChain {
  mutators: Vec<Box<dyn Mutator>>,
}

impl MutatorChain {
  pub fn new() -> Self {
    Self::default()
  }

  /// The builtin chain: os, arch, image, link, vndk, version, test_per_src,
  /// prebuilt_select.
  pub fn builtin() -> Self {
    Self::new()
      .with(os::OsMutator)
      .with(arch::ArchMutator)
      .with(image::ImageMutator)
      .with(link::LinkMutator)
      .with(vndk::VndkMutator)
      .with(version::VersionMutator)
      .with(test_per_src::TestPerSrcMutator)
      .with(prebuilt::PrebuiltSelectMutator)
  }

  pub fn with(mut self, mutator: impl Mutator + 'static) -> Self {
    self.push(Box::new(mutator));
    self
  }

  pub fn push(&mut self, mutator: Box<dyn Mutator>) {
    self.mutators.push(mutator);
  }

  pub fn names(&self) -> Vec<&'static str> {
    self.mutators.iter().map(|m| m.name()).collect()
  }

  pub fn len(&self) -> usize {
    self.mutators.len()
  }

  pub fn is_empty(&self) -> bool {
    self.mutators.is_empty()
  }

  /// Run every pass in order. A pass with errors stops the chain after all
  /// of its errors are collected.
  pub fn run(&self, graph: &mut DependencyGraph, config: &Config) -> Result<(), Vec<MutatorError>> {
    for mutator in &self.mutators {
      run_pass(mutator.as_ref(), graph, config)?;
    }
    info!(passes = self.mutators.len(), variants = graph.variant_count(), "mutator chain complete");
    Ok(())
  }
}

/// Run a single pass over every live variant.
pub fn run_pass(mutator: &dyn Mutator, graph: &mut DependencyGraph, config: &Config) -> Result<(), Vec<MutatorError>> {
  let before = graph.variant_count();
  let order = graph.topological_variants(mutator.direction()).order;

  let results: Vec<(VariantId, Result<Mutation, MutatorError>)> = {
    let ctx = MutatorContext {
      config,
      graph: &*graph,
    };
    let evaluate = |id: &VariantId| {
      ctx
        .graph
        .variant(*id)
        .map(|variant| (*id, mutator.mutate(variant, &ctx)))
    };
    if mutator.parallel() {
      order.par_iter().filter_map(evaluate).collect()
    } else {
      order.iter().filter_map(evaluate).collect()
    }
  };

  let mut errors = Vec::new();
  let mut mutations = Vec::with_capacity(results.len());
  for (id, result) in results {
    match result {
      Ok(mutation) => mutations.push((id, mutation)),
      Err(err) => errors.push(err),
    }
  }
  if !errors.is_empty() {
    return Err(errors);
  }

  for (id, mutation) in mutations {
    if let Err(err) = commit(mutator, graph, id, mutation) {
      errors.push(err);
    }
  }
  if !errors.is_empty() {
    return Err(errors);
  }

  debug!(
    pass = mutator.name(),
    before,
    after = graph.variant_count(),
    "mutator pass complete"
  );
  Ok(())
}

fn commit(mutator: &dyn Mutator, graph: &mut DependencyGraph, id: VariantId, mutation: Mutation) -> Result<(), MutatorError> {
  match mutation {
    Mutation::Keep(patch) => {
      if patch.is_empty() {
        return Ok(());
      }
      if let Some(variant) = graph.variant_mut(id) {
        apply_patch(variant, &patch).map_err(|e| MutatorError::property(mutator.name(), variant, e))?;
      }
      Ok(())
    }
    Mutation::Split(splits) => {
      let axis = mutator.axis().ok_or(MutatorError::NoAxis { mutator: mutator.name() })?;
      let Some(template) = graph.variant(id) else {
        return Ok(());
      };

      let mut seen = HashSet::new();
      let mut clones = Vec::with_capacity(splits.len());
      for split in splits {
        if !seen.insert(split.value.clone()) {
          return Err(MutatorError::DuplicateVariation {
            mutator: mutator.name(),
            module: template.module_name().to_string(),
            variant: template.name(),
            value: split.value,
          });
        }
        let mut clone = template.clone();
        clone.variations.push(Variation {
          axis: axis.name.to_string(),
          value: split.value,
          local: axis.local,
        });
        apply_patch(&mut clone, &split.patch).map_err(|e| MutatorError::property(mutator.name(), &clone, e))?;
        clones.push(clone);
      }

      if clones.is_empty() {
        debug!(pass = mutator.name(), variant = %template.qualified_name(), "variant dropped");
      }
      graph.replace_variant(id, clones)?;
      Ok(())
    }
  }
}
