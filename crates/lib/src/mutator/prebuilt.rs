use crate::consts::PREBUILT_PREFIX;
use crate::graph::{DependencyGraph, Variant};
use crate::props::PropertyMapExt;

use super::{Mutation, Mutator, MutatorContext, MutatorError, Patch};

/// Set on prebuilt variants that replace their source module.
pub const PREBUILT_SELECTED_PROPERTY: &str = "prebuilt_selected";
/// Set on source variants replaced by a prebuilt.
pub const PREBUILT_SHADOWED_PROPERTY: &str = "prebuilt_shadowed";

/// Decides, for every `prebuilt_<name>` module, whether it replaces the
/// source module `<name>`.
///
/// A prebuilt is used when it has `srcs` and either sets `prefer: true` or
/// no source module exists. Runs serially: the decision reads other modules.
pub struct PrebuiltSelectMutator;

impl PrebuiltSelectMutator {
  fn usable(variant: &Variant) -> bool {
    !variant.props.strings("srcs").is_empty()
  }

  /// Prebuilt variant of `prebuilt` agreeing with `source` on every axis
  /// both carry.
  fn matching<'a>(graph: &'a DependencyGraph, prebuilt: &str, source: &Variant) -> Option<&'a Variant> {
    graph.variants_of(prebuilt).find(|candidate| {
      candidate
        .variations
        .iter()
        .all(|v| source.variation(&v.axis).is_none_or(|value| value == v.value))
    })
  }
}

impl Mutator for PrebuiltSelectMutator {
  fn name(&self) -> &'static str {
    "prebuilt_select"
  }

  fn parallel(&self) -> bool {
    false
  }

  fn mutate(&self, variant: &Variant, ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let name = variant.module_name();

    if variant.module.kind.is_prebuilt() {
      let source = name.strip_prefix(PREBUILT_PREFIX).unwrap_or(name);
      let selected = Self::usable(variant) && (variant.props.flag("prefer") || !ctx.graph.has_module(source));
      return Ok(Mutation::Keep(
        Patch::default().replacing(PREBUILT_SELECTED_PROPERTY, selected),
      ));
    }

    let prebuilt = format!("{}{}", PREBUILT_PREFIX, name);
    if ctx.graph.has_module(&prebuilt)
      && let Some(candidate) = Self::matching(ctx.graph, &prebuilt, variant)
      && Self::usable(candidate)
      && candidate.props.flag("prefer")
    {
      return Ok(Mutation::Keep(
        Patch::default().replacing(PREBUILT_SHADOWED_PROPERTY, true),
      ));
    }
    Ok(Mutation::unchanged())
  }
}
