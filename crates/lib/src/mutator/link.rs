use crate::graph::Variant;
use crate::props::overlay::collect_overlays;

use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Patch, Split};

/// Splits libraries into `static` and `shared` variants, applying the
/// `static: {...}` and `shared: {...}` overlays.
pub struct LinkMutator;

impl Mutator for LinkMutator {
  fn name(&self) -> &'static str {
    "link"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::local("link"))
  }

  fn mutate(&self, variant: &Variant, _ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let Some(linkable) = variant.module.kind.as_linkable() else {
      return Ok(Mutation::unchanged());
    };
    let values = linkable.link_variations();
    if values.is_empty() {
      return Ok(Mutation::unchanged());
    }

    values
      .into_iter()
      .map(|value| {
        let overlay = collect_overlays(&variant.props, &[value.to_string()])
          .map_err(|e| MutatorError::property(self.name(), variant, e))?;
        Ok(Split::new(value, Patch::merging(overlay)))
      })
      .collect::<Result<Vec<_>, _>>()
      .map(Mutation::Split)
  }
}
