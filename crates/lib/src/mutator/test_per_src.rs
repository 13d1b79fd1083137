use std::path::Path;

use crate::graph::Variant;
use crate::props::{PropertyMapExt, PropertyValue};

use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Patch, Split};

/// Splits tests with `test_per_src: true` into one variant per source file,
/// named after the file's stem and building only that file.
pub struct TestPerSrcMutator;

impl Mutator for TestPerSrcMutator {
  fn name(&self) -> &'static str {
    "test_per_src"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::local("test_per_src"))
  }

  fn mutate(&self, variant: &Variant, _ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    if !variant.module.kind.is_test() || !variant.props.flag("test_per_src") {
      return Ok(Mutation::unchanged());
    }

    let srcs = variant.props.strings("srcs");
    if srcs.is_empty() {
      return Err(MutatorError::invalid(self.name(), variant, "test_per_src requires srcs"));
    }

    let splits = srcs
      .iter()
      .map(|src| {
        let stem = Path::new(src)
          .file_stem()
          .map_or_else(|| src.clone(), |s| s.to_string_lossy().into_owned());
        let patch = Patch::default()
          .replacing("srcs", PropertyValue::List(vec![src.clone()]))
          .replacing("stem", stem.clone());
        Split::new(stem, patch)
      })
      .collect();
    Ok(Mutation::Split(splits))
  }
}
