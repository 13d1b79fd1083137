use crate::graph::Variant;
use crate::platform::os::Os;
use crate::props::PropertyMapExt;

use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Split};

/// Splits every module into its device and host variants.
///
/// Modules are device-only unless `host_supported: true`;
/// `device_supported: false` makes them host-only.
pub struct OsMutator;

impl Mutator for OsMutator {
  fn name(&self) -> &'static str {
    "os"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::inherited("os"))
  }

  fn mutate(&self, variant: &Variant, ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let mut splits = Vec::new();
    if variant.props.flag_or("device_supported", true) {
      splits.push(Split::plain(Os::Android.as_str()));
    }
    if variant.props.flag("host_supported") {
      splits.push(Split::plain(ctx.config.host_os.as_str()));
    }
    Ok(Mutation::Split(splits))
  }
}
