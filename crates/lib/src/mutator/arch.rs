use crate::graph::Variant;
use crate::platform::Target;
use crate::platform::arch::{Arch, Multilib};
use crate::platform::os::{Os, OsClass};
use crate::props::PropertyMapExt;
use crate::props::overlay::collect_overlays;

use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Patch, Split};

/// Splits each OS variant into one variant per target architecture.
///
/// Which architectures are built follows `compile_multilib`: `both`,
/// `first`, `32`, `64` or `prefer32`. Each clone gets the `arch.<arch>`,
/// `multilib.<lib32|lib64>`, `target.<android|host>`, `target.<os>` and
/// `target.<os>_<arch>` overlays, in that order.
pub struct ArchMutator;

impl Mutator for ArchMutator {
  fn name(&self) -> &'static str {
    "arch"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::inherited("arch"))
  }

  fn mutate(&self, variant: &Variant, ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let os: Os = variant
      .variation("os")
      .and_then(|os| os.parse().ok())
      .ok_or_else(|| MutatorError::invalid(self.name(), variant, "variant has no os variation"))?;

    let arches = match os.class() {
      OsClass::Device => &ctx.config.device_arches,
      OsClass::Host => &ctx.config.host_arches,
    };

    let multilib = match variant.props.string("compile_multilib") {
      Some(value) => value,
      None => variant
        .module
        .kind
        .as_compilable()
        .map_or("both", |c| c.default_multilib()),
    };
    // Recovery images only carry the primary architecture.
    let multilib = if variant.props.flag("recovery") && multilib == "both" {
      "first"
    } else {
      multilib
    };

    let selected = select_arches(arches, multilib)
      .ok_or_else(|| MutatorError::invalid(self.name(), variant, format!("invalid compile_multilib \"{}\"", multilib)))?;

    let mut splits = Vec::with_capacity(selected.len());
    for arch in selected {
      let target = Target::new(os, arch);
      let paths = vec![
        format!("arch.{}", arch),
        format!("multilib.{}", arch.multilib().as_str()),
        match os.class() {
          OsClass::Device => "target.android".to_string(),
          OsClass::Host => "target.host".to_string(),
        },
        format!("target.{}", os),
        format!("target.{}", target.overlay_key()),
      ];
      let overlay =
        collect_overlays(&variant.props, &paths).map_err(|e| MutatorError::property(self.name(), variant, e))?;
      splits.push(Split::new(arch.as_str(), Patch::merging(overlay)));
    }
    Ok(Mutation::Split(splits))
  }
}

/// Architectures built for `compile_multilib`, `None` for an unknown value.
pub fn select_arches(arches: &[Arch], multilib: &str) -> Option<Vec<Arch>> {
  let of_class = |class: Multilib| -> Vec<Arch> { arches.iter().copied().filter(|a| a.multilib() == class).collect() };
  let selected = match multilib {
    "both" => arches.to_vec(),
    "first" => arches.first().copied().into_iter().collect(),
    "32" => of_class(Multilib::Lib32),
    "64" => of_class(Multilib::Lib64),
    "prefer32" => {
      let lib32 = of_class(Multilib::Lib32);
      if lib32.is_empty() {
        arches.first().copied().into_iter().collect()
      } else {
        lib32.into_iter().take(1).collect()
      }
    }
    _ => return None,
  };
  Some(selected)
}
