use std::cmp::Ordering;

use crate::graph::Variant;
use crate::props::PropertyMapExt;

use super::image::Image;
use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Patch, Split};

pub const STUB_PROPERTY: &str = "stub";

/// Splits shared core variants of libraries with `stubs.versions` into the
/// implementation (empty version) and one stub variant per version.
///
/// Stub variants only export symbols, so they drop every dependency.
pub struct VersionMutator;

impl Mutator for VersionMutator {
  fn name(&self) -> &'static str {
    "version"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::local("version"))
  }

  fn mutate(&self, variant: &Variant, _ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let versions = variant.props.strings("stubs.versions");
    if versions.is_empty() || variant.variation("link") != Some("shared") || Image::of(variant) != Image::Core {
      return Ok(Mutation::unchanged());
    }

    if let Some(empty) = versions.iter().find(|v| v.is_empty()) {
      return Err(MutatorError::invalid(
        self.name(),
        variant,
        format!("invalid stubs version \"{}\"", empty),
      ));
    }

    let mut splits = vec![Split::plain("")];
    for version in versions {
      splits.push(Split::new(
        version.clone(),
        Patch {
          clear_deps: true,
          ..Default::default()
        }
        .replacing(STUB_PROPERTY, true),
      ));
    }
    Ok(Mutation::Split(splits))
  }
}

/// Order stub versions: numerically when both parse as integers, otherwise
/// as strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  match (a.parse::<u64>(), b.parse::<u64>()) {
    (Ok(a), Ok(b)) => a.cmp(&b),
    _ => a.cmp(b),
  }
}

/// The latest of `versions`: numeric maximum when every version is an
/// integer, lexicographic maximum otherwise.
pub fn latest_version<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
  let versions: Vec<&str> = versions.into_iter().collect();
  if versions.iter().all(|v| v.parse::<u64>().is_ok()) {
    versions.into_iter().max_by(|a, b| compare_versions(a, b))
  } else {
    versions.into_iter().max()
  }
}
