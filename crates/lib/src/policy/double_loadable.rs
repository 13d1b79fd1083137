use std::collections::HashSet;

use crate::graph::{Variant, VariantId};
use crate::module::DepTag;
use crate::mutator::image::{Image, has_vendor_variant};
use crate::mutator::version::STUB_PROPERTY;
use crate::props::PropertyMapExt;

use super::{PolicyCheck, PolicyViolation, ResolvedView};

const CHECK: &str = "double_loadable";

/// Libraries that may be loaded into both the system and the vendor
/// namespace of one process.
///
/// An LL-NDK or `double_loadable` library in the core image can pull other
/// libraries into a vendor process. Every library it reaches through shared
/// edges that also has a vendor variant would then exist twice, so it must
/// itself be LL-NDK, VNDK-SP or `double_loadable`. Libraries with no vendor
/// variant are walked through.
pub struct DoubleLoadableCheck;

impl DoubleLoadableCheck {
  fn is_root(variant: &Variant) -> bool {
    Image::of(variant) == Image::Core
      && variant.variation("link") == Some("shared")
      && !variant.props.flag(STUB_PROPERTY)
      && (variant.props.lookup("llndk").is_some() || variant.props.flag("double_loadable"))
  }

  fn may_be_double_loaded(variant: &Variant) -> bool {
    let props = &variant.props;
    props.lookup("llndk").is_some()
      || (props.flag("vndk.enabled") && props.flag("vndk.support_system_process"))
      || props.flag("double_loadable")
  }

  fn walk<'a>(
    view: &ResolvedView<'a>,
    root: &'a Variant,
    current: VariantId,
    path: &mut Vec<&'a str>,
    visited: &mut HashSet<VariantId>,
    violations: &mut Vec<PolicyViolation>,
  ) {
    let mut children = Vec::new();
    view.visit_direct_deps(current, |edge, child| {
      if edge.tag == DepTag::Shared && visited.insert(child.id) {
        children.push(child);
      }
    });

    for child in children {
      if Self::may_be_double_loaded(child) {
        continue;
      }
      path.push(child.module_name());
      if has_vendor_variant(&child.props) {
        let message = format!(
          "links a library \"{}\" which is not LL-NDK, VNDK-SP, or explicitly marked as 'double_loadable:true'. (dependency: {})",
          child.module_name(),
          path.join(" -> ")
        );
        violations.push(PolicyViolation::new(CHECK, root, child, message));
      } else {
        Self::walk(view, root, child.id, path, visited, violations);
      }
      path.pop();
    }
  }
}

impl PolicyCheck for DoubleLoadableCheck {
  fn name(&self) -> &'static str {
    CHECK
  }

  fn check(&self, view: &ResolvedView<'_>) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();
    for root in view.variants().filter(|v| Self::is_root(v)) {
      let mut path = vec![root.module_name()];
      let mut visited = HashSet::from([root.id]);
      Self::walk(view, root, root.id, &mut path, &mut visited, &mut violations);
    }
    violations
  }
}
