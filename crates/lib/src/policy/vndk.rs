use crate::graph::Variant;
use crate::mutator::image::Image;
use crate::mutator::vndk::{LINK_TYPE_PROPERTY, VndkClass};
use crate::props::PropertyMapExt;

use super::{PolicyCheck, PolicyViolation, ResolvedView};

const CHECK: &str = "vndk_link";

/// Link rules inside the vendor image.
///
/// Vendor modules may not link VNDK-private libraries. VNDK libraries may
/// only link other VNDK libraries and LL-NDK; VNDK-SP libraries only VNDK-SP
/// and LL-NDK. Neither may link an extension. Extensions of VNDK-SP keep the
/// VNDK-SP restriction but may link other VNDK-SP extensions.
pub struct VndkLinkCheck;

impl VndkLinkCheck {
  fn class(variant: &Variant) -> VndkClass {
    VndkClass::of(variant).unwrap_or(VndkClass::Platform)
  }

  fn is_private(target: &Variant) -> bool {
    target.props.string(LINK_TYPE_PROPERTY) == Some("native:vndk_private")
  }

  /// The violated rule for `source` linking `target`, if any.
  fn violation(source: &Variant, target: &Variant) -> Option<String> {
    use VndkClass::*;

    let name = target.module_name();
    let class = Self::class(source);
    if class == Vendor && Self::is_private(target) {
      return Some(format!(
        "(vendor) should not link to \"{}\" which is VNDK-private (`vendor_available: false`)",
        name
      ));
    }

    // The remaining rules constrain what ends up loaded at runtime.
    if target.variation("link") != Some("shared") {
      return None;
    }
    let target_class = Self::class(target);
    match class {
      Vndk | VndkPrivate => match target_class {
        Llndk | Vndk | VndkPrivate | VndkSp | VndkSpPrivate => None,
        VndkExt | VndkSpExt => Some(format!("(VNDK) should not link to \"{}\" which is a VNDK extension", name)),
        _ => Some(format!("(VNDK) should not link to \"{}\" which is not VNDK", name)),
      },
      VndkSp | VndkSpPrivate => match target_class {
        Llndk | VndkSp | VndkSpPrivate => None,
        VndkExt | VndkSpExt => Some(format!(
          "(VNDK-SP) should not link to \"{}\" which is a VNDK extension",
          name
        )),
        _ => Some(format!("(VNDK-SP) should not link to \"{}\" which is not VNDK-SP", name)),
      },
      VndkSpExt => match target_class {
        Llndk | VndkSp | VndkSpPrivate | VndkSpExt => None,
        _ => Some(format!(
          "(VNDK-SP extension) should not link to \"{}\" which is not VNDK-SP",
          name
        )),
      },
      _ => None,
    }
  }
}

impl PolicyCheck for VndkLinkCheck {
  fn name(&self) -> &'static str {
    CHECK
  }

  fn check(&self, view: &ResolvedView<'_>) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();
    for source in view.variants().filter(|v| Image::of(v).is_vendor()) {
      view.visit_direct_deps(source.id, |edge, target| {
        if !edge.tag.is_library() {
          return;
        }
        if let Some(message) = Self::violation(source, target) {
          violations.push(PolicyViolation::new(CHECK, source, target, message));
        }
      });
    }
    violations
  }
}
