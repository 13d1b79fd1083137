use crate::module::DepTag;
use crate::mutator::image::Image;
use crate::mutator::vndk::VndkClass;
use crate::props::PropertyMapExt;

use super::{PolicyCheck, PolicyViolation, ResolvedView};

const CHECK: &str = "vndk_extends";

/// A VNDK extension must extend a vendor-available VNDK library of the same
/// flavor (VNDK or VNDK-SP).
pub struct VndkExtendsCheck;

impl PolicyCheck for VndkExtendsCheck {
  fn name(&self) -> &'static str {
    CHECK
  }

  fn check(&self, view: &ResolvedView<'_>) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();
    for source in view.variants().filter(|v| Image::of(v).is_vendor()) {
      view.visit_direct_deps(source.id, |edge, base| {
        if edge.tag != DepTag::VndkExt {
          return;
        }
        let name = base.module_name();
        let message = if !VndkClass::of(base).is_some_and(|class| class.is_vndk()) {
          format!("`extends` refers a non-vndk module \"{}\"", name)
        } else if source.props.flag("vndk.support_system_process") != base.props.flag("vndk.support_system_process") {
          format!("`extends` refers a module \"{}\" with mismatched support_system_process", name)
        } else if base.props.lookup("vendor_available").and_then(|v| v.as_bool()) != Some(true) {
          format!("`extends` refers module \"{}\" which does not have `vendor_available: true`", name)
        } else {
          return;
        };
        violations.push(PolicyViolation::new(CHECK, source, base, message));
      });
    }
    violations
  }
}
