//! VNDK classification of variants.
//!
//! The pass does not split anything; it records `vndk_class` and `link_type`
//! on every variant so the boundary checks and generators can read them as
//! ordinary properties.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::graph::Variant;
use crate::props::{PropertyMap, PropertyMapExt};

use super::image::Image;
use super::{Mutation, Mutator, MutatorContext, MutatorError, Patch};

pub const VNDK_CLASS_PROPERTY: &str = "vndk_class";
pub const LINK_TYPE_PROPERTY: &str = "link_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VndkClass {
  Platform,
  Product,
  Llndk,
  Vndk,
  VndkSp,
  VndkPrivate,
  VndkSpPrivate,
  VndkExt,
  VndkSpExt,
  Vendor,
}

impl VndkClass {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Platform => "platform",
      Self::Product => "product",
      Self::Llndk => "llndk",
      Self::Vndk => "vndk",
      Self::VndkSp => "vndk_sp",
      Self::VndkPrivate => "vndk_private",
      Self::VndkSpPrivate => "vndk_sp_private",
      Self::VndkExt => "vndk_ext",
      Self::VndkSpExt => "vndk_sp_ext",
      Self::Vendor => "vendor",
    }
  }

  /// Classify a variant from its module definition and image.
  pub fn classify(props: &PropertyMap, image: Image<'_>) -> Self {
    match image {
      Image::Core | Image::Recovery => Self::Platform,
      Image::Vendor(_) => Self::vndk_class(props).unwrap_or(Self::Vendor),
      Image::Product(_) => Self::vndk_class(props).unwrap_or(Self::Product),
    }
  }

  fn vndk_class(props: &PropertyMap) -> Option<Self> {
    if props.lookup("llndk").is_some() {
      return Some(Self::Llndk);
    }
    if !props.flag("vndk.enabled") {
      return None;
    }
    let sp = props.flag("vndk.support_system_process");
    let ext = props.string("vndk.extends").is_some();
    let private = props.lookup("vendor_available").and_then(|v| v.as_bool()) == Some(false);
    Some(match (sp, ext, private) {
      (true, true, _) => Self::VndkSpExt,
      (false, true, _) => Self::VndkExt,
      (true, false, true) => Self::VndkSpPrivate,
      (true, false, false) => Self::VndkSp,
      (false, false, true) => Self::VndkPrivate,
      (false, false, false) => Self::Vndk,
    })
  }

  /// Class recorded on `variant` by the vndk pass.
  pub fn of(variant: &Variant) -> Option<Self> {
    variant.props.string(VNDK_CLASS_PROPERTY).and_then(|s| s.parse().ok())
  }

  /// VNDK libraries that are not extensions.
  pub fn is_vndk(&self) -> bool {
    matches!(self, Self::Vndk | Self::VndkSp | Self::VndkPrivate | Self::VndkSpPrivate)
  }

  /// VNDK-SP libraries, extensions included.
  pub fn is_vndk_sp(&self) -> bool {
    matches!(self, Self::VndkSp | Self::VndkSpPrivate | Self::VndkSpExt)
  }

  pub fn is_vndk_ext(&self) -> bool {
    matches!(self, Self::VndkExt | Self::VndkSpExt)
  }

  /// The `link_type` string generators use for this class. Private LL-NDK
  /// libraries are `native:vndk_private` even though their class is `llndk`.
  pub fn link_type(&self, llndk_private: bool) -> &'static str {
    match self {
      Self::Platform => "native:platform",
      Self::Product => "native:product",
      Self::Llndk if llndk_private => "native:vndk_private",
      Self::Llndk | Self::Vndk | Self::VndkSp => "native:vndk",
      Self::VndkPrivate | Self::VndkSpPrivate => "native:vndk_private",
      Self::VndkExt | Self::VndkSpExt | Self::Vendor => "native:vendor",
    }
  }
}

impl fmt::Display for VndkClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for VndkClass {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    [
      Self::Platform,
      Self::Product,
      Self::Llndk,
      Self::Vndk,
      Self::VndkSp,
      Self::VndkPrivate,
      Self::VndkSpPrivate,
      Self::VndkExt,
      Self::VndkSpExt,
      Self::Vendor,
    ]
    .into_iter()
    .find(|class| class.as_str() == s)
    .ok_or_else(|| format!("unknown vndk class '{}'", s))
  }
}

/// Records `vndk_class` and `link_type` on every variant.
pub struct VndkMutator;

impl Mutator for VndkMutator {
  fn name(&self) -> &'static str {
    "vndk"
  }

  fn mutate(&self, variant: &Variant, _ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let props = &variant.props;
    let class = VndkClass::classify(props, Image::of(variant));
    let link_type = class.link_type(props.flag("llndk.private"));
    Ok(Mutation::Keep(
      Patch::default()
        .replacing(VNDK_CLASS_PROPERTY, class.as_str())
        .replacing(LINK_TYPE_PROPERTY, link_type),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::props;
  use serde_json::json;

  fn vendor(value: serde_json::Value) -> VndkClass {
    VndkClass::classify(&props(value), Image::Vendor("VER"))
  }

  #[test]
  fn vendor_image_classes() {
    assert_eq!(vendor(json!({"vendor_available": true, "vndk": {"enabled": true}})), VndkClass::Vndk);
    assert_eq!(
      vendor(json!({"vendor_available": false, "vndk": {"enabled": true}})),
      VndkClass::VndkPrivate
    );
    assert_eq!(
      vendor(json!({"vendor_available": true, "vndk": {"enabled": true, "support_system_process": true}})),
      VndkClass::VndkSp
    );
    assert_eq!(
      vendor(json!({"vendor": true, "vndk": {"enabled": true, "extends": "libvndk"}})),
      VndkClass::VndkExt
    );
    assert_eq!(vendor(json!({"llndk": {"symbol_file": "libllndk.map.txt"}})), VndkClass::Llndk);
    assert_eq!(vendor(json!({"vendor": true})), VndkClass::Vendor);
  }

  #[test]
  fn core_variants_are_platform() {
    let props = props(json!({"vendor_available": true, "vndk": {"enabled": true}}));
    assert_eq!(VndkClass::classify(&props, Image::Core), VndkClass::Platform);
    assert_eq!(VndkClass::classify(&props, Image::Recovery), VndkClass::Platform);
  }

  #[test]
  fn link_types() {
    assert_eq!(VndkClass::Vndk.link_type(false), "native:vndk");
    assert_eq!(VndkClass::VndkSp.link_type(false), "native:vndk");
    assert_eq!(VndkClass::VndkPrivate.link_type(false), "native:vndk_private");
    assert_eq!(VndkClass::VndkExt.link_type(false), "native:vendor");
    assert_eq!(VndkClass::Vendor.link_type(false), "native:vendor");
    assert_eq!(VndkClass::Llndk.link_type(false), "native:vndk");
    assert_eq!(VndkClass::Llndk.link_type(true), "native:vndk_private");
    assert_eq!(VndkClass::Platform.link_type(false), "native:platform");
  }

  #[test]
  fn classes_parse_back() {
    for class in ["vndk_sp_ext", "platform", "llndk"] {
      assert_eq!(class.parse::<VndkClass>().unwrap().as_str(), class);
    }
    assert!("system".parse::<VndkClass>().is_err());
  }
}
