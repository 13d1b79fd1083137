use crate::graph::Variant;
use crate::platform::os::{Os, OsClass};
use crate::props::overlay::collect_overlays;
use crate::props::{PropertyMap, PropertyMapExt};

use super::version::STUB_PROPERTY;
use super::{Axis, Mutation, Mutator, MutatorContext, MutatorError, Patch, Split};

pub const CORE_IMAGE: &str = "core";
pub const RECOVERY_IMAGE: &str = "recovery";
pub const VENDOR_IMAGE_PREFIX: &str = "vendor.";
pub const PRODUCT_IMAGE_PREFIX: &str = "product.";

/// Partition image a variant is installed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image<'a> {
  Core,
  Vendor(&'a str),
  Product(&'a str),
  Recovery,
}

impl<'a> Image<'a> {
  /// Parse an `image` variation value.
  pub fn parse(value: &'a str) -> Option<Self> {
    if value == CORE_IMAGE {
      Some(Self::Core)
    } else if value == RECOVERY_IMAGE {
      Some(Self::Recovery)
    } else if let Some(version) = value.strip_prefix(VENDOR_IMAGE_PREFIX) {
      Some(Self::Vendor(version))
    } else {
      value.strip_prefix(PRODUCT_IMAGE_PREFIX).map(Self::Product)
    }
  }

  /// Image of `variant`; variants not split by image count as core.
  pub fn of(variant: &'a Variant) -> Self {
    variant.variation("image").and_then(Self::parse).unwrap_or(Self::Core)
  }

  pub fn value(&self) -> String {
    match self {
      Self::Core => CORE_IMAGE.to_string(),
      Self::Vendor(version) => format!("{}{}", VENDOR_IMAGE_PREFIX, version),
      Self::Product(version) => format!("{}{}", PRODUCT_IMAGE_PREFIX, version),
      Self::Recovery => RECOVERY_IMAGE.to_string(),
    }
  }

  pub fn is_vendor(&self) -> bool {
    matches!(self, Self::Vendor(_))
  }

  fn overlay(&self) -> Option<&'static str> {
    match self {
      Self::Core => None,
      Self::Vendor(_) => Some("target.vendor"),
      Self::Product(_) => Some("target.product"),
      Self::Recovery => Some("target.recovery"),
    }
  }
}

/// Whether a module's definition gives it a vendor variant next to its core
/// one (`vendor_available`, VNDK and LL-NDK libraries).
pub fn has_vendor_variant(props: &PropertyMap) -> bool {
  props.lookup("vendor_available").is_some() || props.flag("vndk.enabled") || props.lookup("llndk").is_some()
}

/// Whether a module is installed only to the vendor partition.
pub fn is_vendor_only(props: &PropertyMap) -> bool {
  props.flag("vendor") || props.flag("soc_specific") || props.flag("proprietary")
}

/// Splits device variants by partition image: `core`, `vendor.<ver>`,
/// `product.<ver>` and `recovery`. Host variants are always `core`.
pub struct ImageMutator;

impl ImageMutator {
  fn images<'c>(props: &PropertyMap, vendor: Option<&'c str>, product: Option<&'c str>) -> Vec<Image<'c>> {
    if props.flag("recovery") {
      return vec![Image::Recovery];
    }
    if is_vendor_only(props) {
      return vec![vendor.map_or(Image::Core, Image::Vendor)];
    }
    if props.flag("product_specific") {
      return vec![product.map_or(Image::Core, Image::Product)];
    }

    let mut images = vec![Image::Core];
    if has_vendor_variant(props)
      && let Some(version) = vendor
    {
      images.push(Image::Vendor(version));
    }
    if (props.flag("product_available") || props.lookup("llndk").is_some())
      && let Some(version) = product
    {
      images.push(Image::Product(version));
    }
    if props.flag("recovery_available") {
      images.push(Image::Recovery);
    }
    images
  }
}

impl Mutator for ImageMutator {
  fn name(&self) -> &'static str {
    "image"
  }

  fn axis(&self) -> Option<Axis> {
    Some(Axis::inherited("image"))
  }

  fn mutate(&self, variant: &Variant, ctx: &MutatorContext<'_>) -> Result<Mutation, MutatorError> {
    let is_host = variant
      .variation("os")
      .and_then(|os| os.parse::<Os>().ok())
      .is_some_and(|os| os.class() == OsClass::Host);
    if is_host {
      return Ok(Mutation::Split(vec![Split::plain(CORE_IMAGE)]));
    }

    let images = Self::images(
      &variant.props,
      ctx.config.vendor_vndk_version(),
      ctx.config.product_vndk_version(),
    );

    let is_llndk = variant.props.lookup("llndk").is_some();
    let mut splits = Vec::with_capacity(images.len());
    for image in images {
      let mut patch = match image.overlay() {
        Some(path) => Patch::merging(
          collect_overlays(&variant.props, &[path.to_string()])
            .map_err(|e| MutatorError::property(self.name(), variant, e))?,
        ),
        None => Patch::default(),
      };
      // Outside the core image an LL-NDK library is only its stub.
      if is_llndk && matches!(image, Image::Vendor(_) | Image::Product(_)) {
        patch = Patch {
          clear_deps: true,
          ..patch
        }
        .replacing(STUB_PROPERTY, true);
      }
      splits.push(Split::new(image.value(), patch));
    }
    Ok(Mutation::Split(splits))
  }
}
