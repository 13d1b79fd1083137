//! Product configuration consumed by the mutator chain.
//!
//! A [`Config`] describes what is being built: which architectures the device
//! and the host support and which VNDK versions the vendor and product
//! partitions are built against. Definitions files may override fields with
//! `modgraph.config{...}` and the CLI may override them again with flags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// Version string meaning "the platform's own VNDK version".
pub const CURRENT_VNDK_VERSION: &str = "current";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Device architectures, primary first.
  pub device_arches: Vec<Arch>,
  pub host_os: Os,
  /// Host architectures, primary first.
  pub host_arches: Vec<Arch>,
  /// VNDK version the vendor partition is built against. Without one no
  /// vendor variants are created and vendor modules build in the core image.
  pub device_vndk_version: Option<String>,
  pub platform_vndk_version: String,
  pub product_vndk_version: Option<String>,
  pub features: BTreeSet<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      device_arches: vec![Arch::Arm64, Arch::Arm],
      host_os: Os::current().unwrap_or(Os::Linux),
      host_arches: vec![Arch::X86_64, Arch::X86],
      device_vndk_version: None,
      platform_vndk_version: CURRENT_VNDK_VERSION.to_string(),
      product_vndk_version: None,
      features: BTreeSet::new(),
    }
  }
}

/// Partial configuration, as written in `modgraph.config{...}`.
///
/// Every field is optional; present fields replace the corresponding
/// [`Config`] field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
  pub device_arches: Option<Vec<Arch>>,
  pub host_os: Option<Os>,
  pub host_arches: Option<Vec<Arch>>,
  pub device_vndk_version: Option<String>,
  pub platform_vndk_version: Option<String>,
  pub product_vndk_version: Option<String>,
  pub features: Option<Vec<String>>,
}

impl Config {
  /// Apply `overrides` on top of this configuration.
  pub fn apply(&mut self, overrides: &ConfigOverrides) {
    if let Some(arches) = &overrides.device_arches {
      self.device_arches = arches.clone();
    }
    if let Some(os) = overrides.host_os {
      self.host_os = os;
    }
    if let Some(arches) = &overrides.host_arches {
      self.host_arches = arches.clone();
    }
    if let Some(v) = &overrides.device_vndk_version {
      self.device_vndk_version = Some(v.clone());
    }
    if let Some(v) = &overrides.platform_vndk_version {
      self.platform_vndk_version = v.clone();
    }
    if let Some(v) = &overrides.product_vndk_version {
      self.product_vndk_version = Some(v.clone());
    }
    if let Some(features) = &overrides.features {
      self.features = features.iter().cloned().collect();
    }
  }

  /// Effective VNDK version of the vendor image, if vendor variants are built.
  ///
  /// `current` resolves to the platform VNDK version.
  pub fn vendor_vndk_version(&self) -> Option<&str> {
    self.device_vndk_version.as_deref().map(|v| self.resolve_vndk_version(v))
  }

  /// Effective VNDK version of the product image, if product variants are built.
  pub fn product_vndk_version(&self) -> Option<&str> {
    self.product_vndk_version.as_deref().map(|v| self.resolve_vndk_version(v))
  }

  pub fn has_feature(&self, feature: &str) -> bool {
    self.features.contains(feature)
  }

  fn resolve_vndk_version<'a>(&'a self, version: &'a str) -> &'a str {
    if version == CURRENT_VNDK_VERSION {
      &self.platform_vndk_version
    } else {
      version
    }
  }
}
