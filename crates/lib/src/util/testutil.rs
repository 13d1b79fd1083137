//! Test helpers for modgraph-lib.
//!
//! Definitions in unit tests are written as `serde_json::json!` literals and
//! converted into property bags here.

use crate::config::Config;
use crate::configure::{ConfigureError, ConfigureErrors, ConfiguredGraph, Configurator, Phase};
use crate::module::ModuleDef;
use crate::props::PropertyMap;

/// Convert a JSON object into a property bag.
pub fn props(value: serde_json::Value) -> PropertyMap {
  serde_json::from_value(value).expect("test properties must be a JSON object of property values")
}

/// A module definition of `module_type` with the given properties.
pub fn def(module_type: &str, value: serde_json::Value) -> ModuleDef {
  ModuleDef::new(module_type, props(value))
}

/// A `cc_library` named `name` with `static_libs` and `shared_libs`.
pub fn cc_library(name: &str, static_libs: &[&str], shared_libs: &[&str]) -> ModuleDef {
  def(
    "cc_library",
    serde_json::json!({
      "name": name,
      "srcs": [format!("{}.c", name)],
      "static_libs": static_libs,
      "shared_libs": shared_libs,
    }),
  )
}

/// Configuration building vendor variants at VNDK version 29.
pub fn vendor_config() -> Config {
  Config {
    device_vndk_version: Some("current".into()),
    platform_vndk_version: "29".into(),
    ..Config::default()
  }
}

/// Configure `defs` with the builtin configurator and [`vendor_config`].
pub fn configure_vendor(defs: Vec<ModuleDef>) -> Result<ConfiguredGraph, ConfigureErrors> {
  Configurator::builtin().configure(defs, &vendor_config())
}

/// The errors of a run that must have failed in the policy phase.
pub fn policy_errors(result: Result<ConfiguredGraph, ConfigureErrors>) -> Vec<ConfigureError> {
  match result {
    Ok(_) => panic!("expected policy errors, configuration succeeded"),
    Err(err) => {
      assert_eq!(err.phase, Phase::Policy, "unexpected failure: {:?}", err.errors);
      err.errors
    }
  }
}
