//! Shared helpers for configuration tests.

use modgraph_lib::config::Config;
use modgraph_lib::configure::{ConfigureError, ConfigureErrors, ConfiguredGraph, Configurator, Phase};
use modgraph_lib::eval::load_definitions_str;

/// Overrides building vendor variants at VNDK version 29.
pub const VENDOR_CONFIG: &str = r#"
modgraph.config { device_vndk_version = "current", platform_vndk_version = "29" }
"#;

/// Evaluate `source` and configure it with the builtin configurator.
pub fn configure(source: &str) -> Result<ConfiguredGraph, ConfigureErrors> {
  let configurator = Configurator::builtin();
  let defs = load_definitions_str(source, "test.lua", configurator.registry())
    .unwrap_or_else(|e| panic!("definitions failed to load: {}", e));
  let mut config = Config::default();
  defs.apply_config(&mut config);
  configurator.configure(defs.modules, &config)
}

/// [`configure`] with vendor variants enabled.
pub fn configure_vendor(source: &str) -> Result<ConfiguredGraph, ConfigureErrors> {
  configure(&format!("{}\n{}", VENDOR_CONFIG, source))
}

/// Errors of a run that must have failed in `phase`.
pub fn errors_in(result: Result<ConfiguredGraph, ConfigureErrors>, phase: Phase) -> Vec<ConfigureError> {
  match result {
    Ok(_) => panic!("expected {} errors, configuration succeeded", phase),
    Err(err) => {
      assert_eq!(err.phase, phase, "unexpected errors: {:?}", err.errors);
      err.errors
    }
  }
}

/// Variant name of the target `module:variant` binds `dependency` to.
pub fn bound_target(graph: &ConfiguredGraph, module: &str, variant: &str, dependency: &str) -> String {
  let source = graph
    .find_variant(module, variant)
    .unwrap_or_else(|| panic!("no variant {}:{}", module, variant));
  graph
    .deps(source.id)
    .into_iter()
    .find(|(edge, _)| edge.reference.to_string() == dependency)
    .map(|(_, target)| target.name())
    .unwrap_or_else(|| panic!("{}:{} has no bound dependency {}", module, variant, dependency))
}
