//! Evaluating and configuring a definitions file for the commands.

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use modgraph_lib::config::{Config, ConfigOverrides};
use modgraph_lib::configure::{ConfiguredGraph, Configurator};
use modgraph_lib::eval::load_definitions;

use crate::output::{print_errors, print_warnings};

/// Evaluate `file`, apply its `modgraph.config{...}` calls and then the
/// command-line `overrides`, and configure the result.
///
/// Every configuration error is printed on its own line before failing.
/// Warnings are printed and do not fail.
pub fn configure_file(file: &str, overrides: &ConfigOverrides) -> Result<ConfiguredGraph> {
  let path = Path::new(file);
  if !path.exists() {
    bail!("Definitions file not found: {}", file);
  }

  let configurator = Configurator::builtin();
  // mlua errors are not Send + Sync, so they are rendered here.
  let definitions = load_definitions(path, configurator.registry())
    .map_err(|e| anyhow!("Failed to evaluate definitions {}: {}", file, e))?;

  let mut config = Config::default();
  definitions.apply_config(&mut config);
  config.apply(overrides);
  debug!(?config, "effective configuration");

  match configurator.configure(definitions.modules, &config) {
    Ok(graph) => {
      print_warnings(graph.warnings());
      Ok(graph)
    }
    Err(failure) => {
      print_errors(&failure.errors);
      Err(failure.into())
    }
  }
}
