//! Implementation of the `modgraph variants` command.

use anyhow::{Result, bail};

use modgraph_lib::config::ConfigOverrides;

use super::load::configure_file;
use crate::output::print_variant;

pub fn cmd_variants(file: &str, overrides: &ConfigOverrides, module: &str) -> Result<()> {
  let graph = configure_file(file, overrides)?;
  let variants: Vec<_> = graph.variants_of(module).collect();
  if variants.is_empty() {
    bail!("Unknown module: {}", module);
  }

  for variant in variants {
    print_variant(&variant.name(), variant.enabled);
  }
  Ok(())
}
