//! Implementation of the `modgraph check` command.
//!
//! Runs the whole configuration pipeline and reports only whether it
//! succeeded. Errors are printed by [`configure_file`], one per line.

use anyhow::Result;

use modgraph_lib::config::ConfigOverrides;

use super::load::configure_file;
use crate::output::print_success;

pub fn cmd_check(file: &str, overrides: &ConfigOverrides) -> Result<()> {
  let graph = configure_file(file, overrides)?;
  print_success(&format!("{}: {} modules configured", file, graph.modules().count()));
  Ok(())
}
