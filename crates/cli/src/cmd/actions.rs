use anyhow::Result;

use modgraph_lib::actions::{builtin_generators, generate_actions};
use modgraph_lib::config::ConfigOverrides;

use super::load::configure_file;
use crate::output::print_json;

pub fn cmd_actions(file: &str, overrides: &ConfigOverrides) -> Result<()> {
  let graph = configure_file(file, overrides)?;
  let actions = generate_actions(&graph, &builtin_generators());
  print_json(&actions)
}
