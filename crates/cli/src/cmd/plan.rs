//! Implementation of the `modgraph plan` command.
//!
//! Configures a definitions file and prints a summary of the resolved graph
//! with its fingerprint, so two runs can be compared at a glance.

use anyhow::{Context, Result};

use modgraph_lib::config::ConfigOverrides;
use modgraph_lib::util::hash::Hashable;

use super::load::configure_file;
use crate::output::{name_list, print_json, print_stat, print_success};

pub fn cmd_plan(file: &str, overrides: &ConfigOverrides, json: bool) -> Result<()> {
  let graph = configure_file(file, overrides)?;
  let summary = graph.summary();
  let fingerprint = summary.compute_hash().context("Failed to compute graph fingerprint")?;

  if json {
    let json_output = serde_json::json!({ "fingerprint": fingerprint.0, "graph": summary });
    return print_json(&json_output);
  }

  let variants: usize = summary.modules.iter().map(|m| m.variants.len()).sum();
  let enabled: usize = summary
    .modules
    .iter()
    .flat_map(|m| &m.variants)
    .filter(|v| v.enabled)
    .count();
  let edges: usize = summary
    .modules
    .iter()
    .flat_map(|m| &m.variants)
    .map(|v| v.deps.len())
    .sum();

  print_success(&format!("Configured {}", file));
  print_stat("Fingerprint", &fingerprint.0);
  print_stat("Modules", &summary.modules.len().to_string());
  print_stat("Variants", &format!("{} ({} enabled)", variants, enabled));
  print_stat("Dependencies", &edges.to_string());

  let vndk = &summary.vndk;
  if !(vndk.core.is_empty() && vndk.sp.is_empty() && vndk.llndk.is_empty()) {
    println!();
    print_stat("VNDK-core", &name_list(&vndk.core));
    print_stat("VNDK-SP", &name_list(&vndk.sp));
    print_stat("LL-NDK", &name_list(&vndk.llndk));
    print_stat("VNDK-private", &name_list(&vndk.private));
  }
  if !summary.warnings.is_empty() {
    println!();
    print_stat("Warnings", &summary.warnings.len().to_string());
  }

  Ok(())
}
