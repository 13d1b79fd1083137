//! Implementation of the `modgraph deps` command.
//!
//! Prints each dependency of one variant next to the variant it was bound
//! to, followed by the variant's static link order.

use anyhow::{Result, bail};

use modgraph_lib::config::ConfigOverrides;
use modgraph_lib::graph::{Variant, VariantId};

use super::load::configure_file;
use crate::output::{binding_line, print_section};

pub fn cmd_deps(file: &str, overrides: &ConfigOverrides, module: &str, variant: &str) -> Result<()> {
  let graph = configure_file(file, overrides)?;
  let Some(source) = graph.find_variant(module, variant) else {
    bail!("Unknown variant: {}:{}", module, variant);
  };

  println!("{}:", source.qualified_name());
  let deps = graph.deps(source.id);
  if deps.is_empty() {
    println!("  (no dependencies)");
  }
  for (edge, target) in deps {
    println!(
      "{}",
      binding_line(edge.tag.as_str(), &edge.reference.to_string(), &target.qualified_name())
    );
  }

  if let Some(order) = graph.link_order(source.id)
    && !order.all_ordered.is_empty()
  {
    let names = |ids: &[VariantId]| -> Vec<String> {
      ids
        .iter()
        .filter_map(|id| graph.variant(*id))
        .map(Variant::qualified_name)
        .collect()
    };
    println!();
    print_section("Transitive order:", &names(&order.all_ordered));
    print_section("Link line:", &names(&order.link_line));
  }
  Ok(())
}
