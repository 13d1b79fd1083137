//! Configuring the same definitions twice gives the same result.

use std::collections::HashSet;

use modgraph_lib::actions::{builtin_generators, generate_actions};
use modgraph_lib::util::hash::Hashable;

use super::common::configure_vendor;

const DEFINITIONS: &str = r#"
  cc_defaults { name = "warnings", cflags = { "-Wall" } }
  cc_library {
    name = "libbase",
    defaults = { "warnings" },
    srcs = { "base.c" },
    vendor_available = true,
    vndk = { enabled = true },
  }
  cc_library {
    name = "liblog",
    srcs = { "log.c" },
    shared_libs = { "libbase" },
    stubs = { versions = { "28", "29" } },
  }
  cc_binary { name = "app", srcs = { "main.c" }, shared_libs = { "liblog" }, static_libs = { "libbase" } }
  cc_prebuilt_library_shared { name = "libbase", srcs = { "prebuilts/libbase.so" } }
"#;

#[test]
fn fingerprint_is_stable_across_runs() {
  let first = configure_vendor(DEFINITIONS).unwrap();
  let second = configure_vendor(DEFINITIONS).unwrap();

  assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
  assert_eq!(
    serde_json::to_string(&first.summary()).unwrap(),
    serde_json::to_string(&second.summary()).unwrap()
  );
}

#[test]
fn action_graphs_are_identical_across_runs() {
  let generators = builtin_generators();
  let first = generate_actions(&configure_vendor(DEFINITIONS).unwrap(), &generators);
  let second = generate_actions(&configure_vendor(DEFINITIONS).unwrap(), &generators);

  assert_eq!(first, second);
  assert_eq!(first.compute_hash().unwrap(), second.compute_hash().unwrap());
}

#[test]
fn variant_names_are_unique_per_module() {
  let graph = configure_vendor(DEFINITIONS).unwrap();
  for module in graph.modules() {
    let mut seen = HashSet::new();
    for variant in graph.variants_of(&module.name) {
      assert!(seen.insert(variant.name()), "duplicate variant {}", variant.qualified_name());
    }
  }
}

#[test]
fn topological_order_puts_dependencies_first() {
  let graph = configure_vendor(DEFINITIONS).unwrap();
  let position: std::collections::HashMap<_, _> = graph
    .topological()
    .iter()
    .enumerate()
    .map(|(index, id)| (*id, index))
    .collect();

  for id in graph.topological() {
    for (_, target) in graph.deps(*id) {
      assert!(position[&target.id] < position[id]);
    }
  }
}
