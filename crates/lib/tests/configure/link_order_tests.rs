//! Static link order of configured binaries and libraries.

use modgraph_lib::configure::ConfigureWarning;

use super::common::configure;

const ARM64_ONLY: &str = r#"modgraph.config { device_arches = { "arm64" } }"#;

fn link_line(graph: &modgraph_lib::configure::ConfiguredGraph, module: &str, variant: &str) -> Vec<String> {
  let source = graph.find_variant(module, variant).expect("variant exists");
  let order = graph.link_order(source.id).expect("link order computed");
  order
    .link_line
    .iter()
    .filter_map(|id| graph.variant(*id))
    .map(|v| v.module_name().to_string())
    .collect()
}

fn all_ordered(graph: &modgraph_lib::configure::ConfiguredGraph, module: &str, variant: &str) -> Vec<String> {
  let source = graph.find_variant(module, variant).expect("variant exists");
  let order = graph.link_order(source.id).expect("link order computed");
  order
    .all_ordered
    .iter()
    .filter_map(|id| graph.variant(*id))
    .map(|v| v.qualified_name())
    .collect()
}

#[test]
fn diamond_orders_shared_dependency_last() {
  let graph = configure(&format!(
    r#"{}
      cc_binary {{ name = "app", srcs = {{ "main.c" }}, static_libs = {{ "libd", "libb", "libc" }} }}
      cc_library_static {{ name = "libb", static_libs = {{ "libd" }} }}
      cc_library_static {{ name = "libc", static_libs = {{ "libd" }} }}
      cc_library_static {{ name = "libd" }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  assert_eq!(link_line(&graph, "app", "android_arm64_core"), ["libb", "libc", "libd"]);
}

#[test]
fn transitive_statics_stay_off_the_link_line() {
  let graph = configure(&format!(
    r#"{}
      cc_binary {{ name = "app", static_libs = {{ "liba" }} }}
      cc_library_static {{ name = "liba", static_libs = {{ "libb" }} }}
      cc_library_static {{ name = "libb" }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  let app = graph.find_variant("app", "android_arm64_core").unwrap();
  let order = graph.link_order(app.id).unwrap();
  let all: Vec<_> = order
    .all_ordered
    .iter()
    .map(|id| graph.variant(*id).unwrap().module_name())
    .collect();
  assert_eq!(all, ["liba", "libb"]);
  assert_eq!(link_line(&graph, "app", "android_arm64_core"), ["liba"]);
}

#[test]
fn shared_libraries_are_never_linked_statically() {
  let graph = configure(&format!(
    r#"{}
      cc_binary {{ name = "app", shared_libs = {{ "libshared" }} }}
      cc_library {{ name = "libshared", static_libs = {{ "libinner" }} }}
      cc_library_static {{ name = "libinner" }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  assert!(link_line(&graph, "app", "android_arm64_core").is_empty());
  assert_eq!(
    link_line(&graph, "libshared", "android_arm64_core_shared"),
    ["libinner"]
  );
}

#[test]
fn static_cycles_are_warnings() {
  let graph = configure(&format!(
    r#"{}
      cc_library_static {{ name = "liba", static_libs = {{ "libb" }} }}
      cc_library_static {{ name = "libb", static_libs = {{ "liba" }} }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  let cycles: Vec<_> = graph
    .warnings()
    .iter()
    .map(|ConfigureWarning::CyclicStaticDependency { variants }| variants.clone())
    .collect();
  assert_eq!(cycles.len(), 1);
  assert_eq!(cycles[0].len(), 2);
  assert!(graph.find_variant("liba", "android_arm64_core_static").is_some());
}

#[test]
fn shared_dependency_statics_reorder_link_line() {
  let graph = configure(&format!(
    r#"{}
      cc_binary {{ name = "app", static_libs = {{ "liby", "libx" }}, shared_libs = {{ "libs" }} }}
      cc_library_shared {{ name = "libs", static_libs = {{ "libx", "liby" }} }}
      cc_library_static {{ name = "libx" }}
      cc_library_static {{ name = "liby" }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  assert_eq!(link_line(&graph, "app", "android_arm64_core"), ["libx", "liby"]);
  assert_eq!(
    all_ordered(&graph, "app", "android_arm64_core"),
    [
      "libs:android_arm64_core_shared",
      "libx:android_arm64_core_static",
      "liby:android_arm64_core_static",
    ]
  );
}

#[test]
fn shared_overlay_statics_follow_the_shared_dependency() {
  let graph = configure(&format!(
    r#"{}
      cc_binary {{ name = "app", shared_libs = {{ "libs" }} }}
      cc_library {{ name = "libs", shared = {{ static_libs = {{ "libz" }} }} }}
      cc_library_static {{ name = "libz" }}
    "#,
    ARM64_ONLY
  ))
  .unwrap();

  assert_eq!(link_line(&graph, "libs", "android_arm64_core_shared"), ["libz"]);
  assert!(link_line(&graph, "libs", "android_arm64_core_static").is_empty());
  assert!(link_line(&graph, "app", "android_arm64_core").is_empty());
  assert_eq!(
    all_ordered(&graph, "app", "android_arm64_core"),
    ["libs:android_arm64_core_shared", "libz:android_arm64_core_static"]
  );
}
