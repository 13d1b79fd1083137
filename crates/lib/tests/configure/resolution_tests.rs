//! Dependency resolution through the full pipeline.

use modgraph_lib::configure::{ErrorKind, Phase};

use super::common::{bound_target, configure, errors_in};

#[test]
fn every_edge_of_an_enabled_variant_is_bound() {
  let graph = configure(
    r#"
      cc_library { name = "libbase" }
      cc_library { name = "liblog", shared_libs = { "libbase" } }
      cc_library_headers { name = "libheaders" }
      cc_binary {
        name = "app",
        shared_libs = { "liblog" },
        static_libs = { "libbase" },
        header_libs = { "libheaders" },
      }
    "#,
  )
  .unwrap();

  for module in ["libbase", "liblog", "libheaders", "app"] {
    for variant in graph.variants_of(module).filter(|v| v.enabled) {
      assert!(
        variant.deps.iter().all(|edge| edge.is_bound()),
        "{} has unbound edges",
        variant.qualified_name()
      );
    }
  }
  assert_eq!(
    bound_target(&graph, "liblog", "android_arm_core_static", "libbase"),
    "android_arm_core_shared"
  );
  assert_eq!(
    bound_target(&graph, "app", "android_arm64_core", "libbase"),
    "android_arm64_core_static"
  );
}

#[test]
fn undefined_module_is_a_missing_variant() {
  let errors = errors_in(
    configure(r#"cc_binary { name = "app", shared_libs = { "libmissing" } }"#),
    Phase::Resolution,
  );

  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind(), ErrorKind::MissingVariant);
  let message = errors[0].to_string();
  assert!(message.contains("libmissing"), "{}", message);
  assert!(message.contains("undefined module"), "{}", message);
}

#[test]
fn arch_disabled_target_fails_only_that_arch() {
  let errors = errors_in(
    configure(
      r#"
        cc_library { name = "liba", shared_libs = { "libfoo" } }
        cc_library { name = "libfoo", arch = { arm = { enabled = false } } }
      "#,
    ),
    Phase::Resolution,
  );

  assert_eq!(errors.len(), 2, "{:?}", errors);
  for error in &errors {
    assert_eq!(error.kind(), ErrorKind::DependsOnDisabledModule);
    assert!(error.to_string().contains("android_arm_core_shared"), "{}", error);
  }
}

#[test]
fn disabled_modules_are_not_resolved() {
  let graph = configure(
    r#"
      cc_library { name = "libold", enabled = false, shared_libs = { "libgone" } }
    "#,
  )
  .unwrap();

  assert!(graph.variants_of("libold").all(|v| !v.enabled));
}

#[test]
fn arch_overlays_add_dependencies() {
  let graph = configure(
    r#"
      cc_library_static { name = "libneon" }
      cc_library {
        name = "libcodec",
        arch = { arm = { static_libs = { "libneon" } } },
      }
    "#,
  )
  .unwrap();

  let arm = graph.find_variant("libcodec", "android_arm_core_shared").unwrap();
  let arm64 = graph.find_variant("libcodec", "android_arm64_core_shared").unwrap();
  assert_eq!(graph.deps(arm.id).len(), 1);
  assert!(graph.deps(arm64.id).is_empty());
}

#[test]
fn defaults_contribute_dependencies() {
  let graph = configure(
    r#"
      cc_defaults { name = "common_defaults", shared_libs = { "liblog" } }
      cc_library { name = "liblog" }
      cc_binary { name = "app", defaults = { "common_defaults" } }
    "#,
  )
  .unwrap();

  assert_eq!(
    bound_target(&graph, "app", "android_arm64_core", "liblog"),
    "android_arm64_core_shared"
  );
}
