//! Versioned stub variants and how references pick them.

use modgraph_lib::configure::{ErrorKind, Phase};

use super::common::{bound_target, configure, errors_in};

const LIBFOO: &str = r#"
  modgraph.config { device_arches = { "arm64" } }
  cc_library_shared { name = "libbar" }
  cc_library {
    name = "libfoo",
    shared_libs = { "libbar" },
    stubs = { versions = { "1", "2", "3" }, symbol_file = "libfoo.map.txt" },
  }
"#;

#[test]
fn stub_variants_are_named_by_version() {
  let graph = configure(LIBFOO).unwrap();
  let mut names: Vec<String> = graph.variants_of("libfoo").map(|v| v.name()).collect();
  names.sort();
  assert_eq!(
    names,
    [
      "android_arm64_core_shared",
      "android_arm64_core_shared_1",
      "android_arm64_core_shared_2",
      "android_arm64_core_shared_3",
      "android_arm64_core_static",
    ]
  );
}

#[test]
fn unversioned_reference_binds_latest_stub() {
  let graph = configure(&format!(r#"{} cc_binary {{ name = "app", shared_libs = {{ "libfoo" }} }}"#, LIBFOO)).unwrap();
  assert_eq!(
    bound_target(&graph, "app", "android_arm64_core", "libfoo"),
    "android_arm64_core_shared_3"
  );
}

#[test]
fn versioned_reference_binds_that_stub() {
  let graph = configure(&format!(r#"{} cc_binary {{ name = "app", shared_libs = {{ "libfoo#1" }} }}"#, LIBFOO)).unwrap();
  assert_eq!(
    bound_target(&graph, "app", "android_arm64_core", "libfoo#1"),
    "android_arm64_core_shared_1"
  );
}

#[test]
fn unknown_version_is_a_missing_variant() {
  let errors = errors_in(
    configure(&format!(r#"{} cc_binary {{ name = "app", shared_libs = {{ "libfoo#4" }} }}"#, LIBFOO)),
    Phase::Resolution,
  );
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].kind(), ErrorKind::MissingVariant);
  assert!(errors[0].to_string().contains("version:4"), "{}", errors[0]);
}

#[test]
fn stubs_carry_no_dependencies() {
  let graph = configure(LIBFOO).unwrap();
  let stub = graph.find_variant("libfoo", "android_arm64_core_shared_2").unwrap();
  let implementation = graph.find_variant("libfoo", "android_arm64_core_shared").unwrap();
  assert!(graph.deps(stub.id).is_empty());
  assert_eq!(graph.deps(implementation.id).len(), 1);
}

#[test]
fn static_references_ignore_stubs() {
  let graph = configure(&format!(r#"{} cc_binary {{ name = "app", static_libs = {{ "libfoo" }} }}"#, LIBFOO)).unwrap();
  assert_eq!(
    bound_target(&graph, "app", "android_arm64_core", "libfoo"),
    "android_arm64_core_static"
  );
}
