//! Vendor image variants and the boundary checks between partitions.

use modgraph_lib::configure::{ErrorKind, Phase};

use super::common::{bound_target, configure, configure_vendor, errors_in};

#[test]
fn vndk_libraries_get_vendor_variants() {
  let graph = configure_vendor(
    r#"
      cc_library {
        name = "libvndk",
        vendor_available = true,
        vndk = { enabled = true },
      }
    "#,
  )
  .unwrap();

  let names: Vec<String> = graph.variants_of("libvndk").map(|v| v.name()).collect();
  assert!(names.contains(&"android_arm64_core_shared".to_string()), "{:?}", names);
  assert!(names.contains(&"android_arm64_vendor.29_shared".to_string()), "{:?}", names);
  assert!(names.contains(&"android_arm_vendor.29_static".to_string()), "{:?}", names);
}

#[test]
fn vendor_modules_bind_vendor_variants() {
  let graph = configure_vendor(
    r#"
      cc_library { name = "libvndk", vendor_available = true, vndk = { enabled = true } }
      cc_binary { name = "vendor_app", vendor = true, shared_libs = { "libvndk" } }
    "#,
  )
  .unwrap();

  assert_eq!(
    bound_target(&graph, "vendor_app", "android_arm64_vendor.29", "libvndk"),
    "android_arm64_vendor.29_shared"
  );
}

#[test]
fn vendor_module_cannot_reach_core_only_library() {
  let errors = errors_in(
    configure_vendor(
      r#"
        cc_library { name = "libcore" }
        cc_binary { name = "vendor_app", vendor = true, shared_libs = { "libcore" } }
      "#,
    ),
    Phase::Resolution,
  );

  assert_eq!(errors[0].kind(), ErrorKind::MissingVariant);
  assert!(errors[0].to_string().contains("image:vendor.29"), "{}", errors[0]);
}

#[test]
fn vendor_only_modules_build_in_core_without_vndk_version() {
  let graph = configure(r#"cc_library_shared { name = "libvendor", vendor = true }"#).unwrap();
  let mut names: Vec<String> = graph.variants_of("libvendor").map(|v| v.name()).collect();
  names.sort();
  assert_eq!(names, ["android_arm64_core_shared", "android_arm_core_shared"]);
}

#[test]
fn vendor_code_may_not_link_vndk_private() {
  let errors = errors_in(
    configure_vendor(
      r#"
        cc_library_shared { name = "libpriv", vendor_available = false, vndk = { enabled = true } }
        cc_library { name = "libvendor", vendor = true, shared_libs = { "libpriv" } }
      "#,
    ),
    Phase::Policy,
  );

  // Every arch and link variant of libvendor breaks the same rule once.
  assert_eq!(errors.len(), 1, "{:?}", errors);
  assert_eq!(errors[0].kind(), ErrorKind::BoundaryPolicy);
  let message = errors[0].to_string();
  assert!(message.starts_with("module \"libvendor\""), "{}", message);
  assert!(message.contains("which is VNDK-private"), "{}", message);
}

#[test]
fn vndk_may_not_link_outside_vndk() {
  let errors = errors_in(
    configure_vendor(
      r#"
        cc_library { name = "libother", vendor_available = true }
        cc_library {
          name = "libvndk",
          vendor_available = true,
          vndk = { enabled = true },
          shared_libs = { "libother" },
        }
      "#,
    ),
    Phase::Policy,
  );

  assert_eq!(errors.len(), 1, "{:?}", errors);
  assert!(
    errors[0]
      .to_string()
      .contains("(VNDK) should not link to \"libother\" which is not VNDK")
  );
}

#[test]
fn llndk_must_not_pull_in_vendor_available_code() {
  let defs = r#"
    cc_library { name = "libutils", vendor_available = true %s }
    cc_library_shared {
      name = "libllndk",
      shared_libs = { "libutils" },
      llndk = { symbol_file = "libllndk.map.txt" },
    }
  "#;

  let errors = errors_in(configure_vendor(&defs.replace("%s", "")), Phase::Policy);
  assert_eq!(errors.len(), 1, "{:?}", errors);
  assert!(errors[0].to_string().contains("(dependency: libllndk -> libutils)"), "{}", errors[0]);

  configure_vendor(&defs.replace("%s", ", double_loadable = true")).unwrap();
}

#[test]
fn vndk_lists_follow_definitions() {
  let graph = configure_vendor(
    r#"
      cc_library { name = "libvndk", vendor_available = true, vndk = { enabled = true } }
      cc_library { name = "libvndk_private", vendor_available = false, vndk = { enabled = true } }
      cc_library {
        name = "libvndksp",
        vendor_available = true,
        vndk = { enabled = true, support_system_process = true },
      }
      cc_library_shared { name = "libllndk", llndk = { symbol_file = "libllndk.map.txt" } }
      cc_library {
        name = "libvndk_ext",
        vendor = true,
        vndk = { enabled = true, extends = "libvndk" },
      }
    "#,
  )
  .unwrap();

  let lists = graph.vndk_lists();
  assert_eq!(lists.core, ["libvndk", "libvndk_private"]);
  assert_eq!(lists.sp, ["libvndksp"]);
  assert_eq!(lists.llndk, ["libllndk"]);
  assert_eq!(lists.private, ["libvndk_private"]);
}

#[test]
fn versioned_extends_is_a_definition_error() {
  let errors = errors_in(
    configure_vendor(
      r#"
        cc_library { name = "libvndk", vendor_available = true, vndk = { enabled = true } }
        cc_library {
          name = "libvndk_ext",
          vendor = true,
          vndk = { enabled = true, extends = "libvndk#29" },
        }
      "#,
    ),
    Phase::Definitions,
  );

  assert_eq!(errors.len(), 1, "{:?}", errors);
  assert_eq!(
    errors[0].to_string(),
    "module \"libvndk_ext\": `extends: \"libvndk#29\"` must name a module, not a versioned stub"
  );
}
