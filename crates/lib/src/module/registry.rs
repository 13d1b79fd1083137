//! Module types and their property schemas.
//!
//! The registry is built once and shared by reference; it maps the module
//! type named in a definition (`cc_library`, `cc_binary`, ...) to what the
//! module builds and which properties it accepts.

use std::collections::BTreeMap;

use crate::consts::PREBUILT_PREFIX;
use crate::props::PropertyKind;

use super::kind::{BinaryKind, LibraryKind, ModuleKind};

/// Accepted shape of a property tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
  Kind(PropertyKind),
  /// A map with a fixed set of keys.
  Struct(BTreeMap<&'static str, Schema>),
  /// A map with free-form keys (e.g. `arch: { arm64 = ... }`), each value
  /// following the inner schema.
  Keyed(Box<Schema>),
}

impl Schema {
  pub fn expected_kind(&self) -> PropertyKind {
    match self {
      Self::Kind(kind) => *kind,
      Self::Struct(_) | Self::Keyed(_) => PropertyKind::Map,
    }
  }

  fn fields(fields: &[(&'static str, Schema)]) -> Self {
    Self::Struct(fields.iter().cloned().collect())
  }
}

#[derive(Debug, Clone)]
pub struct ModuleType {
  pub name: String,
  pub kind: ModuleKind,
  /// Top-level properties the type accepts.
  pub schema: BTreeMap<&'static str, Schema>,
}

impl ModuleType {
  pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
    Self {
      name: name.into(),
      kind,
      schema: cc_schema(&kind),
    }
  }

  /// Name under which a module declared as `declared` is registered.
  ///
  /// Prebuilts live next to the source module they may replace, so they are
  /// registered as `prebuilt_<name>`.
  pub fn module_name(&self, declared: &str) -> String {
    if self.kind.is_prebuilt() {
      format!("{}{}", PREBUILT_PREFIX, declared)
    } else {
      declared.to_string()
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleTypeRegistry {
  types: BTreeMap<String, ModuleType>,
}

impl ModuleTypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry holding the builtin `cc_*` module types.
  pub fn builtin() -> Self {
    let library = |static_lib, shared_lib, prebuilt| {
      ModuleKind::Library(LibraryKind {
        static_lib,
        shared_lib,
        prebuilt,
      })
    };

    let mut registry = Self::new();
    for module_type in [
      ModuleType::new("cc_defaults", ModuleKind::Defaults),
      ModuleType::new("cc_library", library(true, true, false)),
      ModuleType::new("cc_library_static", library(true, false, false)),
      ModuleType::new("cc_library_shared", library(false, true, false)),
      ModuleType::new("cc_library_headers", ModuleKind::Library(LibraryKind::headers())),
      ModuleType::new("cc_binary", ModuleKind::Binary(BinaryKind { test: false })),
      ModuleType::new("cc_test", ModuleKind::Binary(BinaryKind { test: true })),
      ModuleType::new("cc_prebuilt_library_shared", library(false, true, true)),
      ModuleType::new("cc_prebuilt_library_static", library(true, false, true)),
    ] {
      registry.register(module_type);
    }
    registry
  }

  /// Register a module type, returning the one it replaced.
  pub fn register(&mut self, module_type: ModuleType) -> Option<ModuleType> {
    self.types.insert(module_type.name.clone(), module_type)
  }

  pub fn get(&self, name: &str) -> Option<&ModuleType> {
    self.types.get(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.types.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }
}

/// Properties that conditional overlays may set.
fn overlay_fields() -> Vec<(&'static str, Schema)> {
  use PropertyKind::*;
  let mut fields = vec![
    ("enabled", Schema::Kind(Bool)),
    ("stem", Schema::Kind(String)),
    ("srcs", Schema::Kind(List)),
    ("cflags", Schema::Kind(List)),
    ("ldflags", Schema::Kind(List)),
    ("export_include_dirs", Schema::Kind(List)),
  ];
  for (property, _) in super::DepTag::LIST_PROPERTIES {
    fields.push((property, Schema::Kind(List)));
  }
  for (property, _) in super::DepTag::EXCLUDE_PROPERTIES {
    fields.push((property, Schema::Kind(List)));
  }
  fields
}

fn cc_schema(kind: &ModuleKind) -> BTreeMap<&'static str, Schema> {
  use PropertyKind::*;

  let overlay = Schema::fields(&overlay_fields());
  let keyed_overlay = Schema::Keyed(Box::new(overlay.clone()));

  let mut fields = overlay_fields();
  fields.extend([
    ("name", Schema::Kind(String)),
    ("defaults", Schema::Kind(List)),
    ("host_supported", Schema::Kind(Bool)),
    ("device_supported", Schema::Kind(Bool)),
    ("compile_multilib", Schema::Kind(String)),
    ("vendor", Schema::Kind(Bool)),
    ("vendor_available", Schema::Kind(Bool)),
    ("soc_specific", Schema::Kind(Bool)),
    ("proprietary", Schema::Kind(Bool)),
    ("product_specific", Schema::Kind(Bool)),
    ("product_available", Schema::Kind(Bool)),
    ("recovery", Schema::Kind(Bool)),
    ("recovery_available", Schema::Kind(Bool)),
    ("arch", keyed_overlay.clone()),
    ("multilib", keyed_overlay.clone()),
    ("target", keyed_overlay),
  ]);

  let library_fields = [
    ("double_loadable", Schema::Kind(Bool)),
    (
      "vndk",
      Schema::fields(&[
        ("enabled", Schema::Kind(Bool)),
        ("support_system_process", Schema::Kind(Bool)),
        ("extends", Schema::Kind(String)),
      ]),
    ),
    (
      "llndk",
      Schema::fields(&[("symbol_file", Schema::Kind(String)), ("private", Schema::Kind(Bool))]),
    ),
    (
      "stubs",
      Schema::fields(&[("versions", Schema::Kind(List)), ("symbol_file", Schema::Kind(String))]),
    ),
    ("static", overlay.clone()),
    ("shared", overlay),
  ];

  match kind {
    ModuleKind::Library(lib) => {
      fields.extend(library_fields);
      if lib.prebuilt {
        fields.push(("prefer", Schema::Kind(Bool)));
      }
    }
    ModuleKind::Binary(bin) => {
      if bin.test {
        fields.push(("test_per_src", Schema::Kind(Bool)));
      }
    }
    ModuleKind::Defaults => {
      fields.extend(library_fields);
      fields.push(("test_per_src", Schema::Kind(Bool)));
    }
  }

  fields.into_iter().collect()
}
