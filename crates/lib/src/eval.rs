//! Definitions file evaluation.
//!
//! [`load_definitions`] runs a Lua definitions file and returns the modules
//! it declared, in declaration order, together with any
//! `modgraph.config{...}` overrides.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::info;

use crate::config::{Config, ConfigOverrides};
use crate::lua::runtime;
use crate::module::ModuleDef;
use crate::module::registry::ModuleTypeRegistry;

/// Errors that can occur while evaluating definitions.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
  /// Lua evaluation error.
  #[error("lua error: {0}")]
  Lua(#[from] LuaError),
}

/// Everything a definitions file declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
  pub modules: Vec<ModuleDef>,
  /// `modgraph.config{...}` calls, in call order.
  pub config_overrides: Vec<ConfigOverrides>,
}

impl Definitions {
  /// Apply every override to `config`; later calls win.
  pub fn apply_config(&self, config: &mut Config) {
    for overrides in &self.config_overrides {
      config.apply(overrides);
    }
  }
}

/// Evaluate the definitions file at `path`.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use modgraph_lib::eval::load_definitions;
/// use modgraph_lib::module::registry::ModuleTypeRegistry;
///
/// let defs = load_definitions(Path::new("modules.lua"), &ModuleTypeRegistry::builtin())?;
/// println!("Modules: {}", defs.modules.len());
/// ```
pub fn load_definitions(path: &Path, registry: &ModuleTypeRegistry) -> Result<Definitions, EvalError> {
  let definitions = Rc::new(RefCell::new(Definitions::default()));
  {
    let lua = runtime::create_runtime(registry, definitions.clone())?;
    runtime::load_file(&lua, path)?;
  }
  let definitions = into_inner(definitions);
  info!(path = %path.display(), modules = definitions.modules.len(), "definitions evaluated");
  Ok(definitions)
}

/// Evaluate definitions held in memory. `name` labels Lua error messages.
pub fn load_definitions_str(source: &str, name: &str, registry: &ModuleTypeRegistry) -> Result<Definitions, EvalError> {
  let definitions = Rc::new(RefCell::new(Definitions::default()));
  {
    let lua = runtime::create_runtime(registry, definitions.clone())?;
    runtime::load_str(&lua, source, name)?;
  }
  Ok(into_inner(definitions))
}

// The Lua state is dropped by now, so this is normally the only reference.
fn into_inner(definitions: Rc<RefCell<Definitions>>) -> Definitions {
  Rc::try_unwrap(definitions)
    .map(RefCell::into_inner)
    .unwrap_or_else(|shared| shared.borrow().clone())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;
  use crate::platform::arch::Arch;
  use crate::props::PropertyMapExt;

  #[test]
  fn evaluates_file_in_declaration_order() -> Result<(), EvalError> {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("modules.lua");
    fs::write(
      &path,
      r#"
        cc_library { name = "libfoo", srcs = { "foo.c" } }
        cc_binary { name = "app", shared_libs = { "libfoo" } }
      "#,
    )
    .unwrap();

    let defs = load_definitions(&path, &ModuleTypeRegistry::builtin())?;
    let names: Vec<_> = defs.modules.iter().filter_map(ModuleDef::name).collect();
    assert_eq!(names, ["libfoo", "app"]);
    Ok(())
  }

  #[test]
  fn require_searches_the_definitions_directory() -> Result<(), EvalError> {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
      temp_dir.path().join("common.lua"),
      r#"return { cflags = { "-Wall", "-Werror" } }"#,
    )
    .unwrap();
    let path = temp_dir.path().join("modules.lua");
    fs::write(
      &path,
      r#"
        local common = require("common")
        cc_library { name = "libfoo", cflags = common.cflags }
      "#,
    )
    .unwrap();

    let defs = load_definitions(&path, &ModuleTypeRegistry::builtin())?;
    assert_eq!(defs.modules[0].props.strings("cflags"), ["-Wall", "-Werror"]);
    Ok(())
  }

  #[test]
  fn config_overrides_apply_in_order() -> Result<(), EvalError> {
    let defs = load_definitions_str(
      r#"
        modgraph.config { device_arches = { "arm64" }, device_vndk_version = "28" }
        modgraph.config { device_vndk_version = "current" }
      "#,
      "config.lua",
      &ModuleTypeRegistry::builtin(),
    )?;

    let mut config = Config::default();
    defs.apply_config(&mut config);
    assert_eq!(config.device_arches, [Arch::Arm64]);
    assert_eq!(config.device_vndk_version.as_deref(), Some("current"));
    Ok(())
  }

  #[test]
  fn lua_errors_name_the_chunk() {
    let err = load_definitions_str("cc_library(", "broken.lua", &ModuleTypeRegistry::builtin()).unwrap_err();
    assert!(err.to_string().contains("broken.lua"), "{}", err);
  }

  #[test]
  fn missing_file_is_an_error() {
    let result = load_definitions(Path::new("/nonexistent/modules.lua"), &ModuleTypeRegistry::builtin());
    assert!(matches!(result, Err(EvalError::Lua(_))));
  }
}
