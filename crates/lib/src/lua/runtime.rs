use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use crate::eval::Definitions;
use crate::lua::globals;
use crate::module::registry::ModuleTypeRegistry;

/// Create a Lua runtime with a global function for every module type in
/// `registry`, recording into `definitions`.
pub fn create_runtime(registry: &ModuleTypeRegistry, definitions: Rc<RefCell<Definitions>>) -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua, registry, definitions)?;
  Ok(lua)
}

/// Load and execute a definitions file.
///
/// `require` also searches the file's directory, and `modgraph.dir` is set
/// to it.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<()> {
  let canonical_path = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let dir = canonical_path
    .parent()
    .unwrap_or(Path::new("."))
    .to_string_lossy()
    .replace('\\', "/");

  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua;{package_path}"))?;
  lua.globals().get::<LuaTable>("modgraph")?.set("dir", dir)?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .exec()
}

/// Execute definitions held in memory; `name` labels error messages.
pub fn load_str(lua: &Lua, source: &str, name: &str) -> LuaResult<()> {
  lua.load(source).set_name(format!("={}", name)).exec()
}
