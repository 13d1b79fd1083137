//! Global Lua values: module type functions and the `modgraph` table.
//!
//! - `cc_library { ... }` (one function per registered module type) - declare a module
//! - `modgraph.os` / `modgraph.arch` - host platform (e.g. "linux", "x86_64")
//! - `modgraph.config { ... }` - override configuration fields
//! - `modgraph.module_types` - names of every registered module type

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::trace;

use super::convert::lua_table_to_props;
use crate::config::ConfigOverrides;
use crate::eval::Definitions;
use crate::module::ModuleDef;
use crate::module::registry::ModuleTypeRegistry;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// Register one global function per module type and the `modgraph` table.
pub fn register_globals(lua: &Lua, registry: &ModuleTypeRegistry, definitions: Rc<RefCell<Definitions>>) -> LuaResult<()> {
  for module_type in registry.names() {
    let name = module_type.to_string();
    let defs = definitions.clone();
    let declare = lua.create_function(move |_, table: LuaTable| {
      let props = lua_table_to_props(&table, "")?;
      trace!(module_type = %name, module = ?props.get("name"), "declared module");
      defs.borrow_mut().modules.push(ModuleDef::new(name.clone(), props));
      Ok(())
    })?;
    lua.globals().set(module_type, declare)?;
  }

  let modgraph = lua.create_table()?;
  if let Some(os) = Os::current() {
    modgraph.set("os", os.as_str())?;
  }
  if let Some(arch) = Arch::current() {
    modgraph.set("arch", arch.as_str())?;
  }
  modgraph.set("module_types", registry.names().collect::<Vec<_>>())?;

  let defs = definitions;
  let config = lua.create_function(move |lua, table: LuaTable| {
    let overrides: ConfigOverrides = lua.from_value(LuaValue::Table(table))?;
    defs.borrow_mut().config_overrides.push(overrides);
    Ok(())
  })?;
  modgraph.set("config", config)?;

  lua.globals().set("modgraph", modgraph)?;
  Ok(())
}
