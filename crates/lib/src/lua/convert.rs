//! Conversion of Lua tables into property bags.
//!
//! Sequences become string lists, other tables become maps keyed by string.
//! Anything a definition cannot mean (functions, userdata, non-string list
//! items, fractional numbers) is rejected with the dotted property path.

use mlua::prelude::*;

use crate::props::value::join_path;
use crate::props::{PropertyMap, PropertyValue};

/// Convert the table passed to a module type function.
pub fn lua_table_to_props(table: &LuaTable, prefix: &str) -> LuaResult<PropertyMap> {
  let mut props = PropertyMap::new();
  for pair in table.clone().pairs::<LuaValue, LuaValue>() {
    let (key, value) = pair?;
    let LuaValue::String(key) = key else {
      return Err(LuaError::external(format!(
        "property \"{}\": keys must be strings, found {}",
        if prefix.is_empty() { "<top level>" } else { prefix },
        key.type_name()
      )));
    };
    let key = key.to_str()?.to_string();
    let path = join_path(prefix, &key);
    if let Some(value) = lua_value_to_property(value, &path)? {
      props.insert(key, value);
    }
  }
  Ok(props)
}

/// Convert one property value. `nil` yields `None`, as if the property had
/// not been written.
pub fn lua_value_to_property(value: LuaValue, path: &str) -> LuaResult<Option<PropertyValue>> {
  let converted = match value {
    LuaValue::Nil => return Ok(None),
    LuaValue::Boolean(b) => PropertyValue::Bool(b),
    LuaValue::Integer(i) => PropertyValue::Int(i),
    LuaValue::Number(n) if n.fract() == 0.0 => PropertyValue::Int(n as i64),
    LuaValue::String(s) => PropertyValue::String(s.to_str()?.to_string()),
    LuaValue::Table(t) => {
      if t.raw_len() > 0 {
        PropertyValue::List(lua_sequence_to_list(&t, path)?)
      } else if t.clone().pairs::<LuaValue, LuaValue>().next().is_none() {
        // `{}` is both an empty list and an empty map; schema checks settle it.
        PropertyValue::List(Vec::new())
      } else {
        PropertyValue::Map(lua_table_to_props(&t, path)?)
      }
    }
    other => {
      return Err(LuaError::external(format!(
        "property \"{}\": unsupported value of type {}",
        path,
        other.type_name()
      )));
    }
  };
  Ok(Some(converted))
}

fn lua_sequence_to_list(table: &LuaTable, path: &str) -> LuaResult<Vec<String>> {
  let mut items = Vec::with_capacity(table.raw_len());
  for item in table.clone().sequence_values::<LuaValue>() {
    match item? {
      LuaValue::String(s) => items.push(s.to_str()?.to_string()),
      other => {
        return Err(LuaError::external(format!(
          "property \"{}\": list items must be strings, found {}",
          path,
          other.type_name()
        )));
      }
    }
  }
  Ok(items)
}
