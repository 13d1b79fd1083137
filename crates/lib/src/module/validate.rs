//! Definition checks that run before any variant exists.

use std::collections::BTreeMap;

use crate::props::value::join_path;
use crate::props::{PropertyKind, PropertyMap, PropertyMapExt, PropertyValue};

use super::registry::Schema;
use super::{ConfigError, DepRef, DepTag};

/// Check `props` against a module type's schema.
///
/// Empty containers are normalized to the container kind the schema expects,
/// since `{}` in a definitions file is both an empty list and an empty map.
pub fn check_schema(module: &str, schema: &BTreeMap<&'static str, Schema>, props: &mut PropertyMap) -> Vec<ConfigError> {
  let mut errors = Vec::new();
  check_fields(module, "", schema, props, &mut errors);
  errors
}

fn check_fields(
  module: &str,
  prefix: &str,
  fields: &BTreeMap<&'static str, Schema>,
  props: &mut PropertyMap,
  errors: &mut Vec<ConfigError>,
) {
  for (key, value) in props.iter_mut() {
    let path = join_path(prefix, key);
    match fields.get(key.as_str()) {
      Some(schema) => check_value(module, &path, key, schema, value, errors),
      None => errors.push(ConfigError::UnknownProperty {
        module: module.to_string(),
        property: path,
      }),
    }
  }
}

fn check_value(
  module: &str,
  path: &str,
  key: &str,
  schema: &Schema,
  value: &mut PropertyValue,
  errors: &mut Vec<ConfigError>,
) {
  let expected = schema.expected_kind();
  if value.is_empty_container() && matches!(expected, PropertyKind::List | PropertyKind::Map) {
    *value = match expected {
      PropertyKind::List => PropertyValue::List(Vec::new()),
      _ => PropertyValue::Map(PropertyMap::new()),
    };
  }

  if value.kind() != expected {
    errors.push(ConfigError::WrongPropertyKind {
      module: module.to_string(),
      property: path.to_string(),
      expected,
      found: value.kind(),
    });
    return;
  }

  match (schema, value) {
    (Schema::Struct(fields), PropertyValue::Map(map)) => check_fields(module, path, fields, map, errors),
    (Schema::Keyed(inner), PropertyValue::Map(map)) => {
      for (name, entry) in map.iter_mut() {
        let entry_path = join_path(path, name);
        check_value(module, &entry_path, name, inner, entry, errors);
      }
    }
    (_, PropertyValue::List(items)) if is_dependency_list(key) => {
      for item in items.iter() {
        if let Err(message) = item.parse::<DepRef>() {
          errors.push(ConfigError::InvalidValue {
            module: module.to_string(),
            property: path.to_string(),
            message,
          });
        }
      }
    }
    _ => {}
  }
}

fn is_dependency_list(key: &str) -> bool {
  DepTag::LIST_PROPERTIES.iter().any(|(property, _)| *property == key)
}

/// VNDK and partition consistency of a module's resolved properties.
pub fn check_vndk(module: &str, props: &PropertyMap) -> Vec<ConfigError> {
  let mut errors = Vec::new();
  let mut fail = |message: String| {
    errors.push(ConfigError::Vndk {
      module: module.to_string(),
      message,
    })
  };

  let vendor = props.flag("vendor");
  let vendor_available = props.lookup("vendor_available").is_some();
  let vndk_enabled = props.flag("vndk.enabled");
  let extends = props.string("vndk.extends");

  if vendor && vendor_available {
    fail("`vendor_available` must not be set together with `vendor: true`".to_string());
  }
  if vndk_enabled && props.flag("product_specific") {
    fail("product_specific must not be true when `vndk: {enabled: true}`".to_string());
  }
  if vndk_enabled && !vendor && !vendor_available {
    fail("`vndk: {enabled: true}` requires `vendor_available` to be set".to_string());
  }
  if let Some(base) = extends {
    match base.parse::<DepRef>() {
      Err(message) => fail(format!("invalid `extends: \"{}\"`: {}", base, message)),
      Ok(reference) if reference.version.is_some() => {
        fail(format!("`extends: \"{}\"` must name a module, not a versioned stub", base))
      }
      Ok(reference) if reference.name == module => fail("a VNDK extension cannot extend itself".to_string()),
      Ok(_) => {}
    }
    if !vndk_enabled {
      fail(format!("`extends: \"{}\"` requires `vndk: {{enabled: true}}`", base));
    }
    if !vendor {
      fail(format!("must set `vendor: true` to set `extends: \"{}\"`", base));
    }
  } else if vendor && vndk_enabled {
    fail("must set `extends: \"...\"` to vndk extension".to_string());
  }

  errors
}
