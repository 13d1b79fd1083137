//! Tagged property values and their merge rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A nested property bag, keyed by property name.
///
/// `BTreeMap` keeps iteration (and therefore serialization and hashing)
/// order stable across runs.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value as declared in a module definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
  Bool(bool),
  Int(i64),
  String(String),
  List(Vec<String>),
  Map(PropertyMap),
}

/// The kind of a [`PropertyValue`], used by schemas and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
  Bool,
  Int,
  String,
  List,
  Map,
}

impl fmt::Display for PropertyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Bool => "bool",
      Self::Int => "int",
      Self::String => "string",
      Self::List => "list",
      Self::Map => "map",
    };
    write!(f, "{}", name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
  #[error("property '{path}': cannot merge {found} into {expected}")]
  KindMismatch {
    path: String,
    expected: PropertyKind,
    found: PropertyKind,
  },

  #[error("property '{path}': expected {expected}, found {found}")]
  WrongKind {
    path: String,
    expected: PropertyKind,
    found: PropertyKind,
  },

  #[error("property '{path}': {message}")]
  InvalidEntry { path: String, message: String },
}

impl PropertyValue {
  pub fn kind(&self) -> PropertyKind {
    match self {
      Self::Bool(_) => PropertyKind::Bool,
      Self::Int(_) => PropertyKind::Int,
      Self::String(_) => PropertyKind::String,
      Self::List(_) => PropertyKind::List,
      Self::Map(_) => PropertyKind::Map,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[String]> {
    match self {
      Self::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&PropertyMap> {
    match self {
      Self::Map(map) => Some(map),
      _ => None,
    }
  }

  /// An empty list or map. Lua cannot tell `{}` apart, so an empty container
  /// takes whichever container kind it is merged with.
  pub fn is_empty_container(&self) -> bool {
    match self {
      Self::List(items) => items.is_empty(),
      Self::Map(map) => map.is_empty(),
      _ => false,
    }
  }

  /// Merge `other` into `self`.
  ///
  /// Lists append, maps merge recursively, scalars are overwritten. `path`
  /// is the dotted property path used in error messages.
  pub fn merge(&mut self, other: &PropertyValue, path: &str) -> Result<(), PropertyError> {
    match (&mut *self, other) {
      (Self::List(dst), Self::List(src)) => {
        dst.extend(src.iter().cloned());
        Ok(())
      }
      (Self::Map(dst), Self::Map(src)) => merge_maps(dst, src, path),
      (dst, src) if dst.is_empty_container() && matches!(src, Self::List(_) | Self::Map(_)) => {
        *dst = src.clone();
        Ok(())
      }
      (Self::List(_) | Self::Map(_), src) if src.is_empty_container() => Ok(()),
      (dst, src) if dst.kind() == src.kind() => {
        *dst = src.clone();
        Ok(())
      }
      (dst, src) => Err(PropertyError::KindMismatch {
        path: path.to_string(),
        expected: dst.kind(),
        found: src.kind(),
      }),
    }
  }
}

/// Merge every entry of `src` into `dst`, see [`PropertyValue::merge`].
pub fn merge_maps(dst: &mut PropertyMap, src: &PropertyMap, prefix: &str) -> Result<(), PropertyError> {
  for (key, value) in src {
    let path = join_path(prefix, key);
    match dst.get_mut(key) {
      Some(existing) => existing.merge(value, &path)?,
      None => {
        dst.insert(key.clone(), value.clone());
      }
    }
  }
  Ok(())
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
  if prefix.is_empty() {
    key.to_string()
  } else {
    format!("{}.{}", prefix, key)
  }
}

/// Typed, dotted-path lookups over a [`PropertyMap`].
pub trait PropertyMapExt {
  /// Look up `path` (e.g. `"vndk.enabled"`), descending through maps.
  fn lookup(&self, path: &str) -> Option<&PropertyValue>;

  /// Set `path`, creating intermediate maps. Existing non-map values on the
  /// way are replaced.
  fn set_path(&mut self, path: &str, value: PropertyValue);

  /// Boolean at `path`, `false` when absent or not a bool.
  fn flag(&self, path: &str) -> bool {
    self.flag_or(path, false)
  }

  fn flag_or(&self, path: &str, default: bool) -> bool {
    self.lookup(path).and_then(PropertyValue::as_bool).unwrap_or(default)
  }

  fn string(&self, path: &str) -> Option<&str> {
    self.lookup(path).and_then(PropertyValue::as_str)
  }

  /// String list at `path`, empty when absent or not a list.
  fn strings(&self, path: &str) -> &[String] {
    self.lookup(path).and_then(PropertyValue::as_list).unwrap_or(&[])
  }

  fn map(&self, path: &str) -> Option<&PropertyMap> {
    self.lookup(path).and_then(PropertyValue::as_map)
  }
}

impl PropertyMapExt for PropertyMap {
  fn lookup(&self, path: &str) -> Option<&PropertyValue> {
    let mut segments = path.split('.');
    let mut current = self.get(segments.next()?)?;
    for segment in segments {
      current = current.as_map()?.get(segment)?;
    }
    Some(current)
  }

  fn set_path(&mut self, path: &str, value: PropertyValue) {
    match path.split_once('.') {
      None => {
        self.insert(path.to_string(), value);
      }
      Some((head, rest)) => {
        let entry = self
          .entry(head.to_string())
          .or_insert_with(|| PropertyValue::Map(PropertyMap::new()));
        if !matches!(entry, PropertyValue::Map(_)) {
          *entry = PropertyValue::Map(PropertyMap::new());
        }
        if let PropertyValue::Map(inner) = entry {
          inner.set_path(rest, value);
        }
      }
    }
  }
}

impl From<bool> for PropertyValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<&str> for PropertyValue {
  fn from(value: &str) -> Self {
    Self::String(value.to_string())
  }
}

impl From<String> for PropertyValue {
  fn from(value: String) -> Self {
    Self::String(value)
  }
}

impl From<Vec<String>> for PropertyValue {
  fn from(value: Vec<String>) -> Self {
    Self::List(value)
  }
}
