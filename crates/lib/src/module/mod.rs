//! Module definitions, dependency references and the module type registry.

pub mod kind;
pub mod registry;
pub mod validate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::props::PropertyMap;
use crate::props::defaults::DefaultsError;
use crate::props::value::PropertyKind;
use kind::ModuleKind;

/// A module exactly as declared by the definitions loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
  pub module_type: String,
  pub props: PropertyMap,
}

impl ModuleDef {
  pub fn new(module_type: impl Into<String>, props: PropertyMap) -> Self {
    Self {
      module_type: module_type.into(),
      props,
    }
  }

  /// The declared `name` property.
  pub fn name(&self) -> Option<&str> {
    self.props.get("name").and_then(|v| v.as_str())
  }
}

/// A registered module after `defaults` resolution.
///
/// Shared by every variant of the module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
  pub name: String,
  pub module_type: String,
  pub kind: ModuleKind,
  /// Properties after `defaults` are merged, before any overlay.
  pub props: PropertyMap,
  /// Position in the definitions file.
  pub index: usize,
}

/// Kind of dependency an edge expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepTag {
  Static,
  WholeStatic,
  Shared,
  Header,
  Runtime,
  VndkExt,
}

impl DepTag {
  /// Properties holding dependency lists, and the tag of the edges they add.
  pub const LIST_PROPERTIES: [(&'static str, DepTag); 5] = [
    ("static_libs", DepTag::Static),
    ("whole_static_libs", DepTag::WholeStatic),
    ("shared_libs", DepTag::Shared),
    ("header_libs", DepTag::Header),
    ("runtime_libs", DepTag::Runtime),
  ];

  /// Properties removing earlier entries from a dependency list.
  pub const EXCLUDE_PROPERTIES: [(&'static str, DepTag); 4] = [
    ("exclude_static_libs", DepTag::Static),
    ("exclude_shared_libs", DepTag::Shared),
    ("exclude_header_libs", DepTag::Header),
    ("exclude_runtime_libs", DepTag::Runtime),
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Static => "static",
      Self::WholeStatic => "whole_static",
      Self::Shared => "shared",
      Self::Header => "header",
      Self::Runtime => "runtime",
      Self::VndkExt => "vndk_ext",
    }
  }

  /// The dependency list property this tag comes from.
  pub fn property(&self) -> &'static str {
    match self {
      Self::Static => "static_libs",
      Self::WholeStatic => "whole_static_libs",
      Self::Shared => "shared_libs",
      Self::Header => "header_libs",
      Self::Runtime => "runtime_libs",
      Self::VndkExt => "vndk.extends",
    }
  }

  /// Value of the `link` axis this tag requests from its target.
  pub fn link_variation(&self) -> &'static str {
    match self {
      Self::Static | Self::WholeStatic | Self::Header => "static",
      Self::Shared | Self::Runtime | Self::VndkExt => "shared",
    }
  }

  /// Edges that place the target on the static link line.
  pub fn is_static_link(&self) -> bool {
    matches!(self, Self::Static | Self::WholeStatic)
  }

  /// Edges that make the target a library linked by the dependent.
  pub fn is_library(&self) -> bool {
    matches!(self, Self::Static | Self::WholeStatic | Self::Shared)
  }
}

impl fmt::Display for DepTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A reference to another module: `name` or `name#version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepRef {
  pub name: String,
  pub version: Option<String>,
}

impl DepRef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: None,
    }
  }

  pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: Some(version.into()),
    }
  }
}

impl FromStr for DepRef {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.split_once('#') {
      None if s.is_empty() => Err("empty dependency name".to_string()),
      None => Ok(Self::new(s)),
      Some((name, version)) if name.is_empty() || version.is_empty() || version.contains('#') => {
        Err(format!("malformed dependency reference '{}'", s))
      }
      Some((name, version)) => Ok(Self::versioned(name, version)),
    }
  }
}

impl fmt::Display for DepRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{}#{}", self.name, version),
      None => write!(f, "{}", self.name),
    }
  }
}

/// Errors in the definitions themselves, reported before any variant exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
  #[error("module of type \"{module_type}\" (definition #{index}) has no name")]
  MissingName { module_type: String, index: usize },

  #[error("module \"{module}\": unknown module type \"{module_type}\"")]
  UnknownModuleType { module: String, module_type: String },

  #[error("module \"{module}\" is defined more than once")]
  DuplicateModule { module: String },

  #[error("module \"{module}\": unrecognized property \"{property}\"")]
  UnknownProperty { module: String, property: String },

  #[error("module \"{module}\": property \"{property}\" must be a {expected}, found {found}")]
  WrongPropertyKind {
    module: String,
    property: String,
    expected: PropertyKind,
    found: PropertyKind,
  },

  #[error("module \"{module}\": property \"{property}\": {message}")]
  InvalidValue {
    module: String,
    property: String,
    message: String,
  },

  #[error("module \"{module}\": {message}")]
  Vndk { module: String, message: String },

  #[error(transparent)]
  Defaults(#[from] DefaultsError),
}
