//! What a module type builds, and the capabilities that follow from it.

use serde::Serialize;

/// Output class of a module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ModuleKind {
  /// Property templates only; never instantiated into variants.
  Defaults,
  Library(LibraryKind),
  Binary(BinaryKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LibraryKind {
  pub static_lib: bool,
  pub shared_lib: bool,
  pub prebuilt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinaryKind {
  pub test: bool,
}

/// Modules whose sources are compiled.
pub trait Compilable {
  /// `compile_multilib` used when the module does not set one.
  fn default_multilib(&self) -> &'static str;
}

/// Modules other variants can link against.
pub trait Linkable {
  /// Values of the `link` axis, empty for header-only libraries.
  fn link_variations(&self) -> Vec<&'static str>;
}

/// Modules that produce an installable file.
pub trait Installable {
  fn install_dir(&self) -> &'static str;

  /// File name of the output for a variant with the given `link` value.
  fn output_file(&self, stem: &str, link: Option<&str>) -> String;
}

impl LibraryKind {
  pub const fn headers() -> Self {
    Self {
      static_lib: false,
      shared_lib: false,
      prebuilt: false,
    }
  }

  pub fn is_headers(&self) -> bool {
    !self.static_lib && !self.shared_lib
  }
}

impl Compilable for LibraryKind {
  fn default_multilib(&self) -> &'static str {
    "both"
  }
}

impl Linkable for LibraryKind {
  fn link_variations(&self) -> Vec<&'static str> {
    let mut values = Vec::new();
    if self.static_lib {
      values.push("static");
    }
    if self.shared_lib {
      values.push("shared");
    }
    values
  }
}

impl Installable for LibraryKind {
  fn install_dir(&self) -> &'static str {
    "lib"
  }

  fn output_file(&self, stem: &str, link: Option<&str>) -> String {
    match link {
      Some("static") => format!("{}.a", stem),
      _ => format!("{}.so", stem),
    }
  }
}

impl Compilable for BinaryKind {
  fn default_multilib(&self) -> &'static str {
    "first"
  }
}

impl Installable for BinaryKind {
  fn install_dir(&self) -> &'static str {
    if self.test { "nativetest" } else { "bin" }
  }

  fn output_file(&self, stem: &str, _link: Option<&str>) -> String {
    stem.to_string()
  }
}

impl ModuleKind {
  pub fn is_defaults(&self) -> bool {
    matches!(self, Self::Defaults)
  }

  pub fn is_prebuilt(&self) -> bool {
    matches!(self, Self::Library(lib) if lib.prebuilt)
  }

  pub fn is_test(&self) -> bool {
    matches!(self, Self::Binary(bin) if bin.test)
  }

  pub fn as_compilable(&self) -> Option<&dyn Compilable> {
    match self {
      Self::Library(lib) if lib.prebuilt || lib.is_headers() => None,
      Self::Library(lib) => Some(lib),
      Self::Binary(bin) => Some(bin),
      Self::Defaults => None,
    }
  }

  pub fn as_linkable(&self) -> Option<&dyn Linkable> {
    match self {
      Self::Library(lib) => Some(lib),
      _ => None,
    }
  }

  pub fn as_installable(&self) -> Option<&dyn Installable> {
    match self {
      Self::Library(lib) if lib.is_headers() => None,
      Self::Library(lib) => Some(lib),
      Self::Binary(bin) => Some(bin),
      Self::Defaults => None,
    }
  }
}
