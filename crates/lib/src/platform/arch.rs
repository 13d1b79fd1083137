use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target CPU architectures a module can be expanded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Arch {
  #[serde(rename = "arm")]
  Arm,
  #[serde(rename = "arm64")]
  Arm64,
  #[serde(rename = "x86")]
  X86,
  #[serde(rename = "x86_64")]
  X86_64,
}

/// Word size class of an architecture, used by `compile_multilib` and the
/// `multilib: { lib32 = ..., lib64 = ... }` overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multilib {
  Lib32,
  Lib64,
}

impl Multilib {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Lib32 => "lib32",
      Self::Lib64 => "lib64",
    }
  }
}

impl Arch {
  /// Detect the host CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "x86" => Some(Self::X86),
      "aarch64" => Some(Self::Arm64),
      "arm" => Some(Self::Arm),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
    }
  }

  pub fn multilib(&self) -> Multilib {
    match self {
      Self::Arm | Self::X86 => Multilib::Lib32,
      Self::Arm64 | Self::X86_64 => Multilib::Lib64,
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "arm" => Ok(Self::Arm),
      "arm64" => Ok(Self::Arm64),
      "x86" => Ok(Self::X86),
      "x86_64" => Ok(Self::X86_64),
      other => Err(format!("unknown architecture '{}'", other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn multilib_classes() {
    assert_eq!(Arch::Arm.multilib(), Multilib::Lib32);
    assert_eq!(Arch::Arm64.multilib(), Multilib::Lib64);
    assert_eq!(Arch::X86_64.multilib().as_str(), "lib64");
  }

  #[test]
  fn parse_roundtrips_identifier() {
    for arch in [Arch::Arm, Arch::Arm64, Arch::X86, Arch::X86_64] {
      assert_eq!(arch.as_str().parse::<Arch>().unwrap(), arch);
    }
    assert!("mips".parse::<Arch>().is_err());
  }
}
