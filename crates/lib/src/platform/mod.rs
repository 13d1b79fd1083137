pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;
use std::fmt;

/// A build target: one OS paired with one architecture (e.g. "android_arm64").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
  pub os: Os,
  pub arch: Arch,
}

impl Target {
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the machine running the configurator.
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn host() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Key used by combined `target: { android_arm64 = {...} }` overlays.
  pub fn overlay_key(&self) -> String {
    format!("{}_{}", self.os, self.arch)
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.overlay_key())
  }
}

/// Returns the host target string (e.g. "linux_x86_64")
///
/// Returns `None` if the current platform is not supported
pub fn host_target() -> Option<String> {
  Target::host().map(|t| t.overlay_key())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn overlay_key_format() {
    let target = Target::new(Os::Android, Arch::Arm64);
    assert_eq!(target.overlay_key(), "android_arm64");

    let target = Target::new(Os::Linux, Arch::X86_64);
    assert_eq!(target.to_string(), "linux_x86_64");
  }
}
