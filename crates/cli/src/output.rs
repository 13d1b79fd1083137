//! Terminal output for the commands.
//!
//! Status and diagnostics are colored when the stream supports it. Graph
//! listings (variants, bindings, link orders) are built as plain lines by
//! the `*_line` helpers and only colored on the way out.

use std::fmt::Display;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const ENABLED: &str = "•";
  pub const DISABLED: &str = "-";
  pub const ARROW: &str = "→";
}

/// Width of the dependency tag column in binding listings.
const TAG_WIDTH: usize = 12;

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

/// Print each configuration error on its own line to stderr.
pub fn print_errors<E: Display>(errors: &[E]) {
  for error in errors {
    eprintln!(
      "{} {}",
      symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
      error.to_string().if_supports_color(Stream::Stderr, |s| s.red())
    );
  }
}

pub fn print_warnings<W: Display>(warnings: &[W]) {
  for warning in warnings {
    eprintln!(
      "{} {}",
      symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
      warning.to_string().if_supports_color(Stream::Stderr, |s| s.yellow())
    );
  }
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Names joined for a one-line stat.
pub fn name_list(names: &[String]) -> String {
  if names.is_empty() {
    "(none)".to_string()
  } else {
    names.join(" ")
  }
}

pub fn variant_line(name: &str, enabled: bool) -> String {
  if enabled {
    format!("  {} {}", symbols::ENABLED, name)
  } else {
    format!("  {} {} (disabled)", symbols::DISABLED, name)
  }
}

pub fn print_variant(name: &str, enabled: bool) {
  let line = variant_line(name, enabled);
  if enabled {
    println!("{}", line);
  } else {
    println!("{}", line.if_supports_color(Stream::Stdout, |s| s.dimmed()));
  }
}

/// `tag reference → module:variant`, with the tag column padded.
pub fn binding_line(tag: &str, reference: &str, target: &str) -> String {
  format!("  {:<width$} {} {} {}", tag, reference, symbols::ARROW, target, width = TAG_WIDTH)
}

/// A titled list of qualified variant names.
pub fn print_section(title: &str, names: &[String]) {
  println!("{}", title.if_supports_color(Stream::Stdout, |s| s.bold()));
  if names.is_empty() {
    println!("  (none)");
  }
  for name in names {
    println!("  {} {}", symbols::ENABLED, name);
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_list_marks_empty_lists() {
    assert_eq!(name_list(&[]), "(none)");
    assert_eq!(name_list(&["libc".to_string(), "libm".to_string()]), "libc libm");
  }

  #[test]
  fn variant_lines_flag_disabled_variants() {
    assert_eq!(variant_line("android_arm64_core_static", true), "  • android_arm64_core_static");
    assert_eq!(variant_line("android_arm_core_static", false), "  - android_arm_core_static (disabled)");
  }

  #[test]
  fn binding_lines_align_the_tag_column() {
    assert_eq!(
      binding_line("shared", "liblog", "liblog:android_arm64_core_shared"),
      "  shared       liblog → liblog:android_arm64_core_shared"
    );
    assert_eq!(
      binding_line("whole_static", "libz#2", "libz:android_arm64_core_static"),
      "  whole_static libz#2 → libz:android_arm64_core_static"
    );
  }
}
