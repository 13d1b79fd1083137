//! Build action generation.
//!
//! Generators read a [`ConfiguredGraph`] and emit [`BuildAction`]s: one
//! command with its input and output paths. Nothing is executed here; the
//! resulting [`ActionGraph`] is serialized for whatever build backend
//! consumes it.
//!
//! # Paths
//!
//! Every output lives under `out/<module>/<variant>/`. Objects go to
//! `obj/<src>.o` below that directory, the linked file next to it.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::configure::ConfiguredGraph;
use crate::consts::{OUT_DIR, PREBUILT_PREFIX};
use crate::graph::Variant;
use crate::module::DepTag;
use crate::mutator::prebuilt::{PREBUILT_SELECTED_PROPERTY, PREBUILT_SHADOWED_PROPERTY};
use crate::mutator::version::STUB_PROPERTY;
use crate::props::PropertyMapExt;
use crate::util::hash::Hashable;

/// A single command of the build.
///
/// # Fields
///
/// - `id`: `<module>:<variant>/<rule>/<n>`, unique within an [`ActionGraph`]
/// - `rule`: `cc`, `ar`, `ld`, `stub` or `cp`
/// - `command`: argv of the command
/// - `inputs`/`outputs`: paths read and written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildAction {
  pub id: String,
  pub rule: String,
  pub command: Vec<String>,
  pub inputs: Vec<String>,
  pub outputs: Vec<String>,
}

/// Every action of a configured graph, dependencies' actions first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionGraph {
  pub actions: Vec<BuildAction>,
}

impl Hashable for ActionGraph {}

pub trait Generator: Send + Sync {
  fn name(&self) -> &'static str;

  /// Actions for one enabled variant.
  fn generate(&self, graph: &ConfiguredGraph, variant: &Variant) -> Vec<BuildAction>;
}

/// Directory holding a variant's outputs.
pub fn variant_dir(variant: &Variant) -> String {
  format!("{}/{}/{}", OUT_DIR, variant.module_name(), variant.name())
}

/// Path of the file a variant produces, `None` for header-only libraries.
pub fn output_path(variant: &Variant) -> Option<String> {
  let installable = variant.module.kind.as_installable()?;
  let declared = variant.module_name();
  let declared = declared.strip_prefix(PREBUILT_PREFIX).unwrap_or(declared);
  let stem = variant.props.string("stem").unwrap_or(declared);
  Some(format!(
    "{}/{}",
    variant_dir(variant),
    installable.output_file(stem, variant.variation("link"))
  ))
}

/// Compile, archive and link actions for `cc_*` modules.
pub struct CcGenerator;

impl CcGenerator {
  fn action(variant: &Variant, rule: &str, n: usize, command: Vec<String>, inputs: Vec<String>, outputs: Vec<String>) -> BuildAction {
    BuildAction {
      id: format!("{}/{}/{}", variant.qualified_name(), rule, n),
      rule: rule.to_string(),
      command,
      inputs,
      outputs,
    }
  }

  /// `-I` flags exported by the variant and its direct dependencies.
  fn include_flags(graph: &ConfiguredGraph, variant: &Variant) -> Vec<String> {
    let mut flags: Vec<String> = variant
      .props
      .strings("export_include_dirs")
      .iter()
      .map(|dir| format!("-I{}", dir))
      .collect();
    for (edge, target) in graph.deps(variant.id) {
      if matches!(edge.tag, DepTag::Static | DepTag::WholeStatic | DepTag::Shared | DepTag::Header) {
        flags.extend(
          target
            .props
            .strings("export_include_dirs")
            .iter()
            .map(|dir| format!("-I{}", dir)),
        );
      }
    }
    flags.dedup();
    flags
  }

  fn compile(graph: &ConfiguredGraph, variant: &Variant) -> (Vec<BuildAction>, Vec<String>) {
    let dir = variant_dir(variant);
    let includes = Self::include_flags(graph, variant);
    let cflags = variant.props.strings("cflags");

    let mut actions = Vec::new();
    let mut objects = Vec::new();
    for (n, src) in variant.props.strings("srcs").iter().enumerate() {
      let object = format!("{}/obj/{}.o", dir, src);
      let mut command = vec!["clang".to_string(), "-c".to_string(), src.clone(), "-o".to_string(), object.clone()];
      command.extend(cflags.iter().cloned());
      command.extend(includes.iter().cloned());
      actions.push(Self::action(variant, "cc", n, command, vec![src.clone()], vec![object.clone()]));
      objects.push(object);
    }
    (actions, objects)
  }

  fn link(graph: &ConfiguredGraph, variant: &Variant, objects: Vec<String>, output: String) -> BuildAction {
    if variant.variation("link") == Some("static") {
      let mut command = vec!["ar".to_string(), "rcs".to_string(), output.clone()];
      command.extend(objects.iter().cloned());
      return Self::action(variant, "ar", 0, command, objects, vec![output]);
    }

    let archives: Vec<String> = graph
      .link_order(variant.id)
      .map(|order| {
        order
          .link_line
          .iter()
          .filter_map(|id| graph.variant(*id))
          .filter_map(output_path)
          .collect()
      })
      .unwrap_or_default();
    let shared: Vec<String> = graph
      .deps_with_tag(variant.id, DepTag::Shared)
      .into_iter()
      .filter_map(output_path)
      .collect();

    let mut command = vec!["clang".to_string()];
    if variant.variation("link") == Some("shared") {
      command.push("-shared".to_string());
    }
    command.extend(["-o".to_string(), output.clone()]);
    command.extend(objects.iter().cloned());
    command.extend(archives.iter().cloned());
    command.extend(shared.iter().cloned());
    command.extend(variant.props.strings("ldflags").iter().cloned());

    let mut inputs = objects;
    inputs.extend(archives);
    inputs.extend(shared);
    Self::action(variant, "ld", 0, command, inputs, vec![output])
  }

  fn stub(variant: &Variant, output: String) -> BuildAction {
    let symbol_file = variant
      .props
      .string("stubs.symbol_file")
      .or_else(|| variant.props.string("llndk.symbol_file"));
    let mut command = vec!["ndkstub".to_string()];
    command.extend(symbol_file.map(str::to_string));
    if let Some(version) = variant.variation("version").filter(|v| !v.is_empty()) {
      command.extend(["--api".to_string(), version.to_string()]);
    }
    command.extend(["-o".to_string(), output.clone()]);
    let inputs = symbol_file.map(str::to_string).into_iter().collect();
    Self::action(variant, "stub", 0, command, inputs, vec![output])
  }
}

impl Generator for CcGenerator {
  fn name(&self) -> &'static str {
    "cc"
  }

  fn generate(&self, graph: &ConfiguredGraph, variant: &Variant) -> Vec<BuildAction> {
    if variant.props.flag(PREBUILT_SHADOWED_PROPERTY) {
      return Vec::new();
    }
    let Some(output) = output_path(variant) else {
      return Vec::new();
    };

    if variant.module.kind.is_prebuilt() {
      if !variant.props.flag(PREBUILT_SELECTED_PROPERTY) {
        return Vec::new();
      }
      let Some(src) = variant.props.strings("srcs").first() else {
        return Vec::new();
      };
      let command = vec!["cp".to_string(), src.clone(), output.clone()];
      return vec![Self::action(variant, "cp", 0, command, vec![src.clone()], vec![output])];
    }

    if variant.props.flag(STUB_PROPERTY) {
      return vec![Self::stub(variant, output)];
    }

    let (mut actions, objects) = Self::compile(graph, variant);
    actions.push(Self::link(graph, variant, objects, output));
    actions
  }
}

pub fn builtin_generators() -> Vec<Box<dyn Generator>> {
  vec![Box::new(CcGenerator)]
}

/// Run `generators` over every enabled variant in topological order.
pub fn generate_actions(graph: &ConfiguredGraph, generators: &[Box<dyn Generator>]) -> ActionGraph {
  let per_variant: Vec<Vec<BuildAction>> = graph
    .topological()
    .par_iter()
    .filter_map(|id| graph.variant(*id))
    .map(|variant| {
      generators
        .iter()
        .flat_map(|generator| generator.generate(graph, variant))
        .collect()
    })
    .collect();

  let actions: Vec<BuildAction> = per_variant.into_iter().flatten().collect();
  debug!(actions = actions.len(), "generated build actions");
  ActionGraph { actions }
}
