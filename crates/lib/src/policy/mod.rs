//! Cross-boundary policy checks.
//!
//! Checks run once every edge is bound. They read the graph through
//! [`ResolvedView`] and never change it; all of them run in parallel and
//! their violations are reported together.

pub mod double_loadable;
pub mod extends;
pub mod vndk;

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::graph::{DepEdge, DependencyGraph, Variant, VariantId};

/// A read-only window on a fully resolved graph.
#[derive(Clone, Copy)]
pub struct ResolvedView<'a> {
  graph: &'a DependencyGraph,
}

impl<'a> ResolvedView<'a> {
  pub fn new(graph: &'a DependencyGraph) -> Self {
    Self { graph }
  }

  /// Enabled variants in declaration order.
  pub fn variants(&self) -> impl Iterator<Item = &'a Variant> {
    self.graph.variants().filter(|v| v.enabled)
  }

  pub fn variants_of(&self, module: &str) -> impl Iterator<Item = &'a Variant> {
    self.graph.variants_of(module)
  }

  pub fn variant(&self, id: VariantId) -> Option<&'a Variant> {
    self.graph.variant(id)
  }

  /// Visit the bound edges of `id` with their targets.
  pub fn visit_direct_deps(&self, id: VariantId, mut f: impl FnMut(&'a DepEdge, &'a Variant)) {
    self.graph.visit_direct_deps(id, |edge, target| {
      if edge.is_bound() {
        f(edge, target)
      }
    });
  }
}

/// A broken boundary rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[error("module \"{module}\" variant \"{variant}\": {message}")]
pub struct PolicyViolation {
  pub check: &'static str,
  pub module: String,
  pub variant: String,
  pub target: String,
  pub message: String,
}

impl PolicyViolation {
  pub fn new(check: &'static str, source: &Variant, target: &Variant, message: impl Into<String>) -> Self {
    Self {
      check,
      module: source.module_name().to_string(),
      variant: source.name(),
      target: target.module_name().to_string(),
      message: message.into(),
    }
  }
}

pub trait PolicyCheck: Send + Sync {
  fn name(&self) -> &'static str;

  fn check(&self, view: &ResolvedView<'_>) -> Vec<PolicyViolation>;
}

/// The builtin checks: `vndk_link`, `vndk_extends` and `double_loadable`.
pub fn builtin_checks() -> Vec<Box<dyn PolicyCheck>> {
  vec![
    Box::new(vndk::VndkLinkCheck),
    Box::new(extends::VndkExtendsCheck),
    Box::new(double_loadable::DoubleLoadableCheck),
  ]
}

/// Run `checks` over `graph`.
///
/// A declaration repeated across arch or link variants breaks a rule once
/// per variant; only the first report of each `(check, module, target,
/// message)` is kept.
pub fn run_checks(checks: &[Box<dyn PolicyCheck>], graph: &DependencyGraph) -> Vec<PolicyViolation> {
  let view = ResolvedView::new(graph);
  let reports: Vec<Vec<PolicyViolation>> = checks
    .par_iter()
    .map(|check| {
      let found = check.check(&view);
      debug!(check = check.name(), violations = found.len(), "policy check complete");
      found
    })
    .collect();

  let mut seen = HashSet::new();
  reports
    .into_iter()
    .flatten()
    .filter(|v| seen.insert((v.check, v.module.clone(), v.target.clone(), v.message.clone())))
    .collect()
}
