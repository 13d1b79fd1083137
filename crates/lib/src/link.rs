//! Static link ordering.
//!
//! On a static link line a library must come before every library it
//! depends on. For each variant we record the transitive closure of its
//! static and shared dependencies in link order, and the static libraries
//! it declared directly, which is what goes on its link line.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::topo::VariantDag;
use crate::graph::{DependencyGraph, Variant, VariantId};
use crate::module::DepTag;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkOrder {
  /// Transitive dependency closure in link order. Shared dependencies and
  /// everything they link are included so they constrain the order, even
  /// though they never reach the link line.
  pub all_ordered: Vec<VariantId>,
  /// Directly declared static dependencies, in link order.
  pub link_line: Vec<VariantId>,
}

/// Order a module's static dependencies.
///
/// Each direct static dependency, then each direct shared dependency, is
/// followed by its own recorded transitive list; of every entry only the
/// last occurrence is kept. The result places each library after everything
/// that requires it, and when two libraries are unconstrained the order of
/// the last requirer wins. Shared dependencies contribute to the transitive
/// order but never to the direct list.
///
/// Returns `(all_ordered, direct_ordered)`.
pub fn order_deps<T>(direct_static: &[T], direct_shared: &[T], all_transitive: &HashMap<T, Vec<T>>) -> (Vec<T>, Vec<T>)
where
  T: Clone + Eq + Hash,
{
  let mut sequence: Vec<&T> = Vec::new();
  for dep in direct_static.iter().chain(direct_shared) {
    sequence.push(dep);
    if let Some(transitive) = all_transitive.get(dep) {
      sequence.extend(transitive);
    }
  }

  let mut seen: HashSet<&T> = HashSet::new();
  let mut all_ordered: Vec<T> = Vec::new();
  for dep in sequence.into_iter().rev() {
    if seen.insert(dep) {
      all_ordered.push(dep.clone());
    }
  }
  all_ordered.reverse();

  let declared: HashSet<&T> = direct_static.iter().collect();
  let direct_ordered = all_ordered.iter().filter(|d| declared.contains(d)).cloned().collect();
  (all_ordered, direct_ordered)
}

/// Compute link orders for every variant in `topo`, which must list
/// dependencies first. Variants on a cycle see whatever their dependencies
/// had recorded so far.
pub fn compute_link_orders(graph: &DependencyGraph, topo: &[VariantId]) -> BTreeMap<VariantId, LinkOrder> {
  let mut all_transitive: HashMap<VariantId, Vec<VariantId>> = HashMap::new();
  let mut orders = BTreeMap::new();

  for id in topo {
    let Some(variant) = graph.variant(*id) else {
      continue;
    };

    let mut direct_static = Vec::new();
    let mut direct_shared = Vec::new();
    for edge in &variant.deps {
      let Some(target) = edge.target.and_then(|t| graph.variant(t)) else {
        continue;
      };
      match edge.tag {
        DepTag::Static | DepTag::WholeStatic if target.variation("link") == Some("static") => {
          direct_static.push(target.id);
        }
        DepTag::Shared => direct_shared.push(target.id),
        _ => {}
      }
    }

    let (all_ordered, link_line) = order_deps(&direct_static, &direct_shared, &all_transitive);
    all_transitive.insert(*id, all_ordered.clone());
    orders.insert(*id, LinkOrder { all_ordered, link_line });
  }

  debug!(variants = orders.len(), "computed link orders");
  orders
}

/// Report static dependency cycles. They never abort a run, but a link line
/// for a variant on a cycle is only as good as the DFS order it was built in.
pub fn find_static_cycles(graph: &DependencyGraph, dag: &VariantDag) -> Vec<Vec<String>> {
  dag
    .static_cycles()
    .into_iter()
    .map(|cycle| {
      let names: Vec<String> = cycle
        .iter()
        .filter_map(|id| graph.variant(*id))
        .map(Variant::qualified_name)
        .collect();
      warn!(variants = %names.join(", "), "cyclic static dependency");
      names
    })
    .collect()
}
