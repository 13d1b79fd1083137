//! Topology of the resolved graph.
//!
//! Once every edge is bound the graph is handed to petgraph: enabled
//! variants become nodes and bound edges run from dependency to dependent.

use std::collections::HashMap;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::warn;

use crate::module::DepTag;

use super::{DependencyGraph, Direction, VariantId};

pub struct VariantDag {
  graph: DiGraph<VariantId, DepTag>,
  nodes: HashMap<VariantId, NodeIndex>,
}

impl VariantDag {
  /// Build the DAG of enabled variants and their bound edges.
  pub fn from_graph(graph: &DependencyGraph) -> Self {
    let mut dag = DiGraph::new();
    let mut nodes = HashMap::new();

    for variant in graph.variants().filter(|v| v.enabled) {
      nodes.insert(variant.id, dag.add_node(variant.id));
    }

    for variant in graph.variants().filter(|v| v.enabled) {
      let dependent = nodes[&variant.id];
      for edge in &variant.deps {
        if let Some(target) = edge.target
          && let Some(&dependency) = nodes.get(&target)
        {
          dag.add_edge(dependency, dependent, edge.tag);
        }
      }
    }

    Self { graph: dag, nodes }
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  /// Enabled variants, dependencies first.
  ///
  /// A cyclic graph cannot be sorted; the guarded DFS order of `graph` is
  /// used instead and a warning is logged.
  pub fn topological_order(&self, graph: &DependencyGraph) -> Vec<VariantId> {
    match toposort(&self.graph, None) {
      Ok(sorted) => sorted.into_iter().map(|idx| self.graph[idx]).collect(),
      Err(cycle) => {
        let at = self.graph[cycle.node_id()];
        let name = graph.variant(at).map(|v| v.qualified_name()).unwrap_or_default();
        warn!(variant = %name, "cycle detected in resolved graph, falling back to DFS order");
        graph
          .topological_variants(Direction::BottomUp)
          .order
          .into_iter()
          .filter(|id| self.nodes.contains_key(id))
          .collect()
      }
    }
  }

  /// Cycles among static link edges: strongly connected components with
  /// more than one variant, and variants linking themselves statically.
  pub fn static_cycles(&self) -> Vec<Vec<VariantId>> {
    let mut statics: DiGraph<VariantId, ()> = DiGraph::new();
    for idx in self.graph.node_indices() {
      statics.add_node(self.graph[idx]);
    }
    for edge in self.graph.raw_edges() {
      if edge.weight.is_static_link() {
        statics.add_edge(edge.source(), edge.target(), ());
      }
    }

    let mut cycles: Vec<Vec<VariantId>> = tarjan_scc(&statics)
      .into_iter()
      .filter(|scc| scc.len() > 1 || statics.contains_edge(scc[0], scc[0]))
      .map(|scc| {
        let mut ids: Vec<VariantId> = scc.into_iter().map(|idx| statics[idx]).collect();
        ids.sort();
        ids
      })
      .collect();
    cycles.sort();
    cycles
  }
}
