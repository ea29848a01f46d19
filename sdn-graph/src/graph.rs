//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! A stateless, rebuild-per-call topology graph. Every query takes a freshly built
//! snapshot; there is no shared mutable graph anywhere in this crate.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use sdn_utils::RouterId;

/// An undirected weighted graph built from a topology snapshot of
/// `Active` routers and `Active` links. `w(e) = link.cost`.
pub struct TopologyGraph {
    pub(crate) graph: UnGraph<RouterId, f64>,
    pub(crate) index: HashMap<RouterId, NodeIndex>,
}

impl TopologyGraph {
    /// Builds a graph from the active-router/active-link snapshot. Callers
    /// are expected to have already filtered out `Inactive` routers and
    /// links before calling this (the Controller core does so when reading
    /// from the store).
    pub fn build(routers: &[RouterId], links: &[(RouterId, RouterId, f64)]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = HashMap::with_capacity(routers.len());

        for &id in routers {
            let idx = graph.add_node(id);
            index.insert(id, idx);
        }
        for &(a, b, cost) in links {
            if let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) {
                graph.update_edge(ia, ib, cost);
            }
        }

        TopologyGraph { graph, index }
    }

    pub fn contains(&self, id: RouterId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.index.keys().copied()
    }

    pub(crate) fn idx(&self, id: RouterId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub(crate) fn id_of(&self, idx: NodeIndex) -> RouterId {
        self.graph[idx]
    }

    /// Neighbors of `id` with their edge cost, or an empty vec if `id`
    /// isn't in the graph.
    pub(crate) fn neighbors(&self, id: RouterId) -> Vec<(RouterId, f64)> {
        let Some(idx) = self.idx(id) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .map(|e| (self.id_of(e.target()), *e.weight()))
            .collect()
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (RouterId, RouterId, f64)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.id_of(e.source()),
                self.id_of(e.target()),
                *e.weight(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_ignores_dangling_link_endpoints() {
        let routers = vec![RouterId(1), RouterId(2)];
        let links = vec![(RouterId(1), RouterId(2), 1.0), (RouterId(2), RouterId(99), 1.0)];
        let g = TopologyGraph::build(&routers, &links);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn empty_graph() {
        let g = TopologyGraph::build(&[], &[]);
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }
}
