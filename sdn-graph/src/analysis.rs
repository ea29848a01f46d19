//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Connectivity, articulation points, bridges, centrality and aggregate
//! statistics. petgraph has no built-in articulation
//! point/bridge algorithm, so both are a direct hand-rolled Tarjan
//! low-link DFS, the idiomatic way to compute them without pulling in a
//! second graph crate just for two functions.

use std::collections::{HashMap, HashSet};

use sdn_utils::RouterId;

use crate::graph::TopologyGraph;
use crate::paths::all_shortest_paths_from;

#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity {
    pub connected: bool,
    pub components: usize,
    pub isolated_nodes: HashSet<RouterId>,
    pub component_members: Vec<HashSet<RouterId>>,
}

/// `connectivity()`.
pub fn connectivity(graph: &TopologyGraph) -> Connectivity {
    let mut visited = HashSet::new();
    let mut component_members = Vec::new();

    for start in graph.router_ids() {
        if visited.contains(&start) {
            continue;
        }
        let mut component = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !component.insert(node) {
                continue;
            }
            visited.insert(node);
            for (neighbor, _) in graph.neighbors(node) {
                if !component.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        component_members.push(component);
    }

    let isolated_nodes = component_members
        .iter()
        .filter(|c| c.len() == 1)
        .flat_map(|c| c.iter().copied())
        .collect();

    Connectivity {
        connected: component_members.len() <= 1,
        components: component_members.len(),
        isolated_nodes,
        component_members,
    }
}

struct TarjanState {
    disc: HashMap<RouterId, usize>,
    low: HashMap<RouterId, usize>,
    timer: usize,
    articulation: HashSet<RouterId>,
    bridges: HashSet<(RouterId, RouterId)>,
}

fn tarjan_dfs(
    graph: &TopologyGraph,
    node: RouterId,
    parent: Option<RouterId>,
    state: &mut TarjanState,
) {
    state.disc.insert(node, state.timer);
    state.low.insert(node, state.timer);
    state.timer += 1;
    let mut children = 0;

    for (neighbor, _) in graph.neighbors(node) {
        if Some(neighbor) == parent {
            continue;
        }
        if let Some(&disc_neighbor) = state.disc.get(&neighbor) {
            let low_node = state.low[&node];
            state.low.insert(node, low_node.min(disc_neighbor));
        } else {
            children += 1;
            tarjan_dfs(graph, neighbor, Some(node), state);
            let low_neighbor = state.low[&neighbor];
            let low_node = state.low[&node];
            state.low.insert(node, low_node.min(low_neighbor));

            if low_neighbor > state.disc[&node] {
                let pair = normalize_pair(node, neighbor);
                state.bridges.insert(pair);
            }

            let is_articulation = match parent {
                None => children > 1,
                Some(_) => low_neighbor >= state.disc[&node],
            };
            if is_articulation {
                state.articulation.insert(node);
            }
        }
    }
}

fn normalize_pair(a: RouterId, b: RouterId) -> (RouterId, RouterId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn run_tarjan(graph: &TopologyGraph) -> TarjanState {
    let mut state = TarjanState {
        disc: HashMap::new(),
        low: HashMap::new(),
        timer: 0,
        articulation: HashSet::new(),
        bridges: HashSet::new(),
    };
    for root in graph.router_ids() {
        if !state.disc.contains_key(&root) {
            tarjan_dfs(graph, root, None, &mut state);
        }
    }
    state
}

/// `articulation_points()`.
pub fn articulation_points(graph: &TopologyGraph) -> HashSet<RouterId> {
    run_tarjan(graph).articulation
}

/// `bridges()`.
pub fn bridges(graph: &TopologyGraph) -> HashSet<(RouterId, RouterId)> {
    run_tarjan(graph).bridges
}

#[derive(Debug, Clone, Default)]
pub struct Centrality {
    pub degree: HashMap<RouterId, f64>,
    pub betweenness: HashMap<RouterId, f64>,
    pub closeness: HashMap<RouterId, f64>,
}

/// `centrality()`. Betweenness counts how often a node falls on the
/// shortest path between two others (excluding the endpoints); closeness
/// is the inverse of the average shortest-path distance to every other
/// reachable node, using edge weights as distances.
pub fn centrality(graph: &TopologyGraph) -> Centrality {
    let mut degree = HashMap::new();
    let mut betweenness: HashMap<RouterId, f64> = HashMap::new();
    let mut closeness = HashMap::new();

    for node in graph.router_ids() {
        degree.insert(node, graph.neighbors(node).len() as f64);
        betweenness.entry(node).or_insert(0.0);
    }

    for node in graph.router_ids() {
        let paths = all_shortest_paths_from(graph, node);
        let reachable = paths.len();
        let total_distance: f64 = paths.values().map(|(_, cost)| cost).sum();
        let closeness_value = if reachable > 0 && total_distance > 0.0 {
            reachable as f64 / total_distance
        } else {
            0.0
        };
        closeness.insert(node, closeness_value);

        for (path, _) in paths.values() {
            for intermediate in path.iter().skip(1).take(path.len().saturating_sub(2)) {
                *betweenness.entry(*intermediate).or_insert(0.0) += 1.0;
            }
        }
    }

    // Each shortest path was counted once per (source, ...) traversal; a
    // pair (s, t) and (t, s) both contribute, so halve to avoid
    // double-counting undirected pairs.
    for value in betweenness.values_mut() {
        *value /= 2.0;
    }

    Centrality {
        degree,
        betweenness,
        closeness,
    }
}

/// `edge_betweenness()`: how many shortest paths traverse each edge,
/// for congestion analysis.
pub fn edge_betweenness(graph: &TopologyGraph) -> HashMap<(RouterId, RouterId), f64> {
    let mut scores: HashMap<(RouterId, RouterId), f64> = HashMap::new();
    for (a, b, _) in graph.edges() {
        scores.insert(normalize_pair(a, b), 0.0);
    }

    for node in graph.router_ids() {
        let paths = all_shortest_paths_from(graph, node);
        for (path, _) in paths.values() {
            for pair in path.windows(2) {
                let key = normalize_pair(pair[0], pair[1]);
                *scores.entry(key).or_insert(0.0) += 1.0;
            }
        }
    }

    for value in scores.values_mut() {
        *value /= 2.0;
    }

    scores
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub n: usize,
    pub m: usize,
    pub density: f64,
    pub diameter: Option<f64>,
    pub radius: Option<f64>,
}

/// `stats()`. `diameter` and `radius` are only defined when the graph is
/// connected.
pub fn stats(graph: &TopologyGraph) -> Stats {
    let n = graph.node_count();
    let m = graph.edge_count();
    let density = if n > 1 {
        (2.0 * m as f64) / (n as f64 * (n as f64 - 1.0))
    } else {
        0.0
    };

    let conn = connectivity(graph);
    let (diameter, radius) = if conn.connected && n > 0 {
        let mut eccentricities = Vec::with_capacity(n);
        for node in graph.router_ids() {
            let ecc = all_shortest_paths_from(graph, node)
                .values()
                .map(|(_, cost)| *cost)
                .fold(0.0_f64, f64::max);
            eccentricities.push(ecc);
        }
        let diameter = eccentricities.iter().cloned().fold(0.0_f64, f64::max);
        let radius = eccentricities
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        (Some(diameter), Some(if n == 1 { 0.0 } else { radius }))
    } else {
        (None, None)
    };

    Stats {
        n,
        m,
        density,
        diameter,
        radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_topology_every_link_is_a_bridge() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3), RouterId(4)];
        let links = vec![
            (RouterId(1), RouterId(2), 1.0),
            (RouterId(2), RouterId(3), 1.0),
            (RouterId(3), RouterId(4), 1.0),
        ];
        let g = TopologyGraph::build(&routers, &links);

        let points = articulation_points(&g);
        assert_eq!(points, HashSet::from([RouterId(2), RouterId(3)]));

        let b = bridges(&g);
        assert_eq!(
            b,
            HashSet::from([
                (RouterId(1), RouterId(2)),
                (RouterId(2), RouterId(3)),
                (RouterId(3), RouterId(4)),
            ])
        );
    }

    #[test]
    fn connectivity_reports_isolated_node() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3)];
        let links = vec![(RouterId(1), RouterId(2), 1.0)];
        let g = TopologyGraph::build(&routers, &links);
        let conn = connectivity(&g);
        assert!(!conn.connected);
        assert_eq!(conn.components, 2);
        assert!(conn.isolated_nodes.contains(&RouterId(3)));
    }

    #[test]
    fn stats_on_triangle() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3)];
        let links = vec![
            (RouterId(1), RouterId(2), 1.0),
            (RouterId(2), RouterId(3), 1.0),
            (RouterId(1), RouterId(3), 1.0),
        ];
        let g = TopologyGraph::build(&routers, &links);
        let s = stats(&g);
        assert_eq!(s.n, 3);
        assert_eq!(s.m, 3);
        assert_eq!(s.diameter, Some(1.0));
        assert_eq!(s.radius, Some(1.0));
    }

    #[test]
    fn disconnected_graph_has_no_diameter() {
        let routers = vec![RouterId(1), RouterId(2)];
        let g = TopologyGraph::build(&routers, &[]);
        let s = stats(&g);
        assert_eq!(s.diameter, None);
        assert_eq!(s.radius, None);
    }

    #[test]
    fn empty_graph_queries_return_empty() {
        let g = TopologyGraph::build(&[], &[]);
        assert!(articulation_points(&g).is_empty());
        assert!(bridges(&g).is_empty());
        assert_eq!(connectivity(&g).components, 0);
    }
}
