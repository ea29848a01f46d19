//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! Shortest-path and k-shortest-path queries.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use sdn_utils::RouterId;

use crate::cost::Cost;
use crate::graph::TopologyGraph;

/// A path and its total weight.
pub type PathResult = (Vec<RouterId>, f64);

/// Runs single-source Dijkstra from `source`, returning the best
/// `(path, cost)` reached so far for every node the heap has finalized.
/// Ties are broken lexicographically by construction: the heap orders
/// candidates by `(cost, path)`, so the first time a node is popped it is
/// popped with the lexicographically smallest path among all
/// minimum-cost candidates seen so far.
fn dijkstra_from(
    graph: &TopologyGraph,
    source: RouterId,
    excluded_nodes: &HashSet<RouterId>,
    excluded_edges: &HashSet<(RouterId, RouterId)>,
) -> HashMap<RouterId, PathResult> {
    let mut finalized: HashMap<RouterId, PathResult> = HashMap::new();
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), vec![source])));

    while let Some(Reverse((cost, path))) = heap.pop() {
        let node = *path.last().expect("path is never empty");
        if finalized.contains_key(&node) {
            continue;
        }
        finalized.insert(node, (path.clone(), cost.0));

        for (neighbor, weight) in graph.neighbors(node) {
            if excluded_nodes.contains(&neighbor) || finalized.contains_key(&neighbor) {
                continue;
            }
            if excluded_edges.contains(&(node, neighbor)) || excluded_edges.contains(&(neighbor, node)) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(neighbor);
            heap.push(Reverse((Cost(cost.0 + weight), next_path)));
        }
    }

    finalized
}

/// `shortest_path(s, t)`: Dijkstra over non-negative edge weights with
/// lexicographic tie-break. `None` covers both "unknown vertex" and
/// "no path".
pub fn shortest_path(graph: &TopologyGraph, s: RouterId, t: RouterId) -> Option<PathResult> {
    if !graph.contains(s) || !graph.contains(t) {
        return None;
    }
    if s == t {
        return Some((vec![s], 0.0));
    }
    dijkstra_from(graph, s, &HashSet::new(), &HashSet::new())
        .remove(&t)
}

/// `all_shortest_paths_from(s)`: every router reachable from `s` (other
/// than `s` itself) paired with its shortest path and cost.
pub fn all_shortest_paths_from(graph: &TopologyGraph, s: RouterId) -> HashMap<RouterId, PathResult> {
    if !graph.contains(s) {
        return HashMap::new();
    }
    let mut result = dijkstra_from(graph, s, &HashSet::new(), &HashSet::new());
    result.remove(&s);
    result
}

fn path_cost(graph: &TopologyGraph, path: &[RouterId]) -> f64 {
    path.windows(2)
        .map(|pair| {
            graph
                .neighbors(pair[0])
                .into_iter()
                .find(|(n, _)| *n == pair[1])
                .map(|(_, w)| w)
                .unwrap_or(0.0)
        })
        .sum()
}

/// `k_shortest_paths(s, t, k)`: Yen's algorithm over loopless simple
/// paths, ranked by total cost ascending then by lexicographic path
/// order. Returns fewer than `k` entries if fewer simple paths exist.
pub fn k_shortest_paths(graph: &TopologyGraph, s: RouterId, t: RouterId, k: usize) -> Vec<PathResult> {
    if k == 0 || !graph.contains(s) || !graph.contains(t) {
        return Vec::new();
    }

    let Some(first) = shortest_path(graph, s, t) else {
        return Vec::new();
    };

    let mut accepted: Vec<PathResult> = vec![first];
    let mut candidates: Vec<PathResult> = Vec::new();
    let mut seen: HashSet<Vec<RouterId>> = HashSet::new();
    seen.insert(accepted[0].0.clone());

    while accepted.len() < k {
        let prev_path = accepted.last().unwrap().0.clone();

        for i in 0..prev_path.len().saturating_sub(1) {
            let spur_node = prev_path[i];
            let root_path = &prev_path[..=i];

            let mut excluded_edges = HashSet::new();
            for (path, _) in &accepted {
                if path.len() > i && path[..=i] == *root_path {
                    excluded_edges.insert((path[i], path[i + 1]));
                }
            }

            let excluded_nodes: HashSet<RouterId> = root_path[..i].iter().copied().collect();

            if let Some((spur_path, spur_cost)) = {
                if !graph.contains(spur_node) {
                    None
                } else if spur_node == t {
                    Some((vec![spur_node], 0.0))
                } else {
                    dijkstra_from(graph, spur_node, &excluded_nodes, &excluded_edges).remove(&t)
                }
            } {
                let mut total_path = root_path[..i].to_vec();
                total_path.extend(spur_path.iter().copied());
                let _ = spur_cost;
                if seen.insert(total_path.clone()) {
                    let cost = path_cost(graph, &total_path);
                    candidates.push((total_path, cost));
                }
            }
        }

        if candidates.is_empty() {
            break;
        }

        candidates.sort_by(|(pa, ca), (pb, cb)| {
            Cost(*ca).cmp(&Cost(*cb)).then_with(|| pa.cmp(pb))
        });
        accepted.push(candidates.remove(0));
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TopologyGraph {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3)];
        let links = vec![
            (RouterId(1), RouterId(2), 1.0),
            (RouterId(2), RouterId(3), 1.0),
            (RouterId(1), RouterId(3), 5.0),
        ];
        TopologyGraph::build(&routers, &links)
    }

    #[test]
    fn two_hop_path_beats_costlier_direct_link() {
        let g = triangle();
        let (path, cost) = shortest_path(&g, RouterId(1), RouterId(3)).unwrap();
        assert_eq!(path, vec![RouterId(1), RouterId(2), RouterId(3)]);
        assert_eq!(cost, 2.0);
    }

    #[test]
    fn falls_back_to_direct_link_when_cheaper_path_is_absent() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3)];
        let links = vec![(RouterId(1), RouterId(2), 1.0), (RouterId(1), RouterId(3), 5.0)];
        let g = TopologyGraph::build(&routers, &links);
        let (path, cost) = shortest_path(&g, RouterId(1), RouterId(3)).unwrap();
        assert_eq!(path, vec![RouterId(1), RouterId(3)]);
        assert_eq!(cost, 5.0);
    }

    #[test]
    fn same_source_and_target() {
        let g = triangle();
        assert_eq!(
            shortest_path(&g, RouterId(1), RouterId(1)),
            Some((vec![RouterId(1)], 0.0))
        );
    }

    #[test]
    fn unreachable_returns_none() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3)];
        let links = vec![(RouterId(1), RouterId(2), 1.0)];
        let g = TopologyGraph::build(&routers, &links);
        assert_eq!(shortest_path(&g, RouterId(1), RouterId(3)), None);
    }

    #[test]
    fn unknown_vertex_returns_none() {
        let g = triangle();
        assert_eq!(shortest_path(&g, RouterId(1), RouterId(99)), None);
    }

    #[test]
    fn k_shortest_paths_are_loopless_and_cost_ordered() {
        let routers = vec![RouterId(1), RouterId(2), RouterId(3), RouterId(4)];
        let links = vec![
            (RouterId(1), RouterId(2), 1.0),
            (RouterId(2), RouterId(3), 1.0),
            (RouterId(3), RouterId(4), 1.0),
            (RouterId(4), RouterId(1), 1.0),
            (RouterId(1), RouterId(3), 3.0),
        ];
        let g = TopologyGraph::build(&routers, &links);
        let results = k_shortest_paths(&g, RouterId(1), RouterId(3), 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], (vec![RouterId(1), RouterId(2), RouterId(3)], 2.0));
        assert_eq!(results[1], (vec![RouterId(1), RouterId(4), RouterId(3)], 2.0));
        assert_eq!(results[2], (vec![RouterId(1), RouterId(3)], 3.0));
    }

    #[test]
    fn k_shortest_returns_fewer_when_exhausted() {
        let routers = vec![RouterId(1), RouterId(2)];
        let links = vec![(RouterId(1), RouterId(2), 1.0)];
        let g = TopologyGraph::build(&routers, &links);
        let results = k_shortest_paths(&g, RouterId(1), RouterId(2), 5);
        assert_eq!(results.len(), 1);
    }
}
