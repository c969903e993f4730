//! Greedy modularity maximization (Clauset, Newman and Moore).
//!
//! Every node starts in its own community; the pair of adjacent communities
//! with the largest modularity gain is merged until no merge improves
//! modularity. Stale heap entries are skipped by comparing community versions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use indexmap::IndexMap;

use crate::graph::{GraphInstance, NodeId};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    gain: f64,
    a: usize,
    b: usize,
    version_a: u64,
    version_b: u64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Largest gain first; ties go to the pair with the smaller indices.
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.a.cmp(&self.a))
            .then_with(|| other.b.cmp(&self.b))
    }
}

struct Communities {
    /// Fraction of edge ends between community pairs, e_ij, stored symmetrically.
    between: Vec<IndexMap<usize, f64>>,
    /// Fraction of edge ends attached to each community, a_i.
    ends: Vec<f64>,
    members: Vec<Vec<usize>>,
    version: Vec<u64>,
    alive: Vec<bool>,
}

impl Communities {
    fn gain(&self, a: usize, b: usize) -> f64 {
        let e = self.between[a].get(&b).copied().unwrap_or(0.0);
        2.0 * (e - self.ends[a] * self.ends[b])
    }

    fn candidate(&self, a: usize, b: usize) -> Candidate {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        Candidate {
            gain: self.gain(a, b),
            a,
            b,
            version_a: self.version[a],
            version_b: self.version[b],
        }
    }

    fn is_current(&self, candidate: &Candidate) -> bool {
        self.alive[candidate.a]
            && self.alive[candidate.b]
            && self.version[candidate.a] == candidate.version_a
            && self.version[candidate.b] == candidate.version_b
    }

    /// Merge community `from` into `into` and return the new neighbors of `into`.
    fn merge(&mut self, into: usize, from: usize) -> Vec<usize> {
        let moved: Vec<(usize, f64)> = self.between[from].drain(..).collect();
        self.between[into].shift_remove(&from);
        for (other, weight) in moved {
            if other == into {
                continue;
            }
            *self.between[into].entry(other).or_insert(0.0) += weight;
            self.between[other].shift_remove(&from);
            *self.between[other].entry(into).or_insert(0.0) += weight;
        }
        self.ends[into] += self.ends[from];
        self.ends[from] = 0.0;
        let absorbed = std::mem::take(&mut self.members[from]);
        self.members[into].extend(absorbed);
        self.alive[from] = false;
        self.version[into] += 1;
        self.between[into].keys().copied().collect()
    }
}

/// Partition the nodes of `graph` into communities, largest first.
///
/// Nodes inside a community keep graph node order; communities of equal size
/// are ordered by their first node. An edgeless graph yields one singleton per
/// node.
pub fn greedy_modularity_communities(graph: &GraphInstance) -> Vec<Vec<NodeId>> {
    let nodes: Vec<NodeId> = graph.nodes().collect();
    let position: IndexMap<NodeId, usize> =
        nodes.iter().enumerate().map(|(idx, node)| (*node, idx)).collect();
    let edge_ends = 2.0 * graph.edge_count() as f64;

    let mut communities = Communities {
        between: vec![IndexMap::new(); nodes.len()],
        ends: vec![0.0; nodes.len()],
        members: (0..nodes.len()).map(|idx| vec![idx]).collect(),
        version: vec![0; nodes.len()],
        alive: vec![true; nodes.len()],
    };

    if edge_ends > 0.0 {
        for (source, target) in graph.edges() {
            let (a, b) = (position[&source], position[&target]);
            *communities.between[a].entry(b).or_insert(0.0) += 1.0 / edge_ends;
            *communities.between[b].entry(a).or_insert(0.0) += 1.0 / edge_ends;
        }
        for (idx, node) in nodes.iter().enumerate() {
            communities.ends[idx] = graph.degree(*node) as f64 / edge_ends;
        }

        let mut heap = BinaryHeap::new();
        for a in 0..nodes.len() {
            for &b in communities.between[a].keys() {
                if a < b {
                    heap.push(communities.candidate(a, b));
                }
            }
        }

        let mut merges = 0usize;
        while let Some(best) = heap.pop() {
            if !communities.is_current(&best) {
                continue;
            }
            if best.gain <= 0.0 {
                break;
            }
            let neighbors = communities.merge(best.a, best.b);
            merges += 1;
            for other in neighbors {
                heap.push(communities.candidate(best.a, other));
            }
        }
        log::trace!("graph {}: {} community merges", graph.name, merges);
    }

    let mut partition: Vec<Vec<usize>> = communities
        .members
        .into_iter()
        .zip(communities.alive)
        .filter(|(_, alive)| *alive)
        .map(|(mut members, _)| {
            members.sort_unstable();
            members
        })
        .collect();
    partition.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    partition
        .into_iter()
        .map(|members| members.into_iter().map(|idx| nodes[idx]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphLoader;

    #[test]
    fn two_triangles_joined_by_a_bridge() {
        let graph =
            GraphLoader::from_edge_list_str("bridge", "1 2\n2 3\n3 1\n3 4\n4 5\n5 6\n6 4\n")
                .expect("graph");
        let communities = greedy_modularity_communities(&graph);
        assert_eq!(communities, vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn disconnected_components_never_merge() {
        let graph = GraphLoader::from_edge_list_str("pairs", "1 2\n3 4\n5 6\n6 7\n")
            .expect("graph");
        let communities = greedy_modularity_communities(&graph);
        assert_eq!(communities, vec![vec![5, 6, 7], vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn edgeless_graph_keeps_singletons() {
        let mut graph = GraphInstance::new("isolated");
        graph.graph.add_node(3);
        graph.graph.add_node(1);
        assert_eq!(greedy_modularity_communities(&graph), vec![vec![3], vec![1]]);
    }

    #[test]
    fn every_node_is_assigned_once() {
        let graph = GraphLoader::from_edge_list_str(
            "mixed",
            "1 2\n2 3\n3 4\n4 1\n1 3\n5 6\n6 7\n7 5\n4 5\n8 9\n",
        )
        .expect("graph");
        let mut assigned: Vec<NodeId> = greedy_modularity_communities(&graph)
            .into_iter()
            .flatten()
            .collect();
        assigned.sort_unstable();
        assert_eq!(assigned, (1..=9).collect::<Vec<_>>());
    }
}
