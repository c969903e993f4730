//! Degree-preserving null model.
//!
//! Randomized graphs are produced with the Markov-chain double-edge swap used by
//! gtrieScanner: every swap removes two edges and adds two edges over the same
//! four endpoints, so each node keeps its degree and the graph stays simple.

use anyhow::{anyhow, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::graph::{GraphInstance, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizationConfig {
    /// Full passes over the edge set.
    pub swap_rounds: usize,
    /// Attempts to find a valid swap partner per visited edge.
    pub max_tries_per_edge: usize,
    /// Base seed; member `i` of an ensemble uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        Self {
            swap_rounds: 3,
            max_tries_per_edge: 10,
            seed: None,
        }
    }
}

/// Counters describing one randomization run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwapStats {
    pub visited: usize,
    pub swapped: usize,
}

/// Swap edges of `graph` in place.
///
/// Each pass visits every node in node order and, for each neighbor in a snapshot
/// of its adjacency, tries up to `max_tries_per_edge` random partners. An edge
/// for which no valid partner was found is left in place.
pub fn swap_edges_markov_chain<R: Rng + ?Sized>(
    graph: &mut GraphInstance,
    swap_rounds: usize,
    max_tries_per_edge: usize,
    rng: &mut R,
) -> SwapStats {
    let node_ids: Vec<NodeId> = graph.nodes().collect();
    let mut stats = SwapStats::default();
    if node_ids.is_empty() {
        return stats;
    }

    for _ in 0..swap_rounds {
        for &src in &node_ids {
            let src_neighbors: Vec<NodeId> = graph.neighbors(src).collect();
            for dst in src_neighbors {
                // An earlier swap of this pass may already have moved the edge.
                if !graph.contains_edge(src, dst) {
                    continue;
                }
                stats.visited += 1;
                if try_swap(graph, &node_ids, src, dst, max_tries_per_edge, rng) {
                    stats.swapped += 1;
                }
            }
        }
    }
    stats
}

fn try_swap<R: Rng + ?Sized>(
    graph: &mut GraphInstance,
    node_ids: &[NodeId],
    src: NodeId,
    dst: NodeId,
    tries: usize,
    rng: &mut R,
) -> bool {
    for _ in 0..tries {
        let Some(&new_src) = node_ids.choose(rng) else {
            return false;
        };
        let new_src_neighbors: Vec<NodeId> = graph.neighbors(new_src).collect();
        if new_src_neighbors.is_empty() {
            continue;
        }
        if new_src == src || new_src == dst || graph.contains_edge(new_src, dst) {
            continue;
        }

        let Some(&new_dst) = new_src_neighbors.choose(rng) else {
            continue;
        };
        if new_dst == src || new_dst == dst || graph.contains_edge(src, new_dst) {
            continue;
        }

        graph.graph.remove_edge(src, dst);
        graph.graph.remove_edge(new_src, new_dst);
        graph.graph.add_edge(src, new_dst, ());
        graph.graph.add_edge(new_src, dst, ());
        return true;
    }
    false
}

/// Return a randomized copy of `graph`, leaving the input untouched.
pub fn randomize<R: Rng + ?Sized>(
    graph: &GraphInstance,
    swap_rounds: usize,
    max_tries_per_edge: usize,
    rng: &mut R,
) -> GraphInstance {
    let mut randomized = graph.clone();
    swap_edges_markov_chain(&mut randomized, swap_rounds, max_tries_per_edge, rng);
    randomized
}

/// One randomized graph together with its position in the ensemble.
#[derive(Debug, Clone)]
pub struct EnsembleMember {
    pub index: usize,
    pub graph: GraphInstance,
}

impl EnsembleMember {
    /// File name used for the member's edge list.
    pub fn edge_list_name(index: usize) -> String {
        format!("{index}_random.edgelist")
    }
}

pub struct EnsembleGenerator;

impl EnsembleGenerator {
    /// Build `count` randomized copies of `graph` in parallel, all in memory.
    ///
    /// Member `i` is seeded with `base_seed + i`, so a fixed seed reproduces the
    /// same ensemble independent of thread scheduling. This is the entry point
    /// for library callers that want the ensemble without the on-disk layout;
    /// `DetectionWorkflow` builds members one at a time with [`Self::member`] so
    /// published members can be skipped, and both paths yield the same graphs.
    pub fn generate(
        graph: &GraphInstance,
        count: usize,
        config: &RandomizationConfig,
    ) -> Result<Vec<EnsembleMember>> {
        Self::ensure_randomizable(graph, count)?;
        let base_seed = config.seed.unwrap_or_else(random_seed);

        let members: Vec<EnsembleMember> = (0..count)
            .into_par_iter()
            .map(|index| Self::member(graph, index, base_seed, config))
            .collect();
        Ok(members)
    }

    /// An edgeless graph cannot be randomized into distinct members.
    pub fn ensure_randomizable(graph: &GraphInstance, count: usize) -> Result<()> {
        if graph.edge_count() == 0 && count > 0 {
            return Err(anyhow!(
                "Graph {} has no edges, randomization would reproduce it verbatim",
                graph.name
            ));
        }
        Ok(())
    }

    /// Build the single member `index` of the ensemble seeded with `base_seed`.
    pub fn member(
        graph: &GraphInstance,
        index: usize,
        base_seed: u64,
        config: &RandomizationConfig,
    ) -> EnsembleMember {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(base_seed.wrapping_add(index as u64));
        let mut randomized = graph.clone().renamed(EnsembleMember::edge_list_name(index));
        let stats = swap_edges_markov_chain(
            &mut randomized,
            config.swap_rounds,
            config.max_tries_per_edge,
            &mut rng,
        );
        debug!(
            "Ensemble member {} of {}: {} of {} visited edges swapped",
            index, graph.name, stats.swapped, stats.visited
        );
        EnsembleMember {
            index,
            graph: randomized,
        }
    }
}

pub(crate) fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
