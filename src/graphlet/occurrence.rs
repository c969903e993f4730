use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::graphlet::class::GraphletClass;

/// One embedding of a graphlet class in a host graph.
///
/// Node order follows the scanner's output and encodes which node plays which
/// role of the canonical labeling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphletOccurrence {
    pub graphlet_class: GraphletClass,
    pub nodes: Vec<NodeId>,
}

impl GraphletOccurrence {
    pub fn new(graphlet_class: GraphletClass, nodes: Vec<NodeId>) -> Self {
        Self {
            graphlet_class,
            nodes,
        }
    }

    pub fn size(&self) -> usize {
        self.graphlet_class.size()
    }
}

/// Count occurrences per class, listing every known class of `size` even when absent.
pub fn class_frequencies(
    occurrences: &[GraphletOccurrence],
    size: usize,
) -> IndexMap<GraphletClass, u64> {
    let mut frequencies: IndexMap<GraphletClass, u64> = GraphletClass::known_classes(size)
        .into_iter()
        .map(|class| (class, 0))
        .collect();
    for occurrence in occurrences {
        *frequencies
            .entry(occurrence.graphlet_class.clone())
            .or_insert(0) += 1;
    }
    frequencies
}

/// Indices of occurrences grouped by class, in first-seen class order.
pub fn group_by_class(occurrences: &[GraphletOccurrence]) -> IndexMap<GraphletClass, Vec<usize>> {
    let mut groups: IndexMap<GraphletClass, Vec<usize>> = IndexMap::new();
    for (idx, occurrence) in occurrences.iter().enumerate() {
        groups
            .entry(occurrence.graphlet_class.clone())
            .or_default()
            .push(idx);
    }
    groups
}
