use petgraph::graphmap::UnGraphMap;

use crate::error::PmotifError;

/// External node identifier. Valid ids start at 1; the motif scanner reserves 0.
pub type NodeId = u64;

pub type SimpleGraph = UnGraphMap<NodeId, ()>;

/// A named simple undirected graph.
///
/// Construction through [`crate::graph::GraphLoader`] guarantees the simple-graph
/// invariants; graphs built by hand can be checked with [`GraphInstance::validate`].
#[derive(Debug, Clone, Default)]
pub struct GraphInstance {
    pub graph: SimpleGraph,
    pub name: String,
}

impl GraphInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: SimpleGraph::new(),
            name: name.into(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, nodes: usize, edges: usize) -> Self {
        Self {
            graph: SimpleGraph::with_capacity(nodes, edges),
            name: name.into(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    pub fn contains_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.contains_edge(a, b)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors(node)
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.graph.neighbors(node).count()
    }

    /// Every edge exactly once, in storage order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph.all_edges().map(|(a, b, _)| (a, b)).collect()
    }

    pub fn degree_sequence(&self) -> Vec<usize> {
        let mut degrees: Vec<usize> = self.nodes().map(|node| self.degree(node)).collect();
        degrees.sort_unstable();
        degrees
    }

    /// Rename the graph, keeping its structure.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the invariants the motif scanner relies on.
    ///
    /// Parallel edges cannot be represented by the underlying graph map, so only
    /// node id 0 and self-loops need checking here.
    pub fn validate(&self) -> Result<(), PmotifError> {
        if self.contains_node(0) {
            return Err(PmotifError::precondition(
                &self.name,
                "node id 0 is reserved, ids must start at 1",
            ));
        }
        if let Some((node, _, _)) = self.graph.all_edges().find(|(a, b, _)| a == b) {
            return Err(PmotifError::precondition(
                &self.name,
                format!("self-loop on node {node}"),
            ));
        }
        Ok(())
    }
}
