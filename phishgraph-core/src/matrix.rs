use crate::dom::DomGraph;
use ndarray::Array2;
use tracing::debug;

/// Width of a node's feature vector.
pub const FEATURE_DIM: usize = 3;

/// Fixed-size encoding of a [`DomGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphMatrices {
    /// `max_nodes × max_nodes`, `1.0` where a retained edge runs row → column.
    pub adjacency: Array2<f32>,
    /// `max_nodes × FEATURE_DIM`, zero rows for padding.
    pub features: Array2<f32>,
    /// Nodes in the source graph.
    pub graph_nodes: usize,
    /// Nodes that made it into the matrices.
    pub retained_nodes: usize,
}

impl GraphMatrices {
    pub fn zeros(max_nodes: usize) -> Self {
        Self {
            adjacency: Array2::zeros((max_nodes, max_nodes)),
            features: Array2::zeros((max_nodes, FEATURE_DIM)),
            graph_nodes: 0,
            retained_nodes: 0,
        }
    }

    pub fn max_nodes(&self) -> usize {
        self.adjacency.nrows()
    }

    pub fn is_truncated(&self) -> bool {
        self.graph_nodes > self.retained_nodes
    }
}

/// Encode `graph` into `max_nodes`-sized adjacency and feature matrices.
///
/// Only the first `max_nodes` nodes in insertion order are kept. Edges with
/// either endpoint beyond the budget are dropped together with their nodes,
/// which keeps adjacency rows and feature rows aligned.
pub fn materialize(graph: &DomGraph, max_nodes: usize) -> GraphMatrices {
    let mut matrices = GraphMatrices::zeros(max_nodes);
    if graph.is_empty() {
        return matrices;
    }

    let retained = graph.node_count().min(max_nodes);
    for (row, node) in graph.nodes().take(retained).enumerate() {
        for (column, value) in node.features.iter().enumerate() {
            matrices.features[[row, column]] = *value;
        }
    }

    for (parent, child) in graph.edges() {
        if parent < retained && child < retained {
            matrices.adjacency[[parent, child]] = 1.0;
        }
    }

    matrices.graph_nodes = graph.node_count();
    matrices.retained_nodes = retained;

    if matrices.is_truncated() {
        debug!(
            "Truncated DOM graph from {} to {} nodes",
            matrices.graph_nodes, retained
        );
    }

    matrices
}
