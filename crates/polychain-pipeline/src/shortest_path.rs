//! Minimum-edge simplification by breadth-first search over usable edges.
//!
//! Every edge has unit weight, so BFS from the first vertex reaches the last
//! one along a path with the fewest edges. The path's edges get their
//! `shortest_path` flag set for consumers that highlight the result.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dag::CandidateDag;
use crate::types::SimplifyError;

/// Outcome of a shortest-path search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortestPath {
    /// Ordered vertex indices from the first to the last vertex.
    Found(Vec<usize>),
    /// The chain has fewer than two vertices; the path is the chain itself.
    Trivial(Vec<usize>),
    /// No usable path connects the first and last vertex.
    Unreachable,
}

impl ShortestPath {
    /// Vertex indices of the path; empty when unreachable.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        match self {
            Self::Found(path) | Self::Trivial(path) => path,
            Self::Unreachable => &[],
        }
    }

    /// Consume the outcome and return its vertex indices.
    #[must_use]
    pub fn into_indices(self) -> Vec<usize> {
        match self {
            Self::Found(path) | Self::Trivial(path) => path,
            Self::Unreachable => Vec::new(),
        }
    }

    /// Whether the last vertex was reached (trivially or not).
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        !matches!(self, Self::Unreachable)
    }

    /// Number of edges on the path.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.indices().len().saturating_sub(1)
    }
}

/// Clear the `shortest_path` flag on every edge.
pub fn reset_shortest_path(dag: &mut CandidateDag) {
    for edge in dag.edges_mut() {
        edge.shortest_path = false;
    }
}

/// Out-neighbors of each of the `n` vertices over traversable edges:
/// chain edges and shortcuts marked `show`.
#[must_use]
pub fn gather_neighbors(n: usize, dag: &CandidateDag) -> Vec<Vec<usize>> {
    (0..n).map(|i| dag.out_neighbors(i)).collect()
}

/// BFS from vertex `0` to vertex `n - 1`, marking the path's edges.
///
/// Only the first `n` vertices take part; edges into later vertices are
/// ignored.
///
/// Flags from a previous run are cleared first, so this may be called again
/// after admissibility changes.
///
/// # Errors
///
/// Returns [`SimplifyError::EdgeNotFound`] if a path edge vanished from the
/// DAG between neighbor gathering and flag marking, which cannot happen for
/// a DAG built by this crate.
pub fn compute_shortest_path(
    n: usize,
    dag: &mut CandidateDag,
) -> Result<ShortestPath, SimplifyError> {
    reset_shortest_path(dag);
    if n < 2 {
        return Ok(ShortestPath::Trivial((0..n).collect()));
    }

    let neighbors = gather_neighbors(n, dag);
    let target = n - 1;
    let mut discovered = vec![false; n];
    let mut predecessor: Vec<Option<usize>> = vec![None; n];

    // FIFO as a growing Vec plus read cursor.
    let mut queue = Vec::with_capacity(n);
    queue.push(0);
    discovered[0] = true;
    let mut cursor = 0;

    while let Some(&current) = queue.get(cursor) {
        cursor += 1;
        if current == target {
            break;
        }
        // Edges reaching past the first `n` vertices are out of scope.
        for &next in neighbors[current].iter().filter(|&&next| next < n) {
            if !discovered[next] {
                discovered[next] = true;
                predecessor[next] = Some(current);
                queue.push(next);
            }
        }
    }

    if !discovered[target] {
        warn!(nodes = n, visited = queue.len(), "last vertex unreachable");
        return Ok(ShortestPath::Unreachable);
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(prev) = predecessor[current] {
        path.push(prev);
        current = prev;
    }
    path.reverse();

    for pair in path.windows(2) {
        dag.update_edge(pair[0], pair[1], |e| e.shortest_path = true)?;
    }

    debug!(
        path_edges = path.len() - 1,
        chain_edges = n - 1,
        "shortest path found"
    );
    Ok(ShortestPath::Found(path))
}
