//! Candidate edge DAG.
//!
//! Every pair `(i, j)` with `i < j` of chain vertices becomes an edge. The
//! original chain edges `(i, i + 1)` are always usable; every other edge is a
//! shortcut whose `show` flag the admissibility strategies toggle. Edges are
//! never removed once generated, so a new tolerance can be tested without
//! rebuilding the graph.

use petgraph::graphmap::DiGraphMap;

use crate::types::{Edge, SimplifyError};

/// Forward-only edge store keyed by `(source, target)` node index.
#[derive(Debug, Clone, Default)]
pub struct CandidateDag {
    graph: DiGraphMap<usize, Edge>,
}

impl CandidateDag {
    /// An empty DAG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A DAG holding only the chain edges of an `n`-vertex chain.
    #[must_use]
    pub fn with_chain(n: usize, epsilon: f64) -> Self {
        let mut dag = Self::new();
        for i in 0..n {
            dag.graph.add_node(i);
        }
        for i in 1..n {
            dag.insert_chain_edge(i - 1, epsilon);
        }
        dag
    }

    /// Number of nodes that have been registered.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Total number of edges, chain and candidate.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether an edge `(source, target)` exists.
    #[must_use]
    pub fn contains_edge(&self, source: usize, target: usize) -> bool {
        self.graph.contains_edge(source, target)
    }

    /// Add the chain edge `(source, source + 1)` if it is missing.
    pub fn insert_chain_edge(&mut self, source: usize, epsilon: f64) {
        let target = source + 1;
        if !self.graph.contains_edge(source, target) {
            self.graph.add_edge(source, target, Edge::new(source, target, epsilon));
        }
    }

    /// Add every missing pair `(i, j)`, `i < j < n`, as an edge.
    ///
    /// Existing edges keep their flags, so this may be called again after
    /// the chain grows. Returns the number of edges inserted.
    pub fn generate_all_candidate_edges(&mut self, n: usize, epsilon: f64) -> usize {
        let mut inserted = 0;
        for i in 0..n {
            self.graph.add_node(i);
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.graph.contains_edge(i, j) {
                    self.graph.add_edge(i, j, Edge::new(i, j, epsilon));
                    inserted += 1;
                }
            }
        }
        inserted
    }

    /// Look up an edge.
    #[must_use]
    pub fn edge(&self, source: usize, target: usize) -> Option<&Edge> {
        self.graph.edge_weight(source, target)
    }

    /// Apply `f` to an existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if the edge does not exist;
    /// it is never inserted.
    pub fn update_edge(
        &mut self,
        source: usize,
        target: usize,
        f: impl FnOnce(&mut Edge),
    ) -> Result<(), SimplifyError> {
        let edge = self
            .graph
            .edge_weight_mut(source, target)
            .ok_or(SimplifyError::EdgeNotFound {
                from: source,
                to: target,
            })?;
        f(edge);
        Ok(())
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.all_edges().map(|(_, _, e)| e)
    }

    /// All edges, mutably.
    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.graph.all_edges_mut().map(|(_, _, e)| e)
    }

    /// Shortcut edges that currently pass admissibility, sorted by
    /// `(source, target)`.
    #[must_use]
    pub fn admissible_shortcuts(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges().filter(|e| e.approx && e.show).copied().collect();
        edges.sort_by_key(|e| (e.source, e.target));
        edges
    }

    /// Number of shortcut edges, admitted or not.
    #[must_use]
    pub fn approx_count(&self) -> usize {
        self.edges().filter(|e| e.approx).count()
    }

    /// Clear `show` on every shortcut edge.
    pub fn hide_approx(&mut self) {
        self.toggle_show_candidates(false);
    }

    /// Set `show` on every shortcut edge without testing anything.
    pub fn toggle_show_candidates(&mut self, visible: bool) {
        for edge in self.edges_mut().filter(|e| e.approx) {
            edge.show = visible;
        }
    }

    /// Targets reachable from `source` over traversable edges, ascending.
    #[must_use]
    pub fn out_neighbors(&self, source: usize) -> Vec<usize> {
        if !self.graph.contains_node(source) {
            return Vec::new();
        }
        let mut targets: Vec<usize> = self
            .graph
            .edges(source)
            .filter(|(_, _, e)| e.is_traversable())
            .map(|(_, t, _)| t)
            .collect();
        targets.sort_unstable();
        targets
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        self.graph.clear();
    }
}
