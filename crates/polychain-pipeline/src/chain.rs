//! A simplification session over one chain.
//!
//! [`ChainState`] owns the nodes, the candidate DAG and the cones of the last
//! cone pass. Independent chains use independent sessions; nothing is shared
//! between them.
//!
//! Mutators that change geometry or tolerances (`set_epsilon`,
//! `set_node_epsilon`, `push_point`) re-run the active admissibility
//! strategy so the `show` flags always describe the current state.
//! Shortest-path flags are only refreshed by
//! [`ChainState::compute_shortest_path`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::admissibility::{Admissibility, AdmissibilityKind, AdmissibilityReport};
use crate::cone::Cone;
use crate::dag::CandidateDag;
use crate::shortest_path::{self, ShortestPath};
use crate::strip::{ErrorStrip, error_strip};
use crate::types::{
    BoundingBox, Edge, Node, Point, Polyline, SimplifyConfig, SimplifyError, validate_epsilon,
};

/// Nodes, candidate edges and derived geometry of one chain.
#[derive(Debug, Clone)]
pub struct ChainState {
    nodes: Vec<Node>,
    dag: CandidateDag,
    epsilon: f64,
    strategy: AdmissibilityKind,
    bounds: BoundingBox,
    cones: BTreeMap<(usize, usize), Cone>,
}

impl ChainState {
    /// An empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: &SimplifyConfig) -> Result<Self, SimplifyError> {
        config.validate()?;
        Ok(Self {
            nodes: Vec::new(),
            dag: CandidateDag::new(),
            epsilon: config.epsilon,
            strategy: config.strategy,
            bounds: config.bounds,
            cones: BTreeMap::new(),
        })
    }

    /// Build a session from a chain: one node per point (each with the
    /// configured tolerance), the chain edges and every candidate shortcut.
    ///
    /// No admissibility test runs yet, so every shortcut starts hidden.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn build_chain(points: &[Point], config: &SimplifyConfig) -> Result<Self, SimplifyError> {
        let mut state = Self::new(config)?;
        state.nodes = points.iter().map(|&p| Node::new(p, config.epsilon)).collect();
        state.dag = CandidateDag::with_chain(points.len(), config.epsilon);
        state
            .dag
            .generate_all_candidate_edges(points.len(), config.epsilon);
        debug!(
            nodes = state.nodes.len(),
            edges = state.dag.edge_count(),
            "chain built"
        );
        Ok(state)
    }

    // --- Accessors ---

    /// Chain vertices with their metadata.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The candidate DAG.
    #[must_use]
    pub const fn dag(&self) -> &CandidateDag {
        &self.dag
    }

    /// Look up an edge.
    #[must_use]
    pub fn edge(&self, source: usize, target: usize) -> Option<&Edge> {
        self.dag.edge(source, target)
    }

    /// The uniform tolerance last set for the whole chain.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The strategy mutators re-run.
    #[must_use]
    pub const fn strategy(&self) -> AdmissibilityKind {
        self.strategy
    }

    /// Nominal coordinate domain.
    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Cones kept by the last cone pass, keyed by `(source, target)`.
    #[must_use]
    pub const fn cones(&self) -> &BTreeMap<(usize, usize), Cone> {
        &self.cones
    }

    /// The cone kept for one edge, if any.
    #[must_use]
    pub fn cone(&self, source: usize, target: usize) -> Option<&Cone> {
        self.cones.get(&(source, target))
    }

    /// The chain as a polyline.
    #[must_use]
    pub fn polyline(&self) -> Polyline {
        Polyline::new(self.nodes.iter().map(|n| n.point).collect())
    }

    /// The extent cones are clipped to.
    ///
    /// Encloses the bounds and the chain, widened on every side by
    /// [`SimplifyConfig::VIRTUAL_EXTENT_FACTOR`] times the larger side.
    #[must_use]
    pub fn virtual_box(&self) -> BoundingBox {
        let points: Vec<Point> = self.nodes.iter().map(|n| n.point).collect();
        let extent = BoundingBox::from_points(&points)
            .map_or(self.bounds, |chain| chain.union(&self.bounds));
        let side = extent.width().max(extent.height());
        extent.expanded(SimplifyConfig::VIRTUAL_EXTENT_FACTOR * side)
    }

    // --- Tolerances and flags ---

    /// Give every vertex the tolerance `value` and re-test all shortcuts.
    ///
    /// The DAG is not regenerated.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] for a negative or
    /// non-finite tolerance, or any error of the admissibility pass.
    pub fn set_epsilon(&mut self, value: f64) -> Result<AdmissibilityReport, SimplifyError> {
        validate_epsilon(value)?;
        self.epsilon = value;
        for node in &mut self.nodes {
            node.epsilon = value;
        }
        self.run(self.strategy)
    }

    /// Override the tolerance of a single vertex and re-test all shortcuts.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::NodeOutOfRange`] for a bad index,
    /// [`SimplifyError::InvalidConfig`] for a bad tolerance, or any error of
    /// the admissibility pass.
    pub fn set_node_epsilon(
        &mut self,
        index: usize,
        value: f64,
    ) -> Result<AdmissibilityReport, SimplifyError> {
        validate_epsilon(value)?;
        self.node_mut(index)?.epsilon = value;
        self.run(self.strategy)
    }

    /// Switch a vertex's error disc on or off.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::NodeOutOfRange`] for a bad index.
    pub fn set_disc(&mut self, index: usize, on: bool) -> Result<(), SimplifyError> {
        self.node_mut(index)?.disc = on;
        Ok(())
    }

    /// Request or clear the error strip overlay of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if the edge does not exist.
    pub fn set_strip(&mut self, source: usize, target: usize, on: bool) -> Result<(), SimplifyError> {
        self.dag.update_edge(source, target, |e| e.strip = on)
    }

    /// Request or clear the cone overlay of an edge.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if the edge does not exist.
    pub fn set_cone(&mut self, source: usize, target: usize, on: bool) -> Result<(), SimplifyError> {
        self.dag.update_edge(source, target, |e| e.cone = on)
    }

    /// Error strip geometry of an edge at the tolerance it was last tested
    /// with, clipped to the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if the edge does not exist,
    /// or [`SimplifyError::Geometry`] if the strip cannot be clipped.
    pub fn strip_for(&self, source: usize, target: usize) -> Result<ErrorStrip, SimplifyError> {
        let edge = self
            .dag
            .edge(source, target)
            .ok_or(SimplifyError::EdgeNotFound {
                from: source,
                to: target,
            })?;
        let strip = error_strip(
            self.nodes[edge.source].point,
            self.nodes[edge.target].point,
            edge.epsilon,
            &self.bounds,
        )?;
        Ok(strip)
    }

    /// Set `show` on every shortcut without testing anything.
    pub fn toggle_show_candidates(&mut self, visible: bool) {
        self.dag.toggle_show_candidates(visible);
    }

    // --- Admissibility ---

    /// Run the Iri–Imai test and make it the active strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::NodeOutOfRange`] if the DAG refers past the
    /// end of the chain.
    pub fn run_iri_imai(&mut self) -> Result<AdmissibilityReport, SimplifyError> {
        self.run(AdmissibilityKind::IriImai)
    }

    /// Run the cone test and make it the active strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::Geometry`] on a kernel invariant violation.
    pub fn run_cone_method(&mut self) -> Result<AdmissibilityReport, SimplifyError> {
        self.run(AdmissibilityKind::Cone)
    }

    /// Run `kind` and make it the active strategy.
    ///
    /// The returned report's cones are moved into the session; read them
    /// through [`ChainState::cones`].
    ///
    /// # Errors
    ///
    /// Propagates the strategy's errors. Cones from an earlier pass are
    /// dropped even on failure.
    pub fn run(&mut self, kind: AdmissibilityKind) -> Result<AdmissibilityReport, SimplifyError> {
        self.strategy = kind;
        self.cones.clear();
        let virtual_box = self.virtual_box();
        let mut report =
            kind.mark_admissible(&mut self.nodes, &mut self.dag, self.epsilon, &virtual_box)?;
        self.cones = std::mem::take(&mut report.cones);
        Ok(report)
    }

    // --- Shortest path ---

    /// BFS over usable edges from the first vertex to the last, marking the
    /// path's edges.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::EdgeNotFound`] if a path edge is missing
    /// from the DAG.
    pub fn compute_shortest_path(&mut self) -> Result<ShortestPath, SimplifyError> {
        shortest_path::compute_shortest_path(self.nodes.len(), &mut self.dag)
    }

    // --- Interactive building ---

    /// Append a vertex with the current uniform tolerance, add its chain
    /// edge and candidate shortcuts, and re-run the active strategy.
    ///
    /// # Errors
    ///
    /// Propagates errors of the admissibility pass.
    pub fn push_point(&mut self, point: Point) -> Result<AdmissibilityReport, SimplifyError> {
        self.nodes.push(Node::new(point, self.epsilon));
        let n = self.nodes.len();
        if n >= 2 {
            self.dag.insert_chain_edge(n - 2, self.epsilon);
        }
        let inserted = self.dag.generate_all_candidate_edges(n, self.epsilon);
        debug!(nodes = n, inserted, "point appended");
        self.run(self.strategy)
    }

    /// Remove every vertex, edge and cone. Tolerance, bounds and strategy
    /// are kept.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.dag.clear();
        self.cones.clear();
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut Node, SimplifyError> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or(SimplifyError::NodeOutOfRange { index, len })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::GeometryError;

    fn reference() -> Vec<Point> {
        [
            (30.0, 70.0),
            (20.0, 55.0),
            (19.0, 37.0),
            (25.0, 41.0),
            (40.0, 45.0),
            (50.0, 41.0),
            (60.0, 45.0),
            (80.0, 40.0),
            (70.0, 80.0),
        ]
        .iter()
        .map(|&(x, y)| Point::new(x, y))
        .collect()
    }

    fn pairs(state: &ChainState) -> Vec<(usize, usize)> {
        state
            .dag()
            .admissible_shortcuts()
            .iter()
            .map(|e| (e.source, e.target))
            .collect()
    }

    #[test]
    fn build_chain_generates_all_candidates_hidden() {
        let state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        assert_eq!(state.len(), 9);
        assert_eq!(state.dag().edge_count(), 36);
        assert!(pairs(&state).is_empty());
        assert!(state.nodes().iter().all(|n| (n.epsilon - 10.0).abs() < f64::EPSILON));
    }

    #[test]
    fn build_chain_rejects_invalid_config() {
        let config = SimplifyConfig {
            epsilon: -3.0,
            ..SimplifyConfig::default()
        };
        assert!(matches!(
            ChainState::build_chain(&reference(), &config),
            Err(SimplifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reference_chain_simplifies_to_three_edges() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_iri_imai().unwrap();
        assert!(state.edge(2, 7).unwrap().show);
        let path = state.compute_shortest_path().unwrap();
        assert_eq!(path, ShortestPath::Found(vec![0, 2, 7, 8]));
        assert!(state.edge(2, 7).unwrap().shortest_path);
    }

    #[test]
    fn set_epsilon_retests_without_regenerating() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_iri_imai().unwrap();
        let edge_count = state.dag().edge_count();

        state.set_epsilon(0.0).unwrap();
        assert!(pairs(&state).is_empty());
        assert_eq!(state.dag().edge_count(), edge_count);
        let path = state.compute_shortest_path().unwrap();
        assert_eq!(path.into_indices(), (0..9).collect::<Vec<_>>());

        state.set_epsilon(10.0).unwrap();
        assert_eq!(pairs(&state).len(), 13);
        assert!(state.dag().edges().all(|e| (e.epsilon - 10.0).abs() < f64::EPSILON));
    }

    #[test]
    fn set_epsilon_rejects_negative() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        assert!(state.set_epsilon(-1.0).is_err());
        assert!((state.epsilon() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn set_node_epsilon_changes_one_vertex() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_iri_imai().unwrap();
        assert!(state.edge(0, 2).unwrap().show);
        // Vertex 1 sits about 4.7 from the (0, 2) shortcut.
        state.set_node_epsilon(1, 4.0).unwrap();
        assert!(!state.edge(0, 2).unwrap().show);
        assert!(state.edge(2, 7).unwrap().show);
    }

    #[test]
    fn edges_keep_uniform_epsilon_under_node_override() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.set_node_epsilon(1, 4.0).unwrap();
        assert!((state.nodes()[1].epsilon - 4.0).abs() < f64::EPSILON);
        let edge = state.edge(0, 2).unwrap();
        assert!((edge.epsilon - 10.0).abs() < f64::EPSILON);
        let strip = state.strip_for(0, 2).unwrap();
        assert!((strip.epsilon - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn node_index_out_of_range() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        assert_eq!(
            state.set_node_epsilon(9, 1.0).unwrap_err(),
            SimplifyError::NodeOutOfRange { index: 9, len: 9 }
        );
        assert!(state.set_disc(12, true).is_err());
        state.set_disc(4, true).unwrap();
        assert!(state.nodes()[4].disc);
    }

    #[test]
    fn cone_method_keeps_cones_until_iri_imai() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_cone_method().unwrap();
        assert_eq!(state.strategy(), AdmissibilityKind::Cone);
        assert!(state.cone(0, 2).is_some());
        assert!(state.edge(0, 2).unwrap().show);

        state.run_iri_imai().unwrap();
        assert!(state.cones().is_empty());
    }

    #[test]
    fn set_epsilon_reruns_active_strategy() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_cone_method().unwrap();
        state.set_epsilon(5.0).unwrap();
        assert_eq!(state.strategy(), AdmissibilityKind::Cone);
        assert!(!state.cones().is_empty());
        assert!(!state.edge(0, 3).unwrap().show);
    }

    #[test]
    fn toggle_show_candidates_feeds_shortest_path() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.toggle_show_candidates(true);
        let path = state.compute_shortest_path().unwrap();
        assert_eq!(path.into_indices(), vec![0, 8]);
    }

    #[test]
    fn push_point_matches_batch_build() {
        let points = reference();
        let config = SimplifyConfig::default();
        let mut incremental = ChainState::build_chain(&points[..2], &config).unwrap();
        for p in &points[2..] {
            incremental.push_point(*p).unwrap();
        }
        let mut batch = ChainState::build_chain(&points, &config).unwrap();
        batch.run_iri_imai().unwrap();

        assert_eq!(incremental.dag().edge_count(), batch.dag().edge_count());
        assert_eq!(pairs(&incremental), pairs(&batch));
        assert_eq!(
            incremental.compute_shortest_path().unwrap(),
            batch.compute_shortest_path().unwrap()
        );
    }

    #[test]
    fn push_point_into_empty_session() {
        let mut state = ChainState::new(&SimplifyConfig::default()).unwrap();
        state.push_point(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(
            state.compute_shortest_path().unwrap(),
            ShortestPath::Trivial(vec![0])
        );
        state.push_point(Point::new(5.0, 1.0)).unwrap();
        assert_eq!(
            state.compute_shortest_path().unwrap(),
            ShortestPath::Found(vec![0, 1])
        );
    }

    #[test]
    fn reset_clears_chain() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_cone_method().unwrap();
        state.reset();
        assert!(state.is_empty());
        assert_eq!(state.dag().edge_count(), 0);
        assert!(state.cones().is_empty());
        assert_eq!(state.strategy(), AdmissibilityKind::Cone);
    }

    #[test]
    fn strip_overlay() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.run_iri_imai().unwrap();
        state.set_strip(2, 7, true).unwrap();
        assert!(state.edge(2, 7).unwrap().strip);
        let strip = state.strip_for(2, 7).unwrap();
        assert!((strip.epsilon - 10.0).abs() < f64::EPSILON);
        for node in &state.nodes()[3..7] {
            assert!(strip.contains(node.point));
        }
        assert_eq!(
            state.set_strip(7, 2, true).unwrap_err(),
            SimplifyError::EdgeNotFound { from: 7, to: 2 }
        );
        assert!(state.strip_for(7, 2).is_err());
    }

    #[test]
    fn cone_overlay_flag() {
        let mut state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        state.set_cone(0, 3, true).unwrap();
        assert!(state.edge(0, 3).unwrap().cone);
    }

    #[test]
    fn duplicate_points_strip_fails() {
        let points = vec![Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
        let state = ChainState::build_chain(&points, &SimplifyConfig::default()).unwrap();
        assert_eq!(
            state.strip_for(0, 1).unwrap_err(),
            SimplifyError::Geometry(GeometryError::MalformedClipping { found: 0 })
        );
    }

    #[test]
    fn virtual_box_encloses_bounds_and_chain() {
        let mut points = reference();
        points.push(Point::new(150.0, -20.0));
        let state = ChainState::build_chain(&points, &SimplifyConfig::default()).unwrap();
        let vbox = state.virtual_box();
        // Extent [0, 150] x [-20, 100], margin 10 * 150.
        assert_eq!(vbox, BoundingBox::new(-1500.0, -1520.0, 1650.0, 1600.0));
        assert!(points.iter().all(|p| vbox.contains(*p)));
    }

    #[test]
    fn polyline_round_trip() {
        let state = ChainState::build_chain(&reference(), &SimplifyConfig::default()).unwrap();
        assert_eq!(state.polyline().into_points(), reference());
    }
}
