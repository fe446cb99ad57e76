//! polychain-pipeline: polygonal chain simplification (sans-IO).
//!
//! Simplifies a chain of points to the fewest vertices whose edges stay
//! within a tolerance of the skipped input points:
//! candidate DAG -> admissibility testing -> shortest path.
//!
//! Two admissibility strategies are available: the exact Iri–Imai strip
//! test and the Toussaint-style cone intersection method.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! point lists and returns structured data. Reading chains from disk and
//! printing reports lives in `polychain-bench`.

pub mod admissibility;
pub mod chain;
pub mod cone;
pub mod dag;
pub mod diagnostics;
pub mod geometry;
pub mod pipeline;
pub mod shortest_path;
pub mod strip;
pub mod types;

pub use admissibility::{Admissibility, AdmissibilityKind, AdmissibilityReport};
pub use chain::ChainState;
pub use diagnostics::{SimplifyDiagnostics, simplify_with_diagnostics};
pub use pipeline::{Pipeline, SimplifyResult};
pub use shortest_path::ShortestPath;
pub use types::{
    BoundingBox, Edge, GeometryError, Node, Point, Polyline, SimplifyConfig, SimplifyError,
};

/// Simplify a chain in one call.
///
/// Equivalent to driving [`Pipeline`] through every stage.
///
/// # Pipeline steps
///
/// 1. Validate the config and build the chain with every candidate edge
/// 2. Mark admissible shortcuts with the configured strategy
/// 3. Breadth-first search for the fewest-edge path from first to last
///    vertex
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidConfig`] if the config fails validation.
/// Returns [`SimplifyError::Geometry`] if cone construction fails with a
/// clipping or invariant error.
pub fn simplify(points: &[Point], config: &SimplifyConfig) -> Result<SimplifyResult, SimplifyError> {
    Ok(Pipeline::new(points.to_vec(), *config)
        .build_dag()?
        .test_admissibility()?
        .extract_path()?
        .into_result())
}
