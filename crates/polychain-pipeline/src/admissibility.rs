//! Admissibility strategies: decide which shortcut edges approximate the
//! vertices they skip within tolerance.
//!
//! This module defines the [`Admissibility`] trait for admissibility tests
//! and the [`AdmissibilityKind`] enum for selecting which test to use at
//! runtime.
//!
//! # Strategy pattern
//!
//! Both tests consume the full candidate DAG and re-derive the `show` flag
//! of every shortcut edge from scratch, so re-running either one under the
//! same tolerance yields the same flags. Neither adds nor removes edges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cone::{Cone, ConeShape, build_double_cone};
use crate::dag::CandidateDag;
use crate::geometry::{point_in_polygon, point_to_line_distance};
use crate::types::{BoundingBox, GeometryError, Node, Point, SimplifyError};

/// Selects which admissibility test to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissibilityKind {
    /// Iri–Imai: every skipped vertex must lie within its tolerance of the
    /// shortcut's supporting line.
    #[default]
    IriImai,

    /// Toussaint-style double cones: the target must lie inside the running
    /// intersection of the cones to every nearer vertex.
    Cone,
}

impl AdmissibilityKind {
    /// Short identifier used in reports and on the command line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IriImai => "iri-imai",
            Self::Cone => "cone",
        }
    }
}

/// What an admissibility pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdmissibilityReport {
    /// Shortcut edges marked `show`.
    pub admitted: usize,
    /// Shortcut edges left hidden.
    pub rejected: usize,
    /// Cones that degenerated to the whole plane.
    pub degenerate_cones: usize,
    /// Cones built for admitted `(source, target)` pairs, chain edges
    /// included. Empty for the Iri–Imai test.
    pub cones: BTreeMap<(usize, usize), Cone>,
}

/// Trait for admissibility tests.
///
/// Input: the chain's nodes (read for coordinates and tolerances; the cone
/// test also switches on `disc` flags), the candidate DAG, the tolerance to
/// stamp on every edge, and the extent cones are clipped to.
pub trait Admissibility {
    /// Re-derive `show` for every shortcut edge.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::Geometry`] when cone construction hits a
    /// kernel invariant violation, and [`SimplifyError::EdgeNotFound`] if
    /// the DAG lacks a candidate edge between two chain vertices.
    fn mark_admissible(
        &self,
        nodes: &mut [Node],
        dag: &mut CandidateDag,
        epsilon: f64,
        virtual_box: &BoundingBox,
    ) -> Result<AdmissibilityReport, SimplifyError>;
}

impl Admissibility for AdmissibilityKind {
    fn mark_admissible(
        &self,
        nodes: &mut [Node],
        dag: &mut CandidateDag,
        epsilon: f64,
        virtual_box: &BoundingBox,
    ) -> Result<AdmissibilityReport, SimplifyError> {
        let report = match *self {
            Self::IriImai => mark_iri_imai(nodes, dag, epsilon)?,
            Self::Cone => mark_cone_method(nodes, dag, epsilon, virtual_box)?,
        };
        debug!(
            strategy = self.label(),
            epsilon,
            admitted = report.admitted,
            rejected = report.rejected,
            degenerate_cones = report.degenerate_cones,
            "admissibility pass complete"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Iri–Imai
// ---------------------------------------------------------------------------

/// Admit a shortcut iff each skipped vertex is within its own tolerance of
/// the line through the shortcut's endpoints.
///
/// Coincident endpoints leave the line undefined; such shortcuts are
/// rejected.
fn mark_iri_imai(
    nodes: &[Node],
    dag: &mut CandidateDag,
    epsilon: f64,
) -> Result<AdmissibilityReport, SimplifyError> {
    dag.hide_approx();
    let mut report = AdmissibilityReport::default();

    for edge in dag.edges_mut() {
        edge.epsilon = epsilon;
        if !edge.approx {
            continue;
        }
        let span = nodes
            .get(edge.source..=edge.target)
            .ok_or(SimplifyError::NodeOutOfRange {
                index: edge.target,
                len: nodes.len(),
            })?;
        let [first, skipped @ .., last] = span else {
            continue;
        };

        edge.show = skipped.iter().all(|k| {
            // NaN (coincident endpoints) compares false.
            point_to_line_distance(k.point, first.point, last.point) <= k.epsilon
        });

        if edge.show {
            report.admitted += 1;
        } else {
            trace!(source = edge.source, target = edge.target, "shortcut rejected");
            report.rejected += 1;
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Cone intersection
// ---------------------------------------------------------------------------

/// Running intersection of the forward and backward wedges built from one
/// source. Plane cones are never pushed, so an empty list is the whole
/// plane.
#[derive(Default)]
struct WedgeIntersection {
    forward: Vec<Vec<Point>>,
    backward: Vec<Vec<Point>>,
}

impl WedgeIntersection {
    /// Inside every forward wedge or inside every backward wedge.
    fn contains(&self, p: Point) -> bool {
        self.forward.iter().all(|w| point_in_polygon(p, w))
            || self.backward.iter().all(|w| point_in_polygon(p, w))
    }

    fn push(&mut self, shape: &ConeShape) {
        if let ConeShape::Wedges { forward, backward } = shape {
            self.forward.push(forward.clone());
            self.backward.push(backward.clone());
        }
    }
}

/// For each source, walk targets outward and admit each one that lies in
/// the running wedge intersection. The first target outside it ends the
/// walk: the intersection only shrinks, so no farther shortcut from this
/// source can pass.
fn mark_cone_method(
    nodes: &mut [Node],
    dag: &mut CandidateDag,
    epsilon: f64,
    virtual_box: &BoundingBox,
) -> Result<AdmissibilityReport, SimplifyError> {
    dag.hide_approx();
    for edge in dag.edges_mut() {
        edge.epsilon = epsilon;
    }

    let mut report = AdmissibilityReport::default();
    let n = nodes.len();

    for i in 0..n {
        let mut region = WedgeIntersection::default();
        for j in (i + 1)..n {
            let target = nodes[j];
            if !region.contains(target.point) {
                trace!(source = i, target = j, "target outside cone intersection, halting");
                break;
            }

            let cone = build_double_cone(&nodes[i], &target, virtual_box)
                .map_err(|e| annotate(e, i, j))?;
            if j > i + 1 {
                dag.update_edge(i, j, |e| e.show = true)?;
                report.admitted += 1;
            }
            if cone.is_plane() {
                report.degenerate_cones += 1;
            } else {
                nodes[j].disc = true;
            }
            region.push(&cone.shape);
            report.cones.insert((i, j), cone);
        }
    }

    report.rejected = dag.approx_count() - report.admitted;
    Ok(report)
}

fn annotate(err: GeometryError, source: usize, target: usize) -> SimplifyError {
    match err {
        GeometryError::InvariantViolation(msg) => SimplifyError::Geometry(
            GeometryError::InvariantViolation(format!("cone ({source}, {target}): {msg}")),
        ),
        other => other.into(),
    }
}
