//! Double-cone construction for the cone admissibility test.
//!
//! A double cone is bounded by the two tangent lines from a source vertex to
//! the error disc around a target vertex. The half containing the target is
//! the forward wedge; its point reflection through the source is the
//! backward wedge. Both wedges are materialized as fan polygons clipped to a
//! virtual extent that is much larger than the chain, so containment tests on
//! chain vertices never see the clipping.
//!
//! When the disc reaches the source no tangent lines exist and the cone is
//! the whole plane.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{
    circle_circle_tangent_points, line_boundary_intersections, point_in_polygon, point_is_on,
    point_on_polygon_boundary,
};
use crate::types::{BoundingBox, GeometryError, Node, Point};

/// Largest angle between neighboring rays of a wedge fan, in degrees.
pub const MAX_FAN_STEP_DEGREES: f64 = 15.0;

/// Relative tolerance of the validator self-check, scaled by the virtual
/// extent.
const SELF_CHECK_TOLERANCE: f64 = 1e-9;

/// Region covered by a double cone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConeShape {
    /// The whole plane: the target's disc reaches the source.
    Plane,
    /// Two opposing wedges sharing the source as apex.
    Wedges {
        /// Fan polygon containing the target.
        forward: Vec<Point>,
        /// Fan polygon containing the target reflected through the source.
        backward: Vec<Point>,
    },
}

/// A double cone from a source vertex through the error disc of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    /// Apex of both wedges.
    pub source: Point,
    /// The target vertex; the forward wedge must contain it.
    pub validator: Point,
    /// Where the tangent lines touch the target's disc, unless degenerate.
    pub tangent_points: Option<[Point; 2]>,
    /// Covered region.
    pub shape: ConeShape,
}

impl Cone {
    /// A full-plane cone.
    #[must_use]
    pub const fn plane(source: Point, validator: Point) -> Self {
        Self {
            source,
            validator,
            tangent_points: None,
            shape: ConeShape::Plane,
        }
    }

    /// Whether this cone covers the whole plane.
    #[must_use]
    pub const fn is_plane(&self) -> bool {
        matches!(self.shape, ConeShape::Plane)
    }

    /// Forward wedge polygon, or `None` for a plane cone.
    #[must_use]
    pub fn forward(&self) -> Option<&[Point]> {
        match &self.shape {
            ConeShape::Plane => None,
            ConeShape::Wedges { forward, .. } => Some(forward),
        }
    }

    /// Backward wedge polygon, or `None` for a plane cone.
    #[must_use]
    pub fn backward(&self) -> Option<&[Point]> {
        match &self.shape {
            ConeShape::Plane => None,
            ConeShape::Wedges { backward, .. } => Some(backward),
        }
    }

    /// The point the backward wedge must contain.
    #[must_use]
    pub fn backward_validator(&self) -> Point {
        self.validator.reflect_through(self.source)
    }

    /// Whether `p` lies strictly inside either wedge.
    ///
    /// A plane cone contains every point.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        match &self.shape {
            ConeShape::Plane => true,
            ConeShape::Wedges { forward, backward } => {
                point_in_polygon(p, forward) || point_in_polygon(p, backward)
            }
        }
    }
}

/// Build the double cone from `source` through the error disc of `target`.
///
/// The disc radius is `target.epsilon`. Wedges are clipped to
/// `virtual_box`, which must contain both vertices.
///
/// # Errors
///
/// A disc that reaches the source is not an error: it yields a plane cone.
/// Returns [`GeometryError::MalformedClipping`] if a tangent line cannot be
/// clipped to `virtual_box`, and [`GeometryError::InvariantViolation`] if
/// the extreme points cannot be split into a forward and a backward end or a
/// wedge fails to contain its validator.
pub fn build_double_cone(
    source: &Node,
    target: &Node,
    virtual_box: &BoundingBox,
) -> Result<Cone, GeometryError> {
    let apex = source.point;
    let validator = target.point;

    let tangent_points = match circle_circle_tangent_points(apex, validator, target.epsilon) {
        Ok(points) => points,
        Err(GeometryError::DegenerateGeometry { radius, distance }) => {
            trace!(radius, distance, "disc reaches source, using plane cone");
            return Ok(Cone::plane(apex, validator));
        }
        Err(e) => return Err(e),
    };

    let (forward_1, backward_1) = split_extremes(apex, tangent_points[0], virtual_box)?;
    let (forward_2, backward_2) = split_extremes(apex, tangent_points[1], virtual_box)?;

    let interior = fan_directions(
        Point::new(forward_1.x - apex.x, forward_1.y - apex.y),
        Point::new(forward_2.x - apex.x, forward_2.y - apex.y),
    );

    let mut forward = Vec::with_capacity(interior.len() + 3);
    let mut backward = Vec::with_capacity(interior.len() + 3);
    forward.extend([apex, forward_1]);
    backward.extend([apex, backward_1]);
    for dir in &interior {
        forward.push(ray_exit(apex, *dir, virtual_box)?);
        backward.push(ray_exit(apex, Point::new(-dir.x, -dir.y), virtual_box)?);
    }
    forward.push(forward_2);
    backward.push(backward_2);

    let cone = Cone {
        source: apex,
        validator,
        tangent_points: Some(tangent_points),
        shape: ConeShape::Wedges { forward, backward },
    };
    self_check(&cone, virtual_box)?;
    Ok(cone)
}

/// Clip the line from `apex` through `tangent` and split its two extreme
/// points into the end beyond the tangent point and the opposite end.
fn split_extremes(
    apex: Point,
    tangent: Point,
    virtual_box: &BoundingBox,
) -> Result<(Point, Point), GeometryError> {
    let [a, b] = line_boundary_intersections(apex, tangent, virtual_box)?;
    match (point_is_on(tangent, apex, a), point_is_on(tangent, apex, b)) {
        (true, false) => Ok((a, b)),
        (false, true) => Ok((b, a)),
        (on_a, on_b) => Err(GeometryError::InvariantViolation(format!(
            "tangent point ({}, {}) must lie on exactly one half of its tangent line \
             (on first: {on_a}, on second: {on_b})",
            tangent.x, tangent.y
        ))),
    }
}

/// Directions strictly between `from` and `to`, rotating the short way,
/// spaced at most [`MAX_FAN_STEP_DEGREES`] apart.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fan_directions(from: Point, to: Point) -> Vec<Point> {
    let cross = from.x.mul_add(to.y, -(from.y * to.x));
    let dot = from.x.mul_add(to.x, from.y * to.y);
    let angle = cross.atan2(dot);
    let steps = (angle.abs() / MAX_FAN_STEP_DEGREES.to_radians()).ceil() as usize;

    (1..steps)
        .map(|k| {
            let (sin, cos) = (angle * k as f64 / steps as f64).sin_cos();
            Point::new(
                from.x.mul_add(cos, -(from.y * sin)),
                from.x.mul_add(sin, from.y * cos),
            )
        })
        .collect()
}

/// Where the ray from `apex` along `dir` leaves `virtual_box`.
fn ray_exit(apex: Point, dir: Point, virtual_box: &BoundingBox) -> Result<Point, GeometryError> {
    let [a, b] =
        line_boundary_intersections(apex, Point::new(apex.x + dir.x, apex.y + dir.y), virtual_box)?;
    let along = |p: Point| (p.x - apex.x).mul_add(dir.x, (p.y - apex.y) * dir.y);
    Ok(if along(a) >= along(b) { a } else { b })
}

/// Each wedge must contain (or, for a zero-width wedge, touch) its validator.
fn self_check(cone: &Cone, virtual_box: &BoundingBox) -> Result<(), GeometryError> {
    let tolerance = SELF_CHECK_TOLERANCE * virtual_box.width().max(virtual_box.height());
    let closed_contains = |polygon: &[Point], p: Point| {
        point_in_polygon(p, polygon) || point_on_polygon_boundary(p, polygon, tolerance)
    };

    if let Some(forward) = cone.forward()
        && !closed_contains(forward, cone.validator)
    {
        return Err(GeometryError::InvariantViolation(format!(
            "forward wedge from ({}, {}) does not contain its target ({}, {})",
            cone.source.x, cone.source.y, cone.validator.x, cone.validator.y
        )));
    }
    if let Some(backward) = cone.backward() {
        let reflected = cone.backward_validator();
        if !closed_contains(backward, reflected) {
            return Err(GeometryError::InvariantViolation(format!(
                "backward wedge from ({}, {}) does not contain the reflected target ({}, {})",
                cone.source.x, cone.source.y, reflected.x, reflected.y
            )));
        }
    }
    Ok(())
}
