//! Error strip of a shortcut: the band of half-width epsilon around its
//! supporting line.
//!
//! A shortcut passes the Iri–Imai test exactly when every vertex it skips
//! lies in its strip (under a uniform tolerance). The two boundary lines are
//! clipped to a box for display.

use serde::{Deserialize, Serialize};

use crate::geometry::{line_boundary_intersections, point_to_line_distance};
use crate::types::{BoundingBox, GeometryError, Point};

/// The two boundary lines of an error strip, clipped to a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStrip {
    /// First point of the supporting line.
    pub source: Point,
    /// Second point of the supporting line.
    pub target: Point,
    /// Half-width of the strip.
    pub epsilon: f64,
    /// Boundary offset to the left of `source → target`.
    pub left: [Point; 2],
    /// Boundary offset to the right of `source → target`.
    pub right: [Point; 2],
}

impl ErrorStrip {
    /// Whether `p` lies within `epsilon` of the supporting line.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        point_to_line_distance(p, self.source, self.target) <= self.epsilon
    }
}

/// Build the strip of half-width `epsilon` around the line through `source`
/// and `target`, with both boundaries clipped to `bbox`.
///
/// # Errors
///
/// Returns [`GeometryError::MalformedClipping`] when `source == target` or
/// when a boundary line misses `bbox`.
pub fn error_strip(
    source: Point,
    target: Point,
    epsilon: f64,
    bbox: &BoundingBox,
) -> Result<ErrorStrip, GeometryError> {
    let length = source.distance(target);
    if length == 0.0 {
        return Err(GeometryError::MalformedClipping { found: 0 });
    }
    let nx = -(target.y - source.y) / length * epsilon;
    let ny = (target.x - source.x) / length * epsilon;
    let offset = |p: Point, sign: f64| Point::new(sign.mul_add(nx, p.x), sign.mul_add(ny, p.y));

    let left = line_boundary_intersections(offset(source, 1.0), offset(target, 1.0), bbox)?;
    let right = line_boundary_intersections(offset(source, -1.0), offset(target, -1.0), bbox)?;

    Ok(ErrorStrip {
        source,
        target,
        epsilon,
        left,
        right,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::orientation;

    const DOMAIN: BoundingBox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn horizontal_strip() {
        let strip =
            error_strip(Point::new(10.0, 50.0), Point::new(90.0, 50.0), 5.0, &DOMAIN).unwrap();
        assert_eq!(strip.left, [Point::new(0.0, 55.0), Point::new(100.0, 55.0)]);
        assert_eq!(strip.right, [Point::new(0.0, 45.0), Point::new(100.0, 45.0)]);
    }

    #[test]
    fn boundaries_are_epsilon_from_the_line() {
        let source = Point::new(19.0, 37.0);
        let target = Point::new(80.0, 40.0);
        let strip = error_strip(source, target, 10.0, &DOMAIN).unwrap();
        for p in strip.left.iter().chain(&strip.right) {
            assert!((point_to_line_distance(*p, source, target) - 10.0).abs() < 1e-9);
        }
        assert!(orientation(source, target, strip.left[0]) > 0.0);
        assert!(orientation(source, target, strip.right[0]) < 0.0);
    }

    #[test]
    fn reference_shortcut_strip_holds_skipped_vertices() {
        let strip =
            error_strip(Point::new(19.0, 37.0), Point::new(80.0, 40.0), 10.0, &DOMAIN).unwrap();
        for (x, y) in [(25.0, 41.0), (40.0, 45.0), (50.0, 41.0), (60.0, 45.0)] {
            assert!(strip.contains(Point::new(x, y)));
        }
        assert!(!strip.contains(Point::new(70.0, 80.0)));
    }

    #[test]
    fn coincident_endpoints_fail() {
        let p = Point::new(5.0, 5.0);
        assert!(matches!(
            error_strip(p, p, 1.0, &DOMAIN),
            Err(GeometryError::MalformedClipping { .. })
        ));
    }

    #[test]
    fn strip_wider_than_box_fails() {
        let result = error_strip(Point::new(10.0, 50.0), Point::new(90.0, 50.0), 60.0, &DOMAIN);
        assert!(result.is_err());
    }
}
