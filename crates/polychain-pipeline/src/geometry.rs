//! Geometry kernel: the primitive predicates and constructions the
//! admissibility tests are built from.
//!
//! Everything here is a pure function of its arguments. Predicates that
//! compare floating-point values state their tolerance explicitly; the
//! collinearity test in particular uses a deliberately loose absolute
//! tolerance ([`COLLINEAR_TOLERANCE`]) sized for chains drawn in a domain of
//! roughly `[0, 100]²`.

use geo::Contains;

use crate::types::{BoundingBox, GeometryError, Point};

/// Absolute tolerance of [`collinear`] on the cross product of the two
/// direction vectors, in squared coordinate units.
pub const COLLINEAR_TOLERANCE: f64 = 1.0;

/// Slack used when deciding whether a clipped coordinate lies on a box edge,
/// and when merging clip points that hit a corner twice.
const CLIP_TOLERANCE: f64 = 1e-9;

/// Convert a chain `Point` to a `geo::Point`.
const fn to_geo(p: Point) -> geo::Point<f64> {
    geo::Point(geo::Coord { x: p.x, y: p.y })
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(p1: Point, p2: Point) -> f64 {
    p1.distance(p2)
}

/// Whether the line through `p1` and `p2` is vertical (zero run).
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_vertical(p1: Point, p2: Point) -> bool {
    p1.x == p2.x
}

/// Whether the line through `p1` and `p2` is horizontal (zero rise).
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_horizontal(p1: Point, p2: Point) -> bool {
    p1.y == p2.y
}

/// Slope of the line through `p1` and `p2`.
///
/// Infinite (or NaN for coincident points) when the line is vertical;
/// callers check [`is_vertical`] first.
#[must_use]
pub fn slope(p1: Point, p2: Point) -> f64 {
    (p2.y - p1.y) / (p2.x - p1.x)
}

/// Signed area of the parallelogram spanned by `a→b` and `a→p`.
///
/// Positive when `p` lies to the left of the directed line `a→b`, negative
/// to the right, zero on the line.
#[must_use]
pub fn orientation(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x).mul_add(p.y - a.y, -((b.y - a.y) * (p.x - a.x)))
}

/// Perpendicular distance from `point` to the infinite line through
/// `line_p1` and `line_p2`.
///
/// Uses `|a·x + b·y + c| / sqrt(a² + b²)` with `a = y1 - y2`,
/// `b = x2 - x1`, `c = x1·y2 - x2·y1`. Returns NaN when the two line points
/// coincide.
#[must_use]
pub fn point_to_line_distance(point: Point, line_p1: Point, line_p2: Point) -> f64 {
    let a = line_p1.y - line_p2.y;
    let b = line_p2.x - line_p1.x;
    let c = line_p1.x.mul_add(line_p2.y, -(line_p2.x * line_p1.y));
    let numerator = a.mul_add(point.x, b.mul_add(point.y, c)).abs();
    let denominator = a.hypot(b);
    if denominator == 0.0 {
        return f64::NAN;
    }
    numerator / denominator
}

/// Distance from `point` to the closed segment `seg_a`–`seg_b`.
#[must_use]
pub fn point_to_segment_distance(point: Point, seg_a: Point, seg_b: Point) -> f64 {
    let dx = seg_b.x - seg_a.x;
    let dy = seg_b.y - seg_a.y;
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq == 0.0 {
        return point.distance(seg_a);
    }
    let t = (point.x - seg_a.x).mul_add(dx, (point.y - seg_a.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);
    point.distance(Point::new(t.mul_add(dx, seg_a.x), t.mul_add(dy, seg_a.y)))
}

/// Points where the infinite line through `p1` and `p2` crosses the
/// boundary of `bbox`.
///
/// Vertical and horizontal lines are handled without forming a slope.
///
/// # Errors
///
/// Returns [`GeometryError::MalformedClipping`] unless exactly two distinct
/// boundary points are found: when `p1 == p2`, when the line misses the
/// box, or when it only grazes a corner.
pub fn line_boundary_intersections(
    p1: Point,
    p2: Point,
    bbox: &BoundingBox,
) -> Result<[Point; 2], GeometryError> {
    let mut hits: Vec<Point> = Vec::with_capacity(4);

    if is_vertical(p1, p2) && is_horizontal(p1, p2) {
        return Err(GeometryError::MalformedClipping { found: 0 });
    } else if is_vertical(p1, p2) {
        if within(p1.x, bbox.min_x, bbox.max_x) {
            hits.push(Point::new(p1.x, bbox.min_y));
            hits.push(Point::new(p1.x, bbox.max_y));
        }
    } else if is_horizontal(p1, p2) {
        if within(p1.y, bbox.min_y, bbox.max_y) {
            hits.push(Point::new(bbox.min_x, p1.y));
            hits.push(Point::new(bbox.max_x, p1.y));
        }
    } else {
        let m = slope(p1, p2);
        let intercept = m.mul_add(-p1.x, p1.y);

        for x in [bbox.min_x, bbox.max_x] {
            let y = m.mul_add(x, intercept);
            if within(y, bbox.min_y, bbox.max_y) {
                push_distinct(&mut hits, Point::new(x, y));
            }
        }
        for y in [bbox.min_y, bbox.max_y] {
            let x = (y - intercept) / m;
            if within(x, bbox.min_x, bbox.max_x) {
                push_distinct(&mut hits, Point::new(x, y));
            }
        }
    }

    match hits.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(GeometryError::MalformedClipping { found: hits.len() }),
    }
}

fn within(v: f64, lo: f64, hi: f64) -> bool {
    v >= lo - CLIP_TOLERANCE && v <= hi + CLIP_TOLERANCE
}

fn push_distinct(hits: &mut Vec<Point>, p: Point) {
    if hits.iter().all(|h| h.distance(p) > CLIP_TOLERANCE) {
        hits.push(p);
    }
}

/// Whether `a`, `b` and `c` lie on a common line, within
/// [`COLLINEAR_TOLERANCE`].
#[must_use]
pub fn collinear(a: Point, b: Point, c: Point) -> bool {
    let lhs = (b.y - a.y) * (c.x - b.x);
    let rhs = (c.y - b.y) * (b.x - a.x);
    (lhs - rhs).abs() < COLLINEAR_TOLERANCE
}

/// Whether `p` lies within the axis-aligned range spanned by `a` and `b`
/// (inclusive), ignoring collinearity.
#[must_use]
pub fn point_is_between(p: Point, a: Point, b: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether `p` lies on the segment `a`–`b`: collinear and between.
#[must_use]
pub fn point_is_on(p: Point, a: Point, b: Point) -> bool {
    collinear(a, p, b) && point_is_between(p, a, b)
}

/// Intersection points of the circles `(c1, r1)` and `(c2, r2)`.
///
/// Returns `None` for concentric circles or circles that neither cross nor
/// touch. Touching circles yield the touching point twice. The first point
/// lies to the left of the directed line `c1→c2`.
#[must_use]
pub fn circle_circle_intersections(c1: Point, r1: f64, c2: Point, r2: f64) -> Option<[Point; 2]> {
    let d = c1.distance(c2);
    let slack = 1e-9 * d.max(1.0);
    if d == 0.0 || d > r1 + r2 + slack || d < (r1 - r2).abs() - slack {
        return None;
    }

    let a = (r2.mul_add(-r2, r1 * r1) + d * d) / (2.0 * d);
    let h = a.mul_add(-a, r1 * r1).max(0.0).sqrt();
    let ux = (c2.x - c1.x) / d;
    let uy = (c2.y - c1.y) / d;
    let mid = Point::new(a.mul_add(ux, c1.x), a.mul_add(uy, c1.y));

    Some([
        Point::new(h.mul_add(-uy, mid.x), h.mul_add(ux, mid.y)),
        Point::new(h.mul_add(uy, mid.x), h.mul_add(-ux, mid.y)),
    ])
}

/// Points where the two tangent lines from `p1` touch the disc of radius
/// `radius2` centered at `p2`.
///
/// The tangent points are the intersections of that disc's boundary with
/// the circle centered at `p1` whose radius is the tangent length
/// `sqrt(d² − radius2²)`. The first point lies to the left of `p1→p2`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] when
/// `radius2 >= distance(p1, p2)` (the disc reaches the source, so no tangent
/// cone exists) or when `radius2` is NaN.
pub fn circle_circle_tangent_points(
    p1: Point,
    p2: Point,
    radius2: f64,
) -> Result<[Point; 2], GeometryError> {
    let d = p1.distance(p2);
    let degenerate = GeometryError::DegenerateGeometry {
        radius: radius2,
        distance: d,
    };
    if radius2.is_nan() || radius2 >= d {
        return Err(degenerate);
    }

    let tangent_length = radius2.mul_add(-radius2, d * d).sqrt();
    circle_circle_intersections(p1, tangent_length, p2, radius2).ok_or(degenerate)
}

/// Whether `point` lies strictly inside the closed polygon whose vertices
/// are `polygon` (in either winding order; the ring is closed implicitly).
///
/// Points on the boundary are outside. Polygons with fewer than three
/// vertices contain nothing.
#[must_use]
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let ring: geo::LineString<f64> = polygon.iter().map(|p| (p.x, p.y)).collect();
    geo::Polygon::new(ring, Vec::new()).contains(&to_geo(point))
}

/// Whether `point` lies within `tolerance` of the polygon's boundary.
#[must_use]
pub fn point_on_polygon_boundary(point: Point, polygon: &[Point], tolerance: f64) -> bool {
    let n = polygon.len();
    (0..n).any(|i| point_to_segment_distance(point, polygon[i], polygon[(i + 1) % n]) <= tolerance)
}
