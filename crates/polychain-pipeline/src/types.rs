//! Shared types for the polychain simplification pipeline.

use serde::{Deserialize, Serialize};

use crate::admissibility::AdmissibilityKind;

/// A 2D point in chain coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Point reflection of `self` through `center`.
    #[must_use]
    pub fn reflect_through(self, center: Self) -> Self {
        Self::new(2.0f64.mul_add(center.x, -self.x), 2.0f64.mul_add(center.y, -self.y))
    }
}

/// A sequence of connected points forming a polygonal chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Axis-aligned rectangle `[min_x, max_x] × [min_y, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub min_x: f64,
    /// Bottom edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Top edge.
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its extreme coordinates.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self::new(first.x, first.y, first.x, first.y);
        Some(points.iter().fold(init, |acc, p| Self {
            min_x: acc.min_x.min(p.x),
            min_y: acc.min_y.min(p.y),
            max_x: acc.max_x.max(p.x),
            max_y: acc.max_y.max(p.y),
        }))
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Whether `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    /// Whether all coordinates are finite and the box is not inverted.
    #[must_use]
    pub fn is_proper(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }
}

/// A chain vertex plus its simplification metadata.
///
/// A node's identity is its index in the chain; edges only ever run from a
/// lower index to a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Vertex coordinates.
    pub point: Point,
    /// Error tolerance assigned to this vertex.
    pub epsilon: f64,
    /// Whether the error disc around this vertex is active.
    pub disc: bool,
}

impl Node {
    /// Create a node with the given tolerance and an inactive disc.
    #[must_use]
    pub const fn new(point: Point, epsilon: f64) -> Self {
        Self {
            point,
            epsilon,
            disc: false,
        }
    }
}

/// A forward edge of the candidate DAG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Index of the source node.
    pub source: usize,
    /// Index of the target node (always greater than `source`).
    pub target: usize,
    /// `true` for shortcut candidates, `false` for original chain edges.
    pub approx: bool,
    /// `true` when the candidate survived admissibility testing.
    ///
    /// Only meaningful for approx edges; chain edges are always usable.
    pub show: bool,
    /// `true` when the edge lies on the current minimal path.
    pub shortest_path: bool,
    /// Uniform tolerance of the session when the edge was last tested.
    ///
    /// Per-vertex overrides are not reflected here: the tests read each
    /// vertex's own [`Node::epsilon`]. Strip overlays are drawn at this
    /// width.
    pub epsilon: f64,
    /// Display flag: cone overlay requested for this edge.
    pub cone: bool,
    /// Display flag: error strip overlay requested for this edge.
    pub strip: bool,
}

impl Edge {
    /// Create an edge with all flags cleared.
    ///
    /// `approx` is derived from the endpoints: an edge is a shortcut iff it
    /// skips at least one vertex.
    #[must_use]
    pub const fn new(source: usize, target: usize, epsilon: f64) -> Self {
        Self {
            source,
            target,
            approx: target > source + 1,
            show: false,
            shortest_path: false,
            epsilon,
            cone: false,
            strip: false,
        }
    }

    /// Whether the shortest-path search may traverse this edge.
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        !self.approx || self.show
    }

    /// Number of chain vertices strictly between source and target.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.target - self.source - 1
    }
}

/// Configuration for a simplification session.
///
/// All parameters have defaults matching the reference chain's domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// Uniform error tolerance applied to every vertex.
    pub epsilon: f64,

    /// Which admissibility test marks shortcut edges.
    pub strategy: AdmissibilityKind,

    /// Nominal coordinate domain of the chain.
    ///
    /// Cones are clipped to a virtual extent that encloses these bounds and
    /// the chain itself, widened by [`SimplifyConfig::VIRTUAL_EXTENT_FACTOR`].
    pub bounds: BoundingBox,
}

impl SimplifyConfig {
    /// Default error tolerance.
    pub const DEFAULT_EPSILON: f64 = 10.0;

    /// Default admissibility strategy.
    pub const DEFAULT_STRATEGY: AdmissibilityKind = AdmissibilityKind::IriImai;

    /// Default coordinate domain, `[0, 100]²`.
    pub const DEFAULT_BOUNDS: BoundingBox = BoundingBox::new(0.0, 0.0, 100.0, 100.0);

    /// Virtual extent margin as a multiple of the larger side of the domain.
    pub const VIRTUAL_EXTENT_FACTOR: f64 = 10.0;

    /// Check the config for values the algorithms cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] if `epsilon` is negative or
    /// not finite, or if `bounds` is inverted or not finite.
    pub fn validate(&self) -> Result<(), SimplifyError> {
        validate_epsilon(self.epsilon)?;
        if !self.bounds.is_proper() {
            return Err(SimplifyError::InvalidConfig(format!(
                "bounds must be finite with min < max, got {:?}",
                self.bounds
            )));
        }
        Ok(())
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            strategy: Self::DEFAULT_STRATEGY,
            bounds: Self::DEFAULT_BOUNDS,
        }
    }
}

/// Reject tolerances the geometry cannot use.
pub(crate) fn validate_epsilon(epsilon: f64) -> Result<(), SimplifyError> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(())
    } else {
        Err(SimplifyError::InvalidConfig(format!(
            "epsilon must be finite and non-negative, got {epsilon}"
        )))
    }
}

/// Failures raised by the geometry kernel and the cone builder.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum GeometryError {
    /// The error disc reaches or swallows the source point, so no pair of
    /// tangent lines exists.
    #[error("no tangent cone: disc radius {radius} >= source distance {distance}")]
    DegenerateGeometry {
        /// Radius of the error disc.
        radius: f64,
        /// Distance between source and disc center.
        distance: f64,
    },

    /// Clipping a line to a box did not yield exactly two points.
    #[error("line clipping produced {found} boundary points, expected 2")]
    MalformedClipping {
        /// Number of distinct boundary points found.
        found: usize,
    },

    /// A constructed shape failed its own consistency check.
    #[error("geometric invariant violated: {0}")]
    InvariantViolation(String),
}

/// Errors that can occur while simplifying a chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SimplifyError {
    /// Configuration or argument is invalid.
    #[error("invalid simplification configuration: {0}")]
    InvalidConfig(String),

    /// An update referred to an edge that does not exist.
    #[error("edge ({from}, {to}) does not exist")]
    EdgeNotFound {
        /// Source node index.
        from: usize,
        /// Target node index.
        to: usize,
    },

    /// A node index is past the end of the chain.
    #[error("node index {index} out of range for chain of {len} nodes")]
    NodeOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the chain.
        len: usize,
    },

    /// The geometry kernel reported an unrecoverable failure.
    #[error("cannot simplify this chain/epsilon combination: {0}")]
    Geometry(#[from] GeometryError),
}
