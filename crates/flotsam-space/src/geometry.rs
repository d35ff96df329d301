//! Emission geometries and exact point containment.
//!
//! A [`Shape`] is a validated [`Geometry`]: once constructed it has the
//! right number of finite points for its kind and carries its tightest
//! bounding box. Containment is boundary-inclusive for every kind.

use std::fmt;

use flotsam_core::Point;

use crate::bbox::BoundingBox;
use crate::error::SpaceError;

/// Relative tolerance for on-segment tests.
///
/// A point counts as on a segment when its distance from the segment is at
/// most this fraction of the segment length (or of 1.0 for segments
/// shorter than that).
pub const LINE_TOLERANCE: f64 = 1e-9;

/// The raw geometry of a shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single point.
    Point(Point),
    /// A straight segment.
    Line {
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
    },
    /// A simple polygon in the x/y plane, vertices in order. The closing
    /// edge from the last vertex back to the first is implicit.
    Polygon(Vec<Point>),
    /// An axis-aligned box.
    Box(BoundingBox),
    /// A finite set of discrete points.
    PointSet(Vec<Point>),
}

/// Discriminant of [`Geometry`], used in configuration and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// [`Geometry::Point`].
    Point,
    /// [`Geometry::Line`].
    Line,
    /// [`Geometry::Polygon`].
    Polygon,
    /// [`Geometry::Box`].
    Box,
    /// [`Geometry::PointSet`].
    PointSet,
}

impl ShapeKind {
    /// Lower-case name for messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Box => "box",
            Self::PointSet => "point set",
        }
    }

    /// Stable one-byte tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Polygon => 2,
            Self::Box => 3,
            Self::PointSet => 4,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated geometry together with its bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    bbox: BoundingBox,
}

impl Shape {
    /// A single point.
    pub fn point(p: Point) -> Result<Self, SpaceError> {
        Self::try_from(Geometry::Point(p))
    }

    /// A segment from `start` to `end`.
    pub fn line(start: Point, end: Point) -> Result<Self, SpaceError> {
        Self::try_from(Geometry::Line { start, end })
    }

    /// A polygon from at least three vertices.
    pub fn polygon(vertices: Vec<Point>) -> Result<Self, SpaceError> {
        Self::try_from(Geometry::Polygon(vertices))
    }

    /// An axis-aligned box from two opposite corners in any order.
    pub fn rect(a: Point, b: Point) -> Result<Self, SpaceError> {
        Ok(Self::from_box(BoundingBox::from_corners(a, b)?))
    }

    /// A shape covering exactly the given box.
    pub fn from_box(bbox: BoundingBox) -> Self {
        Self {
            geometry: Geometry::Box(bbox),
            bbox,
        }
    }

    /// A non-empty set of discrete points.
    pub fn point_set(points: Vec<Point>) -> Result<Self, SpaceError> {
        Self::try_from(Geometry::PointSet(points))
    }

    /// Build a shape of `kind` from an ordered list of points.
    ///
    /// Point takes exactly one point, line exactly two, box two opposite
    /// corners, polygon at least three and point set at least one.
    pub fn from_points(kind: ShapeKind, points: &[Point]) -> Result<Self, SpaceError> {
        let exact = |n: usize| -> Result<(), SpaceError> {
            if points.len() < n {
                Err(SpaceError::TooFewPoints {
                    kind: kind.name(),
                    required: n,
                    got: points.len(),
                })
            } else if points.len() > n {
                Err(SpaceError::TooManyPoints {
                    kind: kind.name(),
                    allowed: n,
                    got: points.len(),
                })
            } else {
                Ok(())
            }
        };
        match kind {
            ShapeKind::Point => {
                exact(1)?;
                Self::point(points[0])
            }
            ShapeKind::Line => {
                exact(2)?;
                Self::line(points[0], points[1])
            }
            ShapeKind::Box => {
                exact(2)?;
                Self::rect(points[0], points[1])
            }
            ShapeKind::Polygon => Self::polygon(points.to_vec()),
            ShapeKind::PointSet => Self::point_set(points.to_vec()),
        }
    }

    /// The underlying geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Which kind of shape this is.
    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Polygon(_) => ShapeKind::Polygon,
            Geometry::Box(_) => ShapeKind::Box,
            Geometry::PointSet(_) => ShapeKind::PointSet,
        }
    }

    /// Tightest enclosing box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// The defining points, in construction order.
    ///
    /// Boxes report their min and max corners.
    pub fn vertices(&self) -> Vec<Point> {
        match &self.geometry {
            Geometry::Point(p) => vec![*p],
            Geometry::Line { start, end } => vec![*start, *end],
            Geometry::Polygon(v) | Geometry::PointSet(v) => v.clone(),
            Geometry::Box(b) => vec![b.min(), b.max()],
        }
    }

    /// Length, area or volume, depending on kind.
    ///
    /// Lines report their length. Polygons report x/y area. Boxes report
    /// x/y area when flat in z and volume otherwise. Points and point sets
    /// report zero.
    pub fn measure(&self) -> f64 {
        match &self.geometry {
            Geometry::Point(_) | Geometry::PointSet(_) => 0.0,
            Geometry::Line { start, end } => start.distance(end),
            Geometry::Polygon(v) => shoelace(v).abs(),
            Geometry::Box(b) => {
                if b.extent().z > 0.0 {
                    b.volume()
                } else {
                    b.area_xy()
                }
            }
        }
    }

    /// Whether an extended shape has collapsed to zero measure.
    ///
    /// Sources with degenerate geometry emit nothing. Points and point
    /// sets are never degenerate.
    pub fn is_degenerate(&self) -> bool {
        match self.geometry {
            Geometry::Point(_) | Geometry::PointSet(_) => false,
            _ => self.measure() <= 0.0,
        }
    }

    /// Whether `p` lies in the shape, boundary included.
    ///
    /// Polygons are vertical prisms: only x and y are tested.
    pub fn contains(&self, p: &Point) -> bool {
        match &self.geometry {
            Geometry::Point(q) => q == p,
            Geometry::PointSet(qs) => qs.iter().any(|q| q == p),
            Geometry::Line { start, end } => on_segment(*start, *end, *p),
            Geometry::Box(b) => b.contains(p),
            Geometry::Polygon(v) => {
                if !self.bbox.contains_xy(p) {
                    return false;
                }
                let flat = Point::xy(p.x, p.y);
                let n = v.len();
                let on_edge = (0..n).any(|i| {
                    let a = v[i];
                    let b = v[(i + 1) % n];
                    on_segment(Point::xy(a.x, a.y), Point::xy(b.x, b.y), flat)
                });
                on_edge || crossing_test(v, p)
            }
        }
    }
}

impl TryFrom<Geometry> for Shape {
    type Error = SpaceError;

    fn try_from(geometry: Geometry) -> Result<Self, Self::Error> {
        let bbox = match &geometry {
            Geometry::Point(p) => {
                check_finite("point", std::slice::from_ref(p))?;
                BoundingBox::new(*p, *p)?
            }
            Geometry::Line { start, end } => {
                check_finite("line", &[*start, *end])?;
                BoundingBox::from_corners(*start, *end)?
            }
            Geometry::Polygon(v) => {
                if v.len() < 3 {
                    return Err(SpaceError::TooFewPoints {
                        kind: "polygon",
                        required: 3,
                        got: v.len(),
                    });
                }
                check_finite("polygon", v)?;
                BoundingBox::from_points(v)?
            }
            Geometry::Box(b) => *b,
            Geometry::PointSet(v) => {
                if v.is_empty() {
                    return Err(SpaceError::TooFewPoints {
                        kind: "point set",
                        required: 1,
                        got: 0,
                    });
                }
                check_finite("point set", v)?;
                BoundingBox::from_points(v)?
            }
        };
        Ok(Self { geometry, bbox })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.geometry {
            Geometry::Point(p) => write!(f, "point {p}"),
            Geometry::Line { start, end } => write!(f, "line {start} -> {end}"),
            Geometry::Polygon(v) => write!(f, "polygon of {} vertices in {}", v.len(), self.bbox),
            Geometry::Box(b) => write!(f, "box {b}"),
            Geometry::PointSet(v) => write!(f, "{} points in {}", v.len(), self.bbox),
        }
    }
}

fn check_finite(what: &'static str, points: &[Point]) -> Result<(), SpaceError> {
    if points.iter().all(Point::is_finite) {
        Ok(())
    } else {
        Err(SpaceError::NonFinite { what })
    }
}

fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let d = b - a;
    let len2 = dot(d, d);
    if len2 == 0.0 {
        return p == a;
    }
    let t = dot(p - a, d) / len2;
    if !(0.0..=1.0).contains(&t) {
        // Endpoints themselves are inside even if t rounds outside [0, 1].
        return p == a || p == b;
    }
    let closest = a + d * t;
    p.distance(&closest) <= LINE_TOLERANCE * len2.sqrt().max(1.0)
}

/// Signed x/y area, positive for counter-clockwise vertex order.
fn shoelace(v: &[Point]) -> f64 {
    let n = v.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = v[i];
            let b = v[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

/// Even-odd ray crossing test in x/y.
fn crossing_test(v: &[Point], p: &Point) -> bool {
    let mut inside = false;
    let mut j = v.len() - 1;
    for i in 0..v.len() {
        let (vi, vj) = (v[i], v[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Shape {
        Shape::polygon(vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(4.0, 4.0),
            Point::xy(0.0, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let err = Shape::polygon(vec![Point::ZERO, Point::xy(1.0, 0.0)]).unwrap_err();
        assert_eq!(
            err,
            SpaceError::TooFewPoints {
                kind: "polygon",
                required: 3,
                got: 2
            }
        );
    }

    #[test]
    fn line_takes_exactly_two_points() {
        let three = [Point::ZERO, Point::xy(1.0, 0.0), Point::xy(2.0, 0.0)];
        assert!(matches!(
            Shape::from_points(ShapeKind::Line, &three),
            Err(SpaceError::TooManyPoints { allowed: 2, .. })
        ));
        assert!(matches!(
            Shape::from_points(ShapeKind::Line, &three[..1]),
            Err(SpaceError::TooFewPoints { required: 2, .. })
        ));
    }

    #[test]
    fn empty_point_set_rejected() {
        assert!(Shape::point_set(Vec::new()).is_err());
    }

    #[test]
    fn nan_vertex_rejected() {
        let err = Shape::line(Point::ZERO, Point::xy(f64::NAN, 1.0)).unwrap_err();
        assert_eq!(err, SpaceError::NonFinite { what: "line" });
    }

    #[test]
    fn polygon_interior_boundary_and_outside() {
        let s = square();
        assert!(s.contains(&Point::xy(2.0, 2.0)));
        assert!(s.contains(&Point::xy(0.0, 2.0)));
        assert!(s.contains(&Point::xy(4.0, 4.0)));
        assert!(s.contains(&Point::xy(2.0, 0.0)));
        assert!(!s.contains(&Point::xy(4.1, 2.0)));
        assert!(!s.contains(&Point::xy(-0.1, -0.1)));
    }

    #[test]
    fn polygon_ignores_z() {
        assert!(square().contains(&Point::new(1.0, 1.0, -30.0)));
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // An L shape: the upper-right quadrant is cut away.
        let l = Shape::polygon(vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(4.0, 2.0),
            Point::xy(2.0, 2.0),
            Point::xy(2.0, 4.0),
            Point::xy(0.0, 4.0),
        ])
        .unwrap();
        assert!(l.contains(&Point::xy(1.0, 3.0)));
        assert!(l.contains(&Point::xy(3.0, 1.0)));
        assert!(!l.contains(&Point::xy(3.0, 3.0)));
        assert!(l.contains(&Point::xy(3.0, 2.0)));
        assert_eq!(l.measure(), 12.0);
    }

    #[test]
    fn line_contains_points_on_segment_only() {
        let s = Shape::line(Point::xy(0.0, 0.0), Point::xy(10.0, 10.0)).unwrap();
        assert!(s.contains(&Point::xy(5.0, 5.0)));
        assert!(s.contains(&Point::xy(0.0, 0.0)));
        assert!(s.contains(&Point::xy(10.0, 10.0)));
        assert!(!s.contains(&Point::xy(11.0, 11.0)));
        assert!(!s.contains(&Point::xy(5.0, 5.1)));
    }

    #[test]
    fn point_and_point_set_containment_is_exact() {
        let p = Shape::point(Point::xy(1.0, 1.0)).unwrap();
        assert!(p.contains(&Point::xy(1.0, 1.0)));
        assert!(!p.contains(&Point::xy(1.0, 1.000001)));
        let set = Shape::point_set(vec![Point::xy(0.0, 0.0), Point::xy(3.0, 3.0)]).unwrap();
        assert!(set.contains(&Point::xy(3.0, 3.0)));
        assert!(!set.contains(&Point::xy(1.5, 1.5)));
    }

    #[test]
    fn bounding_box_is_tight() {
        let tri = Shape::polygon(vec![
            Point::xy(1.0, 0.0),
            Point::xy(5.0, 2.0),
            Point::xy(2.0, 6.0),
        ])
        .unwrap();
        let b = tri.bounding_box();
        assert_eq!(b.min(), Point::xy(1.0, 0.0));
        assert_eq!(b.max(), Point::xy(5.0, 6.0));
    }

    #[test]
    fn measures() {
        assert_eq!(square().measure(), 16.0);
        let line = Shape::line(Point::ZERO, Point::xy(3.0, 4.0)).unwrap();
        assert_eq!(line.measure(), 5.0);
        let flat = Shape::rect(Point::ZERO, Point::xy(2.0, 3.0)).unwrap();
        assert_eq!(flat.measure(), 6.0);
        let solid = Shape::rect(Point::ZERO, Point::new(2.0, 3.0, 2.0)).unwrap();
        assert_eq!(solid.measure(), 12.0);
        assert_eq!(Shape::point(Point::ZERO).unwrap().measure(), 0.0);
    }

    #[test]
    fn collapsed_shapes_are_degenerate() {
        let line = Shape::line(Point::xy(1.0, 1.0), Point::xy(1.0, 1.0)).unwrap();
        assert!(line.is_degenerate());
        let collinear = Shape::polygon(vec![
            Point::xy(0.0, 0.0),
            Point::xy(1.0, 1.0),
            Point::xy(2.0, 2.0),
        ])
        .unwrap();
        assert!(collinear.is_degenerate());
        assert!(!Shape::point(Point::ZERO).unwrap().is_degenerate());
        assert!(!square().is_degenerate());
    }

    #[test]
    fn box_from_points_accepts_any_corner_order() {
        let s = Shape::from_points(ShapeKind::Box, &[Point::xy(5.0, 5.0), Point::xy(1.0, 2.0)])
            .unwrap();
        assert_eq!(s.kind(), ShapeKind::Box);
        assert!(s.contains(&Point::xy(3.0, 3.0)));
    }

    #[test]
    fn display_names_the_kind() {
        assert!(square().to_string().starts_with("polygon of 4 vertices"));
        assert_eq!(ShapeKind::PointSet.to_string(), "point set");
    }
}
