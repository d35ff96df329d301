//! Axis-aligned bounding boxes.

use std::fmt;

use flotsam_core::Point;

use crate::error::SpaceError;

/// An axis-aligned box with `min <= max` on every axis.
///
/// The invariant is enforced by the constructors, so a `BoundingBox` in
/// hand is always well formed. Containment and overlap are closed-interval
/// tests: the boundary counts as inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Build a box from its corners.
    ///
    /// Fails if any coordinate is non-finite or `min > max` on some axis.
    pub fn new(min: Point, max: Point) -> Result<Self, SpaceError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SpaceError::NonFinite {
                what: "bounding box",
            });
        }
        for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
            if lo > hi {
                return Err(SpaceError::InvertedBox {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Build a box from two opposite corners given in any order.
    pub fn from_corners(a: Point, b: Point) -> Result<Self, SpaceError> {
        Self::new(a.min(b), a.max(b))
    }

    /// Tightest box enclosing a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Result<Self, SpaceError> {
        let mut iter = points.into_iter();
        let first = *iter.next().ok_or(SpaceError::TooFewPoints {
            kind: "bounding box",
            required: 1,
            got: 0,
        })?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Self::new(min, max)
    }

    /// Lower corner.
    pub fn min(&self) -> Point {
        self.min
    }

    /// Upper corner.
    pub fn max(&self) -> Point {
        self.max
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Point {
        self.max - self.min
    }

    /// Centre point.
    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }

    /// Area of the x/y footprint.
    pub fn area_xy(&self) -> f64 {
        let e = self.extent();
        e.x * e.y
    }

    /// Volume (zero for flat boxes).
    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e.x * e.y * e.z
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether `p` lies inside or on the boundary of the x/y footprint,
    /// ignoring z.
    pub fn contains_xy(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether the two boxes share at least one point (touching counts).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// Whether the x/y interiors of the two boxes intersect.
    ///
    /// Boxes that only share an edge do not overlap in this sense. Used to
    /// check that blocks partition the domain.
    pub fn overlaps_interior(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The shared region, if the boxes overlap.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.overlaps(other) {
            return None;
        }
        Some(BoundingBox {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Clamp a point onto the box.
    pub fn clamp(&self, p: Point) -> Point {
        p.max(self.min).min(self.max)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> BoundingBox {
        BoundingBox::new(Point::ZERO, Point::new(1.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn rejects_inverted_axis() {
        let err = BoundingBox::new(Point::xy(2.0, 0.0), Point::xy(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, SpaceError::InvertedBox { axis: 'x', .. }));
    }

    #[test]
    fn rejects_nan() {
        assert!(BoundingBox::new(Point::xy(f64::NAN, 0.0), Point::xy(1.0, 1.0)).is_err());
    }

    #[test]
    fn corners_in_any_order() {
        let b = BoundingBox::from_corners(Point::xy(3.0, 0.0), Point::xy(1.0, 2.0)).unwrap();
        assert_eq!(b.min(), Point::xy(1.0, 0.0));
        assert_eq!(b.max(), Point::xy(3.0, 2.0));
    }

    #[test]
    fn from_points_is_tight() {
        let pts = [Point::xy(1.0, 5.0), Point::xy(-2.0, 3.0), Point::xy(0.0, 7.0)];
        let b = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(b.min(), Point::xy(-2.0, 3.0));
        assert_eq!(b.max(), Point::xy(1.0, 7.0));
    }

    #[test]
    fn from_no_points_fails() {
        let none: [Point; 0] = [];
        assert!(BoundingBox::from_points(&none).is_err());
    }

    #[test]
    fn boundary_is_inside() {
        let b = unit();
        assert!(b.contains(&Point::ZERO));
        assert!(b.contains(&Point::new(1.0, 1.0, 1.0)));
        assert!(b.contains(&Point::new(0.5, 1.0, 0.0)));
        assert!(!b.contains(&Point::new(1.0 + 1e-12, 0.5, 0.5)));
    }

    #[test]
    fn touching_boxes_overlap_but_not_in_interior() {
        let a = BoundingBox::new(Point::ZERO, Point::xy(5.0, 5.0)).unwrap();
        let b = BoundingBox::new(Point::xy(5.0, 0.0), Point::xy(10.0, 5.0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps_interior(&b));
    }

    #[test]
    fn intersection_and_union() {
        let a = BoundingBox::new(Point::ZERO, Point::xy(4.0, 4.0)).unwrap();
        let b = BoundingBox::new(Point::xy(2.0, 2.0), Point::xy(6.0, 6.0)).unwrap();
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.min(), Point::xy(2.0, 2.0));
        assert_eq!(i.max(), Point::xy(4.0, 4.0));
        let u = a.union(&b);
        assert_eq!(u.max(), Point::xy(6.0, 6.0));
        let far = BoundingBox::new(Point::xy(10.0, 10.0), Point::xy(11.0, 11.0)).unwrap();
        assert!(a.intersection(&far).is_none());
    }

    #[test]
    fn flat_box_measures() {
        let b = BoundingBox::new(Point::ZERO, Point::xy(2.0, 3.0)).unwrap();
        assert_eq!(b.area_xy(), 6.0);
        assert_eq!(b.volume(), 0.0);
        assert_eq!(b.center(), Point::xy(1.0, 1.5));
    }
}
