//! Rectangular bounding boxes and associated trait implementations.

use serde::{Deserialize, Serialize};

use super::{Point, Polygon, Rect, Shape};

/// An axis-aligned rectangular bounding box.
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
/// This differs from [`Rect`] in that it could be empty, meaning that `p0`
/// is to the upper right of `p1`.
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Bbox {
    pub p0: Point,
    pub p1: Point,
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    /// Create a new [`Bbox`] from two [`Point`]s.
    #[inline]
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
    /// Creates a new [`Bbox`] from a single [`Point`].
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Creates an empty, otherwise invalid bounding box.
    pub fn empty() -> Self {
        Self {
            p0: Point::new(i64::MAX, i64::MAX),
            p1: Point::new(i64::MIN, i64::MIN),
        }
    }
    /// Returns `true` if the bounding box is empty.
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    #[inline]
    pub fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }
    #[inline]
    pub fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }
    /// Returns true if [`Point`] `pt` lies inside the bounding box.
    pub fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// Returns the union of two bounding boxes.
    pub fn union(&self, other: Bbox) -> Bbox {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return other;
        }
        Bbox::new(
            Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        )
    }
    /// Converts a non-empty bounding box into a [`Rect`].
    ///
    /// Returns [`None`] if the bounding box is empty.
    #[inline]
    pub fn into_rect(self) -> Option<Rect> {
        if self.is_empty() {
            None
        } else {
            Some(Rect::new(self.p0, self.p1))
        }
    }
}

impl From<Rect> for Bbox {
    fn from(r: Rect) -> Self {
        Self { p0: r.p0, p1: r.p1 }
    }
}

/// A trait representing functions available for objects with a bounding box.
pub trait BoundBox {
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> Bbox;
    /// Computes the union with rectangular bounding box `bbox`.
    fn union(&self, bbox: Bbox) -> Bbox {
        self.bbox().union(bbox)
    }
}

impl<T> BoundBox for &T
where
    T: BoundBox,
{
    fn bbox(&self) -> Bbox {
        T::bbox(*self)
    }
}

impl BoundBox for Bbox {
    fn bbox(&self) -> Bbox {
        *self
    }
}

impl BoundBox for Point {
    fn bbox(&self) -> Bbox {
        Bbox::from_point(*self)
    }
}

impl BoundBox for Rect {
    fn bbox(&self) -> Bbox {
        Bbox::from(*self)
    }
}

impl BoundBox for Polygon {
    fn bbox(&self) -> Bbox {
        self.points.bbox()
    }
}

impl BoundBox for Shape {
    fn bbox(&self) -> Bbox {
        match self {
            Shape::Rect(r) => r.bbox(),
            Shape::Polygon(p) => p.bbox(),
        }
    }
}

impl BoundBox for Vec<Point> {
    fn bbox(&self) -> Bbox {
        self.iter()
            .fold(Bbox::empty(), |bbox, pt| bbox.union(pt.bbox()))
    }
}
