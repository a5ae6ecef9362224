//! Core geometric types and their operations/attributes.
//!
//! All coordinates are integers in layout database units (nanometers).

use std::cmp::Ordering;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use self::bbox::BoundBox;
use self::transform::Translate;

pub mod bbox;
pub mod octagon;
pub mod transform;

/// Snaps `pos` to the nearest multiple of `grid`.
///
/// Ties are broken towards negative infinity.
pub fn snap_to_grid(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);

    let rem = pos.rem_euclid(grid);
    if rem <= grid / 2 {
        pos - rem
    } else {
        pos + grid - rem
    }
}

/// Snaps `pos` up to the next multiple of `grid`.
pub fn snap_up_to_grid(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);

    let rem = pos.rem_euclid(grid);
    if rem == 0 {
        pos
    } else {
        pos + grid - rem
    }
}

/// A point in two-dimensional layout-space.
#[derive(
    Debug, Copy, Clone, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, (0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Returns `true` if both coordinates are multiples of `grid`.
    #[inline]
    pub fn is_on_grid(&self, grid: i64) -> bool {
        self.x.rem_euclid(grid) == 0 && self.y.rem_euclid(grid) == 0
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub<Point> for Point {
    type Output = Self;
    fn sub(self, rhs: Point) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i64, i64)> for Point {
    fn from(value: (i64, i64)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

/// A one-dimensional span.
#[derive(
    Debug, Default, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Span {
    start: i64,
    stop: i64,
}

impl Span {
    /// Creates a new [`Span`] between two integers.
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start: start.min(stop),
            stop: start.max(stop),
        }
    }

    /// Creates a new [`Span`] with center `center` and length `span`.
    ///
    /// The start is snapped to `grid`, so the span's edges land on the grid
    /// whenever `span` is itself a multiple of `grid`, even if `span / 2` is not.
    pub fn from_center_span_gridded(center: i64, span: i64, grid: i64) -> Self {
        assert!(span >= 0);

        let start = snap_to_grid(center - span / 2, grid);
        Self::new(start, start + span)
    }

    /// Gets the center of the span.
    #[inline]
    pub fn center(&self) -> i64 {
        (self.start + self.stop) / 2
    }

    /// Gets the length of the span.
    #[inline]
    pub fn length(&self) -> i64 {
        self.stop - self.start
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Creates a new [`Span`] expanded by `amount` in both directions.
    pub fn expand_all(self, amount: i64) -> Self {
        Self::new(self.start - amount, self.stop + amount)
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }

    pub fn contains(self, other: Self) -> bool {
        self.union(other) == self
    }

    pub fn translate(self, amount: i64) -> Self {
        Self {
            start: self.start + amount,
            stop: self.stop + amount,
        }
    }
}

impl From<(i64, i64)> for Span {
    #[inline]
    fn from(tup: (i64, i64)) -> Self {
        Self::new(tup.0, tup.1)
    }
}

/// An enumeration of axis-aligned directions.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum Dir {
    /// The horizontal, or x-aligned, direction.
    #[default]
    Horiz,
    /// The vertical, or y-aligned, direction.
    Vert,
}

/// A closed n-sided polygon with arbitrary number of vertices.
///
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end.
#[derive(Debug, Default, Clone, Hash, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Twice the signed area enclosed by the polygon.
    ///
    /// Positive for counter-clockwise vertex order.
    pub fn signed_area2(&self) -> i128 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let (a, b) = (self.points[i], self.points[(i + 1) % n]);
                a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
            })
            .sum()
    }

    /// Returns `true` if the vertices are ordered counter-clockwise.
    pub fn is_ccw(&self) -> bool {
        self.signed_area2() > 0
    }

    /// Approximates a circle of diameter `diameter` centered on the origin.
    ///
    /// The first vertex lies on the positive x-axis and vertices proceed
    /// counter-clockwise. Every vertex is snapped to `grid`.
    pub fn circle(diameter: i64, n_points: usize, grid: i64) -> Self {
        assert!(n_points >= 4);
        let r = diameter as f64 / 2.0;
        let points = (0..n_points)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / n_points as f64;
                Point::new(
                    snap_to_grid((r * theta.cos()).round() as i64, grid),
                    snap_to_grid((r * theta.sin()).round() as i64, grid),
                )
            })
            .collect();
        Self { points }
    }

    /// Returns `true` if every corner of `rect` lies inside the polygon.
    ///
    /// For convex polygons this is equivalent to containment of the whole rectangle.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        rect.corners().iter().all(|&pt| self.contains(pt))
    }
}

impl Translate for Polygon {
    fn translate(&mut self, p: Point) {
        for pt in self.points.iter_mut() {
            pt.translate(p);
        }
    }
}

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    /// The lower-left corner.
    pub p0: Point,
    /// The upper-right corner.
    pub p1: Point,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates a rectangle from horizontal and vertical [`Span`]s.
    pub fn from_spans(h: Span, v: Span) -> Self {
        Self {
            p0: Point::new(h.start(), v.start()),
            p1: Point::new(h.stop(), v.stop()),
        }
    }

    /// Creates a rectangle of dimensions `dims` centered (as closely as the grid allows) on `center`.
    pub fn from_center_dims_gridded(center: Point, dims: Dims, grid: i64) -> Self {
        Self::from_spans(
            Span::from_center_span_gridded(center.x, dims.w(), grid),
            Span::from_center_span_gridded(center.y, dims.h(), grid),
        )
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2, (self.p0.y + self.p1.y) / 2)
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.p0.y
    }

    #[inline]
    pub fn top(&self) -> i64 {
        self.p1.y
    }

    #[inline]
    pub fn left(&self) -> i64 {
        self.p0.x
    }

    #[inline]
    pub fn right(&self) -> i64 {
        self.p1.x
    }

    /// Returns the horizontal span of the rectangle.
    pub fn hspan(&self) -> Span {
        Span::new(self.p0.x, self.p1.x)
    }

    /// Returns the vertical span of the rectangle.
    pub fn vspan(&self) -> Span {
        Span::new(self.p0.y, self.p1.y)
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }

    /// Returns the dimensions of the rectangle as [`Dims`].
    #[inline]
    pub fn dims(&self) -> Dims {
        Dims::new(self.width(), self.height())
    }

    /// Returns the length of the shorter side.
    #[inline]
    pub fn min_dim(&self) -> i64 {
        self.width().min(self.height())
    }

    /// Expands the rectangle by `amount` on all sides.
    #[inline]
    pub fn expand(&self, amount: i64) -> Self {
        Self::new(
            Point::new(self.p0.x - amount, self.p0.y - amount),
            Point::new(self.p1.x + amount, self.p1.y + amount),
        )
    }

    /// Expands the left and right edges by `dims.w()` and the top and bottom edges by `dims.h()`.
    pub fn expand_dims(&self, dims: Dims) -> Self {
        Self::new(
            Point::new(self.p0.x - dims.w(), self.p0.y - dims.h()),
            Point::new(self.p1.x + dims.w(), self.p1.y + dims.h()),
        )
    }

    /// The four corners, counter-clockwise from the lower left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// Returns the smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: Rect) -> Self {
        Self::from_spans(
            self.hspan().union(other.hspan()),
            self.vspan().union(other.vspan()),
        )
    }
}

/// The primary geometric primitive comprising raw layout.
#[derive(Debug, Clone, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

impl Translate for Shape {
    fn translate(&mut self, p: Point) {
        match self {
            Self::Rect(s) => s.translate(p),
            Self::Polygon(s) => s.translate(p),
        }
    }
}

impl Shape {
    pub fn as_rect(&self) -> Option<Rect> {
        if let Shape::Rect(rect) = self {
            Some(*rect)
        } else {
            None
        }
    }

    pub fn as_poly(&self) -> Option<&Polygon> {
        if let Shape::Polygon(poly) = self {
            Some(poly)
        } else {
            None
        }
    }

    /// Returns `true` if every vertex of the shape lies on `grid`.
    pub fn is_on_grid(&self, grid: i64) -> bool {
        match self {
            Shape::Rect(r) => r.p0.is_on_grid(grid) && r.p1.is_on_grid(grid),
            Shape::Polygon(p) => p.points.iter().all(|pt| pt.is_on_grid(grid)),
        }
    }
}

/// Common shape operations, dispatched from the [`Shape`] enum to its variants by [mod@enum_dispatch].
#[enum_dispatch]
pub trait ShapeTrait {
    /// Returns our "origin", an arbitrary [`Point`] on the shape.
    fn point0(&self) -> Point;
    /// Returns `true` if the shape contains [`Point`] `pt`.
    ///
    /// Containment is *inclusive*: points on the boundary are regarded as inside the shape.
    fn contains(&self, pt: Point) -> bool;
    /// Converts the shape to a [`Polygon`], the most general of shapes.
    fn to_poly(&self) -> Polygon;
}

impl ShapeTrait for Rect {
    fn point0(&self) -> Point {
        self.p0
    }
    fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    fn to_poly(&self) -> Polygon {
        Polygon {
            points: self.corners().to_vec(),
        }
    }
}

impl ShapeTrait for Polygon {
    fn point0(&self) -> Point {
        self.points[0]
    }
    fn contains(&self, pt: Point) -> bool {
        if !self.points.bbox().contains(pt) {
            return false;
        }

        // Winding-number test.
        let mut winding_num: isize = 0;
        for idx in 0..self.points.len() {
            let (past, next) = (
                &self.points[idx],
                &self.points[(idx + 1) % self.points.len()],
            );

            if past.y.min(next.y) <= pt.y && past.y.max(next.y) >= pt.y {
                if next.y == past.y {
                    // Horizontal edge at the point's height: a hit only if the point lies on it.
                    if past.x.min(next.x) <= pt.x && past.x.max(next.x) >= pt.x {
                        return true;
                    }
                } else {
                    // Cross-multiplied to stay exact on integer coordinates.
                    let lhs = (next.x - past.x) as i128 * (pt.y - past.y) as i128;
                    let rhs = (pt.x - past.x) as i128 * (next.y - past.y) as i128;
                    let ord = if next.y > past.y {
                        lhs.cmp(&rhs)
                    } else {
                        rhs.cmp(&lhs)
                    };
                    match ord {
                        Ordering::Equal => return true,
                        Ordering::Greater => {
                            // Count each crossing once: include the lower endpoint only.
                            let upper = past.y.max(next.y);
                            if pt.y != upper {
                                if next.y > past.y {
                                    winding_num += 1;
                                } else {
                                    winding_num -= 1;
                                }
                            }
                        }
                        Ordering::Less => (),
                    }
                }
            }
        }
        winding_num != 0
    }
    fn to_poly(&self) -> Polygon {
        self.clone()
    }
}

/// A horizontal and vertical rectangular dimension with no specified location.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Dims {
    w: i64,
    h: i64,
}

impl Dims {
    pub const fn new(w: i64, h: i64) -> Self {
        Self { w, h }
    }

    pub const fn square(value: i64) -> Self {
        Self { w: value, h: value }
    }

    /// Returns the dimension in the given direction.
    pub fn dim(&self, dir: Dir) -> i64 {
        match dir {
            Dir::Horiz => self.w,
            Dir::Vert => self.h,
        }
    }

    #[inline]
    pub fn w(&self) -> i64 {
        self.w
    }

    #[inline]
    pub fn h(&self) -> i64 {
        self.h
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.h
    }

    /// Returns the component-wise maximum of two [`Dims`].
    pub fn max(self, other: Dims) -> Self {
        Self::new(self.w.max(other.w), self.h.max(other.h))
    }

    /// Returns a rectangle with these dimensions and its lower-left corner at the origin.
    pub fn into_rect(self) -> Rect {
        Rect::new(Point::zero(), Point::new(self.w, self.h))
    }
}

impl std::ops::Add<Dims> for Dims {
    type Output = Self;
    fn add(self, rhs: Dims) -> Self::Output {
        Self::new(self.w + rhs.w, self.h + rhs.h)
    }
}

impl std::ops::Sub<Dims> for Dims {
    type Output = Self;
    fn sub(self, rhs: Dims) -> Self::Output {
        Self::new(self.w - rhs.w, self.h - rhs.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest() {
        assert_eq!(snap_to_grid(12, 5), 10);
        assert_eq!(snap_to_grid(13, 5), 15);
        assert_eq!(snap_to_grid(-12, 5), -10);
        assert_eq!(snap_to_grid(-13, 5), -15);
        assert_eq!(snap_up_to_grid(11, 5), 15);
        assert_eq!(snap_up_to_grid(10, 5), 10);
    }

    #[test]
    fn gridded_span_keeps_length() {
        let span = Span::from_center_span_gridded(0, 15, 5);
        assert_eq!(span.length(), 15);
        assert_eq!(span.start() % 5, 0);
    }

    #[test]
    fn expand_dims_grows_each_axis_separately() {
        let rect = Rect::new(Point::new(0, 0), Point::new(100, 50));
        let grown = rect.expand_dims(Dims::new(10, 20));
        assert_eq!(grown, Rect::new(Point::new(-10, -20), Point::new(110, 70)));
        assert_eq!(grown.dims(), rect.dims() + Dims::new(20, 40));
    }

    #[test]
    fn polygon_contains_boundary_and_interior() {
        let poly = Rect::new(Point::new(0, 0), Point::new(100, 50)).to_poly();
        assert!(poly.is_ccw());
        assert!(poly.contains(Point::new(50, 25)));
        assert!(poly.contains(Point::new(0, 0)));
        assert!(poly.contains(Point::new(100, 25)));
        assert!(!poly.contains(Point::new(101, 25)));
        assert!(!poly.contains(Point::new(50, -1)));
    }

    #[test]
    fn polygon_contains_diagonal_edges() {
        let diamond = Polygon::new(vec![
            Point::new(0, -10),
            Point::new(10, 0),
            Point::new(0, 10),
            Point::new(-10, 0),
        ]);
        assert!(diamond.contains(Point::new(0, 0)));
        assert!(diamond.contains(Point::new(5, 5)));
        assert!(!diamond.contains(Point::new(6, 5)));
        assert!(!diamond.contains(Point::new(-6, -5)));
        // Level with a vertex but outside.
        assert!(!diamond.contains(Point::new(11, 0)));
        assert!(!diamond.contains(Point::new(-11, 0)));
    }

    #[test]
    fn circle_is_ccw_and_gridded() {
        let circle = Polygon::circle(1000, 64, 5);
        assert_eq!(circle.points.len(), 64);
        assert_eq!(circle.points[0], Point::new(500, 0));
        assert!(circle.is_ccw());
        assert!(circle.points.iter().all(|p| p.is_on_grid(5)));
        assert!(circle.contains(Point::zero()));
    }
}
