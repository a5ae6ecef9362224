//! Lines restricted to 0, 45 and 90 degree directions, and the octagons built from them.
//!
//! Diagonal line offsets are snapped to the grid, so every intersection of an
//! axis-aligned line with a diagonal line lands on the grid and every diagonal
//! edge is exactly 45 degrees.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use super::{snap_to_grid, Point, Polygon};

/// One of the eight outward edge normals of an octagon, counter-clockwise from east.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum OctDir {
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
}

impl OctDir {
    /// All directions, counter-clockwise from east.
    pub const ALL: [OctDir; 8] = [
        OctDir::E,
        OctDir::NE,
        OctDir::N,
        OctDir::NW,
        OctDir::W,
        OctDir::SW,
        OctDir::S,
        OctDir::SE,
    ];

    /// Returns the direction `index * 45` degrees counter-clockwise from east.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The next direction, 45 degrees counter-clockwise.
    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn is_diagonal(&self) -> bool {
        self.index() % 2 == 1
    }

    /// The unnormalized integer normal vector `(nx, ny)`.
    pub fn normal(&self) -> (i64, i64) {
        match self {
            OctDir::E => (1, 0),
            OctDir::NE => (1, 1),
            OctDir::N => (0, 1),
            OctDir::NW => (-1, 1),
            OctDir::W => (-1, 0),
            OctDir::SW => (-1, -1),
            OctDir::S => (0, -1),
            OctDir::SE => (1, -1),
        }
    }
}

/// The line `nx * x + ny * y = offset`, where `(nx, ny)` is the normal of `dir`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctLine {
    pub dir: OctDir,
    pub offset: i64,
}

impl OctLine {
    /// The line facing `dir` at perpendicular distance `apothem` from the origin.
    ///
    /// For diagonal directions the offset is `apothem * sqrt(2)` snapped to `grid`.
    pub fn at_apothem(dir: OctDir, apothem: i64, grid: i64) -> Self {
        let offset = if dir.is_diagonal() {
            snap_to_grid((apothem as f64 * SQRT_2).round() as i64, grid)
        } else {
            apothem
        };
        Self { dir, offset }
    }

    /// Returns the point where this line meets a line whose direction is
    /// 45 degrees away from it.
    ///
    /// Exactly one of the two lines is diagonal, so the intersection is exact.
    pub fn corner(&self, other: &OctLine) -> Point {
        let (a1, b1) = self.dir.normal();
        let (a2, b2) = other.dir.normal();
        let det = a1 * b2 - a2 * b1;
        debug_assert!(det == 1 || det == -1, "lines must be 45 degrees apart");

        // 1 / det == det for det in {-1, 1}.
        let x = (self.offset * b2 - other.offset * b1) * det;
        let y = (a1 * other.offset - a2 * self.offset) * det;
        Point::new(x, y)
    }
}

/// The eight edge lines of an octagon with equal apothems, counter-clockwise from east.
pub fn octagon_lines(apothem: i64, grid: i64) -> [OctLine; 8] {
    OctDir::ALL.map(|dir| OctLine::at_apothem(dir, apothem, grid))
}

/// A regular octagon centered on the origin with distance `across_flats` between opposite edges.
///
/// Each edge is `across_flats / (1 + sqrt(2))` long up to grid rounding.
/// Vertices are counter-clockwise, starting from the lower end of the east edge,
/// `(across_flats / 2, -side / 2)`.
///
/// `across_flats` should be a multiple of twice the grid for the vertices to land on the grid.
pub fn regular_octagon(across_flats: i64, grid: i64) -> Polygon {
    let lines = octagon_lines(across_flats / 2, grid);
    let points = (0..8)
        .map(|k| lines[(k + 7) % 8].corner(&lines[k]))
        .collect();
    Polygon::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShapeTrait;

    fn is_manhattan_or_45(poly: &Polygon) -> bool {
        let n = poly.points.len();
        (0..n).all(|i| {
            let d = poly.points[(i + 1) % n] - poly.points[i];
            d.x == 0 || d.y == 0 || d.x.abs() == d.y.abs()
        })
    }

    #[test]
    fn octagon_vertices() {
        let oct = regular_octagon(68_000, 5);
        assert_eq!(oct.points.len(), 8);
        // 34000 * sqrt(2) = 48083.3, snapped to 48085.
        assert_eq!(oct.points[0], Point::new(34_000, -14_085));
        assert_eq!(oct.points[1], Point::new(34_000, 14_085));
        assert_eq!(oct.points[2], Point::new(14_085, 34_000));
        assert_eq!(oct.points[4], Point::new(-34_000, 14_085));
        assert!(oct.is_ccw());
        assert!(is_manhattan_or_45(&oct));
        assert!(oct.points.iter().all(|p| p.is_on_grid(5)));
    }

    #[test]
    fn octagon_side_matches_regular_relation() {
        let d = 68_000;
        let oct = regular_octagon(d, 5);
        let side = (oct.points[1].y - oct.points[0].y) as f64;
        let expected = d as f64 / (1.0 + SQRT_2);
        assert!((side - expected).abs() < 10.0);
    }

    #[test]
    fn octagon_contains_center_but_not_corner_of_bounding_square() {
        let oct = regular_octagon(10_000, 5);
        assert!(oct.contains(Point::zero()));
        assert!(oct.contains(Point::new(5_000, 0)));
        assert!(!oct.contains(Point::new(4_900, 4_900)));
    }

    #[test]
    fn corner_of_axis_and_diagonal_lines() {
        let w = OctLine {
            dir: OctDir::W,
            offset: 1_000,
        };
        let sw = OctLine {
            dir: OctDir::SW,
            offset: 1_415,
        };
        // x = -1000, -x - y = 1415
        assert_eq!(w.corner(&sw), Point::new(-1_000, -415));
        assert_eq!(sw.corner(&w), Point::new(-1_000, -415));
    }
}
