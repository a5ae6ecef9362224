//! Translation traits.
//!
//! Instances are placed by translation only, so no rotation or reflection is modeled.

use super::{Point, Rect};

/// A trait for specifying how a shape is translated by a [`Point`].
pub trait Translate {
    /// Translates the shape by a [`Point`] through mutation.
    fn translate(&mut self, p: Point);
}

/// A trait for specifying how a shape is translated by a [`Point`].
pub trait TranslateOwned {
    /// Consumes and translates the shape by a [`Point`], returning the new shape.
    fn translate_owned(self, p: Point) -> Self
    where
        Self: Sized;
}

impl<T: Translate> TranslateOwned for T {
    fn translate_owned(mut self, p: Point) -> Self {
        self.translate(p);
        self
    }
}

impl Translate for Point {
    fn translate(&mut self, p: Point) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl Translate for Rect {
    fn translate(&mut self, p: Point) {
        self.p0.translate(p);
        self.p1.translate(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Polygon, Shape};

    #[test]
    fn translate_shapes() {
        let rect = Rect::new(Point::new(0, 0), Point::new(10, 10));
        assert_eq!(
            rect.translate_owned(Point::new(5, -5)),
            Rect::new(Point::new(5, -5), Point::new(15, 5))
        );

        let shape = Shape::Polygon(Polygon::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(0, 10),
        ]));
        let moved = shape.translate_owned(Point::new(100, 0));
        assert_eq!(
            moved.as_poly().map(|p| p.points[1]),
            Some(Point::new(110, 0))
        );
    }
}
