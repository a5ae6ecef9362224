//! The `ElementGroup` type for grouping `Element`s.
//!
//! For cases when you want a collection of shapes,
//! but you don't want to create a separate [`Component`](crate::component::Component).

use sggeom::bbox::{Bbox, BoundBox};
use sggeom::transform::{Translate, TranslateOwned};
use sggeom::{snap_to_grid, Point, Shape};

use super::cell::Element;
use super::layers::{LayerBoundBox, LayerKey, LayerSpec};

/// A group of layout [`Element`]s.
///
/// Cannot contain instances of cells.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ElementGroup {
    /// Translates all elements in the group by an offset.
    loc: Point,
    /// The list of [`Element`]s in this group.
    elems: Vec<Element>,
}

impl ElementGroup {
    /// Creates a new, empty [`ElementGroup`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the origin of this group.
    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }

    /// Sets the position of this group.
    #[inline]
    pub fn set_loc(&mut self, p: impl Into<Point>) {
        self.loc = p.into();
    }

    /// Adds a single [`Element`] to this group.
    #[inline]
    pub fn add(&mut self, elt: impl Into<Element>) {
        self.elems.push(elt.into());
    }

    /// Adds a shape on the drawing purpose of `layer`.
    pub fn add_shape(&mut self, layer: LayerKey, shape: impl Into<Shape>) {
        self.elems
            .push(Element::new(LayerSpec::drawing(layer), shape.into()));
    }

    /// Adds all elements in the given iterator to this element group.
    #[inline]
    pub fn extend(&mut self, elems: impl IntoIterator<Item = Element>) {
        self.elems.extend(elems);
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Returns an iterator over the elements in this group **after translation**.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        let loc = self.loc;
        self.elems.iter().map(move |e| e.clone().translate_owned(loc))
    }

    /// Translates the group so that its bounding box center
    /// lands on the center of `target`, snapped to `grid`.
    ///
    /// Does nothing if either bounding box is empty.
    pub fn align_centers_gridded(&mut self, target: impl BoundBox, grid: i64) {
        let (src, dst) = (self.bbox(), target.bbox());
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let dx = (dst.p0.x + dst.p1.x - src.p0.x - src.p1.x) / 2;
        let dy = (dst.p0.y + dst.p1.y - src.p0.y - src.p1.y) / 2;
        self.translate(Point::new(snap_to_grid(dx, grid), snap_to_grid(dy, grid)));
    }
}

impl IntoIterator for ElementGroup {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        let loc = self.loc;
        self.elems
            .into_iter()
            .map(|e| e.translate_owned(loc))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl BoundBox for ElementGroup {
    fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::empty();
        for elem in self.elements() {
            bbox = elem.inner.union(bbox);
        }
        bbox
    }
}

impl Translate for ElementGroup {
    #[inline]
    fn translate(&mut self, p: Point) {
        self.loc.translate(p);
    }
}

impl LayerBoundBox for ElementGroup {
    fn layer_bbox(&self, key: LayerKey) -> Bbox {
        let mut bbox = Bbox::empty();
        for elem in self.elements() {
            if elem.layer.layer() == key {
                bbox = bbox.union(elem.bbox());
            }
        }
        bbox
    }
}
