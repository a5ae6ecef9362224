//! Layout views: cells, instances, ports, layers and the drawing context.

pub mod cell;
pub mod context;
pub mod elements;
pub mod group;
pub mod layers;

use self::cell::Element;
use self::group::ElementGroup;

/// A trait implemented by objects that can be drawn
/// inside a layout cell's context.
pub trait Draw {
    /// Draws the object.
    fn draw(self) -> crate::error::Result<ElementGroup>;
}

impl Draw for ElementGroup {
    fn draw(self) -> crate::error::Result<ElementGroup> {
        Ok(self)
    }
}

impl Draw for Element {
    fn draw(self) -> crate::error::Result<ElementGroup> {
        let mut group = ElementGroup::new();
        group.add(self);
        Ok(group)
    }
}
