//! Via layout generators.
//!
//! These generators size and draw rectangular arrays of via cuts.

use sggeom::transform::TranslateOwned;
use sggeom::{Dims, Dir, Point, Rect};

use crate::layout::group::ElementGroup;
use crate::layout::layers::LayerKey;
use crate::pdk::rules::ViaRule;

/// Values that come in pairs, one for the bottom metal and one for the top metal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Pair<T> {
    pub bot: T,
    pub top: T,
}

impl<T> Pair<T> {
    pub fn new(bot: T, top: T) -> Self {
        Self { bot, top }
    }
}

/// Dimensions relevant to creating a tiled via array.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ViaArrayDims {
    /// Extension of each metal layer beyond the edge of the via array.
    extension: Pair<Dims>,
    /// Dimensions of each drawn via.
    via_size: Dims,
    /// Spacing between vias.
    via_spacing: Dims,
}

impl ViaArrayDims {
    /// Creates a new [`ViaArrayDims`] struct storing the given dimensions.
    pub fn new(bot_extension: Dims, top_extension: Dims, via_size: Dims, via_spacing: Dims) -> Self {
        Self {
            extension: Pair::new(bot_extension, top_extension),
            via_size,
            via_spacing,
        }
    }

    /// Square cuts of `rule`, spaced `spacing` apart and extended by the rule's enclosures.
    pub fn from_rule(rule: &ViaRule, spacing: i64) -> Self {
        Self::new(
            Dims::square(rule.bot_enclosure),
            Dims::square(rule.top_enclosure),
            Dims::square(rule.size),
            Dims::square(spacing),
        )
    }

    #[inline]
    pub fn via_size(&self) -> Dims {
        self.via_size
    }

    #[inline]
    pub fn via_spacing(&self) -> Dims {
        self.via_spacing
    }

    /// Returns the sizes on each metal layer of an `nx` by `ny` via array
    /// centered (up to rounding) on the origin.
    pub fn size(&self, nx: usize, ny: usize) -> Pair<Rect> {
        let array = self.array_dims(nx, ny);
        let base = Rect::from_center_dims_gridded(Point::zero(), array, 1);
        Pair::new(
            base.expand_dims(self.extension.bot),
            base.expand_dims(self.extension.top),
        )
    }

    /// Calculates the size of the via layer bounding box.
    ///
    /// Does not consider extension on the top/bottom metal layers.
    pub fn array_dims(&self, nx: usize, ny: usize) -> Dims {
        debug_assert!(nx >= 1);
        debug_assert!(ny >= 1);

        let (nx, ny) = (nx as i64, ny as i64);
        Dims::new(
            self.via_size.w() * nx + self.via_spacing.w() * (nx - 1),
            self.via_size.h() * ny + self.via_spacing.h() * (ny - 1),
        )
    }

    /// Calculates the maximum number of vias that can be tiled along the given direction
    /// inside metal of length `len`, honoring the extension on both metal layers.
    pub fn max_n_metal(&self, dir: Dir, len: i64) -> usize {
        let line_and_space = self.via_size.dim(dir) + self.via_spacing.dim(dir);
        let ext = self
            .extension
            .bot
            .dim(dir)
            .max(self.extension.top.dim(dir));

        // The max number of contacts that can be placed within the metal bounding box.
        let max = (len + self.via_spacing.dim(dir) - 2 * ext) / line_and_space;

        if max >= 1 {
            usize::try_from(max).unwrap_or(usize::MAX)
        } else {
            0
        }
    }
}

/// A via array of fixed size.
///
/// The [`draw`](FixedSizeViaArray::draw) method draws the via
/// cuts and centers them at `(0, 0)`.
pub struct FixedSizeViaArray {
    dims: ViaArrayDims,

    /// Width of the via array (in number of vias).
    nx: usize,
    /// Height of the via array (in number of vias).
    ny: usize,

    /// The via layer.
    via_layer: LayerKey,

    /// Layout database grid size as determined by the PDK.
    grid: i64,
}

impl FixedSizeViaArray {
    pub fn new(dims: ViaArrayDims, nx: usize, ny: usize, via_layer: LayerKey, grid: i64) -> Self {
        Self {
            dims,
            nx,
            ny,
            via_layer,
            grid,
        }
    }

    /// Draws the via cuts, returning an [`ElementGroup`].
    ///
    /// Returns an empty group if either count is zero.
    pub fn draw(&self) -> ElementGroup {
        let mut group = ElementGroup::new();
        if self.nx == 0 || self.ny == 0 {
            return group;
        }

        let pitch = self.dims.via_size + self.dims.via_spacing;
        for i in 0..self.nx as i64 {
            for j in 0..self.ny as i64 {
                let base = Point::new(pitch.w() * i, pitch.h() * j);
                let via = self.dims.via_size.into_rect().translate_owned(base);
                group.add_shape(self.via_layer, via);
            }
        }

        group.align_centers_gridded(Point::zero(), self.grid);
        group
    }
}

#[cfg(test)]
mod tests {
    use sggeom::bbox::BoundBox;
    use slotmap::SlotMap;

    use super::*;

    fn dims() -> ViaArrayDims {
        ViaArrayDims::new(
            Dims::square(50),
            Dims::square(50),
            Dims::square(190),
            Dims::square(220),
        )
    }

    #[test]
    fn array_dims_and_fit_agree() {
        let dims = dims();
        assert_eq!(dims.array_dims(3, 1), Dims::new(1010, 190));
        // 1010 + 2 * 50
        assert_eq!(dims.max_n_metal(Dir::Horiz, 1110), 3);
        assert_eq!(dims.max_n_metal(Dir::Horiz, 1109), 2);
        assert_eq!(dims.max_n_metal(Dir::Horiz, 200), 0);
    }

    #[test]
    fn metal_size_includes_enclosure() {
        let sizes = dims().size(2, 2);
        assert_eq!(sizes.bot.dims(), Dims::square(2 * 190 + 220 + 100));
        assert_eq!(sizes.top, sizes.bot);
    }

    #[test]
    fn draws_centered_cuts() {
        let mut sm: SlotMap<LayerKey, ()> = SlotMap::with_key();
        let via = sm.insert(());
        let group = FixedSizeViaArray::new(dims(), 2, 3, via, 5).draw();
        assert_eq!(group.len(), 6);
        let bbox = group.bbox().into_rect().unwrap();
        assert_eq!(bbox.dims(), dims().array_dims(2, 3));
        assert!(bbox.center().x.abs() <= 5 && bbox.center().y.abs() <= 5);
        assert!(group.elements().all(|e| e.inner.is_on_grid(5)));
    }
}
