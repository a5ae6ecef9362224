//! Utilities and types for fitting and drawing via arrays.

use serde::{Deserialize, Serialize};
use sggeom::{snap_up_to_grid, Dims, Dir, Point};

use self::generators::{FixedSizeViaArray, ViaArrayDims};
use crate::layout::group::ElementGroup;
use crate::layout::layers::LayerKey;
use crate::log::debug;
use crate::pdk::rules::ViaRule;

pub mod generators;

/// A requested number of vias.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct ViaCounts {
    pub columns: usize,
    pub rows: usize,
}

impl Default for ViaCounts {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl ViaCounts {
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    /// Requests as many vias as fit in both directions.
    pub const fn max() -> Self {
        Self::new(usize::MAX, usize::MAX)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }
}

/// The via array chosen for a region.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct ViaFit {
    /// Number of columns.
    pub nx: usize,
    /// Number of rows.
    pub ny: usize,
    /// Spacing between cuts.
    pub spacing: i64,
}

impl ViaFit {
    /// The total number of cuts.
    #[inline]
    pub fn count(&self) -> usize {
        self.nx * self.ny
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The array dimensions of this fit under `rule`.
    pub fn dims(&self, rule: &ViaRule) -> ViaArrayDims {
        ViaArrayDims::from_rule(rule, self.spacing)
    }

    /// The extent of the cuts, or [`None`] if the fit is empty.
    pub fn array_dims(&self, rule: &ViaRule) -> Option<Dims> {
        if self.is_empty() {
            None
        } else {
            Some(self.dims(rule).array_dims(self.nx, self.ny))
        }
    }

    /// Draws the cuts on `via_layer`, centered on `center` up to grid rounding.
    pub fn draw(&self, rule: &ViaRule, via_layer: LayerKey, center: Point, grid: i64) -> ElementGroup {
        let mut group = FixedSizeViaArray::new(self.dims(rule), self.nx, self.ny, via_layer, grid).draw();
        group.align_centers_gridded(center, grid);
        group
    }
}

fn candidate(
    rule: &ViaRule,
    spacing: i64,
    region: Option<Dims>,
    requested: ViaCounts,
    cap: Option<usize>,
) -> ViaFit {
    let dims = ViaArrayDims::from_rule(rule, spacing);
    let (mut nx, mut ny) = (requested.columns, requested.rows);
    if let Some(region) = region {
        nx = nx.min(dims.max_n_metal(Dir::Horiz, region.w()));
        ny = ny.min(dims.max_n_metal(Dir::Vert, region.h()));
    }
    if let Some(cap) = cap {
        nx = nx.min(cap);
        ny = ny.min(cap);
    }
    if nx == 0 || ny == 0 {
        (nx, ny) = (0, 0);
    }
    ViaFit { nx, ny, spacing }
}

/// Fits up to `requested` cuts of `rule` inside `region`, including enclosure.
///
/// When the rule has a dense spacing, arrays below the density threshold use
/// the normal spacing and larger arrays use the dense spacing; whichever
/// holds more cuts wins, so the result never decreases as the request grows.
/// Without a region the request is only adjusted for spacing.
///
/// Never fails; returns an empty fit if not a single cut fits.
pub fn fit_via_array(rule: &ViaRule, region: Option<Dims>, requested: ViaCounts) -> ViaFit {
    let fit = match rule.dense_space {
        Some(dense) => {
            let cap = rule.dense_threshold.saturating_sub(1);
            let normal = candidate(rule, rule.space, region, requested, Some(cap));
            let dense = candidate(rule, dense, region, requested, None);
            if dense.count() > normal.count() {
                dense
            } else {
                normal
            }
        }
        None => candidate(rule, rule.space, region, requested, None),
    };

    let clamped = |got: usize, req: usize| req != usize::MAX && got < req;
    if clamped(fit.nx, requested.columns) || clamped(fit.ny, requested.rows) {
        debug!(
            "clamped {} array from {}x{} to {}x{}",
            rule.name, requested.columns, requested.rows, fit.nx, fit.ny
        );
    }
    fit
}

/// Returns the enclosure needed so that `array_len` of cuts plus enclosure on
/// both sides is at least `min_width`, never less than `enclosure`.
pub fn enclosure_for_min_width(enclosure: i64, array_len: i64, min_width: i64, grid: i64) -> i64 {
    let needed = snap_up_to_grid(((min_width - array_len) + 1) / 2, grid);
    enclosure.max(needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn via1() -> ViaRule {
        ViaRule {
            name: arcstr::literal!("Via1"),
            bot: arcstr::literal!("Metal1"),
            top: arcstr::literal!("Metal2"),
            class: arcstr::literal!("vn"),
            size: 190,
            space: 220,
            dense_space: Some(290),
            dense_threshold: 4,
            bot_enclosure: 50,
            top_enclosure: 50,
            min_width_override: false,
        }
    }

    #[test]
    fn clamps_to_what_fits() {
        // Four cuts at dense spacing: 4 * 190 + 3 * 290 + 2 * 50.
        let region = Dims::new(1730, 290);
        let fit = fit_via_array(&via1(), Some(region), ViaCounts::new(100, 1));
        assert_eq!((fit.nx, fit.ny), (4, 1));
        assert_eq!(fit.spacing, 290);
    }

    #[test]
    fn small_arrays_use_normal_spacing() {
        let fit = fit_via_array(&via1(), None, ViaCounts::new(3, 2));
        assert_eq!((fit.nx, fit.ny, fit.spacing), (3, 2, 220));
        let fit = fit_via_array(&via1(), None, ViaCounts::new(4, 1));
        assert_eq!((fit.nx, fit.ny, fit.spacing), (4, 1, 290));
    }

    #[test]
    fn counts_are_monotonic() {
        let region = Dims::new(3000, 3000);
        let mut last = 0;
        for n in 1..20 {
            let fit = fit_via_array(&via1(), Some(region), ViaCounts::new(n, n));
            assert!(fit.count() >= last);
            last = fit.count();
        }
    }

    #[test]
    fn nothing_fits() {
        let fit = fit_via_array(&via1(), Some(Dims::new(200, 1000)), ViaCounts::new(2, 2));
        assert!(fit.is_empty());
        assert_eq!(fit.array_dims(&via1()), None);
    }

    #[test]
    fn enclosure_grows_to_min_width() {
        assert_eq!(enclosure_for_min_width(100, 420, 1640, 5), 610);
        assert_eq!(enclosure_for_min_width(500, 2860, 2000, 5), 500);
        // Odd remainders round up onto the grid.
        assert_eq!(enclosure_for_min_width(0, 995, 2000, 5), 505);
    }
}
