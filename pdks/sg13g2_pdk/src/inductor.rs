//! Octagonal spiral inductors.
//!
//! The coil is a single polygon traced along 0, 45 and 90 degree lines. Edge `j`
//! faces direction `W + j * 45` degrees counter-clockwise. The trace starts on
//! the west side of ring 0, runs counter-clockwise and moves out by one pitch on
//! every north-east edge, so edge `j` lies on ring `(j + 2) / 8`. A coil of `n`
//! turns makes `n + 1/2` revolutions and ends on the east side of ring `n`,
//! so both leads leave along the x axis and the inner lead crosses the outer
//! rings on the underpass metal.

use arcstr::ArcStr;
use derive_builder::Builder;
use pcell::component::Component;
use pcell::data::PcellCtx;
use pcell::error::{ErrorSource, Result};
use pcell::layout::cell::{Port, PortOrientation};
use pcell::layout::context::LayoutCtx;
use pcell::layout::layers::LayerKey;
use serde::{Deserialize, Serialize};
use sggeom::bbox::BoundBox;
use sggeom::octagon::{OctDir, OctLine};
use sggeom::{snap_up_to_grid, Point, Polygon, Rect, Span};

use crate::constants::{INDUCTOR_LEAD_LENGTH, INDUCTOR_MARKER_MARGIN};
use crate::log::{debug, warn};
use crate::via_stack::{draw_via_column, metal_range, LayerOrderPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct InductorParams {
    #[builder(setter(into))]
    pub model: ArcStr,
    /// Trace width in micrometers.
    pub width: f64,
    /// Spacing between adjacent turns in micrometers.
    pub space: f64,
    /// Inner diameter, across flats, in micrometers.
    pub diameter: f64,
    pub turns: usize,
    /// Draw the extraction block marker.
    pub block_qrc: bool,
    /// Draw the substrate etch marker.
    pub sub_etch: bool,
    /// Length of each lead past the outermost turn in micrometers.
    pub lead_length: f64,
    /// The coil metal.
    #[builder(setter(into))]
    pub metal: ArcStr,
    /// The metal carrying the inner lead under the turns.
    #[builder(setter(into))]
    pub underpass: ArcStr,
}

impl Default for InductorParams {
    fn default() -> Self {
        Self {
            model: arcstr::literal!("inductor2"),
            width: 2.0,
            space: 2.1,
            diameter: 15.48,
            turns: 1,
            block_qrc: true,
            sub_etch: false,
            lead_length: INDUCTOR_LEAD_LENGTH,
            metal: arcstr::literal!("TopMetal2"),
            underpass: arcstr::literal!("TopMetal1"),
        }
    }
}

impl InductorParams {
    #[inline]
    pub fn builder() -> InductorParamsBuilder {
        InductorParamsBuilder::default()
    }
}

/// The smallest inner diameter that leaves room for `turns` turns and the leads.
pub fn min_diameter(turns: usize, width: i64, space: i64, grid: i64) -> i64 {
    snap_up_to_grid(2 * turns as i64 * (width + space) + 4 * width, 2 * grid)
}

/// Spiral dimensions in layout units.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Spiral {
    pub width: i64,
    pub space: i64,
    /// Inner diameter; a multiple of twice the grid.
    pub diameter: i64,
    /// Full turns; the trace makes half a revolution more.
    pub turns: usize,
    pub grid: i64,
}

impl Spiral {
    #[inline]
    fn pitch(&self) -> i64 {
        self.width + self.space
    }

    /// Apothem of the inner edge of ring `ring`.
    #[inline]
    pub fn inner(&self, ring: usize) -> i64 {
        self.diameter / 2 + ring as i64 * self.pitch()
    }

    /// Apothem of the outer edge of ring `ring`.
    #[inline]
    pub fn outer(&self, ring: usize) -> i64 {
        self.inner(ring) + self.width
    }

    /// The outermost ring, which carries the outer lead.
    #[inline]
    pub fn last_ring(&self) -> usize {
        self.turns
    }

    fn n_edges(&self) -> usize {
        8 * self.turns + 5
    }

    fn edge(&self, j: usize, outer: bool) -> OctLine {
        let ring = (j + 2) / 8;
        let apothem = if outer { self.outer(ring) } else { self.inner(ring) };
        OctLine::at_apothem(OctDir::from_index(OctDir::W.index() + j), apothem, self.grid)
    }

    /// The vertical extent of the leads, centered on the x axis.
    pub fn lead_span(&self) -> Span {
        Span::from_center_span_gridded(0, self.width, self.grid)
    }

    /// The coil outline, counter-clockwise.
    ///
    /// The outer boundary runs from the start of the trace to its end and the
    /// inner boundary runs back. Both ends are cut flat at the top of the lead span.
    pub fn coil(&self) -> Polygon {
        let n = self.n_edges();
        let top = self.lead_span().stop();
        let last = self.last_ring();

        let mut points = Vec::with_capacity(2 * n + 2);
        points.push(Point::new(-self.outer(0), top));
        points.extend((0..n - 1).map(|j| self.edge(j, true).corner(&self.edge(j + 1, true))));
        points.push(Point::new(self.outer(last), top));
        points.push(Point::new(self.inner(last), top));
        points.extend(
            (0..n - 1)
                .rev()
                .map(|j| self.edge(j, false).corner(&self.edge(j + 1, false))),
        );
        points.push(Point::new(-self.inner(0), top));
        Polygon::new(points)
    }
}

pub struct Inductor {
    params: InductorParams,
    spiral: Spiral,
    lead: i64,
    metal: LayerKey,
    underpass: LayerKey,
    /// The metals from the underpass up to the coil metal.
    crossing: Vec<LayerKey>,
}

impl Component for Inductor {
    type Params = InductorParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        if params.turns == 0 {
            return Err(ErrorSource::InvalidArgs("an inductor needs at least one turn".into()).into());
        }
        let grid = ctx.grid();
        let layers = ctx.layers();
        let metal = layers.by_name(&params.metal)?;
        layers.which_metal(metal)?;

        let (min_w, min_s) = ctx
            .rules()
            .metal(&params.metal)
            .map(|m| (m.min_width, m.min_space))
            .unwrap_or((grid, grid));
        let width = ctx.snap(params.width);
        let space = ctx.snap(params.space);
        if width < min_w || space < min_s {
            debug!(
                "raising inductor width/space from {}/{} to {}/{}",
                width,
                space,
                width.max(min_w),
                space.max(min_s)
            );
        }
        let (width, space) = (width.max(min_w), space.max(min_s));

        let min_d = min_diameter(params.turns, width, space, grid);
        let mut diameter = ctx.snap_to(params.diameter, 2 * grid);
        if diameter < min_d {
            debug!("inductor diameter {diameter} is below the minimum, using {min_d}");
            diameter = min_d;
        }

        let lead = ctx.snap(params.lead_length);
        if lead < 0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "lead length must not be negative, got {}",
                params.lead_length
            ))
            .into());
        }

        let crossing = metal_range(layers, &params.underpass, &params.metal, LayerOrderPolicy::Strict)?;
        let underpass = layers.by_name(&params.underpass)?;

        Ok(Self {
            params: params.clone(),
            spiral: Spiral {
                width,
                space,
                diameter,
                turns: params.turns,
                grid,
            },
            lead,
            metal,
            underpass,
            crossing,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("{}_{}t", self.params.model, self.params.turns)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let tech = ctx.inner().clone();
        let layers = tech.layers();
        let s = &self.spiral;
        let band = s.lead_span();

        let coil = s.coil();
        let outline = coil
            .bbox()
            .into_rect()
            .ok_or_else(|| ErrorSource::InvalidLayout("empty inductor coil".into()))?;
        ctx.draw_poly(self.metal, coil);

        let last = s.last_ring();
        let reach = s.outer(last) + self.lead;
        let lead_rect = |x0: i64, x1: i64| Rect::from_spans(Span::new(x0, x1), band);

        ctx.draw_rect(self.metal, lead_rect(s.inner(last), reach));
        ctx.draw_rect(self.underpass, lead_rect(-reach, -s.inner(0)));
        let landing = lead_rect(-s.outer(0), -s.inner(0));
        let connected = draw_via_column(ctx, &self.crossing, landing)?;
        if connected + 1 < self.crossing.len() {
            warn!("inductor underpass is not fully connected to the coil");
        }

        ctx.draw_rect(layers.by_name("IND")?, outline);
        if self.params.block_qrc {
            ctx.draw_rect(layers.by_name("NoQRC")?, outline.expand(INDUCTOR_MARKER_MARGIN));
        }
        if self.params.sub_etch {
            ctx.draw_rect(layers.by_name("LBE")?, outline.expand(2 * INDUCTOR_MARKER_MARGIN));
        }

        ctx.add_port(Port::new(
            "P1",
            self.underpass,
            Point::new(-reach, 0),
            s.width,
            PortOrientation::R180,
        ))?;
        ctx.add_port(Port::new(
            "P2",
            self.metal,
            Point::new(reach, 0),
            s.width,
            PortOrientation::R0,
        ))?;

        ctx.set_metadata("model", &self.params.model)?;
        ctx.set_metadata("turns", s.turns)?;
        ctx.set_metadata("width", tech.to_user(s.width))?;
        ctx.set_metadata("space", tech.to_user(s.space))?;
        ctx.set_metadata("diameter", tech.to_user(s.diameter))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiral(turns: usize, diameter: i64) -> Spiral {
        Spiral {
            width: 2_000,
            space: 2_100,
            diameter,
            turns,
            grid: 5,
        }
    }

    fn edges_are_octilinear(poly: &Polygon) -> bool {
        let n = poly.points.len();
        (0..n).all(|i| {
            let d = poly.points[(i + 1) % n] - poly.points[i];
            d.x == 0 || d.y == 0 || d.x.abs() == d.y.abs()
        })
    }

    fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
        let (px, py) = (p.x as f64, p.y as f64);
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
        let len2 = dx * dx + dy * dy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
        };
        (px - (ax + t * dx)).hypot(py - (ay + t * dy))
    }

    /// The smallest distance from the vertices `ends` to any edge of `poly`
    /// that touches none of them.
    fn clearance(poly: &Polygon, ends: &[usize]) -> f64 {
        let n = poly.points.len();
        let touches = |i: usize| ends.contains(&i) || ends.contains(&((i + 1) % n));
        ends.iter()
            .flat_map(|&e| {
                (0..n)
                    .filter(move |&i| !touches(i))
                    .map(move |i| segment_distance(poly.points[e], poly.points[i], poly.points[(i + 1) % n]))
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn min_diameter_matches_formula() {
        assert_eq!(min_diameter(2, 2_000, 2_100, 5), 24_400);
        assert_eq!(min_diameter(1, 2_005, 2_100, 5), 16_230);
    }

    #[test]
    fn single_turn_is_a_full_ring() {
        let s = spiral(1, 16_200);
        let coil = s.coil();
        // 13 edges: one closed ring and the half revolution out to the east side.
        assert_eq!(coil.points.len(), 28);
        assert!(coil.is_ccw());
        assert!(edges_are_octilinear(&coil));
        assert!(coil.points.iter().all(|p| p.is_on_grid(5)));

        let bbox = coil.bbox();
        assert_eq!(bbox.p1.y, s.outer(1));
        assert_eq!(bbox.p0.y, -s.outer(1));
        assert_eq!((bbox.p0.x, bbox.p1.x), (-s.outer(1), s.outer(1)));
    }

    #[test]
    fn multi_turn_coil() {
        for turns in 2..5 {
            let s = spiral(turns, 25_840);
            let coil = s.coil();
            assert_eq!(coil.points.len(), 2 * (8 * turns + 5) + 2);
            assert!(coil.is_ccw());
            assert!(edges_are_octilinear(&coil));
            let bbox = coil.bbox();
            assert_eq!(bbox.p0.x, -s.outer(turns));
            assert_eq!(bbox.p1.x, s.outer(turns));
            assert_eq!(bbox.p1.y, s.outer(turns));
        }
    }

    #[test]
    fn trace_ends_clear_the_rest_of_the_coil() {
        for turns in 1..5 {
            let min_d = min_diameter(turns, 2_000, 2_100, 5);
            for diameter in [min_d, 25_840.max(min_d), min_d + 10_000] {
                let coil = spiral(turns, diameter).coil();
                let n = coil.points.len();
                let end = n / 2 - 1;
                let start = clearance(&coil, &[0, n - 1]);
                let stop = clearance(&coil, &[end, end + 1]);
                assert!(start >= 2_100.0 - 1e-6, "turns={turns} d={diameter}: start {start}");
                assert!(stop >= 2_100.0 - 1e-6, "turns={turns} d={diameter}: end {stop}");
            }
        }
    }

    #[test]
    fn vertices_keep_width_and_space() {
        // Diagonal offsets are snapped to the grid, which may move an edge by
        // up to one grid step.
        for turns in 1..4 {
            let s = spiral(turns, min_diameter(turns, 2_000, 2_100, 5));
            let coil = s.coil();
            for v in 0..coil.points.len() {
                let d = clearance(&coil, &[v]);
                assert!(d >= 2_000.0 - 5.0, "turns={turns} vertex {v}: {d}");
            }
        }
    }
}
