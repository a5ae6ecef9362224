//! Bonding pads and rows of bonding pads.

use std::fmt::Display;
use std::str::FromStr;

use arcstr::ArcStr;
use derive_builder::Builder;
use itertools::Itertools;
use pcell::component::Component;
use pcell::data::PcellCtx;
use pcell::error::{ErrorSource, PcellError, Result};
use pcell::layout::cell::{Element, Port, PortOrientation};
use pcell::layout::context::LayoutCtx;
use pcell::layout::elements::via::{fit_via_array, ViaCounts};
use pcell::layout::group::ElementGroup;
use pcell::layout::layers::LayerKey;
use serde::{Deserialize, Serialize};
use sggeom::{snap_to_grid, Dims, Point, Polygon, Rect, Shape, ShapeTrait};

use crate::constants::{CIRCLE_POINTS, PAD_LOWER_METAL_SCALE, PAD_OPENING_SCALE, PAD_UBM_SCALE};
use crate::log::{debug, warn};
use crate::via_stack::{boundary_rule, metal_range, LayerOrderPolicy};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondpadShape {
    Octagon,
    Square,
    Circle,
}

impl BondpadShape {
    /// The pad outline of diameter `diameter` centered on the origin.
    ///
    /// `diameter` should be a multiple of twice the grid.
    pub fn outline(&self, diameter: i64, grid: i64) -> Shape {
        match self {
            BondpadShape::Octagon => sggeom::octagon::regular_octagon(diameter, grid).into(),
            BondpadShape::Square => {
                Rect::from_center_dims_gridded(Point::zero(), Dims::square(diameter), grid).into()
            }
            BondpadShape::Circle => Polygon::circle(diameter, CIRCLE_POINTS, grid).into(),
        }
    }
}

impl FromStr for BondpadShape {
    type Err = PcellError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "octagon" => Ok(Self::Octagon),
            "square" => Ok(Self::Square),
            "circle" => Ok(Self::Circle),
            _ => Err(ErrorSource::UnsupportedShape(s.to_string()).into()),
        }
    }
}

impl Display for BondpadShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Octagon => write!(f, "octagon"),
            Self::Square => write!(f, "square"),
            Self::Circle => write!(f, "circle"),
        }
    }
}

/// `diameter * scale`, rounded to twice the grid so the shape stays centered.
fn scaled(diameter: i64, scale: f64, grid: i64) -> i64 {
    snap_to_grid((diameter as f64 * scale).round() as i64, 2 * grid)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct BondpadParams {
    /// One of `octagon`, `square` or `circle`.
    #[builder(setter(into))]
    pub shape: ArcStr,
    /// Draw every metal from `bottom_metal` up to `top_metal`, joined by vias.
    pub stack_metals: bool,
    /// Add under-bump metallization.
    pub flip_chip: bool,
    /// Pad diameter in micrometers.
    pub diameter: f64,
    #[builder(setter(into))]
    pub top_metal: ArcStr,
    #[builder(setter(into))]
    pub bottom_metal: ArcStr,
}

impl Default for BondpadParams {
    fn default() -> Self {
        Self {
            shape: arcstr::literal!("octagon"),
            stack_metals: true,
            flip_chip: false,
            diameter: 68.0,
            top_metal: arcstr::literal!("TopMetal2"),
            bottom_metal: arcstr::literal!("Metal1"),
        }
    }
}

impl BondpadParams {
    #[inline]
    pub fn builder() -> BondpadParamsBuilder {
        BondpadParamsBuilder::default()
    }
}

pub struct Bondpad {
    params: BondpadParams,
    shape: BondpadShape,
    diameter: i64,
    /// Pad metals from the bottom of the stack to the top metal.
    metals: Vec<LayerKey>,
}

impl Bondpad {
    /// Draws the vias of every boundary, keeping only cuts whose enclosure
    /// lies inside `lower`.
    fn draw_vias(&self, ctx: &mut LayoutCtx, lower: &Polygon, region: Dims) -> Result<()> {
        let tech = ctx.inner().clone();
        let grid = ctx.grid();

        for (&bot, &top) in self.metals.iter().tuple_windows() {
            let Some((rule, via_layer)) = boundary_rule(&tech, bot, top)? else {
                continue;
            };
            let fit = fit_via_array(&rule, Some(region), ViaCounts::max());
            if fit.is_empty() {
                warn!("no {} via fits in a {}nm pad", rule.name, region.w());
                continue;
            }

            let enclosure = rule.enclosure();
            let cuts = fit.draw(&rule, via_layer, Point::zero(), grid);
            let total = cuts.len();
            let kept: Vec<Element> = cuts
                .into_iter()
                .filter(|e| {
                    e.shape()
                        .as_rect()
                        .map(|r| lower.contains_rect(&r.expand(enclosure)))
                        .unwrap_or(false)
                })
                .collect();
            debug!("kept {} of {} {} cuts inside the pad", kept.len(), total, rule.name);

            let mut group = ElementGroup::new();
            group.extend(kept);
            ctx.draw(group)?;
        }
        Ok(())
    }
}

impl Component for Bondpad {
    type Params = BondpadParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        let shape = params.shape.parse::<BondpadShape>()?;
        let diameter = ctx.snap_to(params.diameter, 2 * ctx.grid());
        if diameter <= 0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "pad diameter must be positive, got {}",
                params.diameter
            ))
            .into());
        }

        let layers = ctx.layers();
        let top = layers.by_name(&params.top_metal)?;
        // A stack whose bottom is the top metal is a single-metal pad.
        let metals = if params.stack_metals && layers.by_name(&params.bottom_metal)? != top {
            metal_range(
                layers,
                &params.bottom_metal,
                &params.top_metal,
                LayerOrderPolicy::Strict,
            )?
        } else {
            layers.which_metal(top)?;
            vec![top]
        };

        Ok(Self {
            params: params.clone(),
            shape,
            diameter,
            metals,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("bondpad_{}_{}", self.shape, self.diameter)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let tech = ctx.inner().clone();
        let layers = tech.layers();
        let grid = ctx.grid();
        let d = self.diameter;

        let (&top, lower) = self
            .metals
            .split_last()
            .ok_or_else(|| ErrorSource::InvalidArgs("bondpad needs a top metal".into()))?;

        ctx.draw_shape(top, self.shape.outline(d, grid));

        if !lower.is_empty() {
            let lower_d = scaled(d, PAD_LOWER_METAL_SCALE, grid);
            let lower_shape = self.shape.outline(lower_d, grid);
            for &metal in lower {
                ctx.draw_shape(metal, lower_shape.clone());
            }
            self.draw_vias(ctx, &lower_shape.to_poly(), Dims::square(lower_d))?;
        }

        let passiv = layers.by_name("Passiv")?;
        ctx.draw_shape(
            passiv,
            self.shape.outline(scaled(d, PAD_OPENING_SCALE, grid), grid),
        );

        if self.params.flip_chip {
            let ubm = layers.by_name("UBM")?;
            let ubm_shape = match self.shape {
                BondpadShape::Circle => BondpadShape::Circle,
                _ => BondpadShape::Square,
            };
            ctx.draw_shape(ubm, ubm_shape.outline(scaled(d, PAD_UBM_SCALE, grid), grid));
        }

        ctx.add_port(Port::new("pad", top, Point::zero(), d, PortOrientation::R0))?;

        ctx.set_metadata("shape", self.shape)?;
        ctx.set_metadata("diameter", tech.to_user(d))?;
        ctx.set_metadata("stack_metals", self.params.stack_metals)?;
        ctx.set_metadata("flip_chip", self.params.flip_chip)?;
        ctx.set_metadata("top_metal", &self.params.top_metal)?;
        ctx.set_metadata("bottom_metal", &self.params.bottom_metal)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct BondpadArrayParams {
    pub n_pads: usize,
    /// Center-to-center pad distance in micrometers.
    pub pad_pitch: f64,
    /// Pad diameter in micrometers.
    pub pad_diameter: f64,
    #[builder(setter(into))]
    pub shape: ArcStr,
    pub stack_metals: bool,
}

impl Default for BondpadArrayParams {
    fn default() -> Self {
        Self {
            n_pads: 4,
            pad_pitch: 100.0,
            pad_diameter: 68.0,
            shape: arcstr::literal!("octagon"),
            stack_metals: true,
        }
    }
}

impl BondpadArrayParams {
    #[inline]
    pub fn builder() -> BondpadArrayParamsBuilder {
        BondpadArrayParamsBuilder::default()
    }
}

/// A row of identical pads along the x axis, the first centered on the origin.
pub struct BondpadArray {
    params: BondpadArrayParams,
    pitch: i64,
}

impl Component for BondpadArray {
    type Params = BondpadArrayParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        params.shape.parse::<BondpadShape>()?;
        let pitch = ctx.snap(params.pad_pitch);
        if params.n_pads == 0 || pitch <= 0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "a pad array needs at least one pad and a positive pitch, got {} pads at {}",
                params.n_pads, params.pad_pitch
            ))
            .into());
        }
        Ok(Self {
            params: params.clone(),
            pitch,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("bondpad_array_{}", self.params.n_pads)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let pad = ctx.instantiate::<Bondpad>(&BondpadParams {
            shape: self.params.shape.clone(),
            stack_metals: self.params.stack_metals,
            diameter: self.params.pad_diameter,
            ..Default::default()
        })?;

        for i in 0..self.params.n_pads {
            let name = arcstr::format!("pad_{}", i + 1);
            let mut inst = pad.clone();
            inst.set_loc(Point::new(i as i64 * self.pitch, 0));
            inst.set_name(name.clone());
            let port = inst.port("pad")?.named(name);
            ctx.add_instance(inst);
            ctx.add_port(port)?;
        }

        let tech = ctx.inner().clone();
        ctx.set_metadata("n_pads", self.params.n_pads)?;
        ctx.set_metadata("pad_pitch", tech.to_user(self.pitch))?;
        ctx.set_metadata("pad_diameter", self.params.pad_diameter)?;
        Ok(())
    }
}
