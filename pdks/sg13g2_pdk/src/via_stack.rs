//! Stacked vias between two metals, optionally flanked by contact pads.

use arcstr::ArcStr;
use derive_builder::Builder;
use itertools::Itertools;
use pcell::component::Component;
use pcell::data::PcellCtx;
use pcell::error::{ErrorSource, Result};
use pcell::layout::cell::{Port, PortOrientation};
use pcell::layout::context::LayoutCtx;
use pcell::layout::elements::via::{enclosure_for_min_width, fit_via_array, ViaCounts, ViaFit};
use pcell::layout::layers::{LayerKey, Layers};
use pcell::pdk::rules::ViaRule;
use serde::{Deserialize, Serialize};
use sggeom::{Dims, Point, Rect};

use crate::constants::PAD_TRACE_WIDTH;
use crate::log::{debug, warn};

/// What to do when the requested bottom layer is not below the top layer.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LayerOrderPolicy {
    /// Reject the request with [`ErrorSource::InvalidLayerOrder`].
    #[default]
    Strict,
    /// Exchange the two layers.
    Swap,
}

fn stack_position(layers: &Layers, stack: &[LayerKey], name: &str) -> Result<usize> {
    let key = layers.by_name(name)?;
    stack
        .iter()
        .position(|&k| k == key)
        .ok_or_else(|| ErrorSource::LayerNotFound(format!("{name} is not a metal layer")).into())
}

/// Returns the metals from `bottom` to `top`, both included.
///
/// Equal layers are always rejected; a reversed pair is rejected or swapped
/// according to `policy`.
pub(crate) fn metal_range(
    layers: &Layers,
    bottom: &str,
    top: &str,
    policy: LayerOrderPolicy,
) -> Result<Vec<LayerKey>> {
    let stack = layers.metal_stack();
    let mut lo = stack_position(layers, &stack, bottom)?;
    let mut hi = stack_position(layers, &stack, top)?;
    if lo > hi && policy == LayerOrderPolicy::Swap {
        debug!("swapping via stack layers {bottom} and {top}");
        std::mem::swap(&mut lo, &mut hi);
    }
    if lo >= hi {
        return Err(ErrorSource::InvalidLayerOrder {
            bottom: bottom.into(),
            top: top.into(),
        }
        .into());
    }
    Ok(stack[lo..=hi].to_vec())
}

/// The minimum width of metal `name`, or zero if the rule table has none.
pub(crate) fn min_width(ctx: &PcellCtx, name: &str) -> i64 {
    ctx.rules().metal(name).map(|m| m.min_width).unwrap_or(0)
}

/// The via between two adjacent metals and its layer, if the rule table defines one.
pub(crate) fn boundary_rule(
    ctx: &PcellCtx,
    bot: LayerKey,
    top: LayerKey,
) -> Result<Option<(ViaRule, LayerKey)>> {
    let layers = ctx.layers();
    let (bot_name, top_name) = (layers.name(bot)?, layers.name(top)?);
    match ctx.rules().via_between(bot_name, top_name) {
        Some(rule) => Ok(Some((rule.clone(), layers.by_name(&rule.name)?))),
        None => {
            debug!("no via between {bot_name} and {top_name}, skipping boundary");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct ViaStackParams {
    #[builder(setter(into))]
    pub bottom_layer: ArcStr,
    #[builder(setter(into))]
    pub top_layer: ArcStr,
    /// Footprint in micrometers.
    ///
    /// Without a footprint every metal is sized from the vias touching it.
    pub size: Option<(f64, f64)>,
    /// Requested counts for Via1 through Via4.
    pub vn: ViaCounts,
    /// Requested counts for TopVia1.
    pub vt1: ViaCounts,
    /// Requested counts for TopVia2.
    pub vt2: ViaCounts,
    pub order: LayerOrderPolicy,
}

impl Default for ViaStackParams {
    fn default() -> Self {
        Self {
            bottom_layer: arcstr::literal!("Metal1"),
            top_layer: arcstr::literal!("Metal2"),
            size: Some((10.0, 10.0)),
            vn: ViaCounts::new(2, 2),
            vt1: ViaCounts::new(1, 1),
            vt2: ViaCounts::new(1, 1),
            order: LayerOrderPolicy::Strict,
        }
    }
}

impl ViaStackParams {
    #[inline]
    pub fn builder() -> ViaStackParamsBuilder {
        ViaStackParamsBuilder::default()
    }

    /// The counts requested for vias of class `class`.
    ///
    /// Classes without a request get as many vias as fit.
    pub fn counts(&self, class: &str) -> ViaCounts {
        match class {
            "vn" => self.vn,
            "vt1" => self.vt1,
            "vt2" => self.vt2,
            _ => ViaCounts::max(),
        }
    }
}

/// Via counts chosen for one boundary of a stack.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BoundaryVias {
    pub via: ArcStr,
    pub columns: usize,
    pub rows: usize,
}

struct Boundary {
    rule: ViaRule,
    via_layer: LayerKey,
    fit: ViaFit,
    array: Dims,
    bot_enclosure: i64,
    top_enclosure: i64,
}

pub struct ViaStack {
    params: ViaStackParams,
    metals: Vec<LayerKey>,
    footprint: Option<Dims>,
}

impl ViaStack {
    fn plan_boundary(&self, ctx: &PcellCtx, bot: LayerKey, top: LayerKey) -> Result<Option<Boundary>> {
        let Some((rule, via_layer)) = boundary_rule(ctx, bot, top)? else {
            return Ok(None);
        };
        let fit = fit_via_array(&rule, self.footprint, self.params.counts(&rule.class));
        let Some(array) = fit.array_dims(&rule) else {
            warn!(
                "no {} via fits in the {:?} footprint, skipping boundary",
                rule.name, self.footprint
            );
            return Ok(None);
        };

        let (mut bot_enclosure, mut top_enclosure) = (rule.bot_enclosure, rule.top_enclosure);
        if rule.min_width_override {
            let layers = ctx.layers();
            let (grid, span) = (ctx.grid(), array.w().min(array.h()));
            bot_enclosure =
                enclosure_for_min_width(bot_enclosure, span, min_width(ctx, layers.name(bot)?), grid);
            top_enclosure =
                enclosure_for_min_width(top_enclosure, span, min_width(ctx, layers.name(top)?), grid);
            if (bot_enclosure, top_enclosure) != (rule.bot_enclosure, rule.top_enclosure) {
                debug!(
                    "enlarged {} enclosure to {}/{} to meet minimum metal width",
                    rule.name, bot_enclosure, top_enclosure
                );
            }
        }

        Ok(Some(Boundary {
            rule,
            via_layer,
            fit,
            array,
            bot_enclosure,
            top_enclosure,
        }))
    }
}

impl Component for ViaStack {
    type Params = ViaStackParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        for (class, counts) in [("vn", params.vn), ("vt1", params.vt1), ("vt2", params.vt2)] {
            if counts.is_zero() {
                return Err(ErrorSource::InvalidArgs(format!(
                    "{class} via counts must be at least 1x1, got {}x{}",
                    counts.columns, counts.rows
                ))
                .into());
            }
        }
        let metals = metal_range(
            ctx.layers(),
            &params.bottom_layer,
            &params.top_layer,
            params.order,
        )?;
        let footprint = match params.size {
            Some((w, h)) => {
                let dims = Dims::new(ctx.snap(w), ctx.snap(h));
                if dims.w() <= 0 || dims.h() <= 0 {
                    return Err(ErrorSource::InvalidArgs(format!(
                        "via stack size must be positive, got {w}x{h}"
                    ))
                    .into());
                }
                Some(dims)
            }
            None => None,
        };
        Ok(Self {
            params: params.clone(),
            metals,
            footprint,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "via_stack_{}_{}",
            self.params.bottom_layer,
            self.params.top_layer
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let tech = ctx.inner().clone();
        let grid = ctx.grid();

        let boundaries = self
            .metals
            .iter()
            .tuple_windows()
            .map(|(&bot, &top)| self.plan_boundary(&tech, bot, top))
            .collect::<Result<Vec<_>>>()?;

        let mut rects = Vec::with_capacity(self.metals.len());
        for (i, &metal) in self.metals.iter().enumerate() {
            let below = i.checked_sub(1).and_then(|j| boundaries[j].as_ref());
            let above = boundaries.get(i).and_then(Option::as_ref);

            let mut dims = Dims::square(min_width(&tech, tech.layers().name(metal)?));
            let mut overridden = false;
            for (b, enclosure) in below
                .map(|b| (b, b.top_enclosure))
                .into_iter()
                .chain(above.map(|b| (b, b.bot_enclosure)))
            {
                dims = dims.max(b.array + Dims::square(2 * enclosure));
                overridden |= b.rule.min_width_override;
            }
            let dims = match self.footprint {
                Some(fp) if overridden => fp.max(dims),
                Some(fp) => fp,
                None => dims,
            };

            let rect = Rect::from_center_dims_gridded(Point::zero(), dims, grid);
            ctx.draw_rect(metal, rect);
            rects.push(rect);
        }

        let mut vias = Vec::with_capacity(boundaries.len());
        for ((&bot, &top), boundary) in self.metals.iter().tuple_windows().zip(&boundaries) {
            match boundary {
                Some(b) => {
                    ctx.draw(b.fit.draw(&b.rule, b.via_layer, Point::zero(), grid))?;
                    vias.push(BoundaryVias {
                        via: b.rule.name.clone(),
                        columns: b.fit.nx,
                        rows: b.fit.ny,
                    });
                }
                None => {
                    let layers = tech.layers();
                    vias.push(BoundaryVias {
                        via: arcstr::format!("{}-{}", layers.name(bot)?, layers.name(top)?),
                        columns: 0,
                        rows: 0,
                    });
                }
            }
        }

        let (first, last) = (0, self.metals.len() - 1);
        ctx.add_port(Port::new(
            "bottom",
            self.metals[first],
            Point::zero(),
            rects[first].min_dim(),
            PortOrientation::R0,
        ))?;
        ctx.add_port(Port::new(
            "top",
            self.metals[last],
            Point::zero(),
            rects[last].min_dim(),
            PortOrientation::R0,
        ))?;

        let layers = tech.layers();
        let outline = rects[first].union(rects[last]);
        ctx.set_metadata("bottom_layer", layers.name(self.metals[first])?)?;
        ctx.set_metadata("top_layer", layers.name(self.metals[last])?)?;
        ctx.set_metadata("width", tech.to_user(outline.width()))?;
        ctx.set_metadata("height", tech.to_user(outline.height()))?;
        ctx.set_metadata("n_layers", self.metals.len())?;
        ctx.set_metadata("vias", vias)?;
        Ok(())
    }
}

/// Draws the vias and intermediate metals joining `metals[0]` to the last
/// metal over `region`, with as many vias per boundary as fit.
///
/// The first and last metals are left to the caller. Returns the number of
/// boundaries that received at least one via.
pub(crate) fn draw_via_column(ctx: &mut LayoutCtx, metals: &[LayerKey], region: Rect) -> Result<usize> {
    let tech = ctx.inner().clone();
    let grid = ctx.grid();
    let mut connected = 0;

    for (i, (&bot, &top)) in metals.iter().tuple_windows().enumerate() {
        if i > 0 {
            ctx.draw_rect(bot, region);
        }
        let Some((rule, via_layer)) = boundary_rule(&tech, bot, top)? else {
            continue;
        };
        let fit = fit_via_array(&rule, Some(region.dims()), ViaCounts::max());
        if fit.is_empty() {
            warn!(
                "no {} via fits in a {}x{} region",
                rule.name,
                region.width(),
                region.height()
            );
            continue;
        }
        ctx.draw(fit.draw(&rule, via_layer, region.center(), grid))?;
        connected += 1;
    }
    Ok(connected)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct ViaStackWithPadsParams {
    #[builder(setter(into))]
    pub bottom_layer: ArcStr,
    #[builder(setter(into))]
    pub top_layer: ArcStr,
    /// Footprint of the via stack in micrometers.
    pub size: (f64, f64),
    /// Pad dimensions in micrometers.
    pub pad_size: (f64, f64),
    /// Center-to-center distance between the two pads in micrometers.
    pub pad_spacing: f64,
    pub trace_width: f64,
}

impl Default for ViaStackWithPadsParams {
    fn default() -> Self {
        Self {
            bottom_layer: arcstr::literal!("Metal1"),
            top_layer: arcstr::literal!("TopMetal2"),
            size: (10.0, 10.0),
            pad_size: (20.0, 20.0),
            pad_spacing: 50.0,
            trace_width: PAD_TRACE_WIDTH,
        }
    }
}

impl ViaStackWithPadsParams {
    #[inline]
    pub fn builder() -> ViaStackWithPadsParamsBuilder {
        ViaStackWithPadsParamsBuilder::default()
    }

    fn stack(&self) -> ViaStackParams {
        ViaStackParams {
            bottom_layer: self.bottom_layer.clone(),
            top_layer: self.top_layer.clone(),
            size: Some(self.size),
            ..Default::default()
        }
    }
}

/// A via stack with a pad on each of its outer layers, for probing.
pub struct ViaStackWithPads {
    params: ViaStackWithPadsParams,
    pad: Dims,
    spacing: i64,
    trace_width: i64,
}

impl Component for ViaStackWithPads {
    type Params = ViaStackWithPadsParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        let grid = ctx.grid();
        let pad = Dims::new(ctx.snap(params.pad_size.0), ctx.snap(params.pad_size.1));
        let spacing = ctx.snap_to(params.pad_spacing, 2 * grid);
        let trace_width = ctx.snap(params.trace_width);
        if pad.w() <= 0 || pad.h() <= 0 || spacing <= 0 || trace_width <= 0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "pad size, spacing and trace width must be positive: {:?}, {}, {}",
                params.pad_size, params.pad_spacing, params.trace_width
            ))
            .into());
        }
        Ok(Self {
            params: params.clone(),
            pad,
            spacing,
            trace_width,
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "via_stack_pads_{}_{}",
            self.params.bottom_layer,
            self.params.top_layer
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let grid = ctx.grid();
        let stack = ctx.instantiate::<ViaStack>(&self.params.stack())?;
        let bottom = stack.port("bottom")?;
        let top = stack.port("top")?;
        ctx.add_instance(stack);

        let half = self.spacing / 2;
        let left = Point::new(-half, 0);
        let right = Point::new(half, 0);

        ctx.draw_rect(bottom.layer, Rect::from_center_dims_gridded(left, self.pad, grid));
        ctx.draw_rect(top.layer, Rect::from_center_dims_gridded(right, self.pad, grid));

        // Traces run from each pad center into the stack center.
        let trace = |x0: i64, x1: i64| {
            let y = Rect::from_center_dims_gridded(Point::zero(), Dims::new(0, self.trace_width), grid);
            Rect::new(Point::new(x0, y.bottom()), Point::new(x1, y.top()))
        };
        ctx.draw_rect(bottom.layer, trace(-half, 0));
        ctx.draw_rect(top.layer, trace(0, half));

        ctx.add_port(Port::new("pad1", bottom.layer, left, self.pad.h(), PortOrientation::R180))?;
        ctx.add_port(Port::new("pad2", top.layer, right, self.pad.h(), PortOrientation::R0))?;

        let tech = ctx.inner().clone();
        ctx.set_metadata("bottom_layer", &self.params.bottom_layer)?;
        ctx.set_metadata("top_layer", &self.params.top_layer)?;
        ctx.set_metadata("pad_spacing", tech.to_user(self.spacing))?;
        Ok(())
    }
}
