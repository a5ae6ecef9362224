//! Multi-finger MOS transistors.

use arcstr::ArcStr;
use derive_builder::Builder;
use pcell::component::Component;
use pcell::data::PcellCtx;
use pcell::error::{ErrorSource, Result};
use pcell::layout::cell::{Port, PortOrientation};
use pcell::layout::context::LayoutCtx;
use pcell::layout::elements::via::{fit_via_array, ViaCounts, ViaFit};
use serde::{Deserialize, Serialize};
use sggeom::bbox::BoundBox;
use sggeom::{snap_to_grid, Point, Rect};

use crate::constants::sd_column_width;
use crate::log::debug;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MosType {
    #[default]
    Nmos,
    Pmos,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MosFlavor {
    /// Low-voltage core device.
    #[default]
    Lv,
    /// High-voltage device on thick gate oxide.
    Hv,
    /// RF device; always has an even number of fingers.
    Rf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", default)]
pub struct MosParams {
    pub mos_type: MosType,
    pub flavor: MosFlavor,
    /// Total gate width in micrometers.
    pub width: f64,
    /// Gate length in micrometers.
    pub length: f64,
    /// Number of fingers.
    pub nf: usize,
    /// Multiplier.
    pub m: usize,
    #[builder(setter(into))]
    pub model: ArcStr,
}

impl Default for MosParams {
    fn default() -> Self {
        Self {
            mos_type: MosType::Nmos,
            flavor: MosFlavor::Lv,
            width: 0.15,
            length: 0.13,
            nf: 1,
            m: 1,
            model: arcstr::literal!("sg13_lv_nmos"),
        }
    }
}

impl MosParams {
    #[inline]
    pub fn builder() -> MosParamsBuilder {
        MosParamsBuilder::default()
    }

    /// The device type recorded in cell metadata.
    pub fn type_name(&self) -> &'static str {
        match (self.flavor, self.mos_type) {
            (MosFlavor::Lv, MosType::Nmos) => "nmos",
            (MosFlavor::Lv, MosType::Pmos) => "pmos",
            (MosFlavor::Hv, MosType::Nmos) => "nmos_hv",
            (MosFlavor::Hv, MosType::Pmos) => "pmos_hv",
            (MosFlavor::Rf, MosType::Nmos) => "rfnmos",
            (MosFlavor::Rf, MosType::Pmos) => "rfpmos",
        }
    }
}

pub struct Mos {
    params: MosParams,
    nf: usize,
    /// Finger width.
    finger_width: i64,
    length: i64,
}

impl Mos {
    /// The index of the last drain column; drains are the odd columns.
    #[inline]
    fn drain_column(&self) -> usize {
        if self.nf % 2 == 1 {
            self.nf
        } else {
            self.nf - 1
        }
    }
}

impl Component for Mos {
    type Params = MosParams;

    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self> {
        if params.nf == 0 || params.m == 0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "nf and m must be at least 1, got nf={} m={}",
                params.nf, params.m
            ))
            .into());
        }
        if params.width <= 0.0 || params.length <= 0.0 {
            return Err(ErrorSource::InvalidArgs(format!(
                "gate dimensions must be positive, got w={} l={}",
                params.width, params.length
            ))
            .into());
        }
        let rules = ctx.rules().mos()?;
        ctx.rules().via_between_or_err("Activ", "Metal1")?;

        let mut nf = params.nf;
        if params.flavor == MosFlavor::Rf && nf % 2 == 1 {
            debug!("rounding RF finger count {nf} up to {}", nf + 1);
            nf += 1;
        }

        let finger_width = ctx.snap(params.width / nf as f64);
        let length = ctx.snap(params.length);
        if finger_width < rules.gate_min_width || length < rules.gate_min_length {
            debug!(
                "raising finger {}x{} to the minimum gate size {}x{}",
                finger_width, length, rules.gate_min_width, rules.gate_min_length
            );
        }

        Ok(Self {
            params: params.clone(),
            nf,
            finger_width: finger_width.max(rules.gate_min_width),
            length: length.max(rules.gate_min_length),
        })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "{}_w{}_l{}_nf{}",
            self.params.type_name(),
            self.finger_width,
            self.length,
            self.nf
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let tech = ctx.inner().clone();
        let layers = tech.layers();
        let rules = tech.rules().mos()?;
        let cont = tech.rules().via_between_or_err("Activ", "Metal1")?;
        let grid = ctx.grid();

        let activ = layers.by_name(&cont.bot)?;
        let metal1 = layers.by_name(&cont.top)?;
        let cont_layer = layers.by_name(&cont.name)?;
        let poly = layers.by_name("GatPoly")?;

        let (nf, w, l) = (self.nf as i64, self.finger_width, self.length);
        let sd = sd_column_width(cont.size, rules.cont_gate_space);
        let pitch = sd + l;

        let active = Rect::new(Point::zero(), Point::new(nf * pitch + sd, w));
        ctx.draw_rect(activ, active);
        let mut diffusion = active;

        // Gates extend below the active region into a common strap.
        let strap_top = -rules.poly_endcap;
        let strap_bottom = strap_top - l;
        for k in 0..nf {
            let x0 = k * pitch + sd;
            ctx.draw_rect(
                poly,
                Rect::new(Point::new(x0, strap_bottom), Point::new(x0 + l, w + rules.poly_endcap)),
            );
        }
        let strap = Rect::new(
            Point::new(sd, strap_bottom),
            Point::new((nf - 1) * pitch + sd + l, strap_top),
        );
        ctx.draw_rect(poly, strap);
        let gates = Rect::new(strap.p0, Point::new(strap.right(), w + rules.poly_endcap));

        let mut columns = Vec::with_capacity(self.nf + 1);
        for k in 0..=nf {
            let column = Rect::new(Point::new(k * pitch, 0), Point::new(k * pitch + sd, w));
            let mut fit = fit_via_array(cont, Some(column.dims()), ViaCounts::new(1, usize::MAX));
            let widened = fit.is_empty();
            if widened {
                fit = ViaFit {
                    nx: 1,
                    ny: 1,
                    spacing: cont.space,
                };
            }

            let cuts = fit.draw(cont, cont_layer, column.center(), grid);
            let cut_box = cuts
                .bbox()
                .into_rect()
                .ok_or_else(|| ErrorSource::InvalidLayout("empty contact array".into()))?;
            ctx.draw(cuts)?;

            if widened {
                // Too narrow for a contact: widen the active region around it.
                let pad = cut_box.expand(cont.bot_enclosure);
                ctx.draw_rect(activ, pad);
                diffusion = diffusion.union(pad);
            }

            let metal = Rect::from_spans(
                cut_box.hspan().expand_all(cont.top_enclosure),
                column
                    .vspan()
                    .union(cut_box.vspan().expand_all(cont.top_enclosure)),
            );
            ctx.draw_rect(metal1, metal);
            columns.push(metal);
        }

        let implant = match self.params.mos_type {
            MosType::Nmos => "nSD",
            MosType::Pmos => "pSD",
        };
        ctx.draw_rect(
            layers.by_name(implant)?,
            diffusion.expand(rules.implant_enclosure),
        );
        if self.params.mos_type == MosType::Pmos {
            ctx.draw_rect(
                layers.by_name("NWell")?,
                diffusion.expand(rules.nwell_enclosure),
            );
        }
        match self.params.flavor {
            MosFlavor::Hv => ctx.draw_rect(
                layers.by_name("ThickGateOx")?,
                diffusion.union(gates).expand(rules.thick_oxide_enclosure),
            ),
            MosFlavor::Rf => {
                let outline = ctx
                    .bbox()
                    .into_rect()
                    .ok_or_else(|| ErrorSource::InvalidLayout("empty transistor".into()))?;
                ctx.draw_rect(layers.by_name("RFShield")?, outline);
            }
            MosFlavor::Lv => (),
        }

        let mid = snap_to_grid(w / 2, grid);
        let source = columns[0];
        let drain = columns[self.drain_column()];
        ctx.add_port(Port::new(
            "G",
            poly,
            Point::new(snap_to_grid(strap.center().x, grid), strap.bottom()),
            l,
            PortOrientation::R270,
        ))?;
        ctx.add_port(Port::new(
            "S",
            metal1,
            Point::new(source.left(), mid),
            w,
            PortOrientation::R180,
        ))?;
        ctx.add_port(Port::new(
            "D",
            metal1,
            Point::new(drain.right(), mid),
            w,
            PortOrientation::R0,
        ))?;

        ctx.set_metadata("model", &self.params.model)?;
        ctx.set_metadata("width", tech.to_user(w * nf))?;
        ctx.set_metadata("length", tech.to_user(l))?;
        ctx.set_metadata("nf", self.nf)?;
        ctx.set_metadata("m", self.params.m)?;
        ctx.set_metadata("type", self.params.type_name())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        let params = MosParams::builder()
            .mos_type(MosType::Pmos)
            .flavor(MosFlavor::Hv)
            .build()
            .unwrap();
        assert_eq!(params.type_name(), "pmos_hv");
        assert_eq!(MosParams::default().type_name(), "nmos");
    }
}
