use pcell::error::{ErrorSource, Result};
use pcell::layout::layers::{LayerInfo, LayerInfoBuilder, LayerType, Layers};

use crate::Sg13g2Pdk;

const LAYERS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/layers.csv"));

fn metal(idx: usize) -> LayerInfoBuilder {
    LayerInfo::builder()
        .metal_idx(idx)
        .layer_type(LayerType::Metal)
}

fn via(idx: usize) -> LayerInfoBuilder {
    LayerInfo::builder().via_idx(idx).layer_type(LayerType::Via)
}

fn base(name: &str) -> LayerInfoBuilder {
    if let Some(n) = name.strip_prefix("TopMetal") {
        // TopMetal1 sits above Metal5.
        return match n.parse::<usize>() {
            Ok(n) => metal(5 + n),
            Err(_) => LayerInfo::builder(),
        };
    }
    if let Some(n) = name.strip_prefix("TopVia") {
        return match n.parse::<usize>() {
            Ok(n) => via(4 + n),
            Err(_) => LayerInfo::builder(),
        };
    }
    if let Some(Ok(n)) = name.strip_prefix("Metal").map(str::parse::<usize>) {
        return metal(n);
    }
    if let Some(Ok(n)) = name.strip_prefix("Via").map(str::parse::<usize>) {
        return via(n);
    }
    let layer_type = match name {
        "Cont" => return via(0),
        "Activ" => LayerType::Diffusion,
        "GatPoly" => LayerType::Gate,
        "NWell" => LayerType::Well,
        "nSD" | "pSD" | "ThickGateOx" => LayerType::Implant,
        "IND" | "NoQRC" | "LBE" | "RFShield" => LayerType::Marker,
        _ => LayerType::Other,
    };
    LayerInfo::builder().layer_type(layer_type)
}

impl Sg13g2Pdk {
    /// The SG13G2 layer table.
    pub fn layers() -> Result<Layers> {
        Layers::from_csv(LAYERS, |name| {
            base(name)
                .build()
                .map_err(|e| ErrorSource::InvalidPdk(e.to_string()).into())
        })
    }
}
