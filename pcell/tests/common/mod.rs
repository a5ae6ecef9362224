#![allow(dead_code)]

use pcell::data::{PcellConfig, PcellCtx};
use pcell::error::{ErrorSource, Result};
use pcell::layout::layers::{LayerInfo, LayerType, Layers};
use pcell::pdk::rules::DesignRules;
use pcell::pdk::Pdk;

pub const LAYERS: &str = "layernum,datatype,name,purpose
8,0,Metal1,drawing
8,2,Metal1,pin
19,0,Via1,drawing
10,0,Metal2,drawing
10,2,Metal2,pin
";

pub const RULES: &str = r#"
grid = 5

[metals.Metal1]
min_width = 160
min_space = 180

[metals.Metal2]
min_width = 200
min_space = 210

[[vias]]
name = "Via1"
bot = "Metal1"
top = "Metal2"
class = "vn"
size = 190
space = 220
dense_space = 290
bot_enclosure = 50
top_enclosure = 50
"#;

/// A two-metal technology used to exercise the framework.
pub struct TestPdk;

impl Pdk for TestPdk {
    fn name(&self) -> &'static str {
        "test"
    }

    fn process(&self) -> &'static str {
        "two-metal test process"
    }

    fn layers(&self) -> Result<Layers> {
        Layers::from_csv(LAYERS, |name| {
            let builder = match name {
                "Metal1" => LayerInfo::builder()
                    .metal_idx(1)
                    .layer_type(LayerType::Metal),
                "Metal2" => LayerInfo::builder()
                    .metal_idx(2)
                    .layer_type(LayerType::Metal),
                "Via1" => LayerInfo::builder().via_idx(1).layer_type(LayerType::Via),
                _ => LayerInfo::builder(),
            };
            builder
                .build()
                .map_err(|e| ErrorSource::InvalidPdk(e.to_string()).into())
        })
    }

    fn rules(&self) -> Result<DesignRules> {
        DesignRules::from_toml(RULES)
    }
}

pub fn setup_ctx() -> PcellCtx {
    let cfg = PcellConfig::builder().pdk(TestPdk).build().unwrap();
    PcellCtx::from_config(cfg).unwrap()
}
