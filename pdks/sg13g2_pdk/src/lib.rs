//! Parametric layout cells for the IHP SG13G2 130nm BiCMOS process.
//!
//! Every generator implements [`Component`](pcell::component::Component) and is
//! built through a [`PcellCtx`] created from [`Sg13g2Pdk`]:
//!
//! ```ignore
//! let ctx = Sg13g2Pdk::new().into_ctx()?;
//! let cell = ctx.generate_layout::<ViaStack>(&ViaStackParams::default())?;
//! ```

use std::path::Path;

use pcell::data::{PcellConfig, PcellCtx};
use pcell::error::Result;
use pcell::layout::layers::Layers;
use pcell::pdk::rules::DesignRules;
use pcell::pdk::Pdk;

pub mod bondpad;
pub mod constants;
pub mod devices;
pub mod inductor;
pub mod layers;
pub mod mos;
pub mod via_stack;

pub(crate) mod log;

const RULES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/rules.toml"));

/// The SG13G2 technology.
///
/// Uses the bundled design rules unless others are supplied.
#[derive(Debug, Clone, Default)]
pub struct Sg13g2Pdk {
    rules: Option<DesignRules>,
}

impl Sg13g2Pdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `rules` in place of the bundled rule table.
    pub fn with_rules(rules: DesignRules) -> Self {
        Self { rules: Some(rules) }
    }

    /// Loads a replacement rule table from a TOML file.
    pub fn from_rules_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_rules(DesignRules::from_toml_file(path)?))
    }

    /// The bundled rule table.
    pub fn default_rules() -> Result<DesignRules> {
        DesignRules::from_toml(RULES)
    }

    /// Creates a technology context for building cells.
    pub fn into_ctx(self) -> Result<PcellCtx> {
        let cfg = PcellConfig::builder().pdk(self).build()?;
        PcellCtx::from_config(cfg)
    }
}

impl Pdk for Sg13g2Pdk {
    fn name(&self) -> &'static str {
        "sg13g2"
    }

    fn process(&self) -> &'static str {
        "IHP SG13G2 130nm BiCMOS"
    }

    fn layers(&self) -> Result<Layers> {
        Self::layers()
    }

    fn rules(&self) -> Result<DesignRules> {
        match &self.rules {
            Some(rules) => Ok(rules.clone()),
            None => Self::default_rules(),
        }
    }
}
