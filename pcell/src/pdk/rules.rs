//! Design-rule tables.
//!
//! All lengths are integers in layout database units.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::deps::arcstr::ArcStr;
use crate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use crate::layout::layers::Layers;

/// Width and spacing rules of a metal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetalRule {
    pub min_width: i64,
    pub min_space: i64,
}

fn default_dense_threshold() -> usize {
    4
}

/// Rules for a via (or contact) layer connecting `bot` to `top`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaRule {
    /// The via layer name.
    pub name: ArcStr,
    /// The layer below the via.
    pub bot: ArcStr,
    /// The layer above the via.
    pub top: ArcStr,
    /// The via class used to look up requested counts, e.g. `vn`.
    pub class: ArcStr,
    /// Edge length of a via cut.
    pub size: i64,
    /// Spacing between cuts.
    pub space: i64,
    /// Spacing between cuts in arrays with at least `dense_threshold`
    /// cuts along either direction.
    #[serde(default)]
    pub dense_space: Option<i64>,
    #[serde(default = "default_dense_threshold")]
    pub dense_threshold: usize,
    pub bot_enclosure: i64,
    pub top_enclosure: i64,
    /// Enlarge the enclosure until the surrounding metal meets its minimum width.
    #[serde(default)]
    pub min_width_override: bool,
}

impl ViaRule {
    /// The larger of the two enclosures.
    #[inline]
    pub fn enclosure(&self) -> i64 {
        self.bot_enclosure.max(self.top_enclosure)
    }
}

/// Front-end rules used by the transistor generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosRules {
    pub gate_min_width: i64,
    pub gate_min_length: i64,
    pub cont_gate_space: i64,
    pub poly_endcap: i64,
    pub implant_enclosure: i64,
    pub nwell_enclosure: i64,
    pub thick_oxide_enclosure: i64,
}

/// A read-only design-rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignRules {
    /// The manufacturing grid.
    pub grid: i64,
    #[serde(default)]
    pub metals: BTreeMap<ArcStr, MetalRule>,
    #[serde(default)]
    pub vias: Vec<ViaRule>,
    #[serde(default)]
    pub mos: Option<MosRules>,
}

impl DesignRules {
    /// Parses and validates a design-rule table from TOML.
    pub fn from_toml(s: &str) -> Result<Self> {
        let rules: Self = toml::from_str(s)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reads a design-rule table from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = || -> Result<Self> {
            let s = std::fs::read_to_string(path)?;
            Self::from_toml(&s)
        };
        with_err_context(inner(), || ErrorContext::ReadFile(path.to_path_buf()))
    }

    /// Checks that every length is positive and lies on the grid.
    pub fn validate(&self) -> Result<()> {
        if self.grid <= 0 {
            return Err(ErrorSource::InvalidRules(format!("grid must be positive: {}", self.grid)).into());
        }
        let check = |what: String, value: i64, allow_zero: bool| -> Result<()> {
            if value < 0 || (!allow_zero && value == 0) {
                return Err(ErrorSource::InvalidRules(format!("{what} must be positive: {value}")).into());
            }
            if value % self.grid != 0 {
                return Err(ErrorSource::InvalidRules(format!(
                    "{what} is not a multiple of the grid ({}): {value}",
                    self.grid
                ))
                .into());
            }
            Ok(())
        };

        for (name, metal) in self.metals.iter() {
            check(format!("{name}.min_width"), metal.min_width, false)?;
            check(format!("{name}.min_space"), metal.min_space, false)?;
        }
        for via in self.vias.iter() {
            let name = &via.name;
            check(format!("{name}.size"), via.size, false)?;
            check(format!("{name}.space"), via.space, false)?;
            if let Some(dense) = via.dense_space {
                check(format!("{name}.dense_space"), dense, false)?;
            }
            check(format!("{name}.bot_enclosure"), via.bot_enclosure, true)?;
            check(format!("{name}.top_enclosure"), via.top_enclosure, true)?;
        }
        if let Some(mos) = self.mos {
            check("mos.gate_min_width".into(), mos.gate_min_width, false)?;
            check("mos.gate_min_length".into(), mos.gate_min_length, false)?;
            check("mos.cont_gate_space".into(), mos.cont_gate_space, false)?;
            check("mos.poly_endcap".into(), mos.poly_endcap, false)?;
            check("mos.implant_enclosure".into(), mos.implant_enclosure, true)?;
            check("mos.nwell_enclosure".into(), mos.nwell_enclosure, true)?;
            check("mos.thick_oxide_enclosure".into(), mos.thick_oxide_enclosure, true)?;
        }
        Ok(())
    }

    /// Checks that every layer named by a rule exists in `layers`.
    pub fn check_layers(&self, layers: &Layers) -> Result<()> {
        let names = self.metals.keys().chain(
            self.vias
                .iter()
                .flat_map(|v| [&v.name, &v.bot, &v.top]),
        );
        for name in names {
            if layers.get_key(name.as_str()).is_none() {
                return Err(ErrorSource::InvalidPdk(format!(
                    "design rules refer to unknown layer {name}"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Returns the rules of metal `name`.
    pub fn metal(&self, name: &str) -> Option<&MetalRule> {
        self.metals.get(name)
    }

    /// Returns the via connecting `bot` (below) to `top` (above), if one is defined.
    pub fn via_between(&self, bot: &str, top: &str) -> Option<&ViaRule> {
        self.vias.iter().find(|v| v.bot == bot && v.top == top)
    }

    /// Like [`DesignRules::via_between`], but returns an
    /// [`ErrorSource::UnknownViaClass`] error if no via is defined.
    pub fn via_between_or_err(&self, bot: &str, top: &str) -> Result<&ViaRule> {
        self.via_between(bot, top).ok_or_else(|| {
            ErrorSource::UnknownViaClass {
                bottom: ArcStr::from(bot),
                top: ArcStr::from(top),
            }
            .into()
        })
    }

    /// Returns the front-end rules, or an error if the table has none.
    pub fn mos(&self) -> Result<&MosRules> {
        self.mos
            .as_ref()
            .ok_or_else(|| ErrorSource::InvalidRules("no MOS rules defined".into()).into())
    }
}
