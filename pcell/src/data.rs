//! The technology context shared by every build.

use std::sync::Arc;

use crate::component::Component;
use crate::deps::arcstr::{self, ArcStr};
use crate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use crate::layout::cell::{Cell, Instance};
use crate::layout::context::LayoutCtx;
use crate::layout::layers::Layers;
use crate::log::debug;
use crate::pdk::rules::DesignRules;
use crate::pdk::Pdk;
use crate::units::{self, SiPrefix};

/// Metadata key under which a cell's parameters are recorded.
pub const PARAMS_KEY: &str = "params";

pub(crate) struct PcellData {
    pdk: Arc<dyn Pdk>,
    layers: Arc<Layers>,
    rules: Arc<DesignRules>,
    lengths: SiPrefix,
    user_lengths: SiPrefix,
}

pub struct PcellConfig {
    pub pdk: Arc<dyn Pdk>,
    /// Replaces the PDK's own design rules.
    pub rules: Option<DesignRules>,
}

#[derive(Default)]
pub struct PcellConfigBuilder {
    pub pdk: Option<Arc<dyn Pdk>>,
    pub rules: Option<DesignRules>,
}

impl PcellConfig {
    #[inline]
    pub fn builder() -> PcellConfigBuilder {
        PcellConfigBuilder::default()
    }
}

impl PcellConfigBuilder {
    pub fn pdk<T>(&mut self, pdk: T) -> &mut Self
    where
        T: Pdk + 'static,
    {
        self.pdk = Some(Arc::new(pdk));
        self
    }

    pub fn rules(&mut self, rules: DesignRules) -> &mut Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(&mut self) -> Result<PcellConfig> {
        let pdk = self
            .pdk
            .clone()
            .ok_or_else(|| ErrorSource::InvalidArgs("a PDK is required".into()))?;
        Ok(PcellConfig {
            pdk,
            rules: self.rules.clone(),
        })
    }
}

/// The immutable technology context.
///
/// Cloning is cheap and clones share the same layers and rules,
/// so a context can be handed to several threads building cells in parallel.
#[derive(Clone)]
pub struct PcellCtx {
    inner: Arc<PcellData>,
}

impl PcellData {
    fn from_config(cfg: PcellConfig) -> Result<Self> {
        let pdk = cfg.pdk;
        let layers = pdk.layers()?;
        let rules = match cfg.rules {
            Some(rules) => rules,
            None => pdk.rules()?,
        };
        rules.validate()?;
        rules.check_layers(&layers)?;
        debug!(
            "loaded technology {} ({}): {} layers, grid {}",
            pdk.name(),
            pdk.process(),
            layers.len(),
            rules.grid
        );
        Ok(Self {
            lengths: pdk.lengths(),
            user_lengths: pdk.user_lengths(),
            pdk,
            layers: Arc::new(layers),
            rules: Arc::new(rules),
        })
    }
}

impl PcellCtx {
    pub fn from_config(cfg: PcellConfig) -> Result<Self> {
        let inner = with_err_context(PcellData::from_config(cfg), || {
            ErrorContext::Task(arcstr::literal!("loading technology"))
        })?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn pdk(&self) -> Arc<dyn Pdk> {
        self.inner.pdk.clone()
    }

    #[inline]
    pub fn layers(&self) -> &Layers {
        &self.inner.layers
    }

    #[inline]
    pub fn rules(&self) -> &DesignRules {
        &self.inner.rules
    }

    /// The grid on which all layout geometry must lie.
    #[inline]
    pub fn grid(&self) -> i64 {
        self.inner.rules.grid
    }

    /// The units of layout lengths.
    #[inline]
    pub fn lengths(&self) -> SiPrefix {
        self.inner.lengths
    }

    /// Converts a user length to layout units, snapped to the grid.
    pub fn snap(&self, value: f64) -> i64 {
        self.snap_to(value, self.grid())
    }

    /// Converts a user length to layout units, snapped to a multiple of `step`.
    pub fn snap_to(&self, value: f64, step: i64) -> i64 {
        units::snap_value(value, self.inner.user_lengths, self.inner.lengths, step)
    }

    /// Converts a length in layout units back to user units.
    pub fn to_user(&self, value: i64) -> f64 {
        units::to_float(value, self.inner.lengths, self.inner.user_lengths)
    }

    fn init_component<T>(&self, params: &T::Params) -> Result<T>
    where
        T: Component,
    {
        with_err_context(T::new(params, self), || ErrorContext::InitComponent {
            type_name: std::any::type_name::<T>().into(),
        })
    }

    /// Generates the layout of component `T`.
    ///
    /// The parameters are recorded in the cell's metadata under [`PARAMS_KEY`],
    /// and the finished cell is validated.
    pub fn generate_layout<T>(&self, params: &T::Params) -> Result<Arc<Cell>>
    where
        T: Component,
    {
        let component = self.init_component::<T>(params)?;
        let name: ArcStr = component.name();
        let mut ctx = LayoutCtx::new(self.clone(), name.clone());

        let inner = |ctx: &mut LayoutCtx| -> Result<()> {
            ctx.set_metadata(PARAMS_KEY, params)?;
            component.layout(ctx)?;
            ctx.cell.validate()
        };
        with_err_context(inner(&mut ctx), || ErrorContext::GenComponent {
            name,
            type_name: std::any::type_name::<T>().into(),
        })?;

        Ok(Arc::new(ctx.cell))
    }

    /// Generates the layout of component `T` and wraps it in an [`Instance`] at the origin.
    pub fn instantiate_layout<T>(&self, params: &T::Params) -> Result<Instance>
    where
        T: Component,
    {
        Ok(Instance::new(self.generate_layout::<T>(params)?))
    }
}
