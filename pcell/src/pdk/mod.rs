//! The technology interface implemented by process design kits.

use crate::error::Result;
use crate::layout::layers::Layers;
use crate::units::SiPrefix;

pub mod rules;

use self::rules::DesignRules;

/// A process design kit.
///
/// A PDK only describes its technology; it is read once when a
/// [`PcellCtx`](crate::data::PcellCtx) is built and never consulted again.
pub trait Pdk: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self) -> &'static str;

    /// The units of layout lengths.
    fn lengths(&self) -> SiPrefix {
        SiPrefix::Nano
    }

    /// The units in which users specify lengths.
    fn user_lengths(&self) -> SiPrefix {
        SiPrefix::Micro
    }

    /// The layers available in this PDK.
    fn layers(&self) -> Result<Layers>;

    /// The design rules of this PDK.
    ///
    /// The layout grid is [`DesignRules::grid`].
    fn rules(&self) -> Result<DesignRules>;
}
