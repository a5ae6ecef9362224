//! A framework for native parametric layout cells.
//!
//! Generators implement [`Component`](component::Component) and are built through a
//! [`PcellCtx`](data::PcellCtx), which carries the immutable technology
//! (layers and design rules) of one process.

pub mod component;
pub mod data;
pub mod error;
pub mod layout;
pub mod pdk;
pub mod units;

pub(crate) mod log;

pub mod deps {
    pub use arcstr;
}
