//! APIs for creating parametric cells.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::data::PcellCtx;
use crate::deps::arcstr::{self, ArcStr};
use crate::error::Result;
use crate::layout::context::LayoutCtx;

/// The trait that all parametric cells must implement.
///
/// `new` converts and checks user parameters; `layout` draws the cell.
/// Both must be pure functions of the parameters and the technology.
pub trait Component: Any {
    /// The parameter type.
    type Params: Serialize;

    /// Creates a new instance of this component with the given parameters.
    fn new(params: &Self::Params, ctx: &PcellCtx) -> Result<Self>
    where
        Self: Sized;

    /// Returns the desired name of this component, optionally
    /// taking into consideration relevant parameter values.
    fn name(&self) -> ArcStr {
        arcstr::literal!("unnamed")
    }

    /// Creates a layout view of this component.
    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()>;
}

/// An empty type for components that are not parametrized.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct NoParams;
