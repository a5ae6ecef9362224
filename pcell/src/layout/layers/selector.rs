//! The `Selector` type for PDK layer selection.

use serde::Serialize;

use super::GdsLayerSpec;

/// An enumeration for selecting layers in a PDK.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum Selector<'a> {
    /// The n'th metal layer, counting from 1 at the bottom of the stack.
    Metal(usize),
    /// The via layer connecting metal `N + 1` to metal `N`.
    ///
    /// For example, `Via(2)` connects metal 3 to metal 2.
    /// `Via(0)` is the contact layer below metal 1.
    Via(usize),
    /// The layer with the given name.
    Name(&'a str),
    /// The layer containing the given GDS spec.
    Gds(GdsLayerSpec),
}
