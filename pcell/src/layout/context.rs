//! Context methods for drawing and instantiating component layouts.

use serde::Serialize;
use sggeom::bbox::{Bbox, BoundBox};
use sggeom::{Polygon, Rect, Shape};

use super::cell::{Cell, Element, Instance, Port};
use super::layers::{LayerBoundBox, LayerKey, LayerSpec, Layers};
use super::Draw;
use crate::component::Component;
use crate::data::PcellCtx;
use crate::deps::arcstr::ArcStr;
use crate::error::Result;
use crate::pdk::rules::DesignRules;

/// Context for creating the layout view of a [`Component`].
pub struct LayoutCtx {
    /// The global [`PcellCtx`].
    pub(crate) inner: PcellCtx,
    /// The layout view of the cell being created.
    pub(crate) cell: Cell,
}

impl LayoutCtx {
    pub(crate) fn new(inner: PcellCtx, name: impl Into<ArcStr>) -> Self {
        Self {
            inner,
            cell: Cell::new(name),
        }
    }

    /// Returns a reference to the global [`PcellCtx`].
    #[inline]
    pub fn inner(&self) -> &PcellCtx {
        &self.inner
    }

    /// Returns the PDK's layer manager.
    #[inline]
    pub fn layers(&self) -> &Layers {
        self.inner.layers()
    }

    /// Returns the PDK's design rules.
    #[inline]
    pub fn rules(&self) -> &DesignRules {
        self.inner.rules()
    }

    /// The grid on which all layout geometry must lie.
    #[inline]
    pub fn grid(&self) -> i64 {
        self.inner.grid()
    }

    /// Converts a user length to layout units, snapped to the grid.
    #[inline]
    pub fn snap(&self, value: f64) -> i64 {
        self.inner.snap(value)
    }

    /// Converts a user length to layout units, snapped to a multiple of `step`.
    #[inline]
    pub fn snap_to(&self, value: f64, step: i64) -> i64 {
        self.inner.snap_to(value, step)
    }

    /// Returns an iterator over the [`Element`]s in the current cell.
    pub fn elems(&self) -> impl Iterator<Item = &Element> {
        self.cell.elems()
    }

    /// Instantiates a layout instance of component `T` with params `params`.
    #[inline]
    pub fn instantiate<T>(&mut self, params: &T::Params) -> Result<Instance>
    where
        T: Component,
    {
        self.inner.instantiate_layout::<T>(params)
    }

    /// Draws a rectangle on the drawing purpose of layer `layer`.
    pub fn draw_rect(&mut self, layer: impl Into<LayerSpec>, rect: Rect) {
        self.cell.add_element(Element::new(layer, rect));
    }

    /// Draws a polygon on the drawing purpose of layer `layer`.
    pub fn draw_poly(&mut self, layer: impl Into<LayerSpec>, poly: Polygon) {
        self.cell.add_element(Element::new(layer, poly));
    }

    pub fn draw_shape(&mut self, layer: impl Into<LayerSpec>, shape: impl Into<Shape>) {
        self.cell.add_element(Element::new(layer, shape));
    }

    pub fn draw<T>(&mut self, value: T) -> Result<()>
    where
        T: Draw,
    {
        let group = value.draw()?;
        self.cell.add_elements(group);
        Ok(())
    }

    /// Adds an instance to the current cell.
    pub fn add_instance(&mut self, inst: Instance) {
        self.cell.add_instance(inst);
    }

    /// Adds a [`Port`] to the cell.
    ///
    /// Fails if a port with the same name already exists.
    pub fn add_port(&mut self, port: Port) -> Result<()> {
        self.cell.add_port(port)?;
        Ok(())
    }

    /// Records `value` in the cell's metadata under `key`.
    pub fn set_metadata(&mut self, key: impl Into<ArcStr>, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.cell.set_metadata(key, value);
        Ok(())
    }

    pub fn bbox(&self) -> Bbox {
        self.cell.bbox()
    }

    pub fn layer_bbox(&self, layer: LayerKey) -> Bbox {
        self.cell.layer_bbox(layer)
    }
}
