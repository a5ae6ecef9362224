//! Types related to the creation and instantiation of [`Cell`]s.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sggeom::bbox::{Bbox, BoundBox};
use sggeom::transform::{Translate, TranslateOwned};
use sggeom::{Point, Polygon, Shape, ShapeTrait};
use thiserror::Error;

use super::layers::{LayerBoundBox, LayerKey, LayerSpec};
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};
use crate::log::error;

/// The layout view of a cell.
///
/// A cell is immutable once generated; parents refer to it through [`Instance`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// The cell's name.
    name: ArcStr,
    /// A list of instances contained in the cell.
    insts: Vec<Instance>,
    /// A list of primitive/geometric elements.
    elems: Vec<Element>,
    /// The cell's ports, in insertion order.
    ports: Vec<Port>,
    /// User-defined metadata.
    metadata: BTreeMap<ArcStr, serde_json::Value>,
}

/// An instance of a cell in a layout.
///
/// Instances are placed by translation only.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// The instance name.
    pub(crate) name: ArcStr,
    /// A pointer to the reference cell.
    pub(crate) cell: Arc<Cell>,
    /// The location of the cell's origin.
    pub(crate) loc: Point,
}

/// A primitive geometric element.
///
/// Combines a geometric [`Shape`] with a [`LayerSpec`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    /// The layer spec where the element is located.
    pub layer: LayerSpec,
    /// The element's shape.
    pub inner: Shape,
}

impl Element {
    /// Creates a new [`Element`].
    pub fn new(layer: impl Into<LayerSpec>, shape: impl Into<Shape>) -> Self {
        Self {
            layer: layer.into(),
            inner: shape.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> LayerKey {
        self.layer.layer()
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.inner
    }
}

impl BoundBox for Element {
    fn bbox(&self) -> Bbox {
        self.inner.bbox()
    }
}

impl Translate for Element {
    fn translate(&mut self, p: Point) {
        self.inner.translate(p);
    }
}

/// The direction a port faces, measured counter-clockwise from the positive x-axis.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PortOrientation {
    /// 0 degrees (east).
    #[default]
    R0,
    /// 90 degrees (north).
    R90,
    /// 180 degrees (west).
    R180,
    /// 270 degrees (south).
    R270,
}

impl PortOrientation {
    /// The orientation in degrees.
    pub fn degrees(&self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Returns the orientation for `degrees`, or [`None`] if it is not a multiple of 90.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }
}

impl Display for PortOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// The kind of connection a port represents.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PortType {
    #[default]
    Electrical,
    /// A port used only for placement.
    Placement,
}

/// A named connection point of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: ArcStr,
    pub center: Point,
    pub width: i64,
    pub orientation: PortOrientation,
    pub layer: LayerKey,
    pub port_type: PortType,
}

impl Port {
    /// Creates a new electrical [`Port`].
    pub fn new(
        name: impl Into<ArcStr>,
        layer: LayerKey,
        center: Point,
        width: i64,
        orientation: PortOrientation,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            width,
            orientation,
            layer,
            port_type: PortType::Electrical,
        }
    }

    pub fn with_type(mut self, port_type: PortType) -> Self {
        self.port_type = port_type;
        self
    }

    /// Returns a copy of this port under a new name.
    pub fn named(&self, name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Translate for Port {
    fn translate(&mut self, p: Point) {
        self.center.translate(p);
    }
}

/// An enumeration of port-related errors.
#[derive(Debug, Error)]
pub enum PortError {
    /// The desired port was not found.
    #[error("port not found: {0}")]
    PortNotFound(ArcStr),

    /// Port already exists.
    #[error("port already exists: {0}")]
    PortAlreadyExists(ArcStr),

    /// The port does not have geometry at its center on its layer.
    #[error("port {0} has no geometry at its center on its layer")]
    LayerNotPresent(ArcStr),
}

impl Cell {
    /// Creates a new, empty [`Cell`] named `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Returns an iterator over the [`Element`]s drawn directly in this cell.
    pub fn elems(&self) -> impl Iterator<Item = &Element> {
        self.elems.iter()
    }

    /// Returns an iterator over the [`Instance`]s in this cell.
    pub fn insts(&self) -> impl Iterator<Item = &Instance> {
        self.insts.iter()
    }

    /// Returns an iterator over the ports of this cell, in insertion order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Retrieves the port named `name`.
    pub fn port(&self, name: &str) -> std::result::Result<&Port, PortError> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PortError::PortNotFound(ArcStr::from(name)))
    }

    /// Returns the metadata stored under `key`.
    pub fn metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Returns all metadata of the cell.
    pub fn metadata_map(&self) -> &BTreeMap<ArcStr, serde_json::Value> {
        &self.metadata
    }

    pub(crate) fn set_metadata(&mut self, key: impl Into<ArcStr>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub(crate) fn add_element(&mut self, elem: Element) {
        self.elems.push(elem);
    }

    pub(crate) fn add_elements(&mut self, elems: impl IntoIterator<Item = Element>) {
        self.elems.extend(elems);
    }

    pub(crate) fn add_instance(&mut self, inst: Instance) {
        self.insts.push(inst);
    }

    pub(crate) fn add_port(&mut self, port: Port) -> std::result::Result<(), PortError> {
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(PortError::PortAlreadyExists(port.name));
        }
        self.ports.push(port);
        Ok(())
    }

    /// Returns every shape on `layer`, including shapes of instances
    /// translated into this cell's coordinates.
    pub fn shapes_on(&self, layer: LayerKey) -> Vec<Shape> {
        let mut shapes: Vec<Shape> = self
            .elems
            .iter()
            .filter(|e| e.layer() == layer)
            .map(|e| e.inner.clone())
            .collect();
        for inst in &self.insts {
            shapes.extend(
                inst.cell
                    .shapes_on(layer)
                    .into_iter()
                    .map(|s| s.translate_owned(inst.loc)),
            );
        }
        shapes
    }

    /// Flattens the cell into a map from layer spec to polygons.
    pub fn polygons_by_layer(&self) -> BTreeMap<LayerSpec, Vec<Polygon>> {
        let mut map: BTreeMap<LayerSpec, Vec<Polygon>> = BTreeMap::new();
        self.collect_polygons(Point::zero(), &mut map);
        map
    }

    fn collect_polygons(&self, offset: Point, map: &mut BTreeMap<LayerSpec, Vec<Polygon>>) {
        for elem in &self.elems {
            map.entry(elem.layer.clone())
                .or_default()
                .push(elem.inner.to_poly().translate_owned(offset));
        }
        for inst in &self.insts {
            inst.cell.collect_polygons(offset + inst.loc, map);
        }
    }

    /// Checks that every port has geometry at its center on its layer.
    ///
    /// Port name uniqueness is enforced when ports are added.
    pub fn validate(&self) -> Result<()> {
        let mut failed = Vec::new();
        for port in &self.ports {
            let covered = self
                .shapes_on(port.layer)
                .iter()
                .any(|s| s.contains(port.center));
            if !covered {
                error!(
                    "cell {}: port {} at ({}, {}) has no geometry on its layer",
                    self.name, port.name, port.center.x, port.center.y
                );
                failed.push(port.name.to_string());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ErrorSource::InvalidLayout(format!(
                "ports without geometry in cell {}: {}",
                self.name,
                failed.join(", ")
            ))
            .into())
        }
    }
}

impl BoundBox for Cell {
    fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::empty();
        for elem in &self.elems {
            bbox = elem.inner.union(bbox);
        }
        for inst in &self.insts {
            bbox = inst.bbox().union(bbox);
        }
        bbox
    }
}

impl LayerBoundBox for Cell {
    fn layer_bbox(&self, layer: LayerKey) -> Bbox {
        let mut bbox = Bbox::empty();
        for elem in &self.elems {
            if elem.layer() == layer {
                bbox = elem.inner.union(bbox);
            }
        }
        for inst in &self.insts {
            bbox = inst.layer_bbox(layer).union(bbox);
        }
        bbox
    }
}

impl Instance {
    /// Creates a new instance of `cell` at the origin.
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            name: cell.name().clone(),
            cell,
            loc: Point::zero(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.name = name.into();
    }

    #[inline]
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }

    #[inline]
    pub fn set_loc(&mut self, loc: impl Into<Point>) {
        self.loc = loc.into();
    }

    /// Retrieves the port named `name`, translated to the instance's location.
    pub fn port(&self, name: &str) -> std::result::Result<Port, PortError> {
        Ok(self.cell.port(name)?.clone().translate_owned(self.loc))
    }

    /// Returns the ports of the instance, translated to its location.
    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.cell
            .ports()
            .map(move |p| p.clone().translate_owned(self.loc))
    }
}

impl Translate for Instance {
    fn translate(&mut self, p: Point) {
        self.loc.translate(p);
    }
}

impl BoundBox for Instance {
    fn bbox(&self) -> Bbox {
        let b = self.cell.bbox();
        match b.into_rect() {
            Some(r) => r.translate_owned(self.loc).bbox(),
            None => b,
        }
    }
}

impl LayerBoundBox for Instance {
    fn layer_bbox(&self, layer: LayerKey) -> Bbox {
        let b = self.cell.layer_bbox(layer);
        match b.into_rect() {
            Some(r) => r.translate_owned(self.loc).bbox(),
            None => b,
        }
    }
}

#[cfg(test)]
mod tests {
    use sggeom::Rect;
    use slotmap::SlotMap;

    use super::*;

    fn keys() -> (LayerKey, LayerKey) {
        let mut sm: SlotMap<LayerKey, ()> = SlotMap::with_key();
        (sm.insert(()), sm.insert(()))
    }

    #[test]
    fn duplicate_ports_are_rejected() {
        let (m1, _) = keys();
        let mut cell = Cell::new("c");
        cell.add_port(Port::new("a", m1, Point::zero(), 10, PortOrientation::R0))
            .unwrap();
        let err = cell
            .add_port(Port::new("a", m1, Point::zero(), 10, PortOrientation::R0))
            .unwrap_err();
        assert!(matches!(err, PortError::PortAlreadyExists(_)));
    }

    #[test]
    fn validate_requires_geometry_under_port() {
        let (m1, m2) = keys();
        let mut cell = Cell::new("c");
        cell.add_element(Element::new(
            LayerSpec::drawing(m1),
            Rect::new(Point::new(-50, -50), Point::new(50, 50)),
        ));
        cell.add_port(Port::new("a", m1, Point::new(50, 0), 100, PortOrientation::R0))
            .unwrap();
        assert!(cell.validate().is_ok());

        cell.add_port(Port::new("b", m2, Point::zero(), 100, PortOrientation::R0))
            .unwrap();
        let err = cell.validate().unwrap_err();
        assert!(matches!(err.source(), ErrorSource::InvalidLayout(_)));
    }

    #[test]
    fn instance_ports_and_shapes_are_translated() {
        let (m1, _) = keys();
        let mut child = Cell::new("child");
        child.add_element(Element::new(
            LayerSpec::drawing(m1),
            Rect::new(Point::new(-10, -10), Point::new(10, 10)),
        ));
        child
            .add_port(Port::new("p", m1, Point::zero(), 20, PortOrientation::R90))
            .unwrap();
        let child = Arc::new(child);

        let mut inst = Instance::new(child);
        inst.set_loc(Point::new(100, 0));
        let mut parent = Cell::new("parent");
        parent.add_instance(inst.clone());

        assert_eq!(inst.port("p").unwrap().center, Point::new(100, 0));
        assert_eq!(
            parent.bbox().into_rect(),
            Some(Rect::new(Point::new(90, -10), Point::new(110, 10)))
        );
        assert_eq!(parent.shapes_on(m1).len(), 1);
        assert_eq!(parent.polygons_by_layer()[&LayerSpec::drawing(m1)].len(), 1);
    }

    #[test]
    fn orientations_from_degrees() {
        assert_eq!(PortOrientation::from_degrees(-90), Some(PortOrientation::R270));
        assert_eq!(PortOrientation::from_degrees(180), Some(PortOrientation::R180));
        assert_eq!(PortOrientation::from_degrees(45), None);
    }
}
