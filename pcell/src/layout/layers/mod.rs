//! Utilities and types for managing layers in a PDK.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use sggeom::bbox::{Bbox, BoundBox};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use self::selector::Selector;
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};

pub mod selector;

new_key_type! {
    /// A unique identifier for a layer in a PDK.
    pub struct LayerKey;
}

/// A GDS layer specification: `(layer number, datatype)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GdsLayerSpec(pub i16, pub i16);

#[derive(Deserialize)]
struct CsvLayerRecord {
    layernum: i16,
    datatype: i16,
    name: String,
    purpose: String,
}

/// An enumeration of layer purposes.
#[derive(Debug, Clone, Serialize, Deserialize, Ord, PartialOrd, PartialEq, Eq, Hash)]
pub enum LayerPurpose {
    Drawing,
    Pin,
    Label,
    /// Named purpose, not first-class supported
    Named(ArcStr),
    /// Other purpose, not first-class supported nor named
    Other(i16),
}

#[derive(Debug, Error)]
#[error("error converting string")]
pub struct FromStrError;

impl FromStr for LayerPurpose {
    type Err = FromStrError;
    fn from_str(purp: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match purp {
            "drawing" => Self::Drawing,
            "pin" => Self::Pin,
            "label" => Self::Label,
            _ => match purp.parse::<i16>() {
                Ok(other) => Self::Other(other),
                Err(_) => Self::Named(ArcStr::from(purp)),
            },
        })
    }
}

/// A unique identifier for a specific GDS layer based on its definition in a PDK.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct LayerSpec(LayerKey, LayerPurpose);

impl LayerSpec {
    /// Creates a new [`LayerSpec`].
    #[inline]
    pub fn new(key: LayerKey, purpose: LayerPurpose) -> Self {
        Self(key, purpose)
    }

    /// Returns the spec for the drawing purpose of the layer associated with key `key`.
    pub fn drawing(key: LayerKey) -> Self {
        Self(key, LayerPurpose::Drawing)
    }

    /// Returns the layer key of a [`LayerSpec`].
    #[inline]
    pub fn layer(&self) -> LayerKey {
        self.0
    }

    /// Returns the purpose of a [`LayerSpec`].
    #[inline]
    pub fn purpose(&self) -> &LayerPurpose {
        &self.1
    }
}

impl From<LayerKey> for LayerSpec {
    fn from(value: LayerKey) -> Self {
        Self::drawing(value)
    }
}

/// A manager for layers in a PDK.
///
/// Keeps track of active layers and indexes them by name.
/// Layers are inserted in the order they are first seen, so keys are stable
/// for a given layer table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layers {
    slots: SlotMap<LayerKey, Layer>,
    names: HashMap<ArcStr, LayerKey>,
    gds_to_layout: HashMap<GdsLayerSpec, LayerSpec>,
    metal_idxs: BTreeMap<usize, LayerKey>,
    via_idxs: BTreeMap<usize, LayerKey>,
}

impl Layers {
    /// Creates an empty [`Layers`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Layers`] from a vector of [`LayerInfo`]s.
    pub fn from_layer_infos(layer_infos: Vec<LayerInfo>) -> Self {
        let mut layers = Self::new();
        for info in layer_infos {
            layers.add(info);
        }
        layers
    }

    /// Creates a [`Layers`] from purposes specified in a CSV file.
    ///
    /// The CSV must have the columns `layernum,datatype,name,purpose`;
    /// rows sharing a name are merged into one layer with several purposes.
    /// Uses the provided `base` closure to fill out the stacking metadata for each layer.
    pub fn from_csv(csv: &str, mut base: impl FnMut(&str) -> Result<LayerInfo>) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let mut order: Vec<String> = Vec::new();
        let mut layer_infos: HashMap<String, LayerInfo> = HashMap::new();

        for record in reader.deserialize() {
            let record: CsvLayerRecord = record?;
            let purp = LayerPurpose::from_str(&record.purpose)
                .map_err(|_| ErrorSource::InvalidPdk(format!("bad purpose {}", record.purpose)))?;
            let gds_spec = GdsLayerSpec(record.layernum, record.datatype);
            if let Some(info) = layer_infos.get_mut(&record.name) {
                info.add_purpose(purp, gds_spec);
            } else {
                let mut layer_info = base(&record.name)?;
                layer_info.name = ArcStr::from(record.name.as_str());
                layer_info.add_purpose(purp, gds_spec);
                order.push(record.name.clone());
                layer_infos.insert(record.name, layer_info);
            }
        }

        Ok(Self::from_layer_infos(
            order
                .iter()
                .filter_map(|name| layer_infos.remove(name))
                .collect(),
        ))
    }

    /// Adds a [`Layer`] to our slot-map and number-map, and name-map.
    pub fn add(&mut self, layer: LayerInfo) -> LayerKey {
        let name = layer.name.clone();
        let key = self.slots.insert_with_key(|k| Layer::new(k, layer));
        for (purp, gds_spec) in self.slots[key].info.purps.iter() {
            self.gds_to_layout
                .insert(*gds_spec, LayerSpec::new(key, purp.clone()));
        }
        self.names.insert(name, key);

        if let Some(via_idx) = self.slots[key].info.via_idx {
            self.via_idxs.insert(via_idx, key);
        }
        if let Some(metal_idx) = self.slots[key].info.metal_idx {
            self.metal_idxs.insert(metal_idx, key);
        }

        key
    }

    /// Gets the [`LayerKey`] with layer name `name`.
    pub fn get_key<Q>(&self, name: &Q) -> Option<LayerKey>
    where
        Q: Hash + Eq + ?Sized,
        ArcStr: Borrow<Q>,
    {
        self.names.get(name).cloned()
    }

    /// Gets a [`LayerKey`] based on the provided [`Selector`].
    pub fn select(&self, sel: Selector) -> Result<LayerKey> {
        let key = match sel {
            Selector::Metal(n) => self.metal_idxs.get(&n).copied(),
            Selector::Via(n) => self.via_idxs.get(&n).copied(),
            Selector::Name(n) => self.names.get(n).copied(),
            Selector::Gds(spec) => self.gds_to_layout.get(&spec).map(|s| s.layer()),
        };
        key.ok_or_else(|| ErrorSource::LayerNotFound(format!("{sel:?}")).into())
    }

    /// Gets the [`LayerKey`] of the layer named `name`, or a [`ErrorSource::LayerNotFound`] error.
    #[inline]
    pub fn by_name(&self, name: &str) -> Result<LayerKey> {
        self.select(Selector::Name(name))
    }

    /// Gets a reference to the [`Layer`] from [`LayerKey`] `key`.
    pub fn get(&self, key: LayerKey) -> Option<&Layer> {
        self.slots.get(key)
    }

    /// Gets the [`LayerInfo`] associated with [`LayerKey`] `layer`.
    pub fn info(&self, layer: LayerKey) -> Result<&LayerInfo> {
        self.slots
            .get(layer)
            .map(|l| &l.info)
            .ok_or_else(|| ErrorSource::LayerNotFound(format!("{layer:?}")).into())
    }

    /// Returns the name associated with [`LayerKey`] `layer`.
    pub fn name(&self, layer: LayerKey) -> Result<&ArcStr> {
        Ok(&self.info(layer)?.name)
    }

    /// Gets the metal index corresponding to this layer.
    ///
    /// Returns an error if this layer is not a metal layer.
    pub fn which_metal(&self, layer: LayerKey) -> Result<usize> {
        let info = self.info(layer)?;
        info.metal_idx
            .ok_or_else(|| ErrorSource::LayerNotFound(format!("metal {}", info.name)).into())
    }

    /// The metal layers ordered from the bottom of the stack to the top.
    pub fn metal_stack(&self) -> Vec<LayerKey> {
        self.metal_idxs.values().copied().collect()
    }

    /// Converts a [`LayerSpec`] into its corresponding [`GdsLayerSpec`].
    pub fn to_gds_spec(&self, spec: &LayerSpec) -> Option<GdsLayerSpec> {
        self.get(spec.layer())
            .and_then(|layer| layer.info.spec(spec.purpose()))
    }

    /// Gets the [`LayerSpec`] corresponding to [`GdsLayerSpec`] `spec`.
    pub fn get_from_spec(&self, spec: GdsLayerSpec) -> Option<&LayerSpec> {
        self.gds_to_layout.get(&spec)
    }

    /// Returns the number of layers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A layer in a PDK.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Layer {
    /// A unique identifier.
    pub id: LayerKey,
    /// Information associated with the layer.
    pub info: LayerInfo,
}

impl Layer {
    pub(crate) fn new(id: LayerKey, info: LayerInfo) -> Self {
        Self { id, info }
    }
}

/// Metadata associated with a layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Builder)]
#[builder(pattern = "owned")]
pub struct LayerInfo {
    /// The layer name.
    #[builder(setter(into), default)]
    pub name: ArcStr,
    /// A layer purpose to GDS spec lookup table.
    #[builder(setter(into), default)]
    pub purps: BTreeMap<LayerPurpose, GdsLayerSpec>,
    /// Position in the metal stack, starting at 1 for the lowest metal.
    #[builder(setter(strip_option), default)]
    pub metal_idx: Option<usize>,
    /// Position in the via stack; see [`Selector::Via`].
    #[builder(setter(strip_option), default)]
    pub via_idx: Option<usize>,
    /// The type of the layer.
    #[builder(default)]
    pub layer_type: LayerType,
}

/// An enumeraton of layer types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug, Serialize, Deserialize)]
pub enum LayerType {
    Metal,
    Via,
    Diffusion,
    Gate,
    Well,
    Implant,
    Marker,
    #[default]
    Other,
}

impl LayerInfo {
    /// Creates a new [`LayerInfoBuilder`].
    #[inline]
    pub fn builder() -> LayerInfoBuilder {
        LayerInfoBuilder::default()
    }

    /// Adds a new [`LayerPurpose`].
    #[inline]
    pub fn add_purpose(&mut self, purp: LayerPurpose, spec: GdsLayerSpec) {
        self.purps.insert(purp, spec);
    }

    /// Retrieves the spec for this layer and [`purpose`](LayerPurpose).
    pub fn spec(&self, purpose: &LayerPurpose) -> Option<GdsLayerSpec> {
        self.purps.get(purpose).copied()
    }
}

/// A trait representing functions available for multi-layered objects with bounding boxes.
pub trait LayerBoundBox: BoundBox {
    fn layer_bbox(&self, layer: LayerKey) -> Bbox;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "layernum,datatype,name,purpose
8,0,Metal1,drawing
8,2,Metal1,pin
19,0,Via1,drawing
10,0,Metal2,drawing
27,0,IND,drawing
";

    fn base(name: &str) -> Result<LayerInfo> {
        let info = match name {
            "Metal1" => LayerInfo::builder()
                .metal_idx(1)
                .layer_type(LayerType::Metal),
            "Metal2" => LayerInfo::builder()
                .metal_idx(2)
                .layer_type(LayerType::Metal),
            "Via1" => LayerInfo::builder().via_idx(1).layer_type(LayerType::Via),
            _ => LayerInfo::builder().layer_type(LayerType::Marker),
        };
        info.build()
            .map_err(|e| ErrorSource::InvalidPdk(e.to_string()).into())
    }

    #[test]
    fn csv_layers_merge_purposes() {
        let layers = Layers::from_csv(CSV, base).unwrap();
        assert_eq!(layers.len(), 4);

        let m1 = layers.by_name("Metal1").unwrap();
        let info = layers.info(m1).unwrap();
        assert_eq!(info.spec(&LayerPurpose::Drawing), Some(GdsLayerSpec(8, 0)));
        assert_eq!(info.spec(&LayerPurpose::Pin), Some(GdsLayerSpec(8, 2)));
        assert_eq!(layers.select(Selector::Gds(GdsLayerSpec(8, 2))).unwrap(), m1);
    }

    #[test]
    fn metal_stack_is_ordered() {
        let layers = Layers::from_csv(CSV, base).unwrap();
        let stack: Vec<_> = layers
            .metal_stack()
            .into_iter()
            .map(|k| layers.name(k).unwrap().clone())
            .collect();
        assert_eq!(stack, vec!["Metal1", "Metal2"]);
        assert_eq!(
            layers.select(Selector::Via(1)).unwrap(),
            layers.by_name("Via1").unwrap()
        );
    }

    #[test]
    fn keys_are_stable_across_loads() {
        let a = Layers::from_csv(CSV, base).unwrap();
        let b = Layers::from_csv(CSV, base).unwrap();
        for name in ["Metal1", "Via1", "Metal2", "IND"] {
            assert_eq!(a.by_name(name).unwrap(), b.by_name(name).unwrap());
        }
    }

    #[test]
    fn unknown_layer_is_an_error() {
        let layers = Layers::from_csv(CSV, base).unwrap();
        let err = layers.by_name("Metal9").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::LayerNotFound(_)));
    }
}
