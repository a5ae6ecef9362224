//! The named devices of the SG13G2 library and their default geometry.

use std::sync::Arc;

use pcell::data::PcellCtx;
use pcell::error::{ErrorSource, Result};
use pcell::layout::cell::Cell;

use crate::bondpad::{Bondpad, BondpadParams};
use crate::inductor::{Inductor, InductorParams};
use crate::mos::{Mos, MosFlavor, MosParams, MosType};

/// The builder a device maps onto, with its default geometry in micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceKind {
    Inductor {
        turns: usize,
        width: f64,
        space: f64,
        diameter: f64,
    },
    Mos {
        mos_type: MosType,
        flavor: MosFlavor,
        width: f64,
        length: f64,
        nf: usize,
    },
    Bondpad {
        diameter: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSpec {
    pub name: &'static str,
    pub model: &'static str,
    pub kind: DeviceKind,
}

pub const DEVICES: &[DeviceSpec] = &[
    DeviceSpec {
        name: "inductor2",
        model: "inductor2",
        kind: DeviceKind::Inductor {
            turns: 1,
            width: 2.0,
            space: 2.1,
            diameter: 15.48,
        },
    },
    DeviceSpec {
        name: "inductor3",
        model: "inductor3",
        kind: DeviceKind::Inductor {
            turns: 2,
            width: 2.0,
            space: 2.1,
            diameter: 25.84,
        },
    },
    DeviceSpec {
        name: "nmos",
        model: "sg13_lv_nmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Nmos,
            flavor: MosFlavor::Lv,
            width: 0.15,
            length: 0.13,
            nf: 1,
        },
    },
    DeviceSpec {
        name: "pmos",
        model: "sg13_lv_pmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Pmos,
            flavor: MosFlavor::Lv,
            width: 1.0,
            length: 0.13,
            nf: 1,
        },
    },
    DeviceSpec {
        name: "nmosHV",
        model: "sg13_hv_nmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Nmos,
            flavor: MosFlavor::Hv,
            width: 1.0,
            length: 0.45,
            nf: 1,
        },
    },
    DeviceSpec {
        name: "pmosHV",
        model: "sg13_hv_pmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Pmos,
            flavor: MosFlavor::Hv,
            width: 1.0,
            length: 0.45,
            nf: 1,
        },
    },
    DeviceSpec {
        name: "rfnmos",
        model: "sg13_lv_rfnmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Nmos,
            flavor: MosFlavor::Rf,
            width: 2.0,
            length: 0.13,
            nf: 2,
        },
    },
    DeviceSpec {
        name: "rfpmos",
        model: "sg13_lv_rfpmos",
        kind: DeviceKind::Mos {
            mos_type: MosType::Pmos,
            flavor: MosFlavor::Rf,
            width: 2.0,
            length: 0.13,
            nf: 2,
        },
    },
    DeviceSpec {
        name: "bondpad",
        model: "bondpad",
        kind: DeviceKind::Bondpad { diameter: 68.0 },
    },
];

/// Looks up a device by name.
pub fn device(name: &str) -> Result<&'static DeviceSpec> {
    DEVICES
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| ErrorSource::DeviceNotFound(name.to_string()).into())
}

/// Builds the device `name` with its default parameters.
pub fn generate_device(ctx: &PcellCtx, name: &str) -> Result<Arc<Cell>> {
    device(name)?.generate(ctx)
}

impl DeviceSpec {
    pub fn inductor_params(&self) -> Option<InductorParams> {
        match self.kind {
            DeviceKind::Inductor {
                turns,
                width,
                space,
                diameter,
            } => Some(self.inductor(turns, width, space, diameter)),
            _ => None,
        }
    }

    pub fn mos_params(&self) -> Option<MosParams> {
        match self.kind {
            DeviceKind::Mos {
                mos_type,
                flavor,
                width,
                length,
                nf,
            } => Some(self.mos(mos_type, flavor, width, length, nf)),
            _ => None,
        }
    }

    pub fn bondpad_params(&self) -> Option<BondpadParams> {
        match self.kind {
            DeviceKind::Bondpad { diameter } => Some(bondpad(diameter)),
            _ => None,
        }
    }

    fn inductor(&self, turns: usize, width: f64, space: f64, diameter: f64) -> InductorParams {
        InductorParams {
            model: self.model.into(),
            width,
            space,
            diameter,
            turns,
            ..Default::default()
        }
    }

    fn mos(
        &self,
        mos_type: MosType,
        flavor: MosFlavor,
        width: f64,
        length: f64,
        nf: usize,
    ) -> MosParams {
        MosParams {
            mos_type,
            flavor,
            width,
            length,
            nf,
            m: 1,
            model: self.model.into(),
        }
    }

    /// Builds this device with its default parameters.
    pub fn generate(&self, ctx: &PcellCtx) -> Result<Arc<Cell>> {
        match self.kind {
            DeviceKind::Inductor {
                turns,
                width,
                space,
                diameter,
            } => ctx.generate_layout::<Inductor>(&self.inductor(turns, width, space, diameter)),
            DeviceKind::Mos {
                mos_type,
                flavor,
                width,
                length,
                nf,
            } => ctx.generate_layout::<Mos>(&self.mos(mos_type, flavor, width, length, nf)),
            DeviceKind::Bondpad { diameter } => {
                ctx.generate_layout::<Bondpad>(&bondpad(diameter))
            }
        }
    }
}

fn bondpad(diameter: f64) -> BondpadParams {
    BondpadParams {
        diameter,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, a) in DEVICES.iter().enumerate() {
            assert!(DEVICES[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
        }
    }

    #[test]
    fn unknown_device() {
        let err = device("capacitor").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::DeviceNotFound(name) if name == "capacitor"));
    }

    #[test]
    fn params_follow_kind() {
        let spec = device("rfpmos").unwrap();
        let params = spec.mos_params().unwrap();
        assert_eq!(params.nf, 2);
        assert_eq!(params.model, "sg13_lv_rfpmos");
        assert!(spec.inductor_params().is_none());
        assert_eq!(device("inductor3").unwrap().inductor_params().unwrap().turns, 2);
    }
}
