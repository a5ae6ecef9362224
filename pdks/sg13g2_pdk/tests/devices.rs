mod common;

use common::setup_ctx;
use pcell::data::PARAMS_KEY;
use pcell::error::ErrorSource;
use serde_json::json;
use sg13g2_pdk::devices::{device, generate_device, DeviceKind, DEVICES};
use sg13g2_pdk::Sg13g2Pdk;

#[test]
fn every_device_builds() {
    let ctx = setup_ctx();
    for spec in DEVICES {
        let cell = spec.generate(&ctx).unwrap();
        assert!(cell.ports().count() >= 1, "{}", spec.name);
        assert!(cell.metadata(PARAMS_KEY).is_some(), "{}", spec.name);
        cell.validate().unwrap();
    }
}

#[test]
fn each_kind_builds_its_own_params() {
    let ctx = setup_ctx();
    for spec in DEVICES {
        let expected = match spec.kind {
            DeviceKind::Inductor { .. } => json!(spec.inductor_params().unwrap()),
            DeviceKind::Mos { .. } => json!(spec.mos_params().unwrap()),
            DeviceKind::Bondpad { .. } => json!(spec.bondpad_params().unwrap()),
        };
        let cell = spec.generate(&ctx).unwrap();
        assert_eq!(cell.metadata(PARAMS_KEY), Some(&expected), "{}", spec.name);
    }
}

#[test]
fn inductor_variants() {
    let ctx = setup_ctx();
    let two = generate_device(&ctx, "inductor3").unwrap();
    assert_eq!(two.metadata("turns"), Some(&json!(2)));
    assert_eq!(two.metadata("model"), Some(&json!("inductor3")));
    let one = generate_device(&ctx, "inductor2").unwrap();
    assert_eq!(one.metadata("turns"), Some(&json!(1)));
}

#[test]
fn unknown_device() {
    let ctx = setup_ctx();
    let err = generate_device(&ctx, "varactor").unwrap_err();
    assert!(matches!(err.source(), ErrorSource::DeviceNotFound(_)));
    assert!(device("nmosHV").is_ok());
}

#[test]
fn builds_are_deterministic_across_threads() {
    let ctx = setup_ctx();
    let handles: Vec<_> = DEVICES
        .iter()
        .map(|spec| {
            let ctx = ctx.clone();
            std::thread::spawn(move || spec.generate(&ctx).unwrap())
        })
        .collect();
    for (spec, handle) in DEVICES.iter().zip(handles) {
        let threaded = handle.join().unwrap();
        let local = spec.generate(&ctx).unwrap();
        assert_eq!(*threaded, *local, "{}", spec.name);
    }
}

#[test]
fn custom_rules() {
    let mut rules = Sg13g2Pdk::default_rules().unwrap();
    rules.grid = 10;
    let ctx = Sg13g2Pdk::with_rules(rules).into_ctx().unwrap();
    assert_eq!(ctx.snap(0.013), 10);
    let cell = generate_device(&ctx, "bondpad").unwrap();
    assert!(cell
        .polygons_by_layer()
        .values()
        .flatten()
        .all(|p| p.points.iter().all(|pt| pt.is_on_grid(10))));
}
