mod common;

use common::{only_rect, setup_ctx, shapes};
use pcell::error::{ErrorContext, ErrorSource};
use pcell::layout::cell::PortOrientation;
use pcell::layout::elements::via::ViaCounts;
use serde_json::json;
use sg13g2_pdk::via_stack::{LayerOrderPolicy, ViaStack, ViaStackParams, ViaStackWithPads, ViaStackWithPadsParams};
use sggeom::Point;

#[test]
fn default_stack() {
    let ctx = setup_ctx();
    let cell = ctx
        .generate_layout::<ViaStack>(&ViaStackParams::default())
        .unwrap();

    assert_eq!(only_rect(&ctx, &cell, "Metal1").dims().w(), 10_000);
    assert_eq!(only_rect(&ctx, &cell, "Metal2").dims().h(), 10_000);
    assert_eq!(shapes(&ctx, &cell, "Via1").len(), 4);

    let bottom = cell.port("bottom").unwrap();
    assert_eq!(bottom.center, Point::zero());
    assert_eq!(bottom.width, 10_000);
    assert_eq!(bottom.orientation, PortOrientation::R0);
    assert_eq!(bottom.layer, ctx.layers().by_name("Metal1").unwrap());
    assert_eq!(cell.port("top").unwrap().layer, ctx.layers().by_name("Metal2").unwrap());
    assert_eq!(cell.ports().count(), 2);

    assert_eq!(cell.metadata("n_layers"), Some(&json!(2)));
    assert_eq!(cell.metadata("bottom_layer"), Some(&json!("Metal1")));
}

#[test]
fn full_lower_stack() {
    let ctx = setup_ctx();
    let params = ViaStackParams::builder()
        .bottom_layer("Metal1")
        .top_layer("Metal5")
        .build()
        .unwrap();
    let cell = ctx.generate_layout::<ViaStack>(&params).unwrap();

    for metal in ["Metal1", "Metal2", "Metal3", "Metal4", "Metal5"] {
        only_rect(&ctx, &cell, metal);
    }
    for via in ["Via1", "Via2", "Via3", "Via4"] {
        assert_eq!(shapes(&ctx, &cell, via).len(), 4, "{via}");
    }
    assert!(shapes(&ctx, &cell, "TopMetal1").is_empty());
    assert_eq!(cell.metadata("n_layers"), Some(&json!(5)));
    assert_eq!(cell.metadata("vias").unwrap().as_array().unwrap().len(), 4);
}

#[test]
fn requests_clamp_to_footprint() {
    let ctx = setup_ctx();
    let params = ViaStackParams::builder()
        .size(Some((1.73, 0.29)))
        .vn(ViaCounts::new(100, 1))
        .build()
        .unwrap();
    let cell = ctx.generate_layout::<ViaStack>(&params).unwrap();
    assert_eq!(shapes(&ctx, &cell, "Via1").len(), 4);
    assert_eq!(
        cell.metadata("vias"),
        Some(&json!([{ "via": "Via1", "columns": 4, "rows": 1 }]))
    );
}

#[test]
fn counts_grow_with_request() {
    let ctx = setup_ctx();
    let mut last = 0;
    for n in 1..12 {
        let params = ViaStackParams::builder()
            .size(Some((3.0, 3.0)))
            .vn(ViaCounts::new(n, n))
            .build()
            .unwrap();
        let cell = ctx.generate_layout::<ViaStack>(&params).unwrap();
        let count = shapes(&ctx, &cell, "Via1").len();
        assert!(count >= last, "{n}x{n} gave {count} vias after {last}");
        last = count;
    }
    assert!(last > 1);
}

#[test]
fn sub_grid_changes_are_invisible() {
    let ctx = setup_ctx();
    let build = |w: f64| {
        let params = ViaStackParams::builder()
            .size(Some((w, 4.0)))
            .build()
            .unwrap();
        ctx.generate_layout::<ViaStack>(&params).unwrap()
    };
    let (a, b) = (build(4.0), build(4.001));
    assert_eq!(a.polygons_by_layer(), b.polygons_by_layer());
    assert_eq!(a.ports().collect::<Vec<_>>(), b.ports().collect::<Vec<_>>());
}

#[test]
fn layer_order() {
    let ctx = setup_ctx();
    let reversed = ViaStackParams::builder()
        .bottom_layer("TopMetal1")
        .top_layer("Metal3")
        .build()
        .unwrap();

    let err = ctx.generate_layout::<ViaStack>(&reversed).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidLayerOrder { .. }));
    assert!(matches!(
        err.context().last(),
        Some(ErrorContext::InitComponent { .. })
    ));

    let swapped = ViaStackParams {
        order: LayerOrderPolicy::Swap,
        ..reversed
    };
    let cell = ctx.generate_layout::<ViaStack>(&swapped).unwrap();
    let layers = ctx.layers();
    assert_eq!(cell.port("bottom").unwrap().layer, layers.by_name("Metal3").unwrap());
    assert_eq!(cell.port("top").unwrap().layer, layers.by_name("TopMetal1").unwrap());
    assert_eq!(cell.metadata("n_layers"), Some(&json!(3)));
}

#[test]
fn rejects_bad_requests() {
    let ctx = setup_ctx();
    let zero = ViaStackParams::builder()
        .vt1(ViaCounts::new(0, 2))
        .build()
        .unwrap();
    let err = ctx.generate_layout::<ViaStack>(&zero).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidArgs(_)));

    let unknown = ViaStackParams::builder()
        .top_layer("Metal9")
        .build()
        .unwrap();
    let err = ctx.generate_layout::<ViaStack>(&unknown).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::LayerNotFound(_)));

    let not_metal = ViaStackParams::builder()
        .bottom_layer("Activ")
        .build()
        .unwrap();
    let err = ctx.generate_layout::<ViaStack>(&not_metal).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::LayerNotFound(_)));
}

#[test]
fn top_metals_meet_min_width() {
    let ctx = setup_ctx();
    let params = ViaStackParams::builder()
        .bottom_layer("Metal5")
        .top_layer("TopMetal2")
        .size(None)
        .build()
        .unwrap();
    let cell = ctx.generate_layout::<ViaStack>(&params).unwrap();

    assert_eq!(shapes(&ctx, &cell, "TopVia1").len(), 1);
    assert_eq!(shapes(&ctx, &cell, "TopVia2").len(), 1);
    assert!(only_rect(&ctx, &cell, "TopMetal1").min_dim() >= 1_640);
    assert_eq!(only_rect(&ctx, &cell, "TopMetal2").min_dim(), 2_000);
    assert_eq!(cell.port("top").unwrap().width, 2_000);
}

#[test]
fn footprint_too_small_for_top_vias() {
    let ctx = setup_ctx();
    let params = ViaStackParams::builder()
        .bottom_layer("Metal5")
        .top_layer("TopMetal2")
        .size(Some((1.0, 1.0)))
        .build()
        .unwrap();
    let cell = ctx.generate_layout::<ViaStack>(&params).unwrap();

    assert!(shapes(&ctx, &cell, "TopVia1").is_empty());
    assert!(shapes(&ctx, &cell, "TopVia2").is_empty());
    let vias = cell.metadata("vias").unwrap().as_array().unwrap().clone();
    assert!(vias.iter().all(|v| v["columns"] == json!(0)));
    // Without vias the metals keep the requested footprint.
    assert_eq!(only_rect(&ctx, &cell, "TopMetal1").min_dim(), 1_000);
}

#[test]
fn stack_with_pads() {
    let ctx = setup_ctx();
    let cell = ctx
        .generate_layout::<ViaStackWithPads>(&ViaStackWithPadsParams::default())
        .unwrap();
    let layers = ctx.layers();

    let pad1 = cell.port("pad1").unwrap();
    assert_eq!(pad1.center, Point::new(-25_000, 0));
    assert_eq!(pad1.orientation, PortOrientation::R180);
    assert_eq!(pad1.layer, layers.by_name("Metal1").unwrap());
    assert_eq!(pad1.width, 20_000);

    let pad2 = cell.port("pad2").unwrap();
    assert_eq!(pad2.center, Point::new(25_000, 0));
    assert_eq!(pad2.orientation, PortOrientation::R0);
    assert_eq!(pad2.layer, layers.by_name("TopMetal2").unwrap());

    assert_eq!(cell.insts().count(), 1);
    // Pad, trace and the stack's own rectangle.
    assert_eq!(shapes(&ctx, &cell, "Metal1").len(), 3);
    assert_eq!(shapes(&ctx, &cell, "Metal3").len(), 1);
}

#[test]
fn parallel_builds_agree() {
    let ctx = setup_ctx();
    let params = ViaStackParams::builder()
        .top_layer("TopMetal2")
        .vn(ViaCounts::new(3, 3))
        .build()
        .unwrap();
    let reference = ctx.generate_layout::<ViaStack>(&params).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (ctx, params) = (ctx.clone(), params.clone());
            std::thread::spawn(move || ctx.generate_layout::<ViaStack>(&params).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(*handle.join().unwrap(), *reference);
    }
}
