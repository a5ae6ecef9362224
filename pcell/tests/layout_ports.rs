use arcstr::ArcStr;
use pcell::component::{Component, NoParams};
use pcell::data::PcellCtx;
use pcell::error::{ErrorContext, ErrorSource};
use pcell::layout::cell::{Port, PortOrientation};
use pcell::layout::context::LayoutCtx;
use pcell::layout::layers::selector::Selector;
use sggeom::{Point, Rect};

mod common;
use common::setup_ctx;

struct TwoPort;
struct FloatingPort;
struct DuplicatePort;

impl Component for TwoPort {
    type Params = NoParams;
    fn new(_params: &Self::Params, _ctx: &PcellCtx) -> pcell::error::Result<Self> {
        Ok(Self)
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("two_port")
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> pcell::error::Result<()> {
        let layer = ctx.layers().select(Selector::Metal(2))?;
        ctx.draw_rect(layer, Rect::new(Point::zero(), Point::new(1000, 200)));
        ctx.add_port(Port::new("a", layer, Point::new(0, 100), 200, PortOrientation::R180))?;
        ctx.add_port(Port::new("b", layer, Point::new(1000, 100), 200, PortOrientation::R0))?;
        Ok(())
    }
}

impl Component for FloatingPort {
    type Params = NoParams;
    fn new(_params: &Self::Params, _ctx: &PcellCtx) -> pcell::error::Result<Self> {
        Ok(Self)
    }

    fn name(&self) -> ArcStr {
        arcstr::literal!("floating_port")
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> pcell::error::Result<()> {
        let m1 = ctx.layers().select(Selector::Metal(1))?;
        let m2 = ctx.layers().select(Selector::Metal(2))?;
        ctx.draw_rect(m1, Rect::new(Point::zero(), Point::new(1000, 200)));
        ctx.add_port(Port::new("a", m2, Point::new(500, 100), 200, PortOrientation::R0))?;
        Ok(())
    }
}

impl Component for DuplicatePort {
    type Params = NoParams;
    fn new(_params: &Self::Params, _ctx: &PcellCtx) -> pcell::error::Result<Self> {
        Ok(Self)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> pcell::error::Result<()> {
        let layer = ctx.layers().select(Selector::Metal(1))?;
        ctx.draw_rect(layer, Rect::new(Point::zero(), Point::new(200, 200)));
        for _ in 0..2 {
            ctx.add_port(Port::new("a", layer, Point::new(100, 100), 200, PortOrientation::R0))?;
        }
        Ok(())
    }
}

#[test]
fn test_layout_ports() {
    let ctx = setup_ctx();
    let cell = ctx.generate_layout::<TwoPort>(&NoParams).unwrap();
    assert_eq!(cell.name(), "two_port");
    let names: Vec<_> = cell.ports().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(cell.port("b").unwrap().orientation.degrees(), 0);
    assert!(cell.metadata("params").is_some());
}

#[test]
fn test_port_without_geometry_fails_validation() {
    let ctx = setup_ctx();
    let err = ctx.generate_layout::<FloatingPort>(&NoParams).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidLayout(_)));
    assert!(matches!(
        err.context().last(),
        Some(ErrorContext::GenComponent { .. })
    ));
}

#[test]
fn test_duplicate_port_is_rejected() {
    let ctx = setup_ctx();
    let err = ctx.generate_layout::<DuplicatePort>(&NoParams).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::LayoutPort(_)));
}

#[test]
fn test_instance_ports_follow_location() {
    let ctx = setup_ctx();
    let mut inst = ctx.instantiate_layout::<TwoPort>(&NoParams).unwrap();
    inst.set_loc(Point::new(0, 5000));
    assert_eq!(inst.port("a").unwrap().center, Point::new(0, 5100));
}
