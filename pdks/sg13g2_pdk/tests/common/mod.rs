#![allow(dead_code)]

use pcell::data::PcellCtx;
use pcell::layout::cell::Cell;
use sg13g2_pdk::Sg13g2Pdk;
use sggeom::{Rect, Shape};

pub fn setup_ctx() -> PcellCtx {
    Sg13g2Pdk::new().into_ctx().unwrap()
}

/// All shapes on layer `name`, including those of instances.
pub fn shapes(ctx: &PcellCtx, cell: &Cell, name: &str) -> Vec<Shape> {
    cell.shapes_on(ctx.layers().by_name(name).unwrap())
}

/// The single rectangle on layer `name`.
pub fn only_rect(ctx: &PcellCtx, cell: &Cell, name: &str) -> Rect {
    let shapes = shapes(ctx, cell, name);
    assert_eq!(shapes.len(), 1, "expected one shape on {name}");
    shapes[0].as_rect().unwrap()
}
