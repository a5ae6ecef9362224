//! Fixed geometry of the SG13G2 cells that is not part of the rule table.
//!
//! Lengths are in nanometers unless noted otherwise.

/// Lower pad metals are drawn at this fraction of the pad diameter.
pub const PAD_LOWER_METAL_SCALE: f64 = 0.95;
/// The passivation opening is drawn at this fraction of the pad diameter.
pub const PAD_OPENING_SCALE: f64 = 0.85;
/// Under-bump metallization is drawn at this fraction of the pad diameter.
pub const PAD_UBM_SCALE: f64 = 0.7;

/// Vertices used to approximate a circular pad.
pub const CIRCLE_POINTS: usize = 64;

/// Distance by which each inductor keep-out box grows past the previous one.
pub const INDUCTOR_MARKER_MARGIN: i64 = 2_000;

/// Width of the traces joining a via stack to its contact pads, in micrometers.
pub const PAD_TRACE_WIDTH: f64 = 2.0;

/// Length of the inductor leads past the outermost turn, in micrometers.
pub const INDUCTOR_LEAD_LENGTH: f64 = 5.0;

/// Diffusion contact column width: a contact plus gate spacing on both sides.
pub const fn sd_column_width(cont_size: i64, cont_gate_space: i64) -> i64 {
    cont_size + 2 * cont_gate_space
}
