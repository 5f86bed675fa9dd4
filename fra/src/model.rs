use core::f32::consts::PI;
use num_traits::Float;

/// DC gain of the reference network.
pub const MODEL_DC_GAIN: f32 = 5.0;
/// Coefficient of `s²` in the reference denominator (s²).
pub const MODEL_A2: f32 = 1e-8;
/// Coefficient of `s` in the reference denominator (s).
pub const MODEL_A1: f32 = 3e-4;

const DEGENERATE: f32 = 1e-9;

/// Magnitude of the reference transfer function
/// `H(s) = 5 / (1e-8 s² + 3e-4 s + 1)` at `s = jω`, `ω = 2πf`.
///
/// Returns 0 where the denominator magnitude vanishes.
pub fn model_gain(frequency: f32) -> f32 {
    let w = 2.0 * PI * frequency;
    let re = 1.0 - MODEL_A2 * w * w;
    let im = MODEL_A1 * w;
    let den = Float::hypot(re, im);
    if den < DEGENERATE {
        0.0
    } else {
        MODEL_DC_GAIN / den
    }
}
