//! Stapes displacement to sound pressure level.
//!
//! Chain: displacement → velocity (×2πf) → volume velocity (× footplate
//! area) → pressure (× cochlear input impedance) → dB re 20 µPa, scaled by
//! a frequency correction curve.
//!
//! Reference: Aibara et al., Hear Res 2001 (cochlear input impedance)

use crate::config::CochleaParameters;
use crate::numeric::{clamp_finite, ResponseCurve};

/// Maximum reported level (dB SPL)
pub const MAX_SPL_DB: f64 = 140.0;

/// Relative sensitivity by frequency, 1.0 at 1 kHz
/// Source: ISO 226:2003 equal-loudness contours, 40 phon (shape only)
const CORRECTION: ResponseCurve = ResponseCurve::new(&[
    (20.0, 0.5),
    (100.0, 0.75),
    (500.0, 0.95),
    (1000.0, 1.0),
    (4000.0, 1.0),
    (8000.0, 0.9),
    (20_000.0, 0.6),
]);

/// Frequency correction applied to the dB value
pub fn frequency_correction(frequency_hz: f64) -> f64 {
    CORRECTION.sample(frequency_hz)
}

/// Sound pressure level produced by a stapes vibration.
///
/// Any invalid argument or intermediate (non-positive, NaN, infinite) yields 0 dB.
pub fn measure_spl(vibration: f64, frequency_hz: f64, params: &CochleaParameters) -> f64 {
    if !(vibration.is_finite() && vibration > 0.0 && frequency_hz.is_finite() && frequency_hz > 0.0) {
        return 0.0;
    }

    let velocity = vibration * params.vibration_unit_m * std::f64::consts::TAU * frequency_hz;
    let volume_velocity = velocity * params.footplate_area_m2;
    let pressure = volume_velocity * params.cochlear_impedance_pa_s_per_m3;
    let ratio = pressure / params.reference_pressure_pa;
    if !(ratio.is_finite() && ratio > 0.0) {
        return 0.0;
    }

    let level = 20.0 * ratio.log10() * frequency_correction(frequency_hz);
    if !level.is_finite() {
        return 0.0;
    }
    clamp_finite(level, 0.0, MAX_SPL_DB)
}
