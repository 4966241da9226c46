//! Ossicular lever chain.
//!
//! Membrane vibration passes through three amplifying stages:
//! malleus-incus lever (~1.3), incus-stapes lever (~1.1) and the
//! membrane/footplate area ratio (~17). A second-order resonance around
//! 1 kHz shapes the result.
//!
//! References:
//! - Wever & Lawrence, Physiological Acoustics, 1954
//! - Zwislocki, J Acoust Soc Am 1962

use crate::config::{LeverParameters, LeverStage};
use crate::numeric::{clamp01, clamp_finite, finite_multiplier, finite_signal};

/// Upper end of the audible range (Hz)
const AUDIBLE_MAX_HZ: f64 = 20_000.0;
/// Gain at 0 Hz on the low-frequency ramp
const LOW_FLOOR: f64 = 0.3;
/// Gain at the top of the audible range
const HIGH_FLOOR: f64 = 0.2;

/// Three-stage mechanical amplifier
#[derive(Debug, Clone)]
pub struct LeverChain {
    params: LeverParameters,
    stiffness_scale: f64,
    damping_scale: f64,
    last_output: f64,
}

impl LeverChain {
    pub fn new(params: &LeverParameters) -> Self {
        Self {
            params: params.clone(),
            stiffness_scale: 1.0,
            damping_scale: 1.0,
            last_output: 0.0,
        }
    }

    /// Transmit at full efficiency
    pub fn transmit(&mut self, vibration_in: f64, frequency_hz: f64) -> f64 {
        self.transmit_with_efficiency(vibration_in, frequency_hz, 1.0)
    }

    /// Transmit with an external efficiency multiplier in [0, 1]
    pub fn transmit_with_efficiency(&mut self, vibration_in: f64, frequency_hz: f64, efficiency: f64) -> f64 {
        if !(vibration_in.is_finite() && vibration_in > 0.0 && frequency_hz.is_finite() && frequency_hz > 0.0) {
            self.last_output = 0.0;
            return 0.0;
        }

        let mut signal = finite_signal(vibration_in * finite_multiplier(self.frequency_response(frequency_hz)));
        for stage in self.stages() {
            signal = finite_signal(signal * finite_multiplier(self.stage_gain(stage)));
        }
        signal = finite_signal(signal * finite_multiplier(self.resonance_attenuation(frequency_hz)));
        signal = finite_signal(signal * clamp01(finite_multiplier(efficiency)));

        self.last_output = clamp_finite(signal, 0.0, self.params.max_output.max(0.0));
        self.last_output
    }

    fn stages(&self) -> [LeverStage; 3] {
        [self.params.malleus, self.params.incus, self.params.stapes]
    }

    /// Effective gain of one stage under the current stiffness/damping scale
    pub fn stage_gain(&self, stage: LeverStage) -> f64 {
        let stiffness_loss = stage.stiffness * (self.stiffness_scale - 1.0).max(0.0);
        let damping_loss = stage.damping * self.damping_scale;
        stage.ratio / (1.0 + (stiffness_loss + damping_loss).max(0.0))
    }

    /// Passband response: flat between the passband edges, linear ramps outside
    pub fn frequency_response(&self, frequency_hz: f64) -> f64 {
        let low = self.params.passband_low_hz;
        let high = self.params.passband_high_hz;
        if frequency_hz < low {
            LOW_FLOOR + (1.0 - LOW_FLOOR) * (frequency_hz / low).max(0.0)
        } else if frequency_hz <= high {
            1.0
        } else {
            let span = (AUDIBLE_MAX_HZ - high).max(1.0);
            (1.0 - (1.0 - HIGH_FLOOR) * (frequency_hz - high) / span).max(HIGH_FLOOR)
        }
    }

    /// Damped-oscillator magnitude normalized so its peak is 1
    pub fn resonance_attenuation(&self, frequency_hz: f64) -> f64 {
        let q = self.params.quality_factor;
        let f0 = self.params.resonance_hz;
        if !(q > 0.0 && f0 > 0.0) {
            return 1.0;
        }

        let x = frequency_hz / f0;
        let magnitude = 1.0 / ((1.0 - x * x).powi(2) + (x / q).powi(2)).sqrt();
        let peak = if q > std::f64::consts::FRAC_1_SQRT_2 {
            q / (1.0 - 1.0 / (4.0 * q * q)).sqrt()
        } else {
            1.0
        };
        clamp01(finite_multiplier(magnitude / peak))
    }

    /// Overall gain at a frequency (excluding the output clamp)
    pub fn total_gain(&self, frequency_hz: f64) -> f64 {
        let stages: f64 = self.stages().iter().map(|&s| self.stage_gain(s)).product();
        self.frequency_response(frequency_hz) * stages * self.resonance_attenuation(frequency_hz)
    }

    /// Scale ossicular stiffness (1.0 = healthy). Values below 0.1 are raised to 0.1.
    pub fn set_stiffness_scale(&mut self, scale: f64) {
        self.stiffness_scale = clamp_finite(scale, 0.1, f64::MAX);
    }

    /// Scale ossicular damping (1.0 = healthy)
    pub fn set_damping_scale(&mut self, scale: f64) {
        self.damping_scale = clamp_finite(scale, 0.0, f64::MAX);
    }

    pub fn silence(&mut self) {
        self.last_output = 0.0;
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}
