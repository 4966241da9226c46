//! Basilar-membrane frequency bands.
//!
//! 24 log-spaced bands from 20 Hz to 20 kHz, roughly one per critical band.
//! Each band responds to the stimulus by its distance in log-frequency and
//! relaxes toward that target exponentially. A shared adaptation level
//! models efferent gain control.
//!
//! Reference: Zwicker, J Acoust Soc Am 1961 (critical band rate)

use serde::{Deserialize, Serialize};

use crate::numeric::{clamp01, finite_or, ResponseCurve};

/// Number of analysis bands
pub const BAND_COUNT: usize = 24;
/// Selectivity falloff per decade of frequency distance
const SELECTIVITY: f64 = 3.0;
/// dB above threshold that gives ~63% of full excitation
const EXCITATION_SCALE_DB: f64 = 20.0;
/// Activation that counts as a strongly driven band
const STRONG_ACTIVATION: f64 = 0.8;
/// Ceiling of the adaptation level
const MAX_ADAPTATION: f64 = 0.5;

/// Base sensitivity of a band by its center frequency
const SENSITIVITY: ResponseCurve = ResponseCurve::new(&[
    (20.0, 0.3),
    (250.0, 0.7),
    (1000.0, 1.0),
    (4000.0, 1.0),
    (8000.0, 0.8),
    (20_000.0, 0.4),
]);

/// One frequency band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Center frequency (Hz)
    pub center_hz: f64,
    /// Base sensitivity [0,1]
    pub base_sensitivity: f64,
    /// Current activation [0,1]
    pub activation: f64,
}

/// Time constants for one band update
#[derive(Debug, Clone, Copy)]
pub struct BandTiming {
    pub adaptation_rate_sec: f64,
    pub recovery_rate_sec: f64,
}

/// Bank of 24 bands with a shared adaptation level
#[derive(Debug, Clone)]
pub struct BandBank {
    bands: [FrequencyBand; BAND_COUNT],
    adaptation_level: f64,
}

impl BandBank {
    /// Bands log-spaced between `min_hz` and `max_hz` inclusive
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        let (min_hz, max_hz) = if min_hz > 0.0 && max_hz > min_hz && max_hz.is_finite() {
            (min_hz, max_hz)
        } else {
            log::warn!("Invalid band range {}..{} Hz, using 20..20000", min_hz, max_hz);
            (20.0, 20_000.0)
        };

        let ratio = max_hz / min_hz;
        let bands = std::array::from_fn(|i| {
            let center_hz = min_hz * ratio.powf(i as f64 / (BAND_COUNT - 1) as f64);
            FrequencyBand {
                center_hz,
                base_sensitivity: clamp01(SENSITIVITY.sample(center_hz)),
                activation: 0.0,
            }
        });

        Self {
            bands,
            adaptation_level: 0.0,
        }
    }

    /// Relax every band toward its response to the current stimulus
    pub fn update(&mut self, frequency_hz: f64, spl_db: f64, threshold_db: f64, dt: f64, timing: BandTiming) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        let excess = finite_or(spl_db - threshold_db, 0.0).max(0.0);
        let intensity = 1.0 - (-excess / EXCITATION_SCALE_DB).exp();
        let stimulus_log = (frequency_hz.is_finite() && frequency_hz > 0.0).then(|| frequency_hz.log10());

        let smoothing = clamp01(dt / timing.adaptation_rate_sec);
        let damping = 1.0 - self.adaptation_level;

        for band in &mut self.bands {
            let selectivity = match stimulus_log {
                Some(log_f) => (-SELECTIVITY * (log_f - band.center_hz.log10()).abs()).exp(),
                None => 0.0,
            };
            let target = clamp01(selectivity * intensity * band.base_sensitivity * damping);
            band.activation = clamp01(finite_or(
                band.activation + (target - band.activation) * smoothing,
                0.0,
            ));
        }

        let strongly_driven = self.bands.iter().any(|b| b.activation > STRONG_ACTIVATION);
        let (goal, rate) = if strongly_driven {
            (MAX_ADAPTATION, timing.adaptation_rate_sec)
        } else {
            (0.0, timing.recovery_rate_sec)
        };
        let step = clamp01(dt / rate);
        self.adaptation_level = finite_or(
            self.adaptation_level + (goal - self.adaptation_level) * step,
            0.0,
        )
        .clamp(0.0, MAX_ADAPTATION);
    }

    /// Activations in band order
    pub fn activations(&self) -> [f64; BAND_COUNT] {
        std::array::from_fn(|i| self.bands[i].activation)
    }

    pub fn bands(&self) -> &[FrequencyBand; BAND_COUNT] {
        &self.bands
    }

    pub fn adaptation_level(&self) -> f64 {
        self.adaptation_level
    }

    /// Index of the most active band, if any band is active
    pub fn dominant_band(&self) -> Option<usize> {
        self.bands
            .iter()
            .enumerate()
            .filter(|(_, b)| b.activation > 0.0)
            .max_by(|a, b| a.1.activation.total_cmp(&b.1.activation))
            .map(|(i, _)| i)
    }
}
