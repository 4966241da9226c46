//! Cochlear analysis: sound level, band decomposition and exposure.
//!
//! This module implements:
//! - Stapes vibration to dB SPL conversion
//! - 24-band log-spaced activation with adaptation
//! - Cumulative exposure and hearing-damage risk

mod bands;
mod exposure;
mod spl;

pub use bands::{BandBank, BandTiming, FrequencyBand, BAND_COUNT};
pub use exposure::{ExposureState, HearingStatus};
pub use spl::{frequency_correction, measure_spl, MAX_SPL_DB};

use crate::config::CochleaParameters;

/// Converts lever output into level, band activations and exposure
#[derive(Debug, Clone)]
pub struct CochlearAnalyzer {
    params: CochleaParameters,
    bands: BandBank,
    exposure: ExposureState,
    current_spl_db: f64,
}

impl CochlearAnalyzer {
    pub fn new(params: &CochleaParameters) -> Self {
        Self {
            params: params.clone(),
            bands: BandBank::new(params.min_band_hz, params.max_band_hz),
            exposure: ExposureState::default(),
            current_spl_db: 0.0,
        }
    }

    /// Sound level for a vibration without changing any state
    pub fn measure(&self, vibration: f64, frequency_hz: f64) -> f64 {
        measure_spl(vibration, frequency_hz, &self.params)
    }

    /// Measure, then advance bands and exposure by `dt`. Returns the level.
    pub fn process(&mut self, vibration: f64, frequency_hz: f64, dt: f64) -> f64 {
        self.current_spl_db = self.measure(vibration, frequency_hz);
        self.update_bands(frequency_hz, self.current_spl_db, dt);
        self.update_exposure(dt);
        self.current_spl_db
    }

    /// Relax band activations toward the response to the given stimulus
    pub fn update_bands(&mut self, frequency_hz: f64, spl_db: f64, dt: f64) {
        let timing = BandTiming {
            adaptation_rate_sec: self.params.adaptation_rate_sec,
            recovery_rate_sec: self.params.recovery_rate_sec,
        };
        self.bands
            .update(frequency_hz, spl_db, self.params.hearing_threshold_db, dt, timing);
    }

    /// Accumulate exposure at the current level
    pub fn update_exposure(&mut self, dt: f64) {
        self.exposure.update(self.current_spl_db, dt, &self.params);
    }

    /// No sound this tick: level drops to zero and bands relax
    pub fn silence(&mut self, dt: f64) {
        self.current_spl_db = 0.0;
        self.update_bands(0.0, 0.0, dt);
        self.update_exposure(dt);
    }

    /// Clear accumulated exposure (bands keep their state)
    pub fn reset_exposure(&mut self) {
        self.exposure = ExposureState::default();
    }

    pub fn current_spl_db(&self) -> f64 {
        self.current_spl_db
    }

    pub fn hearing_damage_risk(&self) -> f64 {
        self.exposure.hearing_damage_risk
    }

    pub fn hearing_status(&self) -> HearingStatus {
        self.exposure.status
    }

    pub fn band_activations(&self) -> [f64; BAND_COUNT] {
        self.bands.activations()
    }

    pub fn bands(&self) -> &BandBank {
        &self.bands
    }

    pub fn adaptation_level(&self) -> f64 {
        self.bands.adaptation_level()
    }

    pub fn exposure(&self) -> &ExposureState {
        &self.exposure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_updates_everything() {
        let mut cochlea = CochlearAnalyzer::new(&CochleaParameters::default());
        let spl = cochlea.process(0.22, 1000.0, 0.016);
        assert!(spl > 0.0);
        assert_eq!(cochlea.current_spl_db(), spl);
        assert!(cochlea.exposure().total_exposure_sec > 0.0);
        assert!(cochlea.band_activations().iter().any(|&a| a > 0.0));
    }

    #[test]
    fn test_silence_zeroes_level() {
        let mut cochlea = CochlearAnalyzer::new(&CochleaParameters::default());
        cochlea.process(0.22, 1000.0, 0.016);
        cochlea.silence(0.016);
        assert_eq!(cochlea.current_spl_db(), 0.0);
        let time = cochlea.exposure().total_exposure_sec;
        cochlea.silence(10.0);
        assert_eq!(cochlea.exposure().total_exposure_sec, time);
    }

    #[test]
    fn test_measure_is_pure() {
        let cochlea = CochlearAnalyzer::new(&CochleaParameters::default());
        let a = cochlea.measure(0.5, 440.0);
        let b = cochlea.measure(0.5, 440.0);
        assert_eq!(a, b);
        assert_eq!(cochlea.current_spl_db(), 0.0);
    }

    #[test]
    fn test_reset_exposure() {
        let mut cochlea = CochlearAnalyzer::new(&CochleaParameters::default());
        for _ in 0..10 {
            cochlea.process(5.0, 1000.0, 1000.0);
        }
        assert!(cochlea.hearing_damage_risk() > 0.0);
        cochlea.reset_exposure();
        assert_eq!(cochlea.hearing_damage_risk(), 0.0);
        assert_eq!(cochlea.hearing_status(), HearingStatus::Normal);
    }
}
