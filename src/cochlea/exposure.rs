//! Cumulative noise exposure and hearing-damage risk.
//!
//! Energy above the exposure threshold accumulates on a 3 dB exchange rate
//! (10 dB per decade of energy). Risk is the larger of a level-based term and
//! a duration-based term that saturates after an 8-hour working day.
//!
//! Reference: NIOSH Publication 98-126, Occupational Noise Exposure, 1998

use serde::{Deserialize, Serialize};

use crate::config::CochleaParameters;
use crate::numeric::{clamp01, finite_or};

/// Largest exponent applied to the energy increment (caps at 10^6 per second)
const MAX_ENERGY_EXPONENT: f64 = 6.0;
/// Ceiling on accumulated energy
const MAX_ENERGY: f64 = 1e15;

/// Categorical hearing risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HearingStatus {
    Normal,
    Caution,
    Warning,
    Danger,
}

impl HearingStatus {
    /// Classify a risk in [0, 1] with breakpoints 0.1 / 0.3 / 0.7
    pub fn from_risk(risk: f64) -> Self {
        let risk = clamp01(risk);
        if risk < 0.1 {
            Self::Normal
        } else if risk < 0.3 {
            Self::Caution
        } else if risk < 0.7 {
            Self::Warning
        } else {
            Self::Danger
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Caution => "Caution",
            Self::Warning => "Warning",
            Self::Danger => "Danger",
        }
    }
}

impl std::fmt::Display for HearingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Accumulated exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureState {
    /// Level in the most recent update (dB SPL)
    pub current_spl_db: f64,
    /// Highest level seen (dB SPL)
    pub peak_spl_db: f64,
    /// Time-weighted mean level while sound was present (dB SPL)
    pub average_spl_db: f64,
    /// Energy above the exposure threshold (relative units × s)
    pub cumulative_energy: f64,
    /// Time with sound present (s)
    pub total_exposure_sec: f64,
    /// Hearing-damage risk [0,1]
    pub hearing_damage_risk: f64,
    /// Risk category
    pub status: HearingStatus,
}

impl Default for ExposureState {
    fn default() -> Self {
        Self {
            current_spl_db: 0.0,
            peak_spl_db: 0.0,
            average_spl_db: 0.0,
            cumulative_energy: 0.0,
            total_exposure_sec: 0.0,
            hearing_damage_risk: 0.0,
            status: HearingStatus::Normal,
        }
    }
}

impl ExposureState {
    /// Account for `dt` seconds at `spl_db`.
    ///
    /// Time and averages only advance while sound is present (level > 0).
    pub fn update(&mut self, spl_db: f64, dt: f64, params: &CochleaParameters) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let spl = finite_or(spl_db, 0.0).max(0.0);
        self.current_spl_db = spl;

        if spl > 0.0 {
            let previous = self.total_exposure_sec;
            self.total_exposure_sec += dt;
            self.average_spl_db = finite_or(
                (self.average_spl_db * previous + spl * dt) / self.total_exposure_sec,
                self.average_spl_db,
            );
            self.peak_spl_db = self.peak_spl_db.max(spl);

            if spl > params.exposure_threshold_db {
                let exponent = ((spl - params.exposure_threshold_db) / 10.0).min(MAX_ENERGY_EXPONENT);
                self.cumulative_energy =
                    finite_or(self.cumulative_energy + 10f64.powf(exponent) * dt, MAX_ENERGY).min(MAX_ENERGY);
            }
        }

        self.hearing_damage_risk = self.risk(params);
        self.status = HearingStatus::from_risk(self.hearing_damage_risk);
    }

    fn risk(&self, params: &CochleaParameters) -> f64 {
        let level_risk = if params.risk_level_span_db > 0.0 {
            clamp01((self.average_spl_db - params.risk_level_floor_db) / params.risk_level_span_db)
        } else {
            0.0
        };
        let time_risk = if params.damage_time_limit_sec > 0.0 {
            clamp01(self.total_exposure_sec / params.damage_time_limit_sec)
        } else {
            0.0
        };
        level_risk.max(time_risk)
    }

    /// Permissible daily exposure at a level (s), 3 dB exchange rate from 85 dB / 8 h
    pub fn permissible_duration_sec(spl_db: f64, params: &CochleaParameters) -> f64 {
        let exponent = (spl_db - params.exposure_threshold_db) / 3.0;
        finite_or(params.damage_time_limit_sec / 2f64.powf(exponent), f64::MAX)
    }
}
