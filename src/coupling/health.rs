//! Periodic health checks over the transmission chain.

use std::collections::BTreeSet;

use crate::config::HealthParameters;
use crate::numeric::finite_or;
use crate::state::{HealthLevel, HealthWarning};
use crate::tick::valid_dt;

/// Checks run at least once per second
const MAX_CHECK_INTERVAL_SEC: f64 = 1.0;
const MIN_CHECK_INTERVAL_SEC: f64 = 1e-3;

/// Values the monitor judges
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthReading {
    pub sound_level_db: f64,
    pub transmission_efficiency_percent: f64,
    pub inflammation_percent: f64,
    pub nerve_strength_percent: f64,
    /// Cochlear damage risk [0,1]
    pub hearing_damage_risk: f64,
    pub perforated: bool,
}

/// Raises and clears named warnings and classifies overall health
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    params: HealthParameters,
    timer_sec: f64,
    warnings: BTreeSet<HealthWarning>,
    level: HealthLevel,
    check_count: u64,
    /// Time-weighted efficiency since the last check (% · s, s)
    efficiency_sum: f64,
    efficiency_weight_sec: f64,
}

impl HealthMonitor {
    pub fn new(params: &HealthParameters) -> Self {
        Self {
            params: params.clone(),
            timer_sec: 0.0,
            warnings: BTreeSet::new(),
            level: HealthLevel::Excellent,
            check_count: 0,
            efficiency_sum: 0.0,
            efficiency_weight_sec: 0.0,
        }
    }

    /// Seconds between checks, clamped so checks run at >= 1 Hz
    pub fn check_interval_sec(&self) -> f64 {
        finite_or(self.params.check_interval_sec, MAX_CHECK_INTERVAL_SEC)
            .clamp(MIN_CHECK_INTERVAL_SEC, MAX_CHECK_INTERVAL_SEC)
    }

    /// Advance the check timer; runs a check when one is due.
    /// Returns true if a check ran.
    pub fn update(&mut self, dt: f64, reading: &HealthReading) -> bool {
        let Some(dt) = valid_dt(dt) else {
            return false;
        };
        self.timer_sec += dt;
        self.efficiency_sum += finite_or(reading.transmission_efficiency_percent, 0.0) * dt;
        self.efficiency_weight_sec += dt;
        let interval = self.check_interval_sec();
        if self.timer_sec < interval {
            return false;
        }
        // Several missed intervals collapse into one check
        self.timer_sec %= interval;
        self.check(reading);
        true
    }

    /// Mean transmission efficiency since the last check (%).
    /// Falls back to the reading when no time has been accumulated.
    pub fn average_efficiency_percent(&self, reading: &HealthReading) -> f64 {
        if self.efficiency_weight_sec > 0.0 {
            finite_or(self.efficiency_sum / self.efficiency_weight_sec, 0.0)
        } else {
            finite_or(reading.transmission_efficiency_percent, 0.0)
        }
    }

    /// Run a check now
    pub fn check(&mut self, reading: &HealthReading) {
        self.check_count += 1;
        let p = &self.params;

        let conditions = [
            (HealthWarning::HighSoundLevel, reading.sound_level_db > p.high_sound_level_db),
            (
                HealthWarning::LowTransmissionEfficiency,
                reading.transmission_efficiency_percent < p.low_efficiency_percent,
            ),
            (HealthWarning::Inflammation, reading.inflammation_percent > p.inflammation_percent),
            (
                HealthWarning::WeakNerveSignal,
                reading.sound_level_db > p.weak_nerve_min_sound_db
                    && reading.nerve_strength_percent < p.weak_nerve_percent,
            ),
            (HealthWarning::HearingDamageRisk, reading.hearing_damage_risk >= 0.7),
            (HealthWarning::MembranePerforation, reading.perforated),
        ];

        for (warning, active) in conditions {
            if active {
                if self.warnings.insert(warning) {
                    log::warn!("Health warning raised: {}", warning);
                }
            } else if self.warnings.remove(&warning) {
                log::info!("Health warning cleared: {:?}", warning);
            }
        }

        let average = self.average_efficiency_percent(reading);
        self.efficiency_sum = 0.0;
        self.efficiency_weight_sec = 0.0;

        let level = HealthLevel::classify(average, self.warnings.len());
        if level != self.level {
            log::info!("Overall health {} -> {}", self.level, level);
            self.level = level;
        }
    }

    pub fn level(&self) -> HealthLevel {
        self.level
    }

    /// Active warnings in a stable order
    pub fn warnings(&self) -> Vec<HealthWarning> {
        self.warnings.iter().copied().collect()
    }

    pub fn has_warning(&self, warning: HealthWarning) -> bool {
        self.warnings.contains(&warning)
    }

    pub fn check_count(&self) -> u64 {
        self.check_count
    }

    /// Forget warnings and history; the next check starts from a clean slate
    pub fn reset(&mut self) {
        self.timer_sec = 0.0;
        self.warnings.clear();
        self.level = HealthLevel::Excellent;
        self.efficiency_sum = 0.0;
        self.efficiency_weight_sec = 0.0;
    }
}
