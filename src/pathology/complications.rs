//! Complication risks and perforation healing.
//!
//! Pressure from a purulent effusion can rupture the tympanic membrane.
//! Rupture relieves pain and drains the ear, but adds conductive loss that
//! heals back only partially. Untreated severe disease can spread to the
//! mastoid air cells and, rarely, intracranially.
//!
//! References:
//! - Berger, Int J Pediatr Otorhinolaryngol 1989 (spontaneous perforation)
//! - Leskinen & Jero, Int J Pediatr Otorhinolaryngol 2005 (complications)

use serde::{Deserialize, Serialize};

use crate::numeric::{clamp01, clamp_finite};

const PERFORATION_RISK_CAP: f64 = 80.0;
const PURULENT_MULTIPLIER: f64 = 1.5;
/// Healing progress where the exponential decay is ~95% complete
const HEALING_DECAY_RATE: f64 = 3.0;

/// Complication risks (%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplicationRisks {
    pub perforation: f64,
    pub mastoiditis: f64,
    pub meningitis: f64,
}

impl ComplicationRisks {
    /// Risks for the current disease state
    pub fn assess(severity: f64, fluid_level: f64, purulent: bool, treatment_effectiveness: f64) -> Self {
        let mut perforation = clamp01(severity) * 100.0 * clamp01(fluid_level);
        if purulent {
            perforation *= PURULENT_MULTIPLIER;
        }
        let perforation = clamp_finite(perforation, 0.0, PERFORATION_RISK_CAP);

        let untreated = 1.0 - clamp_finite(treatment_effectiveness, 0.0, 100.0) / 100.0;
        let mastoiditis = if perforation > 40.0 && treatment_effectiveness < 30.0 {
            clamp_finite((perforation - 40.0) * untreated, 0.0, 100.0)
        } else {
            0.0
        };
        let meningitis = if mastoiditis > 20.0 {
            clamp_finite(mastoiditis * 0.1 * untreated, 0.0, 100.0)
        } else {
            0.0
        };

        Self {
            perforation,
            mastoiditis,
            meningitis,
        }
    }
}

/// Resumable healing of a perforation-induced hearing loss.
///
/// The extra loss decays exponentially from its starting value toward the
/// residual that remains after healing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealingTask {
    pub elapsed_sec: f64,
    pub total_sec: f64,
    /// Extra loss when healing began (dB)
    pub start_loss_db: f64,
    /// Extra loss left once healed (dB)
    pub residual_loss_db: f64,
}

impl HealingTask {
    pub fn new(added_loss_db: f64, recovery_fraction: f64, total_sec: f64) -> Self {
        let added = clamp_finite(added_loss_db, 0.0, 60.0);
        Self {
            elapsed_sec: 0.0,
            total_sec: if total_sec.is_finite() { total_sec.max(0.0) } else { 0.0 },
            start_loss_db: added,
            residual_loss_db: added * (1.0 - clamp01(recovery_fraction)),
        }
    }

    /// Advance by `dt`. Returns true once healing is complete.
    pub fn advance(&mut self, dt: f64) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_sec = (self.elapsed_sec + dt).min(self.total_sec);
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_sec >= self.total_sec
    }

    pub fn progress(&self) -> f64 {
        if self.total_sec > 0.0 {
            clamp01(self.elapsed_sec / self.total_sec)
        } else {
            1.0
        }
    }

    /// Extra loss at the current point of healing (dB)
    pub fn current_loss_db(&self) -> f64 {
        if self.is_complete() {
            return self.residual_loss_db;
        }
        let decay = (-HEALING_DECAY_RATE * self.progress()).exp();
        self.residual_loss_db + (self.start_loss_db - self.residual_loss_db) * decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perforation_risk() {
        let risks = ComplicationRisks::assess(0.5, 0.5, false, 20.0);
        assert!((risks.perforation - 25.0).abs() < 1e-9);
        let purulent = ComplicationRisks::assess(0.5, 0.5, true, 20.0);
        assert!((purulent.perforation - 37.5).abs() < 1e-9);
        let capped = ComplicationRisks::assess(1.0, 1.0, true, 20.0);
        assert_eq!(capped.perforation, PERFORATION_RISK_CAP);
    }

    #[test]
    fn test_treatment_prevents_spread() {
        let untreated = ComplicationRisks::assess(1.0, 1.0, true, 0.0);
        assert!(untreated.mastoiditis > 0.0);
        assert!(untreated.meningitis > 0.0);

        let treated = ComplicationRisks::assess(1.0, 1.0, true, 60.0);
        assert_eq!(treated.mastoiditis, 0.0);
        assert_eq!(treated.meningitis, 0.0);
    }

    #[test]
    fn test_healing_decays_toward_residual() {
        let mut task = HealingTask::new(15.0, 0.7, 30.0);
        assert!((task.current_loss_db() - 15.0).abs() < 1e-9);

        let mut previous = task.current_loss_db();
        while !task.advance(1.0) {
            let loss = task.current_loss_db();
            assert!(loss < previous);
            previous = loss;
        }
        assert!((task.current_loss_db() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_healing_ignores_invalid_dt() {
        let mut task = HealingTask::new(15.0, 0.7, 30.0);
        assert!(!task.advance(f64::NAN));
        assert!(!task.advance(-5.0));
        assert_eq!(task.elapsed_sec, 0.0);
    }
}
