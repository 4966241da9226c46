//! Treatment plan and effectiveness.
//!
//! Effectiveness (0-100) is the sum of three capped contributions:
//! - Antibiotic: bacterial pathogens only, after the onset delay, reduced by
//!   resistance (cap 70)
//! - Painkiller: flat 30, masks symptoms without altering the course
//! - Natural healing: immune response × healing multiplier, weaker in young
//!   children (cap 40)
//!
//! References:
//! - Lieberthal et al., Pediatrics 2013 (AAP guideline; 48-72 h response)
//! - Rovers et al., Lancet 2006 (benefit of antibiotics by age)

use serde::{Deserialize, Serialize};

use crate::config::PathologyParameters;
use crate::numeric::{clamp01, clamp_finite};

const ANTIBIOTIC_CAP: f64 = 70.0;
const PAINKILLER_EFFECT: f64 = 30.0;
const NATURAL_CAP: f64 = 40.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// An antibiotic course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntibioticCourse {
    /// Nominal effectiveness [0,1]
    pub effectiveness: f64,
    /// Episode time the course started (simulation s)
    pub started_at_sec: f64,
}

/// Active treatments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub antibiotic: Option<AntibioticCourse>,
    pub painkiller: bool,
    pub self_healing: bool,
}

impl Default for TreatmentPlan {
    fn default() -> Self {
        Self {
            antibiotic: None,
            painkiller: false,
            self_healing: true,
        }
    }
}

/// Breakdown of treatment effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentEffect {
    pub antibiotic: f64,
    pub painkiller: f64,
    pub natural: f64,
    /// Sum clamped to [0, 100]
    pub total: f64,
}

impl TreatmentPlan {
    /// Effectiveness at `now_sec` of episode time
    pub fn evaluate(&self, params: &PathologyParameters, now_sec: f64) -> TreatmentEffect {
        let antibiotic = self
            .antibiotic
            .map(|course| antibiotic_effect(course, params, now_sec))
            .unwrap_or(0.0);
        let painkiller = if self.painkiller { PAINKILLER_EFFECT } else { 0.0 };
        let natural = if self.self_healing {
            natural_healing(params)
        } else {
            0.0
        };

        TreatmentEffect {
            antibiotic,
            painkiller,
            natural,
            total: clamp_finite(antibiotic + painkiller + natural, 0.0, 100.0),
        }
    }
}

fn antibiotic_effect(course: AntibioticCourse, params: &PathologyParameters, now_sec: f64) -> f64 {
    if !params.pathogen.is_bacterial() {
        return 0.0;
    }
    let days_on_course = (now_sec - course.started_at_sec) * time_acceleration(params) / SECONDS_PER_DAY;
    if !(days_on_course >= params.antibiotic_onset_days) {
        return 0.0;
    }
    let effect = clamp01(course.effectiveness) * 100.0 * (1.0 - clamp01(params.pathogen.antibiotic_resistance()));
    clamp_finite(effect, 0.0, ANTIBIOTIC_CAP)
}

fn natural_healing(params: &PathologyParameters) -> f64 {
    let age_adjustment = age_healing_factor(params.patient_age_years);
    let effect = params.immune_response * params.healing_rate_multiplier * age_adjustment;
    clamp_finite(effect, 0.0, NATURAL_CAP)
}

/// Immature immunity heals more slowly
pub fn age_healing_factor(age_years: f64) -> f64 {
    if age_years < 2.0 {
        0.6
    } else if age_years < 6.0 {
        0.8
    } else {
        1.0
    }
}

/// Simulated seconds per simulation second, guarded against nonsense
pub fn time_acceleration(params: &PathologyParameters) -> f64 {
    if params.time_acceleration.is_finite() && params.time_acceleration > 0.0 {
        params.time_acceleration
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathology::Pathogen;

    #[test]
    fn test_default_is_natural_only() {
        let params = PathologyParameters::default();
        let effect = TreatmentPlan::default().evaluate(&params, 0.0);
        // immune 1.0 × 25 × 0.8 (age 4)
        assert!((effect.natural - 20.0).abs() < 1e-9);
        assert_eq!(effect.antibiotic, 0.0);
        assert_eq!(effect.total, effect.natural);
    }

    #[test]
    fn test_antibiotic_onset_delay() {
        let params = PathologyParameters::default();
        let plan = TreatmentPlan {
            antibiotic: Some(AntibioticCourse {
                effectiveness: 0.8,
                started_at_sec: 0.0,
            }),
            ..Default::default()
        };
        // One disease day is ten simulation seconds at the default acceleration
        assert_eq!(plan.evaluate(&params, 5.0).antibiotic, 0.0);
        let effect = plan.evaluate(&params, 10.0).antibiotic;
        // 80 × (1 - 0.15) = 68
        assert!((effect - 68.0).abs() < 1e-9);
    }

    #[test]
    fn test_antibiotic_capped() {
        let params = PathologyParameters::default();
        let plan = TreatmentPlan {
            antibiotic: Some(AntibioticCourse {
                effectiveness: 1.0,
                started_at_sec: 0.0,
            }),
            ..Default::default()
        };
        assert_eq!(plan.evaluate(&params, 100.0).antibiotic, ANTIBIOTIC_CAP);
    }

    #[test]
    fn test_viral_ignores_antibiotics() {
        let params = PathologyParameters {
            pathogen: Pathogen::Viral,
            ..Default::default()
        };
        let plan = TreatmentPlan {
            antibiotic: Some(AntibioticCourse {
                effectiveness: 1.0,
                started_at_sec: 0.0,
            }),
            ..Default::default()
        };
        assert_eq!(plan.evaluate(&params, 1000.0).antibiotic, 0.0);
    }

    #[test]
    fn test_total_clamped() {
        let params = PathologyParameters {
            immune_response: 10.0,
            ..Default::default()
        };
        let plan = TreatmentPlan {
            antibiotic: Some(AntibioticCourse {
                effectiveness: 1.0,
                started_at_sec: 0.0,
            }),
            painkiller: true,
            self_healing: true,
        };
        let effect = plan.evaluate(&params, 1000.0);
        assert_eq!(effect.total, 100.0);
        assert_eq!(effect.natural, NATURAL_CAP);
    }

    #[test]
    fn test_age_factor() {
        assert_eq!(age_healing_factor(1.0), 0.6);
        assert_eq!(age_healing_factor(4.0), 0.8);
        assert_eq!(age_healing_factor(30.0), 1.0);
    }
}
