//! Efficiency multipliers fed back from pathology into the signal chain.
//!
//! Implements the disease → mechanics coupling:
//! - Inflamed, thickened membrane vibrates less (severity)
//! - A ruptured membrane loses area, more so at low frequencies
//! - Effusion loads the ossicles (fluid × severity), bounded below by the
//!   vascular efficiency floor
//!
//! ## Formula
//! ```text
//! membrane = (1 − k_sev × severity) × perforation_factor(area, f)
//! lever    = max(1 − k_fluid × fluid × severity, floor)
//! ```
//!
//! Multipliers are computed from the previous tick's pathology and vascular
//! state, never from values written during the current tick.
//!
//! ## References
//! - Ravicz et al., Hear Res 2004 - Effusion and middle-ear transmission
//! - Voss et al., Otol Neurotol 2001 - Perforation size and conductive loss

use crate::config::SimulationParameters;
use crate::numeric::clamp01;
use crate::pathology::PathologyView;
use crate::physics::perforation::{loss_to_factor, transmission_loss_db};

use super::vascular::VascularView;

/// Per-stage efficiency multipliers, each in [0,1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyModifiers {
    /// Applied to the membrane's aggregate vibration
    pub membrane: f64,
    /// Applied to the lever chain output
    pub lever: f64,
}

impl Default for EfficiencyModifiers {
    fn default() -> Self {
        Self {
            membrane: 1.0,
            lever: 1.0,
        }
    }
}

impl EfficiencyModifiers {
    /// Multipliers for a tone at `frequency_hz`
    pub fn compute(
        pathology: &dyn PathologyView,
        vascular: &dyn VascularView,
        params: &SimulationParameters,
        frequency_hz: f64,
    ) -> Self {
        let severity = clamp01(pathology.severity());
        let fluid = clamp01(pathology.fluid_level());

        let mut membrane = 1.0 - clamp01(params.severity_membrane_loss) * severity;
        if pathology.has_perforation() {
            let loss_db = transmission_loss_db(pathology.perforation_area_fraction(), frequency_hz);
            membrane *= loss_to_factor(loss_db);
        }

        let loaded = 1.0 - clamp01(params.fluid_lever_loss) * fluid * severity;
        let lever = loaded.max(clamp01(vascular.efficiency_floor()));

        Self {
            membrane: clamp01(membrane),
            lever: clamp01(lever),
        }
    }

    /// Combined multiplier (%)
    pub fn percent(&self) -> f64 {
        clamp01(self.membrane * self.lever) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPathology {
        severity: f64,
        fluid: f64,
        perforation: Option<f64>,
    }

    impl PathologyView for FixedPathology {
        fn severity(&self) -> f64 {
            self.severity
        }
        fn fluid_level(&self) -> f64 {
            self.fluid
        }
        fn has_perforation(&self) -> bool {
            self.perforation.is_some()
        }
        fn perforation_area_fraction(&self) -> f64 {
            self.perforation.unwrap_or(0.0)
        }
    }

    struct FixedFlow(f64);

    impl VascularView for FixedFlow {
        fn blood_flow(&self) -> f64 {
            self.0
        }
        fn efficiency_floor(&self) -> f64 {
            0.3 * self.0
        }
    }

    fn healthy() -> FixedPathology {
        FixedPathology {
            severity: 0.0,
            fluid: 0.0,
            perforation: None,
        }
    }

    #[test]
    fn test_healthy_ear_is_lossless() {
        let m = EfficiencyModifiers::compute(&healthy(), &FixedFlow(0.85), &SimulationParameters::default(), 1000.0);
        assert_eq!(m, EfficiencyModifiers::default());
        assert_eq!(m.percent(), 100.0);
    }

    #[test]
    fn test_severity_and_fluid_reduce_efficiency() {
        let sick = FixedPathology {
            severity: 0.8,
            fluid: 0.5,
            perforation: None,
        };
        let m = EfficiencyModifiers::compute(&sick, &FixedFlow(0.85), &SimulationParameters::default(), 1000.0);
        assert!((m.membrane - 0.6).abs() < 1e-12);
        assert!((m.lever - 0.76).abs() < 1e-12);
    }

    #[test]
    fn test_vascular_floor() {
        let sick = FixedPathology {
            severity: 1.0,
            fluid: 1.0,
            perforation: None,
        };
        let m = EfficiencyModifiers::compute(&sick, &FixedFlow(1.0), &SimulationParameters::default(), 1000.0);
        // 1 − 0.6 = 0.4 beats the 0.3 floor
        assert!((m.lever - 0.4).abs() < 1e-12);

        let params = SimulationParameters {
            fluid_lever_loss: 1.0,
            ..Default::default()
        };
        let m = EfficiencyModifiers::compute(&sick, &FixedFlow(1.0), &params, 1000.0);
        assert!((m.lever - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_disease_perforation_hurts_low_frequencies_more() {
        let perforated = FixedPathology {
            perforation: Some(0.2),
            ..healthy()
        };
        let params = SimulationParameters::default();
        let low = EfficiencyModifiers::compute(&perforated, &FixedFlow(0.85), &params, 250.0);
        let high = EfficiencyModifiers::compute(&perforated, &FixedFlow(0.85), &params, 4000.0);
        assert!(low.membrane < high.membrane);
        assert!(high.membrane < 1.0);
    }
}
