//! Middle-ear mucosal blood flow.
//!
//! Inflammation swells the mucosa and compresses its capillaries, so flow
//! falls as the disease worsens. Flow in turn sets a floor on how much lever
//! efficiency the fluid-laden middle ear can lose: well-perfused mucosa
//! clears effusion from the ossicles.
//!
//! ## Formula
//! ```text
//! target = baseline × (1 − drop × inflammation)
//! flow  += (target − flow) × dt / response_time
//! floor  = gain × flow
//! ```
//!
//! ## References
//! - Hellström et al., Acta Otolaryngol 1982 - Middle ear mucosal blood flow
//! - Ryan et al., Ann Otol Rhinol Laryngol 2001 - Vascular changes in otitis media

use crate::config::VascularParameters;
use crate::numeric::{clamp01, finite_or};
use crate::tick::valid_dt;

/// Read-only view of the vascular state consumed by transmission stages
pub trait VascularView {
    /// Blood flow fraction [0,1]
    fn blood_flow(&self) -> f64;

    /// Lower bound on lever efficiency provided by the current flow
    fn efficiency_floor(&self) -> f64;
}

/// First-order blood flow model driven by inflammation
#[derive(Debug, Clone)]
pub struct VascularModel {
    params: VascularParameters,
    blood_flow: f64,
    inflammation: f64,
}

impl VascularModel {
    pub fn new(params: &VascularParameters) -> Self {
        Self {
            params: params.clone(),
            blood_flow: clamp01(params.baseline_flow),
            inflammation: 0.0,
        }
    }

    /// Set the inflammation level driving the flow target [0,1]
    pub fn set_inflammation(&mut self, level: f64) {
        self.inflammation = clamp01(level);
    }

    /// Flow the model relaxes toward at the current inflammation
    pub fn target_flow(&self) -> f64 {
        let drop = clamp01(self.params.inflammation_flow_drop);
        clamp01(self.params.baseline_flow * (1.0 - drop * self.inflammation))
    }

    /// Relax the flow toward its target
    pub fn advance(&mut self, dt: f64) {
        let Some(dt) = valid_dt(dt) else {
            return;
        };
        let response = finite_or(self.params.response_time_sec, 2.0).max(1e-3);
        let step = clamp01(dt / response);
        self.blood_flow = clamp01(self.blood_flow + (self.target_flow() - self.blood_flow) * step);
    }

    pub fn inflammation(&self) -> f64 {
        self.inflammation
    }

    /// Restore resting flow
    pub fn reset(&mut self) {
        self.blood_flow = clamp01(self.params.baseline_flow);
        self.inflammation = 0.0;
    }
}

impl VascularView for VascularModel {
    fn blood_flow(&self) -> f64 {
        self.blood_flow
    }

    fn efficiency_floor(&self) -> f64 {
        clamp01(self.params.efficiency_floor_gain * self.blood_flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resting_flow() {
        let model = VascularModel::new(&VascularParameters::default());
        assert!((model.blood_flow() - 0.85).abs() < 1e-12);
        assert!((model.efficiency_floor() - 0.255).abs() < 1e-12);
    }

    #[test]
    fn test_inflammation_reduces_flow() {
        let mut model = VascularModel::new(&VascularParameters::default());
        model.set_inflammation(1.0);
        for _ in 0..1000 {
            model.advance(0.016);
        }
        // 0.85 × (1 − 0.5)
        assert!((model.blood_flow() - 0.425).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut model = VascularModel::new(&VascularParameters::default());
        model.set_inflammation(f64::NAN);
        assert_eq!(model.inflammation(), 0.0);
        model.advance(f64::INFINITY);
        model.advance(-1.0);
        assert!((model.blood_flow() - 0.85).abs() < 1e-12);
    }
}
