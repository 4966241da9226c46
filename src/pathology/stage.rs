//! Disease stages and the transition graph.
//!
//! Incubation → EarlyOnset → Acute → Peak → {Resolution | Chronic}
//! Resolution → {Recovery | Chronic}, Chronic → {Resolution | Chronic}
//! Recovery is terminal.
//!
//! Reference: Rosenfeld & Kay, Laryngoscope 2003 (natural history of AOM)

use serde::{Deserialize, Serialize};

/// Stage of an otitis media episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseStage {
    Incubation,
    EarlyOnset,
    Acute,
    Peak,
    Resolution,
    Recovery,
    Chronic,
}

/// Inputs that decide the branch out of Peak, Resolution and Chronic
#[derive(Debug, Clone, Copy)]
pub struct TransitionInputs {
    /// Treatment effectiveness [0,100]
    pub treatment_effectiveness: f64,
    /// Fluid level [0,1]
    pub fluid_level: f64,
    /// Effectiveness below which the disease turns chronic
    pub chronic_threshold: f64,
    /// Effectiveness required to leave Chronic
    pub chronic_exit_threshold: f64,
}

impl DiseaseStage {
    pub const ALL: [DiseaseStage; 7] = [
        Self::Incubation,
        Self::EarlyOnset,
        Self::Acute,
        Self::Peak,
        Self::Resolution,
        Self::Recovery,
        Self::Chronic,
    ];

    /// Base duration in days; `None` for the terminal stage
    pub fn base_duration_days(&self) -> Option<f64> {
        match self {
            Self::Incubation => Some(1.0),
            Self::EarlyOnset => Some(1.0),
            Self::Acute => Some(2.0),
            Self::Peak => Some(2.0),
            Self::Resolution => Some(3.0),
            Self::Chronic => Some(14.0),
            Self::Recovery => None,
        }
    }

    /// Fraction of peak severity this stage drives toward
    pub fn severity_target(&self) -> f64 {
        match self {
            Self::Incubation => 0.15,
            Self::EarlyOnset => 0.4,
            Self::Acute => 0.85,
            Self::Peak => 1.0,
            Self::Resolution => 0.35,
            Self::Recovery => 0.0,
            Self::Chronic => 0.5,
        }
    }

    /// Fraction of peak severity the effusion drives toward
    pub fn fluid_target(&self) -> f64 {
        match self {
            Self::Incubation => 0.1,
            Self::EarlyOnset => 0.3,
            Self::Acute => 0.5,
            Self::Peak => 0.8,
            Self::Resolution => 0.4,
            Self::Recovery => 0.0,
            Self::Chronic => 0.7,
        }
    }

    /// Stage entered when this one has run its course
    pub fn next(&self, inputs: &TransitionInputs) -> Self {
        let weak_treatment = inputs.treatment_effectiveness < inputs.chronic_threshold;
        match self {
            Self::Incubation => Self::EarlyOnset,
            Self::EarlyOnset => Self::Acute,
            Self::Acute => Self::Peak,
            Self::Peak => {
                if weak_treatment && inputs.fluid_level > 0.6 {
                    Self::Chronic
                } else {
                    Self::Resolution
                }
            }
            Self::Resolution => {
                if weak_treatment && inputs.fluid_level > 0.5 {
                    Self::Chronic
                } else {
                    Self::Recovery
                }
            }
            Self::Chronic => {
                if inputs.treatment_effectiveness >= inputs.chronic_exit_threshold {
                    Self::Resolution
                } else {
                    Self::Chronic
                }
            }
            Self::Recovery => Self::Recovery,
        }
    }

    /// Whether `next` is an edge of the transition graph
    pub fn can_transition_to(&self, next: DiseaseStage) -> bool {
        use DiseaseStage::*;
        matches!(
            (self, next),
            (Incubation, EarlyOnset)
                | (EarlyOnset, Acute)
                | (Acute, Peak)
                | (Peak, Resolution)
                | (Peak, Chronic)
                | (Resolution, Recovery)
                | (Resolution, Chronic)
                | (Chronic, Resolution)
                | (Chronic, Chronic)
                | (Recovery, Recovery)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recovery)
    }

    /// Parse a stage name (case-insensitive, hyphens and underscores ignored)
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().to_lowercase() == key)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Incubation => "Incubation",
            Self::EarlyOnset => "EarlyOnset",
            Self::Acute => "Acute",
            Self::Peak => "Peak",
            Self::Resolution => "Resolution",
            Self::Recovery => "Recovery",
            Self::Chronic => "Chronic",
        }
    }
}

impl std::fmt::Display for DiseaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
