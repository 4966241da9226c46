//! Otitis media pathology.
//!
//! Implements the course of a middle-ear infection:
//! - Stage progression with age, immunity and treatment effects
//! - Treatment effectiveness (antibiotics, analgesia, natural healing)
//! - Complication risks and spontaneous membrane perforation
//! - Healing of perforation-induced hearing loss

mod complications;
mod diagnostics;
mod machine;
mod pathogen;
mod stage;
mod treatment;

pub use complications::{ComplicationRisks, HealingTask};
pub use diagnostics::PathologyDiagnostics;
pub use machine::{DiseaseState, PathologyStateMachine};
pub use pathogen::Pathogen;
pub use stage::{DiseaseStage, TransitionInputs};
pub use treatment::{age_healing_factor, AntibioticCourse, TreatmentEffect, TreatmentPlan};

/// Read-only view of the disease state consumed by transmission stages
pub trait PathologyView {
    /// Severity [0,1]
    fn severity(&self) -> f64;

    /// Middle-ear effusion [0,1]
    fn fluid_level(&self) -> f64;

    /// Inflammation [0,1]
    fn inflammation_level(&self) -> f64 {
        self.severity()
    }

    fn has_perforation(&self) -> bool;

    /// Area fraction of a disease-induced perforation [0,1]
    fn perforation_area_fraction(&self) -> f64;
}
