//! Tympanic Sim - middle and inner ear transmission simulation engine
//!
//! This library models how a tone is picked up by the eardrum, amplified by
//! the ossicular chain, analysed by the cochlea and carried by the auditory
//! nerve, while an otitis media episode feeds losses back into the chain.

pub mod audiometry;
pub mod cochlea;
pub mod config;
pub mod coupling;
pub mod error;
pub mod geometry;
pub mod nerve;
pub mod numeric;
pub mod pathology;
pub mod physics;
pub mod state;
pub mod tick;

pub use audiometry::{AirBoneGapSweep, ClinicalReference, ExperimentRecord, AUDIOMETRIC_FREQUENCIES_HZ};
pub use cochlea::{CochlearAnalyzer, HearingStatus, BAND_COUNT};
pub use config::Parameters;
pub use coupling::{EfficiencyModifiers, TransmissionOrchestrator};
pub use error::{TransmissionError, TransmissionResult};
pub use geometry::MembraneMesh;
pub use nerve::{NerveSignal, NerveSignalPipeline, NerveStage};
pub use pathology::{DiseaseStage, PathologyStateMachine, PathologyView};
pub use physics::{LeverChain, MembraneSimulator, PerforationGrade, PerforationZone};
pub use state::{HealthLevel, HealthWarning, StatusSnapshot};
pub use tick::TickContext;
