//! Coupling between the signal chain, pathology and vascular state.
//!
//! ## Forward Path (Sound → Nerve)
//! - Membrane vibration → lever amplification → cochlear level → nerve signal
//!
//! ## Feedback Path (Pathology → Mechanics)
//! - Severity and disease perforation reduce membrane efficiency
//! - Effusion loads the lever chain, floored by mucosal blood flow
//!
//! ## Data Flow
//! ```text
//!  sound ──► Membrane ──► Lever ──► Cochlea ──► Nerve ──► snapshot
//!               ▲            ▲
//!               │ membrane   │ lever
//!          EfficiencyModifiers (previous tick)
//!               ▲            ▲
//!          Pathology ──► Vascular
//! ```

pub mod health;
pub mod modifiers;
pub mod orchestrator;
pub mod vascular;

pub use health::{HealthMonitor, HealthReading};
pub use modifiers::EfficiencyModifiers;
pub use orchestrator::{SoundInput, StageOutputs, TransmissionOrchestrator};
pub use vascular::{VascularModel, VascularView};
