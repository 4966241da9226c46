//! Mechanical stages of the conduction path.
//!
//! This module implements:
//! - Tympanic membrane vibration (per-vertex spring-damper, modal drive)
//! - Perforation geometry, grading and conductive loss
//! - The ossicular lever chain
//! - Semi-implicit Euler time integration

pub mod integrator;
pub mod lever;
pub mod membrane;
pub mod perforation;

pub use integrator::{IntegratorState, SemiImplicitEuler};
pub use lever::LeverChain;
pub use membrane::{MembraneSimulator, MembraneVertex, ModeWeights};
pub use perforation::{PerforationGrade, PerforationZone};
