//! Configuration module for loading simulation parameters.
//!
//! Anatomical parameters include citations to their source publications.

mod parameters;

pub use parameters::{
    CochleaParameters, HealthParameters, LeverParameters, LeverStage, MembraneParameters,
    NerveParameters, Parameters, PathologyParameters, SimulationParameters, VascularParameters,
};
