//! Auditory nerve transmission.
//!
//! Converts cochlear output into a signal strength after a timed, four-phase
//! journey to the brainstem, with fatigue, adaptation and condition-dependent
//! losses along the way.

mod pipeline;
mod signal;

pub use pipeline::NerveSignalPipeline;
pub use signal::{NerveSignal, NerveStage, PhaseTimer};
