//! Published state of the simulation.
//!
//! Contains the per-tick status snapshot and the health classification
//! types shared by the health monitor and the binary.

mod metrics;

pub use metrics::{HealthLevel, HealthWarning, StatusSnapshot, ThresholdStatus};
