//! Declined-operation errors.
//!
//! Numeric faults never surface here; they are repaired in place by the stage
//! that produced them. These variants report operations that were refused
//! without changing any state.

use thiserror::Error;

/// An operation the simulation declined
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransmissionError {
    /// Membrane already carries the maximum number of perforation zones
    #[error("Perforation capacity reached: {max} zones already active")]
    PerforationCapacity {
        /// Configured maximum
        max: usize,
    },

    /// Nerve pipeline queue is full
    #[error("Nerve signal queue full: {capacity} signals pending")]
    SignalQueueFull {
        /// Configured queue length
        capacity: usize,
    },

    /// Treatment requested while no disease episode is running
    #[error("No active disease episode for {operation}")]
    NoActiveDisease {
        /// Operation that was refused
        operation: &'static str,
    },
}

/// Result alias for declinable operations
pub type TransmissionResult<T> = Result<T, TransmissionError>;
