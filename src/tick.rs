//! Per-tick context passed explicitly into every stage.

use rand::rngs::StdRng;

/// Everything a stage may read about "now": the step size, the simulation
/// clock, and the seeded random source. Stages never reach for global time
/// or a thread-local RNG.
pub struct TickContext<'a> {
    /// Step size in seconds (finite, > 0)
    pub dt: f64,
    /// Simulation time at the start of the tick (s)
    pub time_sec: f64,
    /// Seeded random source owned by the orchestrator
    pub rng: &'a mut StdRng,
}

impl<'a> TickContext<'a> {
    pub fn new(dt: f64, time_sec: f64, rng: &'a mut StdRng) -> Self {
        Self { dt, time_sec, rng }
    }

    /// Step size as f32 for the membrane mesh
    pub fn dt_f32(&self) -> f32 {
        self.dt as f32
    }
}

/// Validate a caller-supplied step size
pub fn valid_dt(dt: f64) -> Option<f64> {
    if dt.is_finite() && dt > 0.0 {
        Some(dt)
    } else {
        None
    }
}
