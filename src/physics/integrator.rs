//! Time integration for the membrane vertices.
//!
//! Semi-implicit (symplectic) Euler:
//! 1. v(t + dt) = v(t) + dt * a(t)
//! 2. x(t + dt) = x(t) + dt * v(t + dt)
//!
//! Stable for a damped spring as long as ω₀·dt < 2. Velocities are clamped
//! component-wise and displacement from rest is clamped in magnitude, so a
//! runaway vertex is bounded rather than diverging.
//!
//! Reference: Hairer, Lubich & Wanner, Geometric Numerical Integration, 2006

use glam::Vec3;

/// State tracking for the integrator
#[derive(Debug, Clone, Default)]
pub struct IntegratorState {
    /// Accumulated integration time (s)
    pub time_sec: f64,
    /// Number of substeps taken
    pub step_count: u64,
    /// Largest speed observed in the last substep
    pub max_speed: f32,
    /// Total kinetic energy after the last substep (model units)
    pub kinetic_energy: f32,
    /// Vertices reset to rest after a non-finite update
    pub reset_count: u64,
}

/// Outcome of one vertex update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexStep {
    /// New position and velocity
    Moved { position: Vec3, velocity: Vec3 },
    /// A non-finite value appeared; the caller resets the vertex
    Diverged,
}

/// Semi-implicit Euler integrator with stability clamps
#[derive(Debug, Clone)]
pub struct SemiImplicitEuler {
    /// State tracking
    pub state: IntegratorState,
    /// Component-wise velocity limit
    pub max_velocity: f32,
    /// Displacement magnitude limit relative to rest
    pub max_displacement: f32,
}

impl SemiImplicitEuler {
    /// Create an integrator. Non-positive or non-finite limits use safe defaults.
    pub fn new(max_velocity: f32, max_displacement: f32) -> Self {
        Self {
            state: IntegratorState::default(),
            max_velocity: positive_or(max_velocity, 50.0),
            max_displacement: positive_or(max_displacement, 0.2),
        }
    }

    /// Advance one vertex by `dt`
    pub fn step_vertex(
        &self,
        position: Vec3,
        rest: Vec3,
        velocity: Vec3,
        acceleration: Vec3,
        dt: f32,
    ) -> VertexStep {
        if !acceleration.is_finite() {
            return VertexStep::Diverged;
        }

        let limit = Vec3::splat(self.max_velocity);
        let velocity = (velocity + acceleration * dt).clamp(-limit, limit);

        let mut displacement = position + velocity * dt - rest;
        let disp_mag = displacement.length();
        if disp_mag > self.max_displacement {
            displacement *= self.max_displacement / disp_mag;
        }
        let position = rest + displacement;

        if velocity.is_finite() && position.is_finite() {
            VertexStep::Moved { position, velocity }
        } else {
            VertexStep::Diverged
        }
    }

    /// Record a completed substep over all vertices
    pub fn finish_substep(&mut self, velocities: impl Iterator<Item = Vec3>, mass: f32, dt: f32) {
        let mut max_speed = 0.0f32;
        let mut ke = 0.0f32;
        for v in velocities {
            let speed_sq = v.length_squared();
            max_speed = max_speed.max(speed_sq.sqrt());
            ke += 0.5 * mass * speed_sq;
        }
        self.state.max_speed = max_speed;
        self.state.kinetic_energy = ke;
        self.state.step_count += 1;
        self.state.time_sec += dt as f64;
    }

    /// Count a vertex reset
    pub fn record_reset(&mut self) {
        self.state.reset_count += 1;
    }

    /// Reset the integrator state
    pub fn reset(&mut self) {
        self.state = IntegratorState::default();
    }

    /// Number of substeps taken
    pub fn step_count(&self) -> u64 {
        self.state.step_count
    }
}

impl Default for SemiImplicitEuler {
    fn default() -> Self {
        Self::new(50.0, 0.2)
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrator_creation() {
        let integrator = SemiImplicitEuler::default();
        assert_eq!(integrator.state.step_count, 0);
        assert_eq!(integrator.state.time_sec, 0.0);
    }

    #[test]
    fn test_step_moves_along_acceleration() {
        let integrator = SemiImplicitEuler::default();
        let step = integrator.step_vertex(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::Z, 0.01);

        match step {
            VertexStep::Moved { position, velocity } => {
                assert!(velocity.z > 0.0);
                // Semi-implicit: position uses the updated velocity
                assert!((position.z - 0.0001).abs() < 1e-7);
            }
            VertexStep::Diverged => panic!("finite step should not diverge"),
        }
    }

    #[test]
    fn test_velocity_clamping() {
        let integrator = SemiImplicitEuler::new(10.0, 100.0);
        let step = integrator.step_vertex(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(100.0, -100.0, 0.0),
            Vec3::ZERO,
            0.001,
        );

        let VertexStep::Moved { velocity, .. } = step else {
            panic!("finite step should not diverge");
        };
        assert!((velocity.x - 10.0).abs() < 1e-6);
        assert!((velocity.y + 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_displacement_clamping() {
        let integrator = SemiImplicitEuler::new(1000.0, 0.2);
        let rest = Vec3::new(1.0, 2.0, 3.0);
        let step = integrator.step_vertex(rest, rest, Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, 1.0);

        let VertexStep::Moved { position, .. } = step else {
            panic!("finite step should not diverge");
        };
        assert!(((position - rest).length() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_diverges() {
        let integrator = SemiImplicitEuler::default();
        let step = integrator.step_vertex(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(f32::NAN, 0.0, 0.0),
            0.001,
        );
        assert_eq!(step, VertexStep::Diverged);

        let step = integrator.step_vertex(
            Vec3::new(f32::INFINITY, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            0.001,
        );
        assert_eq!(step, VertexStep::Diverged);
    }

    #[test]
    fn test_energy_tracking() {
        let mut integrator = SemiImplicitEuler::default();
        integrator.finish_substep([Vec3::new(2.0, 0.0, 0.0)].into_iter(), 0.5, 0.001);

        assert_eq!(integrator.step_count(), 1);
        assert!((integrator.state.kinetic_energy - 1.0).abs() < 1e-6);
        assert!((integrator.state.max_speed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_limits_use_defaults() {
        let integrator = SemiImplicitEuler::new(f32::NAN, -1.0);
        assert_eq!(integrator.max_velocity, 50.0);
        assert_eq!(integrator.max_displacement, 0.2);
    }
}
