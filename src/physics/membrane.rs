//! Tympanic membrane vibration model.
//!
//! Each vertex is an independent damped spring anchored at its rest position
//! and driven along the membrane normal:
//!
//! m·a = -k·(x - x₀) - c·v + n̂·F(vertex, t)
//!
//! The drive F is a band-weighted sum of three spatial modes (piston,
//! radially decaying, radially oscillating), scaled by a frequency response
//! curve and a sinusoid. The mesh is animated in slowed visual time: a tone
//! of f Hz drives it at f × `visual_time_scale` Hz. `deform` returns the
//! current mean displacement magnitude; `rms_vibration` holds its RMS under
//! a 125 ms time weighting for stages that need a steady level.
//!
//! References:
//! - Fay et al., J Acoust Soc Am 2006 (low-frequency piston motion, modal
//!   breakup above ~2 kHz)
//! - Khanna & Tonndorf, J Acoust Soc Am 1972 (vibration patterns)

use glam::Vec3;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::MembraneParameters;
use crate::error::{TransmissionError, TransmissionResult};
use crate::geometry::MembraneMesh;
use crate::numeric::{finite_or, ResponseCurve};
use crate::tick::TickContext;

use super::integrator::{IntegratorState, SemiImplicitEuler, VertexStep};
use super::perforation::{self, PerforationGrade, PerforationZone};

/// Membrane velocity response by frequency (Hz, relative gain)
/// Source: Békésy, Experiments in Hearing, 1960 (umbo velocity transfer)
const MEMBRANE_RESPONSE: ResponseCurve = ResponseCurve::new(&[
    (20.0, 0.1),
    (100.0, 0.3),
    (250.0, 0.5),
    (500.0, 0.8),
    (1000.0, 1.0),
    (2000.0, 1.0),
    (4000.0, 0.8),
    (8000.0, 0.4),
    (20_000.0, 0.1),
]);

/// Upper frequency of the low band (Hz)
const LOW_BAND_HZ: f32 = 1000.0;
/// Upper frequency of the mid band (Hz)
const MID_BAND_HZ: f32 = 4000.0;
/// Hard cap on substeps per frame
const MAX_SUBSTEPS: usize = 50;

/// A single membrane vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembraneVertex {
    /// Rest position (immutable after construction)
    pub rest_position: Vec3,
    /// Current position
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Mass
    pub mass: f32,
    /// Tear depth [0,1]; 0 means intact
    pub perforation_depth: f32,
    /// Position the torn edge retracts to
    pub hole_position: Vec3,
}

impl MembraneVertex {
    fn new(rest_position: Vec3, mass: f32) -> Self {
        Self {
            rest_position,
            position: rest_position,
            velocity: Vec3::ZERO,
            mass,
            perforation_depth: 0.0,
            hole_position: rest_position,
        }
    }

    /// Whether this vertex lies inside a perforation
    pub fn is_perforated(&self) -> bool {
        self.perforation_depth > 0.0
    }

    /// Displacement from rest
    pub fn displacement(&self) -> Vec3 {
        self.position - self.rest_position
    }

    fn settle(&mut self) {
        self.position = self.rest_position;
        self.velocity = Vec3::ZERO;
    }
}

/// Weights of the three spatial modes for one frequency band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeWeights {
    pub piston: f32,
    pub first: f32,
    pub second: f32,
}

impl ModeWeights {
    /// Low frequencies move the membrane as a piston; high frequencies
    /// break it up into higher-order modes.
    pub fn for_frequency(frequency_hz: f32) -> Self {
        if frequency_hz < LOW_BAND_HZ {
            Self {
                piston: 0.7,
                first: 0.3,
                second: 0.0,
            }
        } else if frequency_hz < MID_BAND_HZ {
            Self {
                piston: 0.3,
                first: 0.5,
                second: 0.2,
            }
        } else {
            Self {
                piston: 0.1,
                first: 0.3,
                second: 0.6,
            }
        }
    }

    /// Mode shape at radial fraction `r` in [0, 1]
    pub fn shape(&self, r: f32) -> f32 {
        let first = (-2.0 * r * r).exp();
        let second = (3.0 * std::f32::consts::PI * r).cos() * (1.0 - r);
        self.piston + self.first * first + self.second * second
    }
}

/// Relative membrane response at a frequency
pub fn frequency_response(frequency_hz: f64) -> f64 {
    MEMBRANE_RESPONSE.sample(frequency_hz)
}

/// Deformable membrane driven by the incoming tone
pub struct MembraneSimulator {
    mesh: MembraneMesh,
    vertices: Vec<MembraneVertex>,
    /// Area attributed to each vertex (one third of each adjacent triangle)
    vertex_areas: Vec<f32>,
    total_area: f32,
    params: MembraneParameters,
    integrator: SemiImplicitEuler,
    zone_count: usize,
    /// Drive clock in visual time (s)
    drive_time_sec: f64,
    /// Running mean square of the aggregate displacement
    mean_square: f32,
    /// Mean displacement magnitude after the last substep
    last_vibration: f32,
}

impl MembraneSimulator {
    /// Build the simulator on a freshly generated mesh
    pub fn new(params: &MembraneParameters) -> Self {
        Self::from_mesh(MembraneMesh::generate_conical(params), params)
    }

    /// Build the simulator on an existing mesh
    pub fn from_mesh(mesh: MembraneMesh, params: &MembraneParameters) -> Self {
        let mass = if params.vertex_mass.is_finite() && params.vertex_mass > 0.0 {
            params.vertex_mass
        } else {
            log::warn!("Invalid vertex mass {}, using default", params.vertex_mass);
            MembraneParameters::default().vertex_mass
        };

        let vertices: Vec<MembraneVertex> = mesh
            .rest_positions
            .iter()
            .map(|&p| MembraneVertex::new(p, mass))
            .collect();

        let mut vertex_areas = vec![0.0f32; vertices.len()];
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (pa, pb, pc) = (mesh.rest_positions[a], mesh.rest_positions[b], mesh.rest_positions[c]);
            let third = (pb - pa).cross(pc - pa).length() / 6.0;
            vertex_areas[a] += third;
            vertex_areas[b] += third;
            vertex_areas[c] += third;
        }
        let total_area: f32 = vertex_areas.iter().sum();

        log::debug!(
            "Membrane: {} vertices, {} triangles, {:.1} mm²",
            vertices.len(),
            mesh.triangle_count(),
            total_area
        );

        Self {
            mesh,
            vertices,
            vertex_areas,
            total_area,
            params: params.clone(),
            integrator: SemiImplicitEuler::new(params.max_velocity, params.max_displacement),
            zone_count: 0,
            drive_time_sec: 0.0,
            mean_square: 0.0,
            last_vibration: 0.0,
        }
    }

    /// Advance the membrane by `ctx.dt` under a tone and return the aggregate
    /// vibration: the mean per-vertex displacement magnitude at the end of
    /// the step, with perforated vertices contributing nothing.
    ///
    /// Invalid amplitude or frequency drive nothing; the membrane still rings
    /// down. An invalid step size leaves the state untouched.
    pub fn deform(&mut self, amplitude: f32, frequency_hz: f32, ctx: &mut TickContext) -> f32 {
        let dt = ctx.dt_f32();
        if !(dt.is_finite() && dt > 0.0) {
            log::debug!("Membrane ignoring invalid dt {}", dt);
            return self.last_vibration;
        }

        let (amplitude, frequency) = if amplitude.is_finite()
            && amplitude > 0.0
            && frequency_hz.is_finite()
            && frequency_hz > 0.0
        {
            (amplitude, frequency_hz)
        } else {
            (0.0, 1000.0)
        };

        let frame_dt = dt.min(positive_or(self.params.max_frame_dt_sec, 0.1));
        let max_substep = positive_or(self.params.max_substep_sec, 0.002);
        let substeps = ((frame_dt / max_substep).ceil() as usize).clamp(1, MAX_SUBSTEPS);
        let h = frame_dt / substeps as f32;

        let n_total = self.vertices.len().max(1) as f32;
        let perforated_fraction = self.perforated_fraction();
        let drive_scale = 1.0 - self.params.perforation_tension_loss.clamp(0.0, 1.0) * perforated_fraction;
        let damping = self.params.damping.max(0.0) * (1.0 + self.params.perforation_damping_gain.max(0.0) * perforated_fraction);
        let stiffness = self.params.stiffness.max(0.0);

        let weights = ModeWeights::for_frequency(frequency);
        let response = frequency_response(frequency as f64) as f32;
        let drive_peak = amplitude * self.params.drive_gain * drive_scale * response;
        let shapes: Vec<f32> = (0..self.vertices.len())
            .map(|i| weights.shape(self.mesh.radial_fraction(i)))
            .collect();

        let normal = self.mesh.normal();
        let visual_hz = frequency as f64 * self.params.visual_time_scale.max(0.0) as f64;
        let pull = (self.params.hole_pull_rate.max(0.0) * h).min(1.0);
        let rms_alpha = (h / positive_or(self.params.rms_time_constant_sec, 0.125)).min(1.0);

        let mut mean = 0.0f32;
        for _ in 0..substeps {
            self.drive_time_sec += h as f64;
            let temporal = (std::f64::consts::TAU * visual_hz * self.drive_time_sec).sin() as f32;

            let mut displacement_sum = 0.0f32;
            for (i, vertex) in self.vertices.iter_mut().enumerate() {
                if vertex.is_perforated() {
                    vertex.position += (vertex.hole_position - vertex.position) * pull;
                    vertex.velocity = Vec3::ZERO;
                    continue;
                }

                let mut drive = drive_peak * shapes[i] * temporal;
                if self.params.enable_thermal_noise {
                    let jitter: f32 = ctx.rng.sample(StandardNormal);
                    drive += jitter * self.params.thermal_noise_amplitude;
                }

                let displacement = vertex.displacement();
                let force = -stiffness * displacement - damping * vertex.velocity + normal * drive;
                let acceleration = force / vertex.mass;

                match self
                    .integrator
                    .step_vertex(vertex.position, vertex.rest_position, vertex.velocity, acceleration, h)
                {
                    VertexStep::Moved { position, velocity } => {
                        vertex.position = position;
                        vertex.velocity = velocity;
                    }
                    VertexStep::Diverged => {
                        vertex.settle();
                        self.integrator.record_reset();
                    }
                }
                displacement_sum += vertex.displacement().length();
            }

            mean = finite_or((displacement_sum / n_total) as f64, 0.0) as f32;
            self.mean_square += (mean * mean - self.mean_square) * rms_alpha;
            if !self.mean_square.is_finite() {
                self.mean_square = 0.0;
            }

            let mass = self.vertices.first().map(|v| v.mass).unwrap_or(1.0);
            self.integrator
                .finish_substep(self.vertices.iter().map(|v| v.velocity), mass, h);
        }

        self.last_vibration = mean;
        self.last_vibration
    }

    /// Stop all motion: intact vertices return to rest and the readout drops to zero
    pub fn silence(&mut self) {
        for vertex in self.vertices.iter_mut().filter(|v| !v.is_perforated()) {
            vertex.settle();
        }
        self.mean_square = 0.0;
        self.last_vibration = 0.0;
    }

    /// Replace the perforation set with explicit vertex indices.
    ///
    /// Out-of-range indices are ignored. Returns the number of vertices marked.
    pub fn set_perforations<I>(&mut self, vertex_indices: I, depth: f32) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        self.clear_perforations();
        let depth = if depth.is_finite() { depth.clamp(0.0, 1.0) } else { 0.0 };
        if depth <= 0.0 {
            return 0;
        }

        let n = self.vertices.len();
        let mut marked = Vec::new();
        for idx in vertex_indices {
            if idx < n {
                marked.push(idx);
            } else {
                log::warn!("Ignoring perforation vertex {} (mesh has {})", idx, n);
            }
        }
        if marked.is_empty() {
            return 0;
        }

        let centroid = marked
            .iter()
            .map(|&i| self.vertices[i].rest_position)
            .fold(Vec3::ZERO, |acc, p| acc + p)
            / marked.len() as f32;
        let count = self.apply_perforation(&marked, centroid, depth);
        self.zone_count = 1;
        count
    }

    /// Add a circular perforation zone.
    ///
    /// Returns the number of vertices inside the zone. A zone that covers no
    /// vertex is ignored and does not count against capacity.
    pub fn add_perforation_zone(&mut self, zone: PerforationZone) -> TransmissionResult<usize> {
        if self.zone_count >= self.params.max_perforations {
            return Err(TransmissionError::PerforationCapacity {
                max: self.params.max_perforations,
            });
        }
        if !zone.is_valid() {
            log::warn!("Ignoring invalid perforation zone {:?}", zone);
            return Ok(0);
        }

        let affected = self.mesh.vertices_within(zone.center, zone.radius_mm);
        if affected.is_empty() {
            log::debug!("Perforation zone at {:?} covers no vertices", zone.center);
            return Ok(0);
        }

        let count = self.apply_perforation(&affected, zone.center, zone.depth);
        self.zone_count += 1;
        log::info!(
            "Perforation zone added: {} vertices, {:.1}% of area ({} zones)",
            count,
            self.perforated_area_fraction() * 100.0,
            self.zone_count
        );
        Ok(count)
    }

    fn apply_perforation(&mut self, indices: &[usize], center: Vec3, depth: f32) -> usize {
        let retraction = self.params.hole_retraction.max(0.0) * self.mesh.radius_mm;
        for &i in indices {
            let vertex = &mut self.vertices[i];
            let outward = (vertex.rest_position - center).truncate().normalize_or_zero().extend(0.0);
            vertex.perforation_depth = vertex.perforation_depth.max(depth);
            vertex.hole_position = vertex.rest_position + outward * retraction * vertex.perforation_depth;
            vertex.velocity = Vec3::ZERO;
        }
        indices.len()
    }

    /// Heal every perforation
    pub fn clear_perforations(&mut self) {
        for vertex in &mut self.vertices {
            vertex.perforation_depth = 0.0;
            vertex.hole_position = vertex.rest_position;
            vertex.settle();
        }
        self.zone_count = 0;
    }

    /// Fraction of vertices inside a perforation
    pub fn perforated_fraction(&self) -> f32 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        let count = self.vertices.iter().filter(|v| v.is_perforated()).count();
        count as f32 / self.vertices.len() as f32
    }

    /// Share of membrane area that is open, weighted by tear depth
    pub fn perforated_area_fraction(&self) -> f64 {
        if self.total_area <= 0.0 {
            return 0.0;
        }
        let open: f32 = self
            .vertices
            .iter()
            .zip(&self.vertex_areas)
            .map(|(v, a)| v.perforation_depth * a)
            .sum();
        (open / self.total_area).clamp(0.0, 1.0) as f64
    }

    /// Clinical grade of the current perforation
    pub fn perforation_grade(&self) -> PerforationGrade {
        PerforationGrade::from_area_fraction(self.perforated_area_fraction())
    }

    /// Conductive loss from the current perforation at a frequency (dB)
    pub fn transmission_loss_db(&self, frequency_hz: f64) -> f64 {
        perforation::transmission_loss_db(self.perforated_area_fraction(), frequency_hz)
    }

    /// Linear transmission factor from the current perforation
    pub fn transmission_factor(&self, frequency_hz: f64) -> f64 {
        perforation::loss_to_factor(self.transmission_loss_db(frequency_hz))
    }

    /// Number of active perforation zones
    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// Aggregate vibration from the last `deform`
    pub fn last_vibration(&self) -> f32 {
        self.last_vibration
    }

    /// Time-weighted RMS of the aggregate vibration
    pub fn rms_vibration(&self) -> f32 {
        finite_or(self.mean_square.max(0.0).sqrt() as f64, 0.0) as f32
    }

    pub fn vertices(&self) -> &[MembraneVertex] {
        &self.vertices
    }

    pub fn mesh(&self) -> &MembraneMesh {
        &self.mesh
    }

    pub fn integrator_state(&self) -> &IntegratorState {
        &self.integrator.state
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
