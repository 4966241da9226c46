//! Parameter structures with citation metadata.
//!
//! Anatomical and physiological constants carry their source where one exists.
//! Model-tuning constants (gains, rates) are marked as such.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pathology::Pathogen;

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Tympanic membrane geometry and vibration model
    pub membrane: MembraneParameters,
    /// Ossicular lever chain
    pub lever: LeverParameters,
    /// Cochlear analyzer (SPL, bands, exposure)
    pub cochlea: CochleaParameters,
    /// Auditory nerve pipeline
    pub nerve: NerveParameters,
    /// Otitis media progression
    pub pathology: PathologyParameters,
    /// Middle-ear mucosal blood flow
    pub vascular: VascularParameters,
    /// Health monitor thresholds
    pub health: HealthParameters,
    /// Orchestrator-level settings
    pub simulation: SimulationParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory
    ///
    /// Each section lives in its own file (`membrane.json`, `lever.json`, ...).
    /// Missing or malformed files fall back to that section's defaults.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            membrane: load_section(dir.join("membrane.json"), "membrane"),
            lever: load_section(dir.join("lever.json"), "lever"),
            cochlea: load_section(dir.join("cochlea.json"), "cochlea"),
            nerve: load_section(dir.join("nerve.json"), "nerve"),
            pathology: load_section(dir.join("pathology.json"), "pathology"),
            vascular: load_section(dir.join("vascular.json"), "vascular"),
            health: load_section(dir.join("health.json"), "health"),
            simulation: load_section(dir.join("simulation.json"), "simulation"),
        }
    }

    /// Load a complete parameter set from a single JSON document
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let params = serde_json::from_str(&contents)?;
        log::info!("Loaded parameters from {:?}", path.as_ref());
        Ok(params)
    }
}

/// Load one parameter section from JSON or return its defaults
fn load_section<T, P>(path: P, label: &str) -> T
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::debug!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Tympanic membrane parameters
///
/// The eardrum is modelled as a shallow cone with the umbo at its apex.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneParameters {
    /// Membrane radius (mm)
    /// Reference: pars tensa diameter 8-10 mm
    /// Source: Volandri et al., J Biomech 2011
    pub radius_mm: f32,

    /// Cone depth at the umbo (mm)
    /// Reference: ~1.5-2 mm umbo depression
    /// Source: Decraemer et al., Hear Res 1991
    pub cone_depth_mm: f32,

    /// Number of concentric vertex rings
    pub ring_count: usize,

    /// Vertices per ring
    pub angular_divisions: usize,

    /// Mass per vertex (model units)
    pub vertex_mass: f32,

    /// Restoring stiffness toward rest position (model units)
    pub stiffness: f32,

    /// Velocity damping coefficient (model units)
    pub damping: f32,

    /// Force produced per unit input amplitude (model tuning)
    pub drive_gain: f32,

    /// Maximum displacement magnitude per vertex
    pub max_displacement: f32,

    /// Component-wise velocity limit
    pub max_velocity: f32,

    /// Largest integration substep (s)
    pub max_substep_sec: f32,

    /// Longest span of physics integrated per frame (s)
    pub max_frame_dt_sec: f32,

    /// Slow-motion factor: the membrane is animated in slowed time, so a
    /// tone of f Hz drives the mesh at f × scale Hz rather than at f.
    /// Keeps the drive well below the substep Nyquist rate.
    pub visual_time_scale: f32,

    /// Time weighting of the RMS vibration readout (s)
    /// Reference: "Fast" sound-level-meter weighting, 125 ms
    /// Source: IEC 61672-1:2013
    pub rms_time_constant_sec: f32,

    /// Fractional loss of drive coupling at full perforation
    pub perforation_tension_loss: f32,

    /// Damping increase per unit perforated fraction
    pub perforation_damping_gain: f32,

    /// Outward retraction of torn edges, as fraction of radius at depth 1
    pub hole_retraction: f32,

    /// Rate at which perforated vertices approach the open-hole position (1/s)
    pub hole_pull_rate: f32,

    /// Maximum number of simultaneously active perforation zones
    pub max_perforations: usize,

    /// Add Brownian jitter to the driving force
    pub enable_thermal_noise: bool,

    /// Jitter force standard deviation
    pub thermal_noise_amplitude: f32,
}

impl Default for MembraneParameters {
    fn default() -> Self {
        Self {
            // Volandri et al. 2011
            radius_mm: 4.5,
            // Decraemer et al. 1991
            cone_depth_mm: 1.5,

            ring_count: 12,
            angular_divisions: 24,

            // Model tuning: natural frequency ~32 Hz, damping ratio 0.5
            vertex_mass: 0.01,
            stiffness: 400.0,
            damping: 2.0,
            drive_gain: 20.0,

            max_displacement: 0.2,
            max_velocity: 50.0,
            max_substep_sec: 0.002,
            max_frame_dt_sec: 0.1,
            visual_time_scale: 0.01,
            // IEC 61672-1
            rms_time_constant_sec: 0.125,

            perforation_tension_loss: 0.5,
            perforation_damping_gain: 2.0,
            hole_retraction: 0.15,
            hole_pull_rate: 20.0,
            max_perforations: 8,

            enable_thermal_noise: false,
            thermal_noise_amplitude: 0.05,
        }
    }
}

/// One stage of the ossicular lever chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeverStage {
    /// Amplification factor
    pub ratio: f64,
    /// Loss coefficient applied when the global stiffness scale rises above 1
    pub stiffness: f64,
    /// Loss coefficient scaled by the global damping scale
    pub damping: f64,
}

impl LeverStage {
    pub const fn new(ratio: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            ratio,
            stiffness,
            damping,
        }
    }
}

/// Ossicular chain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverParameters {
    /// Malleus-incus lever
    /// Reference: manubrium / long process ratio ~1.3
    /// Source: Wever & Lawrence, Physiological Acoustics 1954
    pub malleus: LeverStage,

    /// Incus-stapes lever
    pub incus: LeverStage,

    /// Tympanic membrane / footplate area ratio
    /// Reference: ~17:1
    /// Source: Wever & Lawrence 1954
    pub stapes: LeverStage,

    /// Middle-ear resonance (Hz)
    /// Reference: 800-1200 Hz
    /// Source: Zwislocki, J Acoust Soc Am 1962
    pub resonance_hz: f64,

    /// Quality factor of the resonance
    pub quality_factor: f64,

    /// Lower edge of the optimal passband (Hz)
    pub passband_low_hz: f64,

    /// Upper edge of the optimal passband (Hz)
    pub passband_high_hz: f64,

    /// Output clamp
    pub max_output: f64,
}

impl Default for LeverParameters {
    fn default() -> Self {
        Self {
            // Wever & Lawrence 1954
            malleus: LeverStage::new(1.3, 0.2, 0.02),
            incus: LeverStage::new(1.1, 0.2, 0.02),
            stapes: LeverStage::new(17.0, 0.1, 0.01),

            // Zwislocki 1962
            resonance_hz: 1000.0,
            quality_factor: 1.5,

            passband_low_hz: 500.0,
            passband_high_hz: 4000.0,
            max_output: 10.0,
        }
    }
}

/// Cochlear analyzer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CochleaParameters {
    /// Lowest band center (Hz)
    pub min_band_hz: f64,

    /// Highest band center (Hz)
    pub max_band_hz: f64,

    /// Stapes footplate area (m²)
    /// Reference: ~3.2 mm²
    /// Source: Wever & Lawrence 1954
    pub footplate_area_m2: f64,

    /// Cochlear input impedance (Pa·s/m³)
    /// Reference: ~21 GΩ acoustic
    /// Source: Aibara et al., Hear Res 2001
    pub cochlear_impedance_pa_s_per_m3: f64,

    /// Reference pressure for dB SPL (Pa)
    pub reference_pressure_pa: f64,

    /// Physical size of one lever-output unit (m). Lever output is stapes displacement in nm.
    pub vibration_unit_m: f64,

    /// Hearing threshold used for band excitation (dB SPL)
    pub hearing_threshold_db: f64,

    /// Level above which exposure energy accumulates (dB SPL)
    /// Reference: 85 dBA recommended exposure limit
    /// Source: NIOSH Publication 98-126, 1998
    pub exposure_threshold_db: f64,

    /// Band smoothing / adaptation onset time constant (s)
    pub adaptation_rate_sec: f64,

    /// Adaptation recovery time constant (s)
    pub recovery_rate_sec: f64,

    /// Exposure time at which time-based risk saturates (s)
    /// Reference: 8-hour working day
    /// Source: NIOSH 1998
    pub damage_time_limit_sec: f64,

    /// Average level at which level-based risk starts (dB SPL)
    pub risk_level_floor_db: f64,

    /// Span above the floor at which level-based risk saturates (dB)
    pub risk_level_span_db: f64,
}

impl Default for CochleaParameters {
    fn default() -> Self {
        Self {
            min_band_hz: 20.0,
            max_band_hz: 20_000.0,

            // Wever & Lawrence 1954
            footplate_area_m2: 3.2e-6,
            // Aibara et al. 2001
            cochlear_impedance_pa_s_per_m3: 2.0e10,
            reference_pressure_pa: 20e-6,
            vibration_unit_m: 1e-9,

            hearing_threshold_db: 20.0,
            // NIOSH 1998
            exposure_threshold_db: 85.0,

            adaptation_rate_sec: 0.5,
            recovery_rate_sec: 2.0,

            // NIOSH 1998
            damage_time_limit_sec: 28_800.0,
            risk_level_floor_db: 80.0,
            risk_level_span_db: 40.0,
        }
    }
}

/// Auditory nerve parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerveParameters {
    /// Auditory nerve length from spiral ganglion to cochlear nucleus (mm)
    /// Reference: ~25 mm
    /// Source: Spoendlin & Schrott, Hear Res 1989
    pub fiber_length_mm: f64,

    /// Conduction velocity (m/s)
    /// Reference: 10-40 m/s for type I fibres
    pub conduction_velocity_m_per_s: f64,

    /// Hair-cell transduction / preprocessing delay (s)
    pub preprocessing_delay_sec: f64,

    /// Ribbon synapse delay (s)
    /// Reference: ~0.5-1 ms
    /// Source: Glowatzki & Fuchs, Nat Neurosci 2002
    pub synaptic_delay_sec: f64,

    /// Brainstem relay delay (s)
    pub brainstem_delay_sec: f64,

    /// Initial fibre damage level [0,1]
    pub damage: f64,

    /// Initial age-related degeneration level [0,1]
    pub aging: f64,

    /// Initial metabolic stress level [0,1]
    pub stress: f64,

    /// Fatigue accrued per completed signal, per unit intensity (percentage points)
    pub fatigue_per_intensity: f64,

    /// Fatigue above which output is halved (%)
    pub protective_fatigue_percent: f64,

    /// Fatigue recovery while idle (%/s)
    pub fatigue_recovery_per_sec: f64,

    /// Idle time before fatigue starts to recover (s)
    pub idle_recovery_delay_sec: f64,

    /// Adaptation onset time constant (s)
    pub adaptation_rate_sec: f64,

    /// Adaptation recovery time constant (s)
    pub recovery_rate_sec: f64,

    /// Maximum signals waiting behind the one in flight
    pub max_queue: usize,

    /// Level mapped to full intensity (dB SPL)
    pub full_scale_db: f64,
}

impl Default for NerveParameters {
    fn default() -> Self {
        Self {
            // Spoendlin & Schrott 1989
            fiber_length_mm: 25.0,
            conduction_velocity_m_per_s: 30.0,

            preprocessing_delay_sec: 0.002,
            // Glowatzki & Fuchs 2002
            synaptic_delay_sec: 0.001,
            brainstem_delay_sec: 0.002,

            damage: 0.0,
            aging: 0.0,
            stress: 0.0,

            fatigue_per_intensity: 0.1,
            protective_fatigue_percent: 80.0,
            fatigue_recovery_per_sec: 5.0,
            idle_recovery_delay_sec: 1.0,

            adaptation_rate_sec: 0.5,
            recovery_rate_sec: 2.0,

            max_queue: 16,
            full_scale_db: 120.0,
        }
    }
}

/// Otitis media progression parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathologyParameters {
    /// Simulated seconds per real second of disease course.
    /// 8640 maps one disease day onto ten simulation seconds.
    pub time_acceleration: f64,

    /// Patient age (years)
    pub patient_age_years: f64,

    /// Immune response strength (1.0 = typical)
    pub immune_response: f64,

    /// Natural healing contribution per unit immune response (%)
    pub healing_rate_multiplier: f64,

    /// Causative pathogen
    pub pathogen: Pathogen,

    /// Delay before antibiotics take effect (days)
    pub antibiotic_onset_days: f64,

    /// Interval between complication checks (simulation seconds)
    pub complication_check_interval_sec: f64,

    /// Probability that a check above threshold perforates the membrane
    pub perforation_probability: f64,

    /// Perforation risk above which checks roll (%)
    pub perforation_risk_threshold: f64,

    /// Hearing loss added by a perforation event (dB)
    pub perforation_hearing_loss_db: f64,

    /// Perforated area fraction per unit severity at the time of rupture
    pub perforation_area_per_severity: f64,

    /// Duration of the healing process (days)
    pub healing_duration_days: f64,

    /// Fraction of the perforation-induced loss recovered by healing
    pub healing_recovery_fraction: f64,

    /// Treatment effectiveness below which Peak/Resolution turn chronic (%)
    pub chronic_threshold: f64,

    /// Treatment effectiveness required to leave Chronic (%)
    pub chronic_exit_threshold: f64,

    /// Run stochastic complication checks
    pub enable_complications: bool,
}

impl Default for PathologyParameters {
    fn default() -> Self {
        Self {
            time_acceleration: 8640.0,
            patient_age_years: 4.0,
            immune_response: 1.0,
            healing_rate_multiplier: 25.0,
            pathogen: Pathogen::default(),
            antibiotic_onset_days: 1.0,
            complication_check_interval_sec: 2.5,
            perforation_probability: 0.02,
            perforation_risk_threshold: 60.0,
            perforation_hearing_loss_db: 15.0,
            perforation_area_per_severity: 0.2,
            healing_duration_days: 3.0,
            healing_recovery_fraction: 0.7,
            chronic_threshold: 20.0,
            chronic_exit_threshold: 50.0,
            enable_complications: true,
        }
    }
}

/// Middle-ear mucosal blood flow parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VascularParameters {
    /// Resting blood flow fraction [0,1]
    pub baseline_flow: f64,

    /// Flow reduction at full inflammation (oedema compression)
    pub inflammation_flow_drop: f64,

    /// Relaxation time toward the target flow (s)
    pub response_time_sec: f64,

    /// Lever efficiency floor per unit blood flow
    pub efficiency_floor_gain: f64,
}

impl Default for VascularParameters {
    fn default() -> Self {
        Self {
            baseline_flow: 0.85,
            inflammation_flow_drop: 0.5,
            response_time_sec: 2.0,
            efficiency_floor_gain: 0.3,
        }
    }
}

/// Health monitor thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthParameters {
    /// Seconds between checks (must give >= 1 Hz)
    pub check_interval_sec: f64,
    /// Sound level above which a warning is raised (dB SPL)
    pub high_sound_level_db: f64,
    /// Transmission efficiency below which a warning is raised (%)
    pub low_efficiency_percent: f64,
    /// Inflammation above which a warning is raised (%)
    pub inflammation_percent: f64,
    /// Nerve strength below which a warning is raised (%)
    pub weak_nerve_percent: f64,
    /// Nerve strength is only judged when the sound level exceeds this (dB SPL)
    pub weak_nerve_min_sound_db: f64,
}

impl Default for HealthParameters {
    fn default() -> Self {
        Self {
            check_interval_sec: 0.5,
            high_sound_level_db: 90.0,
            low_efficiency_percent: 50.0,
            inflammation_percent: 40.0,
            weak_nerve_percent: 20.0,
            weak_nerve_min_sound_db: 30.0,
        }
    }
}

/// Orchestrator-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Seed for the tick RNG
    pub seed: u64,
    /// Amplitudes at or below this are treated as silence
    pub silence_epsilon: f64,
    /// Nerve efficiency assumed when no nerve pipeline is attached
    pub missing_nerve_efficiency: f64,
    /// Membrane efficiency lost per unit severity
    pub severity_membrane_loss: f64,
    /// Lever efficiency lost per unit (fluid × severity)
    pub fluid_lever_loss: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            seed: 42,
            silence_epsilon: 1e-6,
            missing_nerve_efficiency: 0.8,
            severity_membrane_loss: 0.5,
            fluid_lever_loss: 0.6,
        }
    }
}
