//! Tick-driven orchestration of the whole transmission chain.
//!
//! One tick:
//! 1. Efficiency multipliers from the previous tick's pathology and vascular state
//! 2. Membrane → lever → cochlea → nerve (or silence propagated downstream)
//! 3. Pathology and vascular models advance (sole writers of their state)
//! 4. Health check when due, then the status snapshot is published
//!
//! The orchestrator owns every subsystem and the seeded RNG; subsystems
//! receive the step size, clock and RNG through an explicit `TickContext`.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cochlea::CochlearAnalyzer;
use crate::config::Parameters;
use crate::nerve::{NerveSignal, NerveSignalPipeline};
use crate::numeric::clamp01;
use crate::pathology::{PathologyStateMachine, PathologyView};
use crate::physics::{LeverChain, MembraneSimulator, PerforationGrade};
use crate::state::StatusSnapshot;
use crate::tick::{valid_dt, TickContext};

use super::health::{HealthMonitor, HealthReading};
use super::modifiers::EfficiencyModifiers;
use super::vascular::{VascularModel, VascularView};

/// External sound input held between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundInput {
    /// Amplitude (≥ 0)
    pub amplitude: f64,
    /// Frequency (Hz, > 0)
    pub frequency_hz: f64,
}

impl Default for SoundInput {
    fn default() -> Self {
        Self {
            amplitude: 0.0,
            frequency_hz: 1000.0,
        }
    }
}

/// Intermediate values of the last tick, stage by stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageOutputs {
    /// Membrane aggregate vibration
    pub membrane_vibration: f64,
    /// Vibration entering the lever chain after membrane losses
    pub lever_input: f64,
    pub lever_output: f64,
    pub sound_level_db: f64,
    /// Intensity submitted to the nerve [0,1]
    pub nerve_intensity: f64,
    /// Nerve output [0,1]
    pub nerve_strength: f64,
}

/// Owns and drives every subsystem of the simulation
pub struct TransmissionOrchestrator {
    params: Parameters,
    membrane: MembraneSimulator,
    lever: LeverChain,
    cochlea: CochlearAnalyzer,
    nerve: Option<NerveSignalPipeline>,
    pathology: PathologyStateMachine,
    vascular: VascularModel,
    health: HealthMonitor,
    rng: StdRng,

    input: SoundInput,
    time_sec: f64,
    tick_count: u64,
    modifiers: EfficiencyModifiers,
    outputs: StageOutputs,
    snapshot: StatusSnapshot,
}

impl TransmissionOrchestrator {
    pub fn new(params: &Parameters) -> Self {
        log::info!(
            "Transmission chain: {}-ring membrane, lever gain {:.1}x at 1 kHz, seed {}",
            params.membrane.ring_count,
            LeverChain::new(&params.lever).total_gain(1000.0),
            params.simulation.seed
        );

        Self {
            params: params.clone(),
            membrane: MembraneSimulator::new(&params.membrane),
            lever: LeverChain::new(&params.lever),
            cochlea: CochlearAnalyzer::new(&params.cochlea),
            nerve: Some(NerveSignalPipeline::new(&params.nerve)),
            pathology: PathologyStateMachine::new(&params.pathology),
            vascular: VascularModel::new(&params.vascular),
            health: HealthMonitor::new(&params.health),
            rng: StdRng::seed_from_u64(params.simulation.seed),
            input: SoundInput::default(),
            time_sec: 0.0,
            tick_count: 0,
            modifiers: EfficiencyModifiers::default(),
            outputs: StageOutputs::default(),
            snapshot: StatusSnapshot::default(),
        }
    }

    /// Set the sound driving subsequent ticks.
    ///
    /// Non-finite or negative amplitude and non-positive frequency are
    /// treated as silence.
    pub fn receive_sound(&mut self, amplitude: f64, frequency_hz: f64) {
        let valid_amplitude = amplitude.is_finite() && amplitude >= 0.0;
        let valid_frequency = frequency_hz.is_finite() && frequency_hz > 0.0;
        if valid_amplitude && valid_frequency {
            self.input = SoundInput {
                amplitude,
                frequency_hz,
            };
        } else {
            log::warn!(
                "Ignoring invalid sound input ({}, {} Hz), treating as silence",
                amplitude,
                frequency_hz
            );
            self.input.amplitude = 0.0;
        }
    }

    /// Advance the whole simulation by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        let Some(dt) = valid_dt(dt) else {
            log::debug!("Skipping tick with invalid dt {}", dt);
            return;
        };

        let frequency = self.input.frequency_hz;
        self.modifiers =
            EfficiencyModifiers::compute(&self.pathology, &self.vascular, &self.params.simulation, frequency);

        let mut ctx = TickContext::new(dt, self.time_sec, &mut self.rng);

        if self.input.amplitude <= self.params.simulation.silence_epsilon {
            self.membrane.silence();
            self.lever.silence();
            self.cochlea.silence(dt);
            if let Some(nerve) = self.nerve.as_mut() {
                nerve.silence(dt);
            }
            self.outputs = StageOutputs::default();
        } else {
            self.membrane.deform(self.input.amplitude as f32, frequency as f32, &mut ctx);
            // The SPL stage needs a steady level, not the instantaneous mean
            let vibration = self.membrane.rms_vibration() as f64;
            let lever_input = vibration * self.modifiers.membrane * self.membrane.transmission_factor(frequency);
            let lever_output = self
                .lever
                .transmit_with_efficiency(lever_input, frequency, self.modifiers.lever);
            let sound_level_db = self.cochlea.process(lever_output, frequency, dt);
            let nerve_intensity = clamp01(sound_level_db / self.params.nerve.full_scale_db.max(1.0));

            let nerve_strength = match self.nerve.as_mut() {
                Some(nerve) => {
                    nerve.set_inflammation(self.pathology.inflammation_level());
                    if let Err(e) = nerve.submit(NerveSignal::new(nerve_intensity, frequency, ctx.time_sec)) {
                        log::debug!("Nerve signal dropped: {}", e);
                    }
                    nerve.advance(dt);
                    nerve.signal_strength()
                }
                None => clamp01(nerve_intensity * self.params.simulation.missing_nerve_efficiency),
            };

            self.outputs = StageOutputs {
                membrane_vibration: vibration,
                lever_input,
                lever_output,
                sound_level_db,
                nerve_intensity,
                nerve_strength,
            };
        }

        self.pathology.tick(&mut ctx);
        self.vascular.set_inflammation(self.pathology.inflammation_level());
        self.vascular.advance(dt);

        self.time_sec += dt;
        self.tick_count += 1;

        let reading = self.health_reading();
        self.health.update(dt, &reading);
        self.snapshot = self.build_snapshot(&reading);
    }

    /// Cure the ear: end the disease episode, close every membrane
    /// perforation and return vascular and health state to rest. Sound input,
    /// the clock and accumulated noise exposure are kept.
    pub fn cure(&mut self) {
        self.pathology.reset();
        self.membrane.clear_perforations();
        self.vascular.reset();
        self.health.reset();
        self.modifiers = EfficiencyModifiers::default();

        let reading = self.health_reading();
        self.snapshot = self.build_snapshot(&reading);
        log::info!("Ear cured at {:.2}s", self.time_sec);
    }

    /// Combined efficiency of the chain under the current multipliers (%)
    pub fn transmission_efficiency_percent(&self) -> f64 {
        let mut efficiency = self.modifiers.percent() * self.membrane.transmission_factor(self.input.frequency_hz);
        if self.nerve.is_none() {
            efficiency *= clamp01(self.params.simulation.missing_nerve_efficiency);
        }
        efficiency
    }

    fn is_perforated(&self) -> bool {
        self.pathology.has_perforation() || self.membrane.perforation_grade() != PerforationGrade::None
    }

    fn health_reading(&self) -> HealthReading {
        HealthReading {
            sound_level_db: self.cochlea.current_spl_db(),
            transmission_efficiency_percent: self.transmission_efficiency_percent(),
            inflammation_percent: clamp01(self.pathology.inflammation_level()) * 100.0,
            nerve_strength_percent: self.outputs.nerve_strength * 100.0,
            hearing_damage_risk: self.cochlea.hearing_damage_risk(),
            perforated: self.is_perforated(),
        }
    }

    fn build_snapshot(&self, reading: &HealthReading) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot {
            time_sec: self.time_sec,
            tick_count: self.tick_count,
            overall_health: self.health.level(),
            warnings: self.health.warnings(),
            sound_level_db: reading.sound_level_db,
            transmission_efficiency_percent: reading.transmission_efficiency_percent,
            nerve_strength_percent: reading.nerve_strength_percent,
            inflammation_percent: reading.inflammation_percent,
            blood_flow_percent: self.vascular.blood_flow() * 100.0,
            disease_stage: self.pathology.stage(),
            disease_hearing_loss_db: self.pathology.state().map(|s| s.hearing_loss_db).unwrap_or(0.0),
            perforation_grade: self.membrane.perforation_grade(),
            hearing_damage_risk: reading.hearing_damage_risk,
            hearing_status: self.cochlea.hearing_status(),
            ..Default::default()
        };
        snapshot.update_status(&self.params.health);
        snapshot
    }

    /// Status published by the last tick
    pub fn status_snapshot(&self) -> StatusSnapshot {
        self.snapshot.clone()
    }

    /// Remove the nerve pipeline; the chain falls back to a fixed efficiency
    pub fn detach_nerve(&mut self) -> Option<NerveSignalPipeline> {
        log::info!("Nerve pipeline detached");
        self.nerve.take()
    }

    pub fn attach_nerve(&mut self, nerve: NerveSignalPipeline) {
        self.nerve = Some(nerve);
    }

    pub fn input(&self) -> SoundInput {
        self.input
    }

    pub fn time_sec(&self) -> f64 {
        self.time_sec
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn modifiers(&self) -> EfficiencyModifiers {
        self.modifiers
    }

    pub fn outputs(&self) -> StageOutputs {
        self.outputs
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn membrane(&self) -> &MembraneSimulator {
        &self.membrane
    }

    /// Membrane access for the perforation editing collaborator
    pub fn membrane_mut(&mut self) -> &mut MembraneSimulator {
        &mut self.membrane
    }

    pub fn lever(&self) -> &LeverChain {
        &self.lever
    }

    pub fn lever_mut(&mut self) -> &mut LeverChain {
        &mut self.lever
    }

    pub fn cochlea(&self) -> &CochlearAnalyzer {
        &self.cochlea
    }

    pub fn nerve(&self) -> Option<&NerveSignalPipeline> {
        self.nerve.as_ref()
    }

    pub fn nerve_mut(&mut self) -> Option<&mut NerveSignalPipeline> {
        self.nerve.as_mut()
    }

    pub fn pathology(&self) -> &PathologyStateMachine {
        &self.pathology
    }

    pub fn pathology_mut(&mut self) -> &mut PathologyStateMachine {
        &mut self.pathology
    }

    pub fn vascular(&self) -> &VascularModel {
        &self.vascular
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }
}
