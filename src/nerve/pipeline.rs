//! Timed auditory nerve pipeline.
//!
//! Received → Preprocessing → Conducting → Synaptic → Brainstem → Completed.
//! One signal is in flight; later submissions wait in a bounded FIFO. Each
//! phase is a resumable timer advanced by the tick's dt; leftover time
//! carries into the next phase and the next queued signal.
//!
//! References:
//! - Spoendlin & Schrott, Hear Res 1989 (nerve length)
//! - Glowatzki & Fuchs, Nat Neurosci 2002 (ribbon synapse timing)

use std::collections::VecDeque;

use crate::config::NerveParameters;
use crate::error::{TransmissionError, TransmissionResult};
use crate::numeric::{clamp01, finite_or};
use crate::tick::valid_dt;

use super::signal::{NerveSignal, NerveStage, PhaseTimer};

/// Conduction loss per unit of (damage + aging)
const CONDUCTION_LOSS: f64 = 0.1;
/// Synaptic loss per unit of metabolic stress
const SYNAPTIC_STRESS_LOSS: f64 = 0.2;
/// Slowest conduction the pipeline will model (m/s)
const MIN_VELOCITY_M_PER_S: f64 = 1.0;
/// Completed intensity that drives adaptation up
const STRONG_INTENSITY: f64 = 0.8;
const MAX_ADAPTATION: f64 = 0.5;

/// Auditory nerve signal pipeline
#[derive(Debug, Clone)]
pub struct NerveSignalPipeline {
    params: NerveParameters,
    current: Option<NerveSignal>,
    timer: PhaseTimer,
    queue: VecDeque<NerveSignal>,

    signal_strength: f64,
    fatigue_percent: f64,
    adaptation_level: f64,
    idle_sec: f64,

    damage: f64,
    aging: f64,
    stress: f64,
    inflammation: f64,

    completed_count: u64,
    last_completed: Option<NerveSignal>,
}

impl NerveSignalPipeline {
    pub fn new(params: &NerveParameters) -> Self {
        Self {
            params: params.clone(),
            current: None,
            timer: PhaseTimer::idle(),
            queue: VecDeque::with_capacity(params.max_queue),
            signal_strength: 0.0,
            fatigue_percent: 0.0,
            adaptation_level: 0.0,
            idle_sec: 0.0,
            damage: clamp01(params.damage),
            aging: clamp01(params.aging),
            stress: clamp01(params.stress),
            inflammation: 0.0,
            completed_count: 0,
            last_completed: None,
        }
    }

    /// Submit a signal. Starts immediately when idle, otherwise queues.
    pub fn submit(&mut self, signal: NerveSignal) -> TransmissionResult<()> {
        if self.current.is_none() {
            self.begin(signal);
            return Ok(());
        }
        if self.queue.len() >= self.params.max_queue {
            return Err(TransmissionError::SignalQueueFull {
                capacity: self.params.max_queue,
            });
        }
        self.queue.push_back(signal);
        Ok(())
    }

    /// Advance the in-flight signal (and any queued ones) by `dt`
    pub fn advance(&mut self, dt: f64) {
        let Some(dt) = valid_dt(dt) else {
            return;
        };

        let mut budget = dt;
        let mut strong = false;
        // Every pass either finishes a phase or exhausts the budget
        let max_passes = (self.queue.len() + 1) * 8;
        for _ in 0..max_passes {
            if self.current.is_none() {
                break;
            }
            let remaining = self.timer.remaining_sec();
            if budget < remaining {
                self.timer.elapsed_sec += budget;
                budget = 0.0;
                break;
            }
            budget -= remaining;
            self.timer.elapsed_sec = self.timer.total_sec;
            if let Some(intensity) = self.complete_phase() {
                strong |= intensity > STRONG_INTENSITY;
            }
        }

        if self.current.is_none() {
            self.rest(budget);
        }
        self.update_adaptation(strong, dt);
    }

    /// Cancel the in-flight signal and the queue; output drops to zero
    pub fn cancel(&mut self) {
        self.current = None;
        self.queue.clear();
        self.timer = PhaseTimer::idle();
        self.signal_strength = 0.0;
    }

    /// Silence for `dt`: cancel processing and let fatigue and adaptation recover
    pub fn silence(&mut self, dt: f64) {
        self.cancel();
        if let Some(dt) = valid_dt(dt) {
            self.rest(dt);
            self.update_adaptation(false, dt);
        }
    }

    fn begin(&mut self, mut signal: NerveSignal) {
        signal.mark_received();
        signal.attenuate(1.0 - self.adaptation_level);
        self.current = Some(signal);
        self.timer = PhaseTimer::start(NerveStage::Received, 0.0);
        self.idle_sec = 0.0;
    }

    /// Apply the effect of the phase that just ended and move on.
    /// Returns the final intensity when a signal completes.
    fn complete_phase(&mut self) -> Option<f64> {
        let stage = self.timer.stage;
        let preprocessing = (1.0 - self.damage) * (1.0 - self.aging * 0.3) * (1.0 - self.fatigue_percent / 100.0);
        let conduction_loss = clamp01((self.damage + self.aging) * CONDUCTION_LOSS);
        let synaptic_loss = clamp01(self.stress * SYNAPTIC_STRESS_LOSS);
        let protective = self.fatigue_percent > self.params.protective_fatigue_percent;
        let inflammation = self.inflammation;

        let signal = self.current.as_mut()?;
        match stage {
            NerveStage::Preprocessing => signal.attenuate(preprocessing),
            NerveStage::Conducting => {
                signal.attenuate(1.0 - conduction_loss);
                signal.degrade_quality(1.0 - conduction_loss);
            }
            NerveStage::Synaptic => {
                signal.attenuate(1.0 - synaptic_loss);
                signal.degrade_quality(1.0 - 0.5 * inflammation);
            }
            NerveStage::Brainstem => {
                let strength = if protective {
                    signal.intensity * 0.5
                } else {
                    signal.intensity
                };
                self.signal_strength = clamp01(strength);
            }
            NerveStage::Idle | NerveStage::Received | NerveStage::Completed => {}
        }

        let next = stage.next();
        signal.stage = next;
        if next == NerveStage::Completed {
            return self.finish();
        }

        self.timer = PhaseTimer::start(next, self.phase_duration(next));
        None
    }

    fn finish(&mut self) -> Option<f64> {
        let done = self.current.take()?;
        let intensity = done.intensity;
        self.fatigue_percent =
            (self.fatigue_percent + intensity * self.params.fatigue_per_intensity).clamp(0.0, 100.0);
        self.completed_count += 1;
        self.last_completed = Some(done);

        match self.queue.pop_front() {
            Some(next) => self.begin(next),
            None => self.timer = PhaseTimer::idle(),
        }
        Some(intensity)
    }

    fn rest(&mut self, idle_dt: f64) {
        self.idle_sec += idle_dt;
        if self.idle_sec > self.params.idle_recovery_delay_sec {
            self.fatigue_percent =
                (self.fatigue_percent - self.params.fatigue_recovery_per_sec * idle_dt).clamp(0.0, 100.0);
        }
    }

    fn update_adaptation(&mut self, strong: bool, dt: f64) {
        let (goal, rate) = if strong {
            (MAX_ADAPTATION, self.params.adaptation_rate_sec)
        } else {
            (0.0, self.params.recovery_rate_sec)
        };
        let step = clamp01(dt / rate);
        self.adaptation_level = finite_or(
            self.adaptation_level + (goal - self.adaptation_level) * step,
            0.0,
        )
        .clamp(0.0, MAX_ADAPTATION);
    }

    /// Duration of a phase under the current nerve condition (s)
    pub fn phase_duration(&self, stage: NerveStage) -> f64 {
        let duration = match stage {
            NerveStage::Preprocessing => self.params.preprocessing_delay_sec,
            NerveStage::Conducting => self.params.fiber_length_mm / 1000.0 / self.conduction_velocity(),
            NerveStage::Synaptic => self.params.synaptic_delay_sec * (1.0 + self.inflammation),
            NerveStage::Brainstem => self.params.brainstem_delay_sec,
            NerveStage::Idle | NerveStage::Received | NerveStage::Completed => 0.0,
        };
        finite_or(duration, 0.0).max(0.0)
    }

    /// Effective conduction velocity (m/s): demyelination and aging slow it
    pub fn conduction_velocity(&self) -> f64 {
        let velocity = self.params.conduction_velocity_m_per_s * (1.0 - 0.5 * self.damage) * (1.0 - 0.3 * self.aging);
        finite_or(velocity, MIN_VELOCITY_M_PER_S).max(MIN_VELOCITY_M_PER_S)
    }

    /// Total latency from receipt to brainstem output (s)
    pub fn total_latency(&self) -> f64 {
        [
            NerveStage::Preprocessing,
            NerveStage::Conducting,
            NerveStage::Synaptic,
            NerveStage::Brainstem,
        ]
        .iter()
        .map(|&s| self.phase_duration(s))
        .sum()
    }

    pub fn set_damage(&mut self, level: f64) {
        self.damage = clamp01(level);
    }

    pub fn set_aging(&mut self, level: f64) {
        self.aging = clamp01(level);
    }

    pub fn set_stress(&mut self, level: f64) {
        self.stress = clamp01(level);
    }

    pub fn set_inflammation(&mut self, level: f64) {
        self.inflammation = clamp01(level);
    }

    pub fn signal_strength(&self) -> f64 {
        self.signal_strength
    }

    pub fn fatigue_percent(&self) -> f64 {
        self.fatigue_percent
    }

    pub fn adaptation_level(&self) -> f64 {
        self.adaptation_level
    }

    /// Stage of the in-flight signal, or `Idle`
    pub fn current_stage(&self) -> NerveStage {
        self.current.as_ref().map(|s| s.stage).unwrap_or(NerveStage::Idle)
    }

    pub fn current_signal(&self) -> Option<&NerveSignal> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn completed_count(&self) -> u64 {
        self.completed_count
    }

    pub fn last_completed(&self) -> Option<&NerveSignal> {
        self.last_completed.as_ref()
    }
}
