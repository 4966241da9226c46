//! Nerve signal and processing phases.

use serde::{Deserialize, Serialize};

use crate::numeric::clamp01;

/// Processing stage of a nerve signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NerveStage {
    Idle,
    Received,
    Preprocessing,
    Conducting,
    Synaptic,
    Brainstem,
    Completed,
}

impl NerveStage {
    /// Next stage in the pipeline; `Completed` and `Idle` are terminal
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Received => Self::Preprocessing,
            Self::Preprocessing => Self::Conducting,
            Self::Conducting => Self::Synaptic,
            Self::Synaptic => Self::Brainstem,
            Self::Brainstem => Self::Completed,
            Self::Completed => Self::Completed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Received => "Received",
            Self::Preprocessing => "Preprocessing",
            Self::Conducting => "Conducting",
            Self::Synaptic => "Synaptic",
            Self::Brainstem => "Brainstem",
            Self::Completed => "Completed",
        }
    }
}

/// A signal travelling from the hair cells to the brainstem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NerveSignal {
    /// Current intensity [0,1]
    pub intensity: f64,
    /// Stimulus frequency (Hz)
    pub frequency_hz: f64,
    /// Signal fidelity [0,1]
    pub quality: f64,
    /// Processing stage
    pub stage: NerveStage,
    /// Loss relative to the received intensity (%)
    pub signal_loss_percent: f64,
    /// Simulation time of submission (s)
    pub timestamp_sec: f64,
    initial_intensity: f64,
}

impl NerveSignal {
    pub fn new(intensity: f64, frequency_hz: f64, timestamp_sec: f64) -> Self {
        let intensity = clamp01(intensity);
        Self {
            intensity,
            frequency_hz: if frequency_hz.is_finite() { frequency_hz.max(0.0) } else { 0.0 },
            quality: 1.0,
            stage: NerveStage::Idle,
            signal_loss_percent: 0.0,
            timestamp_sec: if timestamp_sec.is_finite() { timestamp_sec } else { 0.0 },
            initial_intensity: intensity,
        }
    }

    /// Intensity when the signal entered the pipeline
    pub fn initial_intensity(&self) -> f64 {
        self.initial_intensity
    }

    /// Reset the loss baseline to the current intensity
    pub(crate) fn mark_received(&mut self) {
        self.initial_intensity = self.intensity;
        self.stage = NerveStage::Received;
    }

    /// Scale intensity by `(1 - loss)` and update the loss bookkeeping
    pub(crate) fn attenuate(&mut self, factor: f64) {
        self.intensity = clamp01(self.intensity * clamp01(factor));
        self.signal_loss_percent = if self.initial_intensity > 0.0 {
            clamp01(1.0 - self.intensity / self.initial_intensity) * 100.0
        } else {
            0.0
        };
    }

    pub(crate) fn degrade_quality(&mut self, factor: f64) {
        self.quality = clamp01(self.quality * clamp01(factor));
    }
}

/// Resumable phase timer: the current stage and how far through it we are
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTimer {
    pub stage: NerveStage,
    pub elapsed_sec: f64,
    pub total_sec: f64,
}

impl PhaseTimer {
    pub fn idle() -> Self {
        Self::start(NerveStage::Idle, 0.0)
    }

    pub fn start(stage: NerveStage, total_sec: f64) -> Self {
        Self {
            stage,
            elapsed_sec: 0.0,
            total_sec: if total_sec.is_finite() { total_sec.max(0.0) } else { 0.0 },
        }
    }

    pub fn remaining_sec(&self) -> f64 {
        (self.total_sec - self.elapsed_sec).max(0.0)
    }

    /// Fraction of the phase completed [0,1]
    pub fn progress(&self) -> f64 {
        if self.total_sec > 0.0 {
            clamp01(self.elapsed_sec / self.total_sec)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = NerveStage::Received;
        let mut visited = vec![stage];
        while stage != NerveStage::Completed {
            stage = stage.next();
            visited.push(stage);
        }
        assert_eq!(
            visited,
            vec![
                NerveStage::Received,
                NerveStage::Preprocessing,
                NerveStage::Conducting,
                NerveStage::Synaptic,
                NerveStage::Brainstem,
                NerveStage::Completed,
            ]
        );
    }

    #[test]
    fn test_signal_clamps() {
        let signal = NerveSignal::new(3.0, f64::NAN, f64::INFINITY);
        assert_eq!(signal.intensity, 1.0);
        assert_eq!(signal.frequency_hz, 0.0);
        assert_eq!(signal.timestamp_sec, 0.0);
    }

    #[test]
    fn test_attenuation_tracks_loss() {
        let mut signal = NerveSignal::new(0.8, 1000.0, 0.0);
        signal.mark_received();
        signal.attenuate(0.5);
        assert!((signal.intensity - 0.4).abs() < 1e-12);
        assert!((signal.signal_loss_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_timer_progress() {
        let mut timer = PhaseTimer::start(NerveStage::Conducting, 0.004);
        timer.elapsed_sec = 0.001;
        assert!((timer.progress() - 0.25).abs() < 1e-12);
        assert!((timer.remaining_sec() - 0.003).abs() < 1e-12);
        assert_eq!(PhaseTimer::start(NerveStage::Received, f64::NAN).total_sec, 0.0);
    }
}
