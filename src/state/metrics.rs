//! Aggregate status of the transmission chain.
//!
//! One snapshot per tick, gathered from every subsystem into a single
//! structure that can be printed or serialized to JSON.

use serde::{Deserialize, Serialize};

use crate::cochlea::HearingStatus;
use crate::config::HealthParameters;
use crate::pathology::DiseaseStage;
use crate::physics::PerforationGrade;

/// Status of a single metric against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ThresholdStatus {
    /// Within the healthy range
    #[default]
    Normal,
    /// Past the warning threshold
    Warning,
    /// Past the threshold by more than the margin
    Critical,
}

impl ThresholdStatus {
    /// Status for a metric where larger values are worse
    pub fn above(value: f64, threshold: f64) -> Self {
        // 20% margin past the threshold for the critical zone
        let margin = threshold.abs() * 0.2;
        if !value.is_finite() {
            ThresholdStatus::Normal
        } else if value > threshold + margin {
            ThresholdStatus::Critical
        } else if value > threshold {
            ThresholdStatus::Warning
        } else {
            ThresholdStatus::Normal
        }
    }

    /// Status for a metric where smaller values are worse
    pub fn below(value: f64, threshold: f64) -> Self {
        let margin = threshold.abs() * 0.2;
        if !value.is_finite() {
            ThresholdStatus::Normal
        } else if value < threshold - margin {
            ThresholdStatus::Critical
        } else if value < threshold {
            ThresholdStatus::Warning
        } else {
            ThresholdStatus::Normal
        }
    }
}

/// Overall health of the hearing chain, best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum HealthLevel {
    #[default]
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthLevel {
    /// Classify from transmission efficiency (%) and the number of active warnings
    pub fn classify(efficiency_percent: f64, warning_count: usize) -> Self {
        let efficiency = if efficiency_percent.is_finite() {
            efficiency_percent
        } else {
            0.0
        };
        if efficiency < 25.0 || warning_count >= 3 {
            HealthLevel::Critical
        } else if efficiency < 50.0 || warning_count == 2 {
            HealthLevel::Poor
        } else if efficiency < 75.0 || warning_count == 1 {
            HealthLevel::Fair
        } else if efficiency < 95.0 {
            HealthLevel::Good
        } else {
            HealthLevel::Excellent
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HealthLevel::Excellent => "Excellent",
            HealthLevel::Good => "Good",
            HealthLevel::Fair => "Fair",
            HealthLevel::Poor => "Poor",
            HealthLevel::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Named warnings raised by the health monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthWarning {
    HighSoundLevel,
    LowTransmissionEfficiency,
    Inflammation,
    WeakNerveSignal,
    HearingDamageRisk,
    MembranePerforation,
}

impl HealthWarning {
    pub fn message(&self) -> &'static str {
        match self {
            HealthWarning::HighSoundLevel => "Sound level is dangerously high",
            HealthWarning::LowTransmissionEfficiency => "Middle-ear transmission efficiency is low",
            HealthWarning::Inflammation => "Middle-ear inflammation detected",
            HealthWarning::WeakNerveSignal => "Auditory nerve signal is weak",
            HealthWarning::HearingDamageRisk => "Cumulative exposure risks hearing damage",
            HealthWarning::MembranePerforation => "Tympanic membrane is perforated",
        }
    }
}

impl std::fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Aggregate status published once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    // === Timing ===
    /// Simulation time (s)
    pub time_sec: f64,
    /// Ticks executed
    pub tick_count: u64,

    // === Health ===
    pub overall_health: HealthLevel,
    /// Active warnings, in a stable order
    pub warnings: Vec<HealthWarning>,

    // === Transmission ===
    /// Cochlear sound level (dB SPL)
    pub sound_level_db: f64,
    pub sound_status: ThresholdStatus,
    /// Product of the stage efficiency multipliers (%)
    pub transmission_efficiency_percent: f64,
    pub efficiency_status: ThresholdStatus,
    /// Auditory nerve output (%)
    pub nerve_strength_percent: f64,
    pub nerve_status: ThresholdStatus,

    // === Pathology ===
    pub inflammation_percent: f64,
    pub inflammation_status: ThresholdStatus,
    /// Mucosal blood flow (%)
    pub blood_flow_percent: f64,
    pub disease_stage: Option<DiseaseStage>,
    /// Conductive loss reported by the disease model (dB)
    pub disease_hearing_loss_db: f64,
    pub perforation_grade: PerforationGrade,

    // === Exposure ===
    /// Hearing damage risk [0,1]
    pub hearing_damage_risk: f64,
    pub hearing_status: HearingStatus,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            time_sec: 0.0,
            tick_count: 0,
            overall_health: HealthLevel::Excellent,
            warnings: Vec::new(),
            sound_level_db: 0.0,
            sound_status: ThresholdStatus::Normal,
            transmission_efficiency_percent: 100.0,
            efficiency_status: ThresholdStatus::Normal,
            nerve_strength_percent: 0.0,
            nerve_status: ThresholdStatus::Normal,
            inflammation_percent: 0.0,
            inflammation_status: ThresholdStatus::Normal,
            blood_flow_percent: 100.0,
            disease_stage: None,
            disease_hearing_loss_db: 0.0,
            perforation_grade: PerforationGrade::None,
            hearing_damage_risk: 0.0,
            hearing_status: HearingStatus::Normal,
        }
    }
}

impl StatusSnapshot {
    /// Update per-metric status indicators from the current values
    pub fn update_status(&mut self, thresholds: &HealthParameters) {
        self.sound_status = ThresholdStatus::above(self.sound_level_db, thresholds.high_sound_level_db);
        self.efficiency_status =
            ThresholdStatus::below(self.transmission_efficiency_percent, thresholds.low_efficiency_percent);
        self.inflammation_status =
            ThresholdStatus::above(self.inflammation_percent, thresholds.inflammation_percent);

        // A quiet ear is not a weak nerve
        self.nerve_status = if self.sound_level_db > thresholds.weak_nerve_min_sound_db {
            ThresholdStatus::below(self.nerve_strength_percent, thresholds.weak_nerve_percent)
        } else {
            ThresholdStatus::Normal
        };
    }

    pub fn has_warning(&self, warning: HealthWarning) -> bool {
        self.warnings.contains(&warning)
    }

    /// Print a formatted summary
    pub fn print_summary(&self) {
        println!("=== Transmission status at {:.3}s ===", self.time_sec);
        println!("Overall health: {}", self.overall_health);
        println!("Sound level: {:.1} dB SPL ({:?})", self.sound_level_db, self.sound_status);
        println!(
            "Transmission efficiency: {:.1}% ({:?})",
            self.transmission_efficiency_percent, self.efficiency_status
        );
        println!("Nerve strength: {:.1}% ({:?})", self.nerve_strength_percent, self.nerve_status);
        println!("Inflammation: {:.1}% ({:?})", self.inflammation_percent, self.inflammation_status);
        println!("Blood flow: {:.1}%", self.blood_flow_percent);
        if let Some(stage) = self.disease_stage {
            println!("Disease stage: {} (hearing loss {:.1} dB)", stage, self.disease_hearing_loss_db);
        }
        if self.perforation_grade != PerforationGrade::None {
            println!("Perforation: grade {}", self.perforation_grade);
        }
        println!(
            "Hearing damage risk: {:.1}% ({})",
            self.hearing_damage_risk * 100.0,
            self.hearing_status
        );
        for warning in &self.warnings {
            println!("  WARNING: {}", warning);
        }
    }
}
