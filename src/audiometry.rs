//! Air-bone gap sweep over perforation size and position.
//!
//! For every perforation grade and position on a grid, a fresh chain is run
//! at each audiometric frequency with and without the perforation. The
//! air-bone gap (ABG) is the level lost to the perforation. Results are
//! compared against a clinical reference of pre-operative audiograms.
//!
//! References:
//! - Mehta et al., Otol Neurotol 2006 (perforation size vs. conductive loss)
//! - Ibekwe et al., Eur Arch Otorhinolaryngol 2016 (location effects)

use serde::{Deserialize, Serialize};

use crate::config::Parameters;
use crate::coupling::TransmissionOrchestrator;
use crate::error::TransmissionResult;
use crate::physics::perforation::diameter_mm;
use crate::physics::{MembraneSimulator, PerforationGrade, PerforationZone};

/// Standard pure-tone audiometry frequencies (Hz)
pub const AUDIOMETRIC_FREQUENCIES_HZ: [f64; 6] = [250.0, 500.0, 1000.0, 2000.0, 3000.0, 4000.0];

/// Grades swept by default
pub const PERFORATION_GRADES: [PerforationGrade; 4] = [
    PerforationGrade::I,
    PerforationGrade::II,
    PerforationGrade::III,
    PerforationGrade::IV,
];

/// Default normalized position grid (both axes)
pub const DEFAULT_GRID_POSITIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// One simulated audiogram for a perforation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub grade: PerforationGrade,
    /// Normalized position [0,1], (0.5, 0.5) at the umbo
    pub pos_x: f64,
    pub pos_y: f64,
    /// Diameter of the requested hole (mm)
    pub perforation_diameter_mm: f64,
    /// Area fraction the mesh actually opened
    pub perforated_area_fraction: f64,
    /// ABG per audiometric frequency (dB, ≥ 0)
    pub abg_db: [f64; 6],
    /// Mean ABG across frequencies (dB)
    pub avg_total_db: f64,
}

/// Mean pre-operative ABG of patients with a given perforation grade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalReference {
    pub grade: PerforationGrade,
    pub abg_db: [f64; 6],
    /// Patients averaged
    pub patients: usize,
}

impl ClinicalReference {
    /// Reference audiogram for a perforated grade
    pub fn for_grade(grade: PerforationGrade) -> Option<Self> {
        let (abg_db, patients) = match grade {
            PerforationGrade::None => return None,
            PerforationGrade::I => ([35.0, 5.0, 10.0, 0.0, 0.0, 10.0], 1),
            PerforationGrade::II => ([22.5, 20.0, 20.0, 7.5, 27.5, 27.5], 4),
            // Round window shielding keeps grade IV below grade III
            PerforationGrade::III => ([60.0, 35.0, 35.0, 15.0, 30.0, 20.0], 1),
            PerforationGrade::IV => ([30.0, 5.0, 15.0, 5.0, 25.0, 35.0], 2),
        };
        Some(Self {
            grade,
            abg_db,
            patients,
        })
    }

    pub fn average_db(&self) -> f64 {
        self.abg_db.iter().sum::<f64>() / self.abg_db.len() as f64
    }

    /// |simulated mean ABG − clinical mean ABG| (dB)
    pub fn mean_error_db(&self, record: &ExperimentRecord) -> f64 {
        (record.avg_total_db - self.average_db()).abs()
    }

    /// Mean absolute per-frequency difference (dB)
    pub fn frequency_error_db(&self, record: &ExperimentRecord) -> f64 {
        self.abg_db
            .iter()
            .zip(&record.abg_db)
            .map(|(clinical, sim)| (sim - clinical).abs())
            .sum::<f64>()
            / self.abg_db.len() as f64
    }
}

/// Position with the smallest error against the clinical reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestPosition {
    pub pos_x: f64,
    pub pos_y: f64,
    pub error_db: f64,
}

/// Timing of each single-frequency measurement
#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub amplitude: f64,
    pub dt: f64,
    /// Ticks before averaging starts
    pub settle_ticks: usize,
    /// Ticks averaged for the reported level
    pub average_ticks: usize,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            dt: 0.016,
            settle_ticks: 120,
            average_ticks: 30,
        }
    }
}

/// Runs the ABG experiment on fresh chains built from `params`
#[derive(Debug, Clone)]
pub struct AirBoneGapSweep {
    params: Parameters,
    settings: SweepSettings,
}

impl AirBoneGapSweep {
    pub fn new(params: &Parameters, settings: SweepSettings) -> Self {
        Self {
            params: params.clone(),
            settings,
        }
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Settled sound level at one frequency, optionally with a perforation
    pub fn measure_level(&self, zone: Option<PerforationZone>, frequency_hz: f64) -> TransmissionResult<f64> {
        let mut sim = TransmissionOrchestrator::new(&self.params);
        if let Some(zone) = zone {
            sim.membrane_mut().add_perforation_zone(zone)?;
        }
        sim.receive_sound(self.settings.amplitude, frequency_hz);

        for _ in 0..self.settings.settle_ticks {
            sim.tick(self.settings.dt);
        }
        let averaged = self.settings.average_ticks.max(1);
        let mut total = 0.0;
        for _ in 0..averaged {
            sim.tick(self.settings.dt);
            total += sim.status_snapshot().sound_level_db;
        }
        Ok(total / averaged as f64)
    }

    /// Levels of the intact ear at every audiometric frequency
    pub fn intact_levels(&self) -> TransmissionResult<[f64; 6]> {
        let mut levels = [0.0; 6];
        for (level, &f) in levels.iter_mut().zip(&AUDIOMETRIC_FREQUENCIES_HZ) {
            *level = self.measure_level(None, f)?;
        }
        Ok(levels)
    }

    /// ABG for one grade at one position
    pub fn run_position(&self, grade: PerforationGrade, pos_x: f64, pos_y: f64) -> TransmissionResult<ExperimentRecord> {
        let intact = self.intact_levels()?;
        self.run_against(&intact, grade, pos_x, pos_y)
    }

    fn run_against(
        &self,
        intact: &[f64; 6],
        grade: PerforationGrade,
        pos_x: f64,
        pos_y: f64,
    ) -> TransmissionResult<ExperimentRecord> {
        let radius = self.params.membrane.radius_mm;
        let fraction = grade.representative_fraction();
        let zone = PerforationZone::from_normalized(pos_x, pos_y, fraction, radius);

        let perforated_area_fraction = {
            let mut sample = MembraneSimulator::new(&self.params.membrane);
            sample.add_perforation_zone(zone)?;
            sample.perforated_area_fraction()
        };

        let mut abg_db = [0.0; 6];
        for ((abg, &f), &intact_level) in abg_db.iter_mut().zip(&AUDIOMETRIC_FREQUENCIES_HZ).zip(intact) {
            let perforated_level = self.measure_level(Some(zone), f)?;
            *abg = (intact_level - perforated_level).max(0.0);
        }
        let avg_total_db = abg_db.iter().sum::<f64>() / abg_db.len() as f64;

        log::debug!(
            "Grade {} at ({:.2}, {:.2}): mean ABG {:.1} dB",
            grade,
            pos_x,
            pos_y,
            avg_total_db
        );

        Ok(ExperimentRecord {
            grade,
            pos_x,
            pos_y,
            perforation_diameter_mm: diameter_mm(fraction, radius as f64),
            perforated_area_fraction,
            abg_db,
            avg_total_db,
        })
    }

    /// Every grade at every (x, y) pair of `positions`
    pub fn run_grid(&self, grades: &[PerforationGrade], positions: &[f64]) -> TransmissionResult<Vec<ExperimentRecord>> {
        let intact = self.intact_levels()?;
        let mut records = Vec::with_capacity(grades.len() * positions.len() * positions.len());
        for &grade in grades {
            for &pos_y in positions {
                for &pos_x in positions {
                    records.push(self.run_against(&intact, grade, pos_x, pos_y)?);
                }
            }
        }
        log::info!("ABG sweep complete: {} records", records.len());
        Ok(records)
    }
}

/// Mean error of all records of a grade against its clinical reference
pub fn mean_error_db(records: &[ExperimentRecord], grade: PerforationGrade) -> Option<f64> {
    let reference = ClinicalReference::for_grade(grade)?;
    let errors: Vec<f64> = records
        .iter()
        .filter(|r| r.grade == grade)
        .map(|r| reference.mean_error_db(r))
        .collect();
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f64>() / errors.len() as f64)
}

/// Position whose mean ABG best matches the clinical mean for `grade`
pub fn best_position(records: &[ExperimentRecord], grade: PerforationGrade) -> Option<BestPosition> {
    let reference = ClinicalReference::for_grade(grade)?;
    records
        .iter()
        .filter(|r| r.grade == grade)
        .map(|r| BestPosition {
            pos_x: r.pos_x,
            pos_y: r.pos_y,
            error_db: reference.mean_error_db(r),
        })
        .min_by(|a, b| a.error_db.total_cmp(&b.error_db))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(grade: PerforationGrade, pos: f64, avg: f64) -> ExperimentRecord {
        ExperimentRecord {
            grade,
            pos_x: pos,
            pos_y: pos,
            perforation_diameter_mm: 1.0,
            perforated_area_fraction: 0.1,
            abg_db: [avg; 6],
            avg_total_db: avg,
        }
    }

    #[test]
    fn test_clinical_averages() {
        let g1 = ClinicalReference::for_grade(PerforationGrade::I).unwrap();
        assert!((g1.average_db() - 10.0).abs() < 1e-9);
        let g3 = ClinicalReference::for_grade(PerforationGrade::III).unwrap();
        assert!((g3.average_db() - 32.5).abs() < 1e-9);
        assert!(ClinicalReference::for_grade(PerforationGrade::None).is_none());
    }

    #[test]
    fn test_best_position_picks_smallest_error() {
        let records = vec![
            record(PerforationGrade::I, 0.25, 30.0),
            record(PerforationGrade::I, 0.5, 11.0),
            record(PerforationGrade::I, 0.75, 2.0),
            record(PerforationGrade::II, 0.5, 10.0),
        ];
        let best = best_position(&records, PerforationGrade::I).unwrap();
        assert_eq!(best.pos_x, 0.5);
        assert!((best.error_db - 1.0).abs() < 1e-9);
        assert!(best_position(&records, PerforationGrade::IV).is_none());

        let mean = mean_error_db(&records, PerforationGrade::I).unwrap();
        assert!((mean - (20.0 + 1.0 + 8.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_error() {
        let g1 = ClinicalReference::for_grade(PerforationGrade::I).unwrap();
        let exact = ExperimentRecord {
            abg_db: g1.abg_db,
            ..record(PerforationGrade::I, 0.5, 10.0)
        };
        assert_eq!(g1.frequency_error_db(&exact), 0.0);
        assert_eq!(g1.mean_error_db(&exact), 0.0);
    }
}
