//! Tympanic membrane perforations.
//!
//! A perforation removes part of the vibrating area and lets sound pass
//! straight through to the middle ear, cancelling the pressure difference
//! that drives the membrane. The resulting conductive loss grows with
//! perforation size and is largest at low frequencies.
//!
//! References:
//! - Voss et al., Otol Neurotol 2001 (loss vs. perforation size and frequency)
//! - Mehta et al., Otol Neurotol 2006 (clinical air-bone gaps by size)

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::numeric::{clamp01, finite_or};

/// Loss coefficient: dB per sqrt(area fraction) at mid frequencies
const SIZE_LOSS_DB: f64 = 30.0;
/// Upper bound on the perforation loss (dB)
const MAX_LOSS_DB: f64 = 50.0;
/// Extra relative loss at and below 250 Hz
const LOW_FREQUENCY_BOOST: f64 = 0.5;

/// A circular perforation on the membrane plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerforationZone {
    /// Center in membrane-local coordinates (mm); only x/y are used
    pub center: Vec3,
    /// Radius (mm)
    pub radius_mm: f32,
    /// Tear depth [0,1]: 1 is a full-thickness hole
    pub depth: f32,
}

impl PerforationZone {
    /// Create a zone; depth is clamped to [0, 1]
    pub fn new(center: Vec3, radius_mm: f32, depth: f32) -> Self {
        let depth = if depth.is_finite() {
            depth.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            center,
            radius_mm,
            depth,
        }
    }

    /// Create a full-thickness zone from a normalized position.
    ///
    /// `pos_x`/`pos_y` in [0, 1] span the membrane's bounding square, with
    /// (0.5, 0.5) at the umbo. `area_fraction` is the share of the membrane
    /// area the hole covers.
    pub fn from_normalized(pos_x: f64, pos_y: f64, area_fraction: f64, membrane_radius_mm: f32) -> Self {
        let r = membrane_radius_mm as f64;
        let x = (clamp01(pos_x) - 0.5) * 2.0 * r;
        let y = (clamp01(pos_y) - 0.5) * 2.0 * r;
        let radius = r * clamp01(area_fraction).sqrt();
        Self::new(Vec3::new(x as f32, y as f32, 0.0), radius as f32, 1.0)
    }

    /// Whether the zone can affect any vertex
    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius_mm.is_finite() && self.radius_mm > 0.0 && self.depth > 0.0
    }
}

/// Clinical size grade of a perforation by area fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerforationGrade {
    /// Intact membrane
    None,
    /// Less than 25% of the pars tensa
    I,
    /// 25-50%
    II,
    /// 50-75%
    III,
    /// More than 75%
    IV,
}

impl PerforationGrade {
    /// All perforated grades in ascending size
    pub const PERFORATED: [PerforationGrade; 4] = [Self::I, Self::II, Self::III, Self::IV];

    /// Grade for an area fraction
    pub fn from_area_fraction(fraction: f64) -> Self {
        let fraction = clamp01(fraction);
        if fraction <= 0.0 {
            Self::None
        } else if fraction < 0.25 {
            Self::I
        } else if fraction < 0.5 {
            Self::II
        } else if fraction < 0.75 {
            Self::III
        } else {
            Self::IV
        }
    }

    /// Area fraction at the middle of the grade's band
    pub fn representative_fraction(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::I => 0.125,
            Self::II => 0.375,
            Self::III => 0.625,
            Self::IV => 0.875,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
        }
    }
}

impl std::fmt::Display for PerforationGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Conductive loss caused by a perforation (dB).
///
/// `area_fraction` is the depth-weighted share of the membrane area that is
/// open. Loss grows with the square root of the fraction (hole diameter)
/// and is boosted up to 50% below 1 kHz, reaching the full boost at 250 Hz.
pub fn transmission_loss_db(area_fraction: f64, frequency_hz: f64) -> f64 {
    let fraction = clamp01(area_fraction);
    if fraction <= 0.0 {
        return 0.0;
    }

    let frequency = if frequency_hz.is_finite() && frequency_hz > 0.0 {
        frequency_hz
    } else {
        1000.0
    };
    let octaves_below_1k = (1000.0 / frequency).log2();
    let boost = 1.0 + LOW_FREQUENCY_BOOST * clamp01(octaves_below_1k / 2.0);

    finite_or(SIZE_LOSS_DB * fraction.sqrt() * boost, MAX_LOSS_DB).min(MAX_LOSS_DB)
}

/// Linear amplitude factor for a loss in dB
pub fn loss_to_factor(loss_db: f64) -> f64 {
    clamp01(10f64.powf(-finite_or(loss_db, 0.0).max(0.0) / 20.0))
}

/// Diameter of a circular hole with the given area fraction (mm)
pub fn diameter_mm(area_fraction: f64, membrane_radius_mm: f64) -> f64 {
    2.0 * membrane_radius_mm * clamp01(area_fraction).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intact_has_no_loss() {
        assert_eq!(transmission_loss_db(0.0, 1000.0), 0.0);
        assert_eq!(loss_to_factor(0.0), 1.0);
    }

    #[test]
    fn test_loss_monotone_in_size() {
        let mut prev = 0.0;
        for i in 1..=20 {
            let loss = transmission_loss_db(i as f64 / 20.0, 1000.0);
            assert!(loss >= prev);
            prev = loss;
        }
        assert!(prev <= MAX_LOSS_DB);
    }

    #[test]
    fn test_low_frequencies_lose_more() {
        let low = transmission_loss_db(0.3, 250.0);
        let mid = transmission_loss_db(0.3, 1000.0);
        let high = transmission_loss_db(0.3, 4000.0);
        assert!(low > mid);
        assert!((mid - high).abs() < 1e-9);
        assert!((low / mid - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_grades() {
        assert_eq!(PerforationGrade::from_area_fraction(0.0), PerforationGrade::None);
        assert_eq!(PerforationGrade::from_area_fraction(0.1), PerforationGrade::I);
        assert_eq!(PerforationGrade::from_area_fraction(0.3), PerforationGrade::II);
        assert_eq!(PerforationGrade::from_area_fraction(0.6), PerforationGrade::III);
        assert_eq!(PerforationGrade::from_area_fraction(0.9), PerforationGrade::IV);
        for grade in PerforationGrade::PERFORATED {
            assert_eq!(PerforationGrade::from_area_fraction(grade.representative_fraction()), grade);
        }
    }

    #[test]
    fn test_zone_from_normalized_position() {
        let zone = PerforationZone::from_normalized(0.5, 0.5, 0.25, 4.0);
        assert!(zone.center.length() < 1e-6);
        assert!((zone.radius_mm - 2.0).abs() < 1e-6);
        assert!(zone.is_valid());

        let zone = PerforationZone::from_normalized(1.0, 0.0, 0.25, 4.0);
        assert!((zone.center.x - 4.0).abs() < 1e-6);
        assert!((zone.center.y + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_zone_depth_clamped() {
        assert_eq!(PerforationZone::new(Vec3::ZERO, 1.0, 3.0).depth, 1.0);
        assert!(!PerforationZone::new(Vec3::ZERO, 1.0, f32::NAN).is_valid());
        assert!(!PerforationZone::new(Vec3::ZERO, -1.0, 1.0).is_valid());
    }

    #[test]
    fn test_diameter() {
        assert!((diameter_mm(1.0, 4.5) - 9.0).abs() < 1e-9);
        assert!((diameter_mm(0.25, 4.5) - 4.5).abs() < 1e-9);
    }
}
