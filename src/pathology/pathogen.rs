//! Causative organisms of acute otitis media.
//!
//! References:
//! - Ngo et al., PLoS One 2016 (pathogen distribution)
//! - Jacobs et al., Antimicrob Agents Chemother 2003 (β-lactam resistance)

use serde::{Deserialize, Serialize};

/// Organism behind the infection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pathogen {
    /// Most common, most virulent, purulent effusion
    StreptococcusPneumoniae,
    /// Non-typeable, frequent β-lactamase producer
    HaemophilusInfluenzae,
    /// Milder course, mostly β-lactamase positive
    MoraxellaCatarrhalis,
    /// Viral otitis: self-limiting, antibiotics ineffective
    Viral,
}

impl Pathogen {
    /// Scale on disease severity and fluid targets
    pub fn virulence(&self) -> f64 {
        match self {
            Pathogen::StreptococcusPneumoniae => 1.0,
            Pathogen::HaemophilusInfluenzae => 0.8,
            Pathogen::MoraxellaCatarrhalis => 0.6,
            Pathogen::Viral => 0.7,
        }
    }

    /// Fraction of antibiotic effect lost to resistance
    pub fn antibiotic_resistance(&self) -> f64 {
        match self {
            Pathogen::StreptococcusPneumoniae => 0.15,
            Pathogen::HaemophilusInfluenzae => 0.3,
            Pathogen::MoraxellaCatarrhalis => 0.5,
            Pathogen::Viral => 1.0,
        }
    }

    pub fn is_bacterial(&self) -> bool {
        !matches!(self, Pathogen::Viral)
    }

    /// Whether the effusion is pus (raises perforation risk)
    pub fn is_purulent(&self) -> bool {
        self.is_bacterial()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pathogen::StreptococcusPneumoniae => "Streptococcus pneumoniae",
            Pathogen::HaemophilusInfluenzae => "Haemophilus influenzae",
            Pathogen::MoraxellaCatarrhalis => "Moraxella catarrhalis",
            Pathogen::Viral => "Viral",
        }
    }
}

impl Default for Pathogen {
    fn default() -> Self {
        Pathogen::StreptococcusPneumoniae
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viral_is_not_bacterial() {
        assert!(!Pathogen::Viral.is_bacterial());
        assert!(!Pathogen::Viral.is_purulent());
        assert_eq!(Pathogen::Viral.antibiotic_resistance(), 1.0);
    }

    #[test]
    fn test_pneumococcus_is_most_virulent() {
        let all = [
            Pathogen::StreptococcusPneumoniae,
            Pathogen::HaemophilusInfluenzae,
            Pathogen::MoraxellaCatarrhalis,
            Pathogen::Viral,
        ];
        assert!(all.iter().all(|p| p.virulence() <= Pathogen::default().virulence()));
    }
}
