//! # Particle Species
//!
//! The nine species that carry a TPC n-sigma column, and the kinematic
//! helpers the analysis tasks need to select them.

use serde::{Deserialize, Serialize};

/// Particle species with a PID hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    El,
    Mu,
    Pi,
    Ka,
    Pr,
    De,
    Tr,
    He,
    Al,
}

impl Species {
    /// All species, in n-sigma column order.
    pub const ALL: [Self; 9] = [
        Self::El,
        Self::Mu,
        Self::Pi,
        Self::Ka,
        Self::Pr,
        Self::De,
        Self::Tr,
        Self::He,
        Self::Al,
    ];

    /// Position of this species in the n-sigma column array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Two-letter code used in histogram names.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::El => "El",
            Self::Mu => "Mu",
            Self::Pi => "Pi",
            Self::Ka => "Ka",
            Self::Pr => "Pr",
            Self::De => "De",
            Self::Tr => "Tr",
            Self::He => "He",
            Self::Al => "Al",
        }
    }

    /// Full name, as used for the tracking PID hypothesis.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::El => "Electron",
            Self::Mu => "Muon",
            Self::Pi => "Pion",
            Self::Ka => "Kaon",
            Self::Pr => "Proton",
            Self::De => "Deuteron",
            Self::Tr => "Triton",
            Self::He => "Helium3",
            Self::Al => "Alpha",
        }
    }

    /// Display label used in histogram titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::El => "e",
            Self::Mu => "#mu",
            Self::Pi => "#pi",
            Self::Ka => "K",
            Self::Pr => "p",
            Self::De => "d",
            Self::Tr => "t",
            Self::He => "^{3}He",
            Self::Al => "#alpha",
        }
    }

    /// Mass in GeV/c^2.
    #[must_use]
    pub const fn mass(self) -> f64 {
        match self {
            Self::El => 0.000_510_998_95,
            Self::Mu => 0.105_658_37,
            Self::Pi => 0.139_570_39,
            Self::Ka => 0.493_677,
            Self::Pr => 0.938_272_088,
            Self::De => 1.875_612_94,
            Self::Tr => 2.808_921_13,
            Self::He => 2.808_391_6,
            Self::Al => 3.727_379_4,
        }
    }

    /// PDG code of the particle (not the antiparticle).
    #[must_use]
    pub const fn pdg_code(self) -> i32 {
        match self {
            Self::El => 11,
            Self::Mu => 13,
            Self::Pi => PDG_PION,
            Self::Ka => 321,
            Self::Pr => 2212,
            Self::De => 1_000_010_020,
            Self::Tr => 1_000_010_030,
            Self::He => 1_000_020_030,
            Self::Al => 1_000_020_040,
        }
    }

    /// Charge in units of e.
    #[must_use]
    pub const fn charge(self) -> i32 {
        match self {
            Self::He | Self::Al => 2,
            _ => 1,
        }
    }
}

// =============================================================================
// PDG CODES
// =============================================================================

/// Positive pion.
pub const PDG_PION: i32 = 211;
/// Anti-proton.
pub const PDG_ANTI_PROTON: i32 = -2212;
/// Anti-helium-3.
pub const PDG_ANTI_HELIUM3: i32 = -1_000_020_030;

// =============================================================================
// KINEMATICS
// =============================================================================

/// Rapidity of a particle given transverse momentum, pseudorapidity and mass.
#[must_use]
pub fn rapidity(pt: f64, eta: f64, mass: f64) -> f64 {
    let pz = pt * eta.sinh();
    let p2 = pt * pt + pz * pz;
    let energy = (p2 + mass * mass).sqrt();
    0.5 * ((energy + pz) / (energy - pz)).ln()
}

/// He3 TPC n-sigma with the momentum-dependent offset of the current
/// parametrisation removed.
#[must_use]
pub fn recalibrated_he3_nsigma(nsigma: f32, tpc_inner_param: f32) -> f32 {
    nsigma + 94.222_101 * (-0.905_203 * tpc_inner_param).exp()
}
