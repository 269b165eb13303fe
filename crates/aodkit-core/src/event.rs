//! # Event Input Streams
//!
//! Typed rows of the reconstructed and Monte-Carlo tables consumed by the
//! analysis tasks, and [`EventBatch`], the input of one processing pass.
//!
//! All row types derive `Deserialize` with per-field defaults, so producers
//! only need to fill the columns a task actually reads.

use crate::cluster::{Association, ClusterRecord};
use crate::primitives::{N_SPECIES, SPEED_OF_LIGHT_CM_PER_PS};
use crate::table::{ClusterPass, ClusterTables};
use crate::{AodError, BcId, CollisionId};
use serde::{Deserialize, Serialize};

// =============================================================================
// COLLISIONS & BUNCH CROSSINGS
// =============================================================================

/// A reconstructed collision (primary vertex).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Collision {
    /// Vertex x position (cm).
    pub pos_x: f32,
    /// Vertex y position (cm).
    pub pos_y: f32,
    /// Vertex z position (cm).
    pub pos_z: f32,
    /// Number of tracks contributing to the vertex.
    pub n_contrib: u16,
    /// Vertex fit chi2.
    pub chi2: f32,
    /// Event time from the TOF (ns).
    pub collision_time: f32,
    /// Resolution of the event time (ns).
    pub collision_time_res: f32,
    /// Standard event selection decision.
    pub sel8: bool,
    /// Bunch crossing the collision was reconstructed in.
    pub bc: Option<BcId>,
    /// Index of the generated collision, for Monte-Carlo input.
    pub mc_collision: Option<u32>,
}

/// A bunch crossing. Rows carry no columns the tasks read; collisions and
/// ambiguous clusters refer to them by position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BunchCrossing {}

// =============================================================================
// TRACKS
// =============================================================================

/// A reconstructed barrel track with its PID and quality columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Owning collision.
    pub collision: CollisionId,
    /// Momentum (GeV/c).
    pub p: f32,
    /// Transverse momentum (GeV/c).
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    /// Charge sign.
    pub sign: i8,
    /// Passes the standard global track selection.
    pub is_global_track: bool,
    /// PID hypothesis used in tracking, in `Species::ALL` order.
    pub pid_for_tracking: u8,
    /// Momentum at the inner wall of the TPC (GeV/c).
    pub tpc_inner_param: f32,
    /// TPC dE/dx (a.u.).
    pub tpc_signal: f32,
    /// TPC n-sigma per species, in `Species::ALL` order.
    pub tpc_nsigma: [f32; N_SPECIES],
    pub has_its: bool,
    pub has_tpc: bool,
    pub has_trd: bool,
    pub has_tof: bool,
    pub its_n_cls: u8,
    pub its_chi2_ncl: f32,
    pub tpc_n_cls_found: i16,
    pub tpc_n_cls_crossed_rows: i16,
    pub tpc_crossed_rows_over_findable_cls: f32,
    pub tpc_chi2_ncl: f32,
    pub trd_chi2: f32,
    pub tof_chi2: f32,
    /// TOF time (ps).
    pub tof_signal: f32,
    /// Momentum used for the TOF expected times (GeV/c).
    pub tof_exp_mom: f32,
    /// TOF n-sigma per species.
    pub tof_nsigma: [f32; N_SPECIES],
    /// Measured minus expected TOF time per species (ps).
    pub tof_exp_signal_diff: [f32; N_SPECIES],
    /// Expected TOF resolution per species (ps).
    pub tof_exp_sigma: [f32; N_SPECIES],
    /// Track length (cm).
    pub length: f32,
    /// Distance of closest approach in the transverse plane (cm).
    pub dca_xy: f32,
    /// Distance of closest approach along z (cm).
    pub dca_z: f32,
    /// Generated particle this track was matched to, for Monte-Carlo input.
    pub mc_particle: Option<u32>,
}

impl Track {
    /// TPC n-sigma for a species.
    #[must_use]
    pub fn nsigma(&self, species: crate::pid::Species) -> f32 {
        self.tpc_nsigma[species.index()]
    }

    /// TOF velocity, if the track reached the TOF with a usable time.
    #[must_use]
    pub fn tof_beta(&self) -> Option<f32> {
        if !self.has_tof || self.tof_signal <= 0.0 {
            return None;
        }
        Some(self.length / (SPEED_OF_LIGHT_CM_PER_PS * self.tof_signal))
    }
}

// =============================================================================
// MONTE CARLO
// =============================================================================

/// A generated collision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McCollision {
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
}

/// A generated particle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McParticle {
    pub mc_collision: u32,
    pub pdg_code: i32,
    pub pt: f32,
    pub eta: f32,
    pub phi: f32,
    /// Rapidity.
    pub y: f32,
    pub is_physical_primary: bool,
}

// =============================================================================
// CLUSTER INPUT
// =============================================================================

/// A reconstructed cluster as delivered by the producer, before it is
/// stored. Exactly one of `collision` and `bc` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bc: Option<u32>,
    #[serde(flatten)]
    pub record: ClusterRecord,
}

impl ClusterEntry {
    /// The row's single reference.
    pub fn association(&self) -> Result<Association, AodError> {
        match (self.collision, self.bc) {
            (Some(c), None) => Ok(Association::Collision(CollisionId(c))),
            (None, Some(b)) => Ok(Association::BunchCrossing(BcId(b))),
            (Some(_), Some(_)) => Err(AodError::InvalidInput(format!(
                "cluster {} carries both a collision and a bc reference",
                self.record.id
            ))),
            (None, None) => Err(AodError::InvalidInput(format!(
                "cluster {} carries neither a collision nor a bc reference",
                self.record.id
            ))),
        }
    }
}

// =============================================================================
// EVENT BATCH
// =============================================================================

/// All input of one processing pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBatch {
    pub collisions: Vec<Collision>,
    pub bcs: Vec<BunchCrossing>,
    pub tracks: Vec<Track>,
    pub mc_collisions: Vec<McCollision>,
    pub mc_particles: Vec<McParticle>,
    pub clusters: Vec<ClusterEntry>,
}

impl EventBatch {
    /// Number of collisions as a reference bound.
    pub fn n_collisions(&self) -> Result<u32, AodError> {
        u32::try_from(self.collisions.len())
            .map_err(|_| AodError::InvalidInput("too many collisions".to_string()))
    }

    /// Number of bunch crossings as a reference bound.
    pub fn n_bcs(&self) -> Result<u32, AodError> {
        u32::try_from(self.bcs.len())
            .map_err(|_| AodError::InvalidInput("too many bunch crossings".to_string()))
    }

    /// Check that every cross-table reference points at an existing row.
    pub fn validate(&self) -> Result<(), AodError> {
        let n_collisions = self.collisions.len();
        let n_bcs = self.bcs.len();

        for (i, collision) in self.collisions.iter().enumerate() {
            if let Some(bc) = collision.bc
                && bc.0 as usize >= n_bcs
            {
                return Err(AodError::InvalidInput(format!(
                    "collision {i} references bc {} of {n_bcs}",
                    bc.0
                )));
            }
            if let Some(mc) = collision.mc_collision
                && mc as usize >= self.mc_collisions.len()
            {
                return Err(AodError::InvalidInput(format!(
                    "collision {i} references mc collision {mc} of {}",
                    self.mc_collisions.len()
                )));
            }
        }

        for (i, track) in self.tracks.iter().enumerate() {
            if track.collision.0 as usize >= n_collisions {
                return Err(AodError::InvalidInput(format!(
                    "track {i} references collision {} of {n_collisions}",
                    track.collision.0
                )));
            }
            if let Some(mc) = track.mc_particle
                && mc as usize >= self.mc_particles.len()
            {
                return Err(AodError::InvalidInput(format!(
                    "track {i} references mc particle {mc} of {}",
                    self.mc_particles.len()
                )));
            }
        }

        for (i, particle) in self.mc_particles.iter().enumerate() {
            if particle.mc_collision as usize >= self.mc_collisions.len() {
                return Err(AodError::InvalidInput(format!(
                    "mc particle {i} references mc collision {} of {}",
                    particle.mc_collision,
                    self.mc_collisions.len()
                )));
            }
        }

        Ok(())
    }

    /// Tracks belonging to a collision, in input order.
    pub fn tracks_of(&self, collision: CollisionId) -> impl Iterator<Item = &Track> + '_ {
        self.tracks
            .iter()
            .filter(move |track| track.collision == collision)
    }

    /// The generated particle a track was matched to.
    #[must_use]
    pub fn mc_particle_of(&self, track: &Track) -> Option<&McParticle> {
        track
            .mc_particle
            .and_then(|i| self.mc_particles.get(i as usize))
    }

    /// Collisions with their ids, in input order.
    pub fn collisions_with_ids(&self) -> impl Iterator<Item = (CollisionId, &Collision)> + '_ {
        self.collisions
            .iter()
            .enumerate()
            .map(|(i, c)| (CollisionId(i as u32), c))
    }

    /// Store the batch's clusters in the matched and ambiguous tables.
    pub fn cluster_tables(&self) -> Result<ClusterTables, AodError> {
        store_clusters(self.n_collisions()?, self.n_bcs()?, &self.clusters)
    }
}

/// Append cluster entries, in order, to the table of their reference kind
/// and finish both tables. References are checked against the given set
/// sizes.
pub fn store_clusters(
    n_collisions: u32,
    n_bcs: u32,
    entries: &[ClusterEntry],
) -> Result<ClusterTables, AodError> {
    let mut pass = ClusterPass::new(n_collisions, n_bcs);
    for entry in entries {
        pass.append(entry.association()?, entry.record.clone())?;
    }
    Ok(pass.finish())
}

// =============================================================================
// TESTS
// =============================================================================
