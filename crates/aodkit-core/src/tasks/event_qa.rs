//! Full event QA.
//!
//! Primary vertex position, contributors and fit quality per selected
//! collision, plus kinematic and detector distributions of the selected
//! tracks. On Monte-Carlo input the vertex and track resolutions against the
//! generated values are filled as well.

use super::{pt_axis, AnalysisTask, PassInput, PT_EDGES_QA};
use crate::event::{EventBatch, Track};
use crate::histogram::{Axis, HistogramRegistry};
use crate::AodError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Event and track selection of the full event QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQaConfig {
    /// Keep only collisions passing the standard event selection.
    pub select_good_events: bool,
    /// Keep only tracks passing the global track selection.
    pub select_global_tracks: bool,
    /// Charge sign to keep; 0 keeps both.
    pub select_charge: i8,
    /// Keep only tracks from physical primaries (Monte-Carlo input).
    pub select_prim: bool,
    /// Keep only tracks from secondaries (Monte-Carlo input).
    pub select_sec: bool,
    /// |PDG code| to keep; 0 keeps all (Monte-Carlo input).
    pub select_pid: i32,
    /// Input carries generator-level information.
    pub is_mc: bool,
}

impl Default for EventQaConfig {
    fn default() -> Self {
        Self {
            select_good_events: true,
            select_global_tracks: true,
            select_charge: 0,
            select_prim: false,
            select_sec: false,
            select_pid: 0,
            is_mc: false,
        }
    }
}

impl EventQaConfig {
    /// Check the charge and PDG selections.
    pub fn validate(&self) -> Result<(), AodError> {
        if !(-1..=1).contains(&self.select_charge) {
            return Err(AodError::InvalidConfig(format!(
                "event_qa.select_charge must be -1, 0 or 1, got {}",
                self.select_charge
            )));
        }
        if self.select_pid < 0 {
            return Err(AodError::InvalidConfig(
                "event_qa.select_pid is an absolute PDG code".to_string(),
            ));
        }
        Ok(())
    }

    /// Charge and generator-level selection of a track that already passed
    /// the global filter.
    fn accepts(&self, track: &Track, batch: &EventBatch) -> bool {
        if self.select_charge != 0 && self.select_charge != track.sign {
            return false;
        }
        if !self.is_mc {
            return true;
        }
        let Some(particle) = batch.mc_particle_of(track) else {
            // Unmatched tracks only survive when no generator cut is asked for.
            return !(self.select_prim || self.select_sec || self.select_pid != 0);
        };
        if self.select_prim && !particle.is_physical_primary {
            return false;
        }
        if self.select_sec && particle.is_physical_primary {
            return false;
        }
        self.select_pid == 0 || self.select_pid == particle.pdg_code.abs()
    }
}

/// Full event QA.
#[derive(Debug, Default)]
pub struct EventQaTask {
    config: EventQaConfig,
}

impl EventQaTask {
    #[must_use]
    pub fn new(config: EventQaConfig) -> Self {
        Self { config }
    }
}

impl AnalysisTask for EventQaTask {
    fn name(&self) -> &'static str {
        "qa-event-track"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let pt = pt_axis(&PT_EDGES_QA, "#it{p}_{T} (GeV/#it{c})")?;
        let n_contrib = Axis::uniform(200, 0.0, 200.0, "Number Of contributors to the PV")?;
        let pos_x = Axis::uniform(500, -1.0, 1.0, "X (cm)")?;
        let pos_y = Axis::uniform(500, -1.0, 1.0, "Y (cm)")?;
        let pos_z = Axis::uniform(100, -20.0, 20.0, "Z (cm)")?;
        let multiplicity = Axis::uniform(200, 0.0, 200.0, "Track Multiplicity")?;

        registry.add_1d("Events/recoEff", "", Axis::uniform(2, 0.5, 2.5, "")?)?;
        registry.set_bin_labels("Events/recoEff", &["all", "selected"])?;
        registry.add_1d("Events/posX", "", pos_x.clone())?;
        registry.add_1d("Events/posY", "", pos_y.clone())?;
        registry.add_1d("Events/posZ", "", pos_z.clone())?;
        registry.add_2d("Events/posXY", "", pos_x.clone(), pos_y.clone())?;
        registry.add_2d("Events/posXvsNContrib", "", pos_x, n_contrib.clone())?;
        registry.add_2d("Events/posYvsNContrib", "", pos_y, n_contrib.clone())?;
        registry.add_2d("Events/posZvsNContrib", "", pos_z, n_contrib.clone())?;
        registry.add_1d("Events/nContrib", "", n_contrib.clone())?;
        registry.add_2d(
            "Events/nContribVsMult",
            "",
            n_contrib.clone(),
            multiplicity.clone(),
        )?;
        registry.add_1d(
            "Events/vertexChi2",
            "",
            Axis::uniform(100, 0.0, 100.0, "#chi^{2}")?,
        )?;
        registry.add_1d("Events/nTracks", "", multiplicity)?;

        if self.config.is_mc {
            let reso = |label: &str| Axis::uniform(100, -0.5, 0.5, label);
            registry.add_2d(
                "Events/resoX",
                "",
                reso("X_{Rec} - X_{Gen} (cm)")?,
                n_contrib.clone(),
            )?;
            registry.add_2d(
                "Events/resoY",
                "",
                reso("Y_{Rec} - Y_{Gen} (cm)")?,
                n_contrib.clone(),
            )?;
            registry.add_2d(
                "Events/resoZ",
                "",
                reso("Z_{Rec} - Z_{Gen} (cm)")?,
                n_contrib,
            )?;
        }

        registry.add_1d("Tracks/recoEff", "", Axis::uniform(2, 0.5, 2.5, "")?)?;
        registry.set_bin_labels("Tracks/recoEff", &["all", "selected"])?;

        let eta = Axis::uniform(180, -0.9, 0.9, "#eta")?;
        let phi = Axis::uniform(180, 0.0, TAU, "#phi (rad)")?;
        registry.add_1d("Tracks/Kine/pt", "#it{p}_{T}", pt.clone())?;
        registry.add_1d("Tracks/Kine/eta", "#eta", eta.clone())?;
        registry.add_1d("Tracks/Kine/phi", "#phi", phi.clone())?;
        if self.config.is_mc {
            registry.add_2d(
                "Tracks/Kine/resoPt",
                "",
                Axis::uniform(100, -0.5, 0.5, "#it{p}_{T, rec} - #it{p}_{T, gen}")?,
                pt.clone(),
            )?;
            registry.add_2d(
                "Tracks/Kine/resoEta",
                "",
                Axis::uniform(100, -0.1, 0.1, "#eta_{rec} - #eta_{gen}")?,
                eta,
            )?;
            registry.add_2d(
                "Tracks/Kine/resoPhi",
                "",
                Axis::uniform(100, -0.1, 0.1, "#phi_{rec} - #phi_{gen}")?,
                phi,
            )?;
        }

        let dca_xy = Axis::uniform(200, -0.15, 0.15, "#it{dcaXY} (cm)")?;
        let dca_z = Axis::uniform(200, -0.15, 0.15, "#it{dcaZ} (cm)")?;
        registry.add_1d("Tracks/dcaXY", "distance of closest approach in xy plane", dca_xy.clone())?;
        registry.add_1d("Tracks/dcaZ", "distance of closest approach in z", dca_z.clone())?;
        // Impact parameter on x, transverse momentum on y.
        registry.add_2d("Tracks/dcaXYvsPt", "", dca_xy, pt.clone())?;
        registry.add_2d("Tracks/dcaZvsPt", "", dca_z, pt.clone())?;
        registry.add_1d(
            "Tracks/length",
            "track length in cm",
            Axis::uniform(400, 0.0, 1000.0, "#it{Length} (cm)")?,
        )?;

        registry.add_1d(
            "Tracks/ITS/itsNCls",
            "number of found ITS clusters",
            Axis::uniform(8, -0.5, 7.5, "# clusters ITS")?,
        )?;
        registry.add_1d(
            "Tracks/ITS/itsChi2NCl",
            "chi2 per ITS cluster",
            Axis::uniform(100, 0.0, 40.0, "chi2 / cluster ITS")?,
        )?;
        registry.add_1d("Tracks/ITS/hasITS", "pt distribution of tracks crossing ITS", pt.clone())?;
        registry.add_1d(
            "Tracks/ITS/hasITSANDhasTPC",
            "pt distribution of tracks crossing both ITS and TPC",
            pt.clone(),
        )?;

        registry.add_1d(
            "Tracks/TPC/tpcNClsFound",
            "number of found TPC clusters",
            Axis::uniform(165, -0.5, 164.5, "# clusters TPC")?,
        )?;
        registry.add_1d(
            "Tracks/TPC/tpcCrossedRows",
            "number of crossed TPC rows",
            Axis::uniform(165, -0.5, 164.5, "# crossed rows TPC")?,
        )?;
        registry.add_1d(
            "Tracks/TPC/tpcCrossedRowsOverFindableCls",
            "crossed TPC rows over findable clusters",
            Axis::uniform(60, 0.7, 1.3, "crossed rows / findable clusters TPC")?,
        )?;
        registry.add_1d(
            "Tracks/TPC/tpcChi2NCl",
            "chi2 per cluster in TPC",
            Axis::uniform(100, 0.0, 10.0, "chi2 / cluster TPC")?,
        )?;
        registry.add_1d("Tracks/TPC/hasTPC", "pt distribution of tracks crossing TPC", pt)?;
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        let batch = input.batch;
        for (collision_id, collision) in batch.collisions_with_ids() {
            registry.fill_label("Events/recoEff", "all")?;
            if self.config.select_good_events && !collision.sel8 {
                continue;
            }
            registry.fill_label("Events/recoEff", "selected")?;

            let mut n_read = 0usize;
            let mut filtered: Vec<&Track> = Vec::new();
            for track in batch.tracks_of(collision_id) {
                n_read += 1;
                if !self.config.select_global_tracks || track.is_global_track {
                    filtered.push(track);
                }
            }
            filtered.retain(|track| self.config.accepts(track, batch));
            let n_tracks = filtered.len();

            let n_contrib = collision.n_contrib;
            registry.fill("Events/posX", collision.pos_x)?;
            registry.fill("Events/posY", collision.pos_y)?;
            registry.fill("Events/posZ", collision.pos_z)?;
            registry.fill2("Events/posXY", collision.pos_x, collision.pos_y)?;
            registry.fill2("Events/posXvsNContrib", collision.pos_x, n_contrib)?;
            registry.fill2("Events/posYvsNContrib", collision.pos_y, n_contrib)?;
            registry.fill2("Events/posZvsNContrib", collision.pos_z, n_contrib)?;
            registry.fill("Events/nContrib", n_contrib)?;
            registry.fill2("Events/nContribVsMult", n_contrib, n_tracks as f64)?;
            registry.fill("Events/vertexChi2", collision.chi2)?;
            registry.fill("Events/nTracks", n_tracks as f64)?;

            if self.config.is_mc
                && let Some(index) = collision.mc_collision
            {
                let generated = batch.mc_collisions.get(index as usize).ok_or_else(|| {
                    AodError::InvalidInput(format!("no mc collision {index}"))
                })?;
                registry.fill2("Events/resoX", collision.pos_x - generated.pos_x, n_contrib)?;
                registry.fill2("Events/resoY", collision.pos_y - generated.pos_y, n_contrib)?;
                registry.fill2("Events/resoZ", collision.pos_z - generated.pos_z, n_contrib)?;
            }

            registry.fill_weighted("Tracks/recoEff", 1.0, n_read as f64)?;
            registry.fill_weighted("Tracks/recoEff", 2.0, n_tracks as f64)?;

            for track in filtered {
                self.fill_track(track, batch, registry)?;
            }
        }
        Ok(())
    }
}

impl EventQaTask {
    fn fill_track(
        &self,
        track: &Track,
        batch: &EventBatch,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        registry.fill("Tracks/Kine/pt", track.pt)?;
        registry.fill("Tracks/Kine/eta", track.eta)?;
        registry.fill("Tracks/Kine/phi", track.phi)?;

        registry.fill("Tracks/dcaXY", track.dca_xy)?;
        registry.fill("Tracks/dcaZ", track.dca_z)?;
        registry.fill2("Tracks/dcaXYvsPt", track.dca_xy, track.pt)?;
        registry.fill2("Tracks/dcaZvsPt", track.dca_z, track.pt)?;
        registry.fill("Tracks/length", track.length)?;

        registry.fill("Tracks/ITS/itsNCls", track.its_n_cls)?;
        registry.fill("Tracks/ITS/itsChi2NCl", track.its_chi2_ncl)?;

        registry.fill("Tracks/TPC/tpcNClsFound", track.tpc_n_cls_found)?;
        registry.fill("Tracks/TPC/tpcCrossedRows", track.tpc_n_cls_crossed_rows)?;
        registry.fill(
            "Tracks/TPC/tpcCrossedRowsOverFindableCls",
            track.tpc_crossed_rows_over_findable_cls,
        )?;
        registry.fill("Tracks/TPC/tpcChi2NCl", track.tpc_chi2_ncl)?;

        if self.config.is_mc
            && let Some(particle) = batch.mc_particle_of(track)
        {
            registry.fill2("Tracks/Kine/resoPt", track.pt - particle.pt, track.pt)?;
            registry.fill2("Tracks/Kine/resoEta", track.eta - particle.eta, track.eta)?;
            registry.fill2("Tracks/Kine/resoPhi", track.phi - particle.phi, track.phi)?;
        }

        if track.has_its {
            registry.fill("Tracks/ITS/hasITS", track.pt)?;
        }
        if track.has_tpc {
            registry.fill("Tracks/TPC/hasTPC", track.pt)?;
        }
        if track.has_its && track.has_tpc {
            registry.fill("Tracks/ITS/hasITSANDhasTPC", track.pt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Collision, McCollision, McParticle};
    use crate::table::ClusterTables;
    use crate::CollisionId;

    fn run(config: EventQaConfig, batch: &EventBatch) -> HistogramRegistry {
        let mut task = EventQaTask::new(config);
        let mut registry = HistogramRegistry::new(task.name());
        task.init(&mut registry).expect("init");
        registry.freeze();
        let clusters = ClusterTables::empty();
        let input = PassInput {
            batch,
            clusters: &clusters,
        };
        task.process(&input, &mut registry).expect("process");
        registry
    }

    fn global(collision: u32, sign: i8) -> Track {
        Track {
            collision: CollisionId(collision),
            pt: 1.2,
            eta: 0.1,
            sign,
            is_global_track: true,
            has_its: true,
            has_tpc: true,
            its_n_cls: 7,
            ..Track::default()
        }
    }

    fn batch() -> EventBatch {
        EventBatch {
            collisions: vec![
                Collision {
                    pos_x: 0.01,
                    pos_y: -0.02,
                    pos_z: 2.5,
                    n_contrib: 40,
                    chi2: 12.0,
                    sel8: true,
                    ..Collision::default()
                },
                Collision {
                    pos_z: -7.0,
                    sel8: false,
                    ..Collision::default()
                },
            ],
            tracks: vec![
                global(0, 1),
                global(0, -1),
                Track {
                    collision: CollisionId(0),
                    pt: 0.4,
                    ..Track::default()
                },
                global(1, 1),
            ],
            ..EventBatch::default()
        }
    }

    #[test]
    fn vertex_histograms_follow_event_selection() {
        let registry = run(EventQaConfig::default(), &batch());

        let reco = registry.get("Events/recoEff").expect("h");
        assert_eq!(reco.bin_content(1), 2.0);
        assert_eq!(reco.bin_content(2), 1.0);

        let pos_z = registry.get("Events/posZ").expect("h");
        assert_eq!(pos_z.entries, 1);
        assert_eq!(pos_z.bin_content(pos_z.x_axis().find_bin(2.5)), 1.0);
        assert_eq!(registry.get("Events/nContrib").expect("h").entries, 1);
        assert_eq!(registry.get("Events/vertexChi2").expect("h").entries, 1);

        let n_tracks = registry.get("Events/nTracks").expect("h");
        assert_eq!(n_tracks.bin_content(n_tracks.x_axis().find_bin(2.0)), 1.0);
    }

    #[test]
    fn track_efficiency_counts_read_and_selected() {
        let registry = run(EventQaConfig::default(), &batch());
        let reco = registry.get("Tracks/recoEff").expect("h");
        assert_eq!(reco.bin_content(1), 3.0);
        assert_eq!(reco.bin_content(2), 2.0);
        assert_eq!(registry.get("Tracks/ITS/hasITSANDhasTPC").expect("h").entries, 2);
    }

    #[test]
    fn charge_selection() {
        let config = EventQaConfig {
            select_charge: -1,
            ..EventQaConfig::default()
        };
        let registry = run(config, &batch());
        assert_eq!(registry.get("Tracks/Kine/pt").expect("h").entries, 1);

        let invalid = EventQaConfig {
            select_charge: 2,
            ..EventQaConfig::default()
        };
        assert!(matches!(invalid.validate(), Err(AodError::InvalidConfig(_))));
    }

    #[test]
    fn mc_resolution_and_primary_selection() {
        let mut input = batch();
        input.collisions[0].mc_collision = Some(0);
        input.mc_collisions = vec![McCollision {
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 2.4,
        }];
        input.mc_particles = vec![McParticle {
            pt: 1.1,
            is_physical_primary: true,
            ..McParticle::default()
        }];
        input.tracks[0].mc_particle = Some(0);

        let config = EventQaConfig {
            is_mc: true,
            select_prim: true,
            ..EventQaConfig::default()
        };
        let registry = run(config, &input);

        let reso_z = registry.get("Events/resoZ").expect("h");
        assert_eq!(reso_z.entries, 1);
        assert_eq!(reso_z.integral(), 1.0);
        // Only the matched primary survives; the unmatched global track is
        // dropped by the generator-level cut.
        assert_eq!(registry.get("Tracks/Kine/pt").expect("h").entries, 1);
        assert_eq!(registry.get("Tracks/Kine/resoPt").expect("h").entries, 1);
    }

    #[test]
    fn data_registry_has_no_resolution_histograms() {
        let registry = run(EventQaConfig::default(), &EventBatch::default());
        assert!(!registry.contains("Events/resoX"));
        assert!(!registry.contains("Tracks/Kine/resoPt"));
    }
}
