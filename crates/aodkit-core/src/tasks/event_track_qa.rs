//! Event and track quality assurance.
//!
//! Vertex position plus kinematic, impact parameter and per-detector
//! quality distributions of the tracks passing a configurable selection.

use super::{pt_axis, AnalysisTask, PassInput, PT_EDGES_QA};
use crate::event::Track;
use crate::pid::Species;
use crate::histogram::{Axis, HistogramRegistry};
use crate::AodError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Track selection of the QA task.
///
/// The three detector toggles are mutually exclusive; with none set, tracks
/// are accepted regardless of which detectors they crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTrackQaConfig {
    pub pt_min: f32,
    pub eta_min: f32,
    pub eta_max: f32,
    pub chi2_its_max: f32,
    pub chi2_tpc_max: f32,
    pub n_cluster_tpc_min: f32,
    pub n_crossed_rows_tpc_min: f32,
    pub crossed_rows_over_findable_min: f32,
    /// Keep ITS standalone tracks only.
    pub its_standalone: bool,
    /// Keep TPC-only tracks only.
    pub tpc_only: bool,
    /// Keep ITS-TPC matched tracks only.
    pub its_tpc_matched: bool,
    /// Monte-Carlo input: skip the vertex histogram and count the PDG codes
    /// of tracks matched to physical primaries.
    pub process_mc: bool,
}

impl Default for EventTrackQaConfig {
    fn default() -> Self {
        Self {
            pt_min: 0.0,
            eta_min: -10.0,
            eta_max: 10.0,
            chi2_its_max: 1000.0,
            chi2_tpc_max: 1000.0,
            n_cluster_tpc_min: -1001.0,
            n_crossed_rows_tpc_min: -1001.0,
            crossed_rows_over_findable_min: -1.0,
            its_standalone: false,
            tpc_only: false,
            its_tpc_matched: false,
            process_mc: false,
        }
    }
}

impl EventTrackQaConfig {
    /// Check ranges and toggle exclusivity.
    pub fn validate(&self) -> Result<(), AodError> {
        if self.eta_min >= self.eta_max {
            return Err(AodError::InvalidConfig(format!(
                "event_track_qa.eta_min ({}) must be below eta_max ({})",
                self.eta_min, self.eta_max
            )));
        }
        let toggles = [self.its_standalone, self.tpc_only, self.its_tpc_matched];
        if toggles.iter().filter(|&&t| t).count() > 1 {
            return Err(AodError::InvalidConfig(
                "at most one of its_standalone, tpc_only, its_tpc_matched may be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a track passes the selection.
    #[must_use]
    pub fn accepts(&self, track: &Track) -> bool {
        if track.pt <= self.pt_min || track.eta <= self.eta_min || track.eta >= self.eta_max {
            return false;
        }
        if self.its_standalone && !(track.has_its && !track.has_tpc) {
            return false;
        }
        if self.tpc_only && !(!track.has_its && track.has_tpc) {
            return false;
        }
        if self.its_tpc_matched && !(track.has_its && track.has_tpc) {
            return false;
        }
        // Quality cuts of a detector the selection excludes are not applied.
        let its_ok = self.tpc_only || track.its_chi2_ncl < self.chi2_its_max;
        let tpc_ok = self.its_standalone
            || (track.tpc_chi2_ncl < self.chi2_tpc_max
                && f32::from(track.tpc_n_cls_found) > self.n_cluster_tpc_min
                && f32::from(track.tpc_n_cls_crossed_rows) > self.n_crossed_rows_tpc_min
                && track.tpc_crossed_rows_over_findable_cls > self.crossed_rows_over_findable_min);
        its_ok && tpc_ok
    }
}

/// Event and track QA.
#[derive(Debug)]
pub struct EventTrackQaTask {
    config: EventTrackQaConfig,
    /// Signed PDG codes of the species with a PID hypothesis, as bin labels.
    pdg_labels: Vec<String>,
}

impl EventTrackQaTask {
    #[must_use]
    pub fn new(config: EventTrackQaConfig) -> Self {
        let pdg_labels = Species::ALL
            .iter()
            .flat_map(|s| [s.pdg_code(), -s.pdg_code()])
            .map(|code| code.to_string())
            .collect();
        Self { config, pdg_labels }
    }
}

impl Default for EventTrackQaTask {
    fn default() -> Self {
        Self::new(EventTrackQaConfig::default())
    }
}

impl AnalysisTask for EventTrackQaTask {
    fn name(&self) -> &'static str {
        "qa-event-track-lite"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let pt = pt_axis(&PT_EDGES_QA, "#it{p}_{T} (GeV/#it{c})")?;
        let imp_par_rphi = Axis::uniform(200, -0.15, 0.15, "#it{d}_{r#it{#varphi}} (cm)")?;
        let imp_par_z = Axis::uniform(200, -0.15, 0.15, "#it{d}_{z} (cm)")?;
        let crossed_rows = Axis::uniform(165, -0.5, 164.5, "# crossed rows TPC")?;
        let cls_found = Axis::uniform(165, -0.5, 164.5, "# clusters TPC")?;
        let ratio = Axis::uniform(60, 0.7, 1.3, "crossed rows / findable clusters TPC")?;

        registry.add_1d(
            "Tracks/VertexPositionZ",
            "",
            Axis::uniform(100, -20.0, 20.0, "Vertex Z (cm)")?,
        )?;

        registry.add_1d("Tracks/Kine/pt", "#it{p}_{T}", pt.clone())?;
        registry.add_1d(
            "Tracks/Kine/eta",
            "#eta",
            Axis::uniform(800, -2.0, 2.0, "#it{#eta}")?,
        )?;
        registry.add_1d(
            "Tracks/Kine/phi",
            "#phi",
            Axis::uniform(180, 0.0, TAU, "#varphi (rad)")?,
        )?;
        registry.add_1d(
            "Tracks/length",
            "track length in cm",
            Axis::uniform(400, 0.0, 1000.0, "length (cm)")?,
        )?;
        registry.add_1d(
            "Tracks/dcaXY",
            "distance of closest approach in xy plane",
            imp_par_rphi.clone(),
        )?;
        registry.add_1d("Tracks/dcaZ", "distance of closest approach in z", imp_par_z)?;
        registry.add_2d(
            "Tracks/dcaXYvsPt",
            "d_{xy} vs. #it{p}_{T}",
            pt.clone(),
            imp_par_rphi.clone(),
        )?;
        // Shares the r-phi binning with dcaXYvsPt.
        registry.add_2d("Tracks/dcaZvsPt", "d_{z} vs. #it{p}_{T}", pt.clone(), imp_par_rphi)?;

        registry.add_1d(
            "Tracks/ITS/itsChi2NCl",
            "chi2 per ITS cluster",
            Axis::uniform(100, 0.0, 40.0, "chi2 / cluster ITS")?,
        )?;
        registry.add_1d(
            "Tracks/TPC/tpcChi2NCl",
            "chi2 per cluster in TPC",
            Axis::uniform(100, 0.0, 10.0, "chi2 / cluster TPC")?,
        )?;
        registry.add_1d("Tracks/TPC/tpcNClsFound", "number of found TPC clusters", cls_found.clone())?;
        registry.add_1d("Tracks/TPC/tpcCrossedRows", "number of crossed TPC rows", crossed_rows.clone())?;
        registry.add_1d(
            "Tracks/TPC/tpcCrossedRowsOverFindableCls",
            "crossed TPC rows over findable clusters",
            ratio.clone(),
        )?;
        registry.add_2d("Tracks/TPC/tpcNClsFoundvsPt", "", pt.clone(), cls_found)?;
        registry.add_2d("Tracks/TPC/tpcCrossedRowsvsPt", "", pt.clone(), crossed_rows)?;
        registry.add_2d("Tracks/TPC/tpcCrossedRowsOverFindableClsvsPt", "", pt, ratio)?;

        registry.add_1d(
            "Tracks/TRD/trdChi2",
            "chi2 in TRD",
            Axis::uniform(100, 0.0, 10.0, "chi2 / cluster TRD")?,
        )?;
        registry.add_1d(
            "Tracks/TOF/tofChi2",
            "chi2 in TOF",
            Axis::uniform(100, 0.0, 10.0, "chi2 / cluster TOF")?,
        )?;

        registry.add_1d(
            "Tracks/matchedDet",
            "matched detectors",
            Axis::uniform(4, 0.5, 4.5, "")?,
        )?;
        registry.set_bin_labels("Tracks/matchedDet", &["hasTPC", "hasITS", "hasTRD", "hasTOF"])?;

        if self.config.process_mc {
            registry.add_1d(
                "Particle/PDGs",
                "Particle PDGs",
                Axis::uniform(100, 0.0, 100.0, "PDG Code")?,
            )?;
            let labels: Vec<&str> = self.pdg_labels.iter().map(String::as_str).collect();
            registry.set_bin_labels("Particle/PDGs", &labels)?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        for track in &input.batch.tracks {
            if !self.config.accepts(track) {
                continue;
            }

            if self.config.process_mc {
                if let Some(particle) = input.batch.mc_particle_of(track)
                    && particle.is_physical_primary
                {
                    let code = particle.pdg_code.to_string();
                    registry.fill_label("Particle/PDGs", &code)?;
                }
            } else {
                let collision = input.collision(track.collision)?;
                registry.fill("Tracks/VertexPositionZ", collision.pos_z)?;
            }

            registry.fill("Tracks/Kine/pt", track.pt)?;
            registry.fill("Tracks/Kine/eta", track.eta)?;
            registry.fill("Tracks/Kine/phi", track.phi)?;
            registry.fill("Tracks/length", track.length)?;
            registry.fill("Tracks/dcaXY", track.dca_xy)?;
            registry.fill("Tracks/dcaZ", track.dca_z)?;
            registry.fill2("Tracks/dcaXYvsPt", track.pt, track.dca_xy)?;
            registry.fill2("Tracks/dcaZvsPt", track.pt, track.dca_z)?;

            registry.fill("Tracks/ITS/itsChi2NCl", track.its_chi2_ncl)?;
            registry.fill("Tracks/TPC/tpcChi2NCl", track.tpc_chi2_ncl)?;
            registry.fill("Tracks/TPC/tpcNClsFound", track.tpc_n_cls_found)?;
            registry.fill("Tracks/TPC/tpcCrossedRows", track.tpc_n_cls_crossed_rows)?;
            registry.fill(
                "Tracks/TPC/tpcCrossedRowsOverFindableCls",
                track.tpc_crossed_rows_over_findable_cls,
            )?;
            registry.fill2("Tracks/TPC/tpcNClsFoundvsPt", track.pt, track.tpc_n_cls_found)?;
            registry.fill2(
                "Tracks/TPC/tpcCrossedRowsvsPt",
                track.pt,
                track.tpc_n_cls_crossed_rows,
            )?;
            registry.fill2(
                "Tracks/TPC/tpcCrossedRowsOverFindableClsvsPt",
                track.pt,
                track.tpc_crossed_rows_over_findable_cls,
            )?;
            registry.fill("Tracks/TRD/trdChi2", track.trd_chi2)?;
            registry.fill("Tracks/TOF/tofChi2", track.tof_chi2)?;

            for (has, label) in [
                (track.has_tpc, "hasTPC"),
                (track.has_its, "hasITS"),
                (track.has_trd, "hasTRD"),
                (track.has_tof, "hasTOF"),
            ] {
                if has {
                    registry.fill_label("Tracks/matchedDet", label)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Collision, EventBatch, McCollision, McParticle};
    use crate::table::ClusterTables;
    use crate::CollisionId;

    fn global_track() -> Track {
        Track {
            collision: CollisionId(0),
            pt: 1.0,
            eta: 0.3,
            phi: 1.0,
            has_its: true,
            has_tpc: true,
            its_chi2_ncl: 2.0,
            tpc_chi2_ncl: 1.5,
            tpc_n_cls_found: 140,
            tpc_n_cls_crossed_rows: 150,
            tpc_crossed_rows_over_findable_cls: 0.95,
            ..Track::default()
        }
    }

    #[test]
    fn default_selection_accepts_global_track() {
        assert!(EventTrackQaConfig::default().accepts(&global_track()));
    }

    #[test]
    fn detector_toggles() {
        let tpc_only = EventTrackQaConfig {
            tpc_only: true,
            ..EventTrackQaConfig::default()
        };
        assert!(!tpc_only.accepts(&global_track()));

        let mut track = global_track();
        track.has_its = false;
        track.its_chi2_ncl = 5000.0;
        assert!(tpc_only.accepts(&track));
    }

    #[test]
    fn two_toggles_are_rejected() {
        let config = EventTrackQaConfig {
            tpc_only: true,
            its_standalone: true,
            ..EventTrackQaConfig::default()
        };
        assert!(matches!(config.validate(), Err(AodError::InvalidConfig(_))));
    }

    fn run(mut task: EventTrackQaTask, batch: &EventBatch) -> HistogramRegistry {
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

    #[test]
    fn matched_detector_labels() {
        let batch = EventBatch {
            collisions: vec![Collision::default()],
            tracks: vec![global_track()],
            ..EventBatch::default()
        };
        let registry = run(EventTrackQaTask::default(), &batch);

        let matched = registry.get("Tracks/matchedDet").expect("h");
        assert_eq!(matched.bin_content(1), 1.0);
        assert_eq!(matched.bin_content(2), 1.0);
        assert_eq!(matched.bin_content(3), 0.0);
        assert_eq!(registry.get("Tracks/VertexPositionZ").expect("h").entries, 1);
    }

    #[test]
    fn vertex_position_counts_selected_tracks() {
        let mut rejected = global_track();
        rejected.pt = 0.0;
        let mut second = global_track();
        second.collision = CollisionId(1);
        let batch = EventBatch {
            collisions: vec![
                Collision {
                    pos_z: -4.0,
                    ..Collision::default()
                },
                Collision {
                    pos_z: 6.0,
                    ..Collision::default()
                },
            ],
            tracks: vec![global_track(), global_track(), second, rejected],
            ..EventBatch::default()
        };
        let registry = run(EventTrackQaTask::default(), &batch);

        let h = registry.get("Tracks/VertexPositionZ").expect("h");
        assert_eq!(h.entries, 3);
        assert_eq!(h.bin_content(h.x_axis().find_bin(-4.0)), 2.0);
        assert_eq!(h.bin_content(h.x_axis().find_bin(6.0)), 1.0);
    }

    #[test]
    fn quality_axes() {
        let registry = run(EventTrackQaTask::default(), &EventBatch::default());

        let ratio = registry
            .get("Tracks/TPC/tpcCrossedRowsOverFindableCls")
            .expect("h")
            .x_axis();
        assert_eq!((ratio.n_bins(), ratio.min(), ratio.max()), (60, 0.7, 1.3));
        let ratio_vs_pt = registry
            .get("Tracks/TPC/tpcCrossedRowsOverFindableClsvsPt")
            .expect("h");
        assert_eq!(ratio_vs_pt.y_axis(), Some(ratio));

        let trd = registry.get("Tracks/TRD/trdChi2").expect("h").x_axis();
        assert_eq!(trd.max(), 10.0);

        let dca_xy = registry.get("Tracks/dcaXYvsPt").expect("h").y_axis();
        let dca_z = registry.get("Tracks/dcaZvsPt").expect("h").y_axis();
        assert_eq!(dca_z, dca_xy);
    }

    #[test]
    fn mc_input_counts_primary_pdg_codes() {
        let mut from_primary = global_track();
        from_primary.mc_particle = Some(0);
        let mut from_secondary = global_track();
        from_secondary.mc_particle = Some(1);
        let batch = EventBatch {
            collisions: vec![Collision::default()],
            tracks: vec![from_primary, from_secondary, global_track()],
            mc_collisions: vec![McCollision::default()],
            mc_particles: vec![
                McParticle {
                    pdg_code: -211,
                    is_physical_primary: true,
                    ..McParticle::default()
                },
                McParticle {
                    pdg_code: 2212,
                    ..McParticle::default()
                },
            ],
            ..EventBatch::default()
        };
        let task = EventTrackQaTask::new(EventTrackQaConfig {
            process_mc: true,
            ..EventTrackQaConfig::default()
        });
        let registry = run(task, &batch);

        let pdgs = registry.get("Particle/PDGs").expect("h");
        assert_eq!(pdgs.entries, 1);
        let bin = pdgs.x_axis().find_label("-211").expect("label");
        assert_eq!(pdgs.bin_content(bin), 1.0);
        assert_eq!(registry.get("Tracks/VertexPositionZ").expect("h").entries, 0);
        assert_eq!(registry.get("Tracks/Kine/pt").expect("h").entries, 3);
    }

    #[test]
    fn data_input_has_no_pdg_histogram() {
        let registry = run(EventTrackQaTask::default(), &EventBatch::default());
        assert!(!registry.contains("Particle/PDGs"));
    }
}
