//! TOF particle identification QA.
//!
//! Event and track bookkeeping of the TOF signal, and for every enabled
//! mass hypothesis the n-sigma separation versus momentum. With the full
//! PID tables the expected time, the measured minus expected time and the
//! expected resolution are filled as well.

use super::{AnalysisTask, PassInput};
use crate::event::{Collision, Track};
use crate::histogram::{Axis, HistogramRegistry};
use crate::pid::{rapidity, Species};
use crate::AodError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Accepted |z-vertex| (cm).
const VERTEX_Z_CUT: f32 = 10.0;

/// Accepted |y| when the rapidity cut is on.
const RAPIDITY_CUT: f64 = 0.5;

/// Binning and selections of the TOF PID QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TofPidQaConfig {
    /// Logarithmic momentum axes.
    pub log_axis: bool,
    pub n_bins_p: usize,
    pub min_p: f64,
    pub max_p: f64,
    pub n_bins_delta: usize,
    pub min_delta: f64,
    pub max_delta: f64,
    pub n_bins_exp_sigma: usize,
    pub min_exp_sigma: f64,
    pub max_exp_sigma: f64,
    pub n_bins_nsigma: usize,
    pub min_nsigma: f64,
    pub max_nsigma: f64,
    /// Require the standard event selection.
    pub apply_ev_sel: bool,
    /// Count only global tracks in the event multiplicity.
    pub apply_track_cut: bool,
    /// Keep only tracks within |y| < 0.5 for the hypothesis mass.
    pub apply_rapidity_cut: bool,
    /// Mass hypotheses to fill.
    pub species: Vec<Species>,
    /// Fill the expected-time histograms from the full PID tables.
    pub full: bool,
}

impl Default for TofPidQaConfig {
    fn default() -> Self {
        Self {
            log_axis: false,
            n_bins_p: 400,
            min_p: 0.1,
            max_p: 5.0,
            n_bins_delta: 200,
            min_delta: -1000.0,
            max_delta: 1000.0,
            n_bins_exp_sigma: 200,
            min_exp_sigma: 0.0,
            max_exp_sigma: 200.0,
            n_bins_nsigma: 200,
            min_nsigma: -10.0,
            max_nsigma: 10.0,
            apply_ev_sel: true,
            apply_track_cut: false,
            apply_rapidity_cut: false,
            species: Vec::new(),
            full: false,
        }
    }
}

impl TofPidQaConfig {
    /// Reject repeated hypotheses and a non-positive log-axis start.
    pub fn validate(&self) -> Result<(), AodError> {
        for (i, species) in self.species.iter().enumerate() {
            if self.species[..i].contains(species) {
                return Err(AodError::InvalidConfig(format!(
                    "tof_pid_qa.species lists {} twice",
                    species.code()
                )));
            }
        }
        if self.log_axis && self.min_p <= 0.0 {
            return Err(AodError::InvalidConfig(
                "tof_pid_qa.min_p must be positive with log_axis".to_string(),
            ));
        }
        Ok(())
    }

    fn momentum_axis(&self, label: &str) -> Result<Axis, AodError> {
        if self.log_axis {
            Axis::logarithmic(self.n_bins_p, self.min_p, self.max_p, label)
        } else {
            Axis::uniform(self.n_bins_p, self.min_p, self.max_p, label)
        }
    }
}

/// Histogram names of one mass hypothesis.
#[derive(Debug)]
struct HypothesisHistos {
    species: Species,
    expected: String,
    expected_diff: String,
    exp_sigma: String,
    nsigma: String,
    nsigma_pt: String,
    nsigma_pos_pt: String,
    nsigma_neg_pt: String,
}

impl HypothesisHistos {
    fn new(species: Species) -> Self {
        let code = species.code();
        Self {
            species,
            expected: format!("expected/{code}"),
            expected_diff: format!("expected_diff/{code}"),
            exp_sigma: format!("expsigma/{code}"),
            nsigma: format!("nsigma/{code}"),
            nsigma_pt: format!("nsigmapt/{code}"),
            nsigma_pos_pt: format!("nsigmapospt/{code}"),
            nsigma_neg_pt: format!("nsigmanegpt/{code}"),
        }
    }
}

const EVENT_STEPS: [&str; 4] = ["Events read", "Passed ev. sel.", "Passed mult.", "Passed vtx Z"];

const TRACK_STEPS: [&str; 5] = ["Tracks read", "isGlobalTrack", "hasITS", "hasTPC", "hasTOF"];

/// TOF PID QA.
#[derive(Debug)]
pub struct TofPidQaTask {
    config: TofPidQaConfig,
    hypotheses: Vec<HypothesisHistos>,
}

impl TofPidQaTask {
    #[must_use]
    pub fn new(config: TofPidQaConfig) -> Self {
        let hypotheses = config
            .species
            .iter()
            .copied()
            .map(HypothesisHistos::new)
            .collect();
        Self { config, hypotheses }
    }

    /// Selection steps a track passes, 1 (read) to 5 (has TOF).
    fn track_steps(track: &Track) -> usize {
        let cuts = [
            track.is_global_track,
            track.has_its,
            track.has_tpc,
            track.has_tof,
        ];
        1 + cuts.iter().take_while(|&&passed| passed).count()
    }

    fn event_selected(&self, collision: &Collision) -> (bool, bool) {
        let ev_sel = !self.config.apply_ev_sel || collision.sel8;
        (ev_sel, collision.pos_z.abs() <= VERTEX_Z_CUT)
    }

    fn fill_event(
        &self,
        collision: &Collision,
        tracks: &[&Track],
        registry: &mut HistogramRegistry,
    ) -> Result<bool, AodError> {
        registry.fill_label("event/evsel", EVENT_STEPS[0])?;
        let (ev_sel, vertex) = self.event_selected(collision);
        if !ev_sel {
            return Ok(false);
        }
        registry.fill_label("event/evsel", EVENT_STEPS[1])?;

        let counted = tracks
            .iter()
            .filter(|t| !self.config.apply_track_cut || t.is_global_track);
        let (n_tracks, tof_mult) =
            counted.fold((0u32, 0u32), |(n, tof), t| (n + 1, tof + u32::from(t.has_tof)));
        registry.fill_label("event/evsel", EVENT_STEPS[2])?;

        if !vertex {
            return Ok(false);
        }
        registry.fill_label("event/evsel", EVENT_STEPS[3])?;
        registry.fill("event/vertexz", collision.pos_z)?;
        registry.fill("event/trackmultiplicity", n_tracks)?;
        registry.fill("event/tofmultiplicity", tof_mult)?;
        registry.fill("event/colltime", collision.collision_time * 1000.0)?;
        registry.fill2(
            "event/colltimereso",
            tof_mult,
            collision.collision_time_res * 1000.0,
        )?;
        Ok(true)
    }

    fn fill_track(&self, track: &Track, registry: &mut HistogramRegistry) -> Result<bool, AodError> {
        let steps = Self::track_steps(track);
        for label in &TRACK_STEPS[..steps] {
            registry.fill_label("event/trackselection", label)?;
        }
        if steps < TRACK_STEPS.len() {
            return Ok(false);
        }
        registry.fill("event/particlehypo", track.pid_for_tracking)?;
        registry.fill2("event/tofsignal", track.p, track.tof_signal)?;
        registry.fill2("event/pexp", track.p, track.tof_exp_mom)?;
        registry.fill("event/eta", track.eta)?;
        registry.fill("event/phi", track.phi)?;
        registry.fill2("event/etaphi", track.eta, track.phi)?;
        registry.fill("event/length", track.length)?;
        registry.fill("event/pt", track.pt)?;
        registry.fill("event/p", track.p)?;
        Ok(true)
    }

    fn fill_hypothesis(
        &self,
        histos: &HypothesisHistos,
        collision: &Collision,
        track: &Track,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        let species = histos.species;
        if self.config.apply_rapidity_cut {
            let y = rapidity(f64::from(track.pt), f64::from(track.eta), species.mass());
            if y.abs() > RAPIDITY_CUT {
                return Ok(());
            }
        }

        let nsigma = track.tof_nsigma[species.index()];
        registry.fill2(&histos.nsigma, track.p, nsigma)?;
        registry.fill2(&histos.nsigma_pt, track.pt, nsigma)?;
        if track.sign > 0 {
            registry.fill2(&histos.nsigma_pos_pt, track.pt, nsigma)?;
        } else {
            registry.fill2(&histos.nsigma_neg_pt, track.pt, nsigma)?;
        }

        if self.config.full {
            let tof = track.tof_signal - collision.collision_time * 1000.0;
            let diff = track.tof_exp_signal_diff[species.index()];
            registry.fill2(&histos.expected, track.p, tof - diff)?;
            registry.fill2(&histos.expected_diff, track.p, diff)?;
            registry.fill2(
                &histos.exp_sigma,
                track.p,
                track.tof_exp_sigma[species.index()],
            )?;
        }
        Ok(())
    }
}

impl Default for TofPidQaTask {
    fn default() -> Self {
        Self::new(TofPidQaConfig::default())
    }
}

impl AnalysisTask for TofPidQaTask {
    fn name(&self) -> &'static str {
        "tof-pid-qa"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let c = &self.config;
        let mult = Axis::uniform(100, 0.0, 100.0, "TOF multiplicity")?;
        let eta = Axis::uniform(100, -1.0, 1.0, "#it{#eta}")?;
        let phi = Axis::uniform(100, 0.0, TAU, "#it{#phi}")?;
        let p = c.momentum_axis("#it{p} (GeV/#it{c})")?;
        let pt = c.momentum_axis("#it{p}_{T} (GeV/#it{c})")?;

        registry.add_1d("event/evsel", "", Axis::uniform(10, 0.5, 10.5, "Ev. Sel.")?)?;
        registry.set_bin_labels("event/evsel", &EVENT_STEPS)?;
        registry.add_1d(
            "event/trackselection",
            "",
            Axis::uniform(10, 0.5, 10.5, "Selection passed")?,
        )?;
        registry.set_bin_labels("event/trackselection", &TRACK_STEPS)?;
        registry.add_1d(
            "event/vertexz",
            "",
            Axis::uniform(100, -20.0, 20.0, "Vtx_{z} (cm)")?,
        )?;
        registry.add_1d(
            "event/particlehypo",
            "",
            Axis::uniform(10, 0.0, 10.0, "PID in tracking")?,
        )?;
        let names: Vec<&str> = Species::ALL.iter().map(|s| s.name()).collect();
        registry.set_bin_labels("event/particlehypo", &names)?;
        registry.add_1d("event/trackmultiplicity", "", mult.clone())?;
        registry.add_1d("event/tofmultiplicity", "", mult.clone())?;
        registry.add_1d(
            "event/colltime",
            "",
            Axis::uniform(100, -2000.0, 2000.0, "Collision time (ps)")?,
        )?;
        registry.add_2d(
            "event/colltimereso",
            "",
            mult,
            Axis::uniform(100, 0.0, 1000.0, "#sigma_{Collision time} (ps)")?,
        )?;
        registry.add_2d(
            "event/tofsignal",
            "",
            p.clone(),
            Axis::uniform(10000, 0.0, 2e6, "TOF Signal (ps)")?,
        )?;
        registry.add_2d(
            "event/pexp",
            "",
            p.clone(),
            c.momentum_axis("#it{p}_{Exp. TOF} (GeV/#it{c})")?,
        )?;
        registry.add_1d("event/eta", "", eta.clone())?;
        registry.add_1d("event/phi", "", phi.clone())?;
        registry.add_2d("event/etaphi", "", eta, phi)?;
        registry.add_1d(
            "event/length",
            "",
            Axis::uniform(100, 0.0, 500.0, "Track length (cm)")?,
        )?;
        registry.add_1d("event/pt", "", pt.clone())?;
        registry.add_1d("event/p", "", p.clone())?;

        for histos in &self.hypotheses {
            let label = histos.species.label();
            tracing::info!("Enabled TOF QA for {} {}", histos.species.name(), label);

            registry.add_2d(
                &histos.expected,
                "",
                p.clone(),
                Axis::uniform(1000, 0.0, 2e6, format!("t_{{exp}}({label}) (ps)"))?,
            )?;
            registry.add_2d(
                &histos.expected_diff,
                "",
                p.clone(),
                Axis::uniform(
                    c.n_bins_delta,
                    c.min_delta,
                    c.max_delta,
                    format!("t-t_{{ev}}-t_{{exp}}({label}) (ps)"),
                )?,
            )?;
            registry.add_2d(
                &histos.exp_sigma,
                "",
                p.clone(),
                Axis::uniform(
                    c.n_bins_exp_sigma,
                    c.min_exp_sigma,
                    c.max_exp_sigma,
                    format!("Exp_{{#sigma}}^{{TOF}}({label}) (ps)"),
                )?,
            )?;

            let title = format!("N_{{#sigma}}^{{TOF}}({label})");
            let nsigma = Axis::uniform(c.n_bins_nsigma, c.min_nsigma, c.max_nsigma, title.clone())?;
            registry.add_2d(&histos.nsigma, &title, p.clone(), nsigma.clone())?;
            registry.add_2d(&histos.nsigma_pt, &title, pt.clone(), nsigma.clone())?;
            registry.add_2d(&histos.nsigma_pos_pt, &title, pt.clone(), nsigma.clone())?;
            registry.add_2d(&histos.nsigma_neg_pt, &title, pt.clone(), nsigma)?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        let batch = input.batch;
        for (collision_id, collision) in batch.collisions_with_ids() {
            let tracks: Vec<&Track> = batch.tracks_of(collision_id).collect();
            let event_ok = self.fill_event(collision, &tracks, registry)?;

            // Track bookkeeping covers every collision; the hypotheses only
            // selected ones.
            for track in tracks {
                if !self.fill_track(track, registry)? || !event_ok {
                    continue;
                }
                for histos in &self.hypotheses {
                    self.fill_hypothesis(histos, collision, track, registry)?;
                }
            }
        }
        Ok(())
    }
}
