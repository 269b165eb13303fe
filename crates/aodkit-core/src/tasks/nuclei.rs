//! # Nuclei Efficiency
//!
//! Three cooperating tasks for the light (anti)nuclei efficiency study on
//! Monte-Carlo input:
//!
//! - [`NucleiVertexTask`]: generated vertex position
//! - [`NucleiGenTask`]: generated primary spectra
//! - [`NucleiRecTask`]: event selection, PID QA and reconstructed spectra
//!
//! The efficiency itself is the ratio of the reconstructed and generated
//! spectra, formed downstream from the two registries.

use super::{pt_axis, AnalysisTask, PassInput, PT_EDGES_NUCLEI};
use crate::histogram::{Axis, HistogramRegistry};
use crate::pid::{
    rapidity, recalibrated_he3_nsigma, Species, PDG_ANTI_HELIUM3, PDG_ANTI_PROTON, PDG_PION,
};
use crate::AodError;
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Cuts shared by the nuclei tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NucleiConfig {
    /// Accepted |z-vertex| range (cm).
    pub cut_vertex: f32,
    /// Accepted |eta| range for tracks.
    pub cut_eta: f32,
    /// Lower edge of the n-sigma window (exclusive).
    pub nsigma_cut_low: f32,
    /// Upper edge of the n-sigma window (exclusive).
    pub nsigma_cut_high: f32,
    /// Accepted |y| range.
    pub rapidity_cut: f32,
}

impl Default for NucleiConfig {
    fn default() -> Self {
        Self {
            cut_vertex: 10.0,
            cut_eta: 0.8,
            nsigma_cut_low: -20.0,
            nsigma_cut_high: 20.0,
            rapidity_cut: 0.5,
        }
    }
}

impl NucleiConfig {
    fn in_nsigma_window(&self, nsigma: f32) -> bool {
        nsigma > self.nsigma_cut_low && nsigma < self.nsigma_cut_high
    }

    fn in_rapidity_window(&self, y: f64) -> bool {
        y.abs() < f64::from(self.rapidity_cut)
    }
}

fn nuclei_pt_axis() -> Result<Axis, AodError> {
    pt_axis(&PT_EDGES_NUCLEI, "#it{p}_{T} (GeV/#it{c})")
}

// =============================================================================
// GENERATED VERTEX
// =============================================================================

/// Fills the generated z-vertex distribution.
#[derive(Debug, Default)]
pub struct NucleiVertexTask;

impl AnalysisTask for NucleiVertexTask {
    fn name(&self) -> &'static str {
        "nuclei-efficiency-vtx"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        registry.add_1d(
            "histVertexTrueZ",
            "MC true z position of z-vertex",
            Axis::uniform(200, -20.0, 20.0, "vertex z (cm)")?,
        )
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        for mc_collision in &input.batch.mc_collisions {
            registry.fill("histVertexTrueZ", mc_collision.pos_z)?;
        }
        Ok(())
    }
}

// =============================================================================
// GENERATED SPECTRA
// =============================================================================

/// Fills generated transverse momentum spectra of physical primaries.
#[derive(Debug, Default)]
pub struct NucleiGenTask {
    config: NucleiConfig,
}

impl NucleiGenTask {
    #[must_use]
    pub fn new(config: NucleiConfig) -> Self {
        Self { config }
    }
}

impl AnalysisTask for NucleiGenTask {
    fn name(&self) -> &'static str {
        "nuclei-efficiency-gen"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let axis = nuclei_pt_axis()?;
        registry.add_1d("histGenPtPion", "generated particles", axis.clone())?;
        registry.add_1d("histGenPtProton", "generated particles", axis.clone())?;
        registry.add_1d("histGenPtHe3", "generated particles", axis)?;
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        for particle in &input.batch.mc_particles {
            if !particle.is_physical_primary {
                continue;
            }
            if !self.config.in_rapidity_window(f64::from(particle.y)) {
                continue;
            }
            let name = match particle.pdg_code {
                PDG_PION => "histGenPtPion",
                PDG_ANTI_PROTON => "histGenPtProton",
                PDG_ANTI_HELIUM3 => "histGenPtHe3",
                _ => continue,
            };
            registry.fill(name, particle.pt)?;
        }
        Ok(())
    }
}

// =============================================================================
// RECONSTRUCTED SPECTRA
// =============================================================================

/// Event selection, PID QA and reconstructed spectra with perfect PID.
#[derive(Debug, Default)]
pub struct NucleiRecTask {
    config: NucleiConfig,
    tof_histos: bool,
}

impl NucleiRecTask {
    #[must_use]
    pub fn new(config: NucleiConfig, tof_histos: bool) -> Self {
        Self { config, tof_histos }
    }
}

impl AnalysisTask for NucleiRecTask {
    fn name(&self) -> &'static str {
        "nuclei-efficiency-rec"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let pt = nuclei_pt_axis()?;
        let signed_p = Axis::uniform(600, -6.0, 6.0, "#it{p}/Z (GeV/#it{c})")?;
        let nsigma = Axis::uniform(200, -100.0, 100.0, "n#sigma_{TPC}")?;

        registry.add_1d(
            "histEvSel",
            "Event selection",
            Axis::uniform(10, -0.5, 9.5, "")?,
        )?;
        registry.set_bin_labels("histEvSel", &["all", "sel8"])?;
        registry.add_1d(
            "histRecVtxZ",
            "collision z position",
            Axis::uniform(200, -20.0, 20.0, "z position (cm)")?,
        )?;
        registry.add_1d("histRecPtPion", "reconstructed particles", pt.clone())?;
        registry.add_1d("histRecPtProton", "reconstructed particles", pt.clone())?;
        registry.add_1d("histRecPtHe3", "reconstructed particles", pt.clone())?;
        registry.add_2d(
            "histTpcSignal",
            "TPC signal vs rigidity",
            signed_p.clone(),
            Axis::uniform(1400, 0.0, 1400.0, "d#it{E}/d#it{x} (a.u.)")?,
        )?;
        if self.tof_histos {
            registry.add_2d(
                "histTofSignalData",
                "TOF signal",
                signed_p,
                Axis::uniform(500, 0.0, 1.2, "#beta (TOF)")?,
            )?;
        }
        registry.add_2d("histTpcNsigmaHe3", "n-sigma TPC", pt.clone(), nsigma.clone())?;
        registry.add_2d("histTpcNsigmaPr", "n-sigma TPC", pt.clone(), nsigma.clone())?;
        registry.add_2d("histTpcNsigmaPi", "n-sigma TPC", pt, nsigma)?;
        registry.add_1d(
            "histItsClusters",
            "number of ITS clusters",
            Axis::uniform(10, -0.5, 9.5, "number of ITS clusters")?,
        )?;
        let dca = Axis::uniform(200, -1.0, 1.0, "dca XY (cm)")?;
        registry.add_1d("histDcaXYprimary", "DCA xy of primaries", dca.clone())?;
        registry.add_1d("histDcaXYsecondary", "DCA xy of secondaries", dca)?;
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        let batch = input.batch;
        for (collision_id, collision) in batch.collisions_with_ids() {
            if collision.pos_z.abs() >= self.config.cut_vertex {
                continue;
            }
            registry.fill_label("histEvSel", "all")?;
            if !collision.sel8 {
                continue;
            }
            registry.fill_label("histEvSel", "sel8")?;
            registry.fill("histRecVtxZ", collision.pos_z)?;

            for track in batch.tracks_of(collision_id) {
                if track.eta.abs() >= self.config.cut_eta || track.its_n_cls == 0 {
                    continue;
                }

                let nsigma_he3 =
                    recalibrated_he3_nsigma(track.nsigma(Species::He), track.tpc_inner_param);
                let nsigma_pr = track.nsigma(Species::Pr);
                let nsigma_pi = track.nsigma(Species::Pi);
                let rigidity = track.tpc_inner_param * f32::from(track.sign);

                registry.fill2("histTpcSignal", rigidity, track.tpc_signal)?;
                registry.fill2("histTpcNsigmaHe3", track.tpc_inner_param, nsigma_he3)?;
                registry.fill2("histTpcNsigmaPr", track.tpc_inner_param, nsigma_pr)?;
                registry.fill2("histTpcNsigmaPi", track.tpc_inner_param, nsigma_pi)?;
                registry.fill("histItsClusters", track.its_n_cls)?;
                if self.tof_histos
                    && let Some(beta) = track.tof_beta()
                {
                    registry.fill2("histTofSignalData", rigidity, beta)?;
                }

                let Some(particle) = batch.mc_particle_of(track) else {
                    continue;
                };
                if particle.is_physical_primary {
                    registry.fill("histDcaXYprimary", track.dca_xy)?;
                } else {
                    registry.fill("histDcaXYsecondary", track.dca_xy)?;
                }

                let pt = f64::from(track.pt);
                let eta = f64::from(track.eta);

                if self.config.in_nsigma_window(nsigma_pi)
                    && particle.pdg_code == PDG_PION
                    && particle.is_physical_primary
                    && self
                        .config
                        .in_rapidity_window(rapidity(pt, eta, Species::Pi.mass()))
                {
                    registry.fill("histRecPtPion", pt)?;
                }
                if self.config.in_nsigma_window(nsigma_pr)
                    && particle.pdg_code == PDG_ANTI_PROTON
                    && particle.is_physical_primary
                    && self
                        .config
                        .in_rapidity_window(rapidity(pt, eta, Species::Pr.mass()))
                {
                    registry.fill("histRecPtProton", pt)?;
                }
                // He3 tracks are reconstructed with unit charge.
                let pt_he3 = pt * 2.0;
                if self.config.in_nsigma_window(nsigma_he3)
                    && particle.pdg_code == PDG_ANTI_HELIUM3
                    && self
                        .config
                        .in_rapidity_window(rapidity(pt_he3, eta, Species::He.mass()))
                {
                    registry.fill("histRecPtHe3", pt_he3)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
