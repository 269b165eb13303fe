//! TPC identified-particle spectra.
//!
//! Fills momentum and transverse momentum spectra for all tracks passing
//! the vertex and pseudorapidity cuts, and per species for tracks whose TPC
//! n-sigma lies within the configured window.

use super::{AnalysisTask, PassInput};
use crate::histogram::{Axis, HistogramRegistry};
use crate::pid::Species;
use crate::AodError;
use serde::{Deserialize, Serialize};

/// Cuts of the spectra task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectraTpcConfig {
    /// Maximum |n-sigma| for a species hypothesis.
    pub nsigma_cut: f32,
    /// Accepted |z-vertex| range (cm).
    pub cut_vertex: f32,
    /// Accepted |eta| range for tracks.
    pub cut_eta: f32,
}

impl Default for SpectraTpcConfig {
    fn default() -> Self {
        Self {
            nsigma_cut: 3.0,
            cut_vertex: 10.0,
            cut_eta: 0.8,
        }
    }
}

fn p_name(species: Species) -> String {
    format!("p/{}", species.code())
}

fn pt_name(species: Species) -> String {
    format!("pt/{}", species.code())
}

/// Momentum spectra per PID hypothesis, histogram names precomputed.
pub struct SpectraTpcTask {
    config: SpectraTpcConfig,
    p_names: Vec<String>,
    pt_names: Vec<String>,
}

impl SpectraTpcTask {
    #[must_use]
    pub fn new(config: SpectraTpcConfig) -> Self {
        Self {
            config,
            p_names: Species::ALL.iter().map(|&s| p_name(s)).collect(),
            pt_names: Species::ALL.iter().map(|&s| pt_name(s)).collect(),
        }
    }
}

impl AnalysisTask for SpectraTpcTask {
    fn name(&self) -> &'static str {
        "tpcspectra-task-skim-analyser"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let p_axis = Axis::uniform(100, 0.0, 20.0, "#it{p} (GeV/#it{c})")?;
        let pt_axis = Axis::uniform(100, 0.0, 20.0, "#it{p}_{T} (GeV/#it{c})")?;

        registry.add_1d("p/Unselected", "Unselected", p_axis.clone())?;
        registry.add_1d("pt/Unselected", "Unselected", pt_axis.clone())?;
        for (i, species) in Species::ALL.iter().enumerate() {
            registry.add_1d(&self.p_names[i], species.label(), p_axis.clone())?;
            registry.add_1d(&self.pt_names[i], species.label(), pt_axis.clone())?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        for track in &input.batch.tracks {
            let collision = input.collision(track.collision)?;
            if collision.pos_z.abs() >= self.config.cut_vertex {
                continue;
            }
            if track.eta.abs() >= self.config.cut_eta {
                continue;
            }

            registry.fill("p/Unselected", track.p)?;
            registry.fill("pt/Unselected", track.pt)?;

            for (i, species) in Species::ALL.iter().enumerate() {
                if track.nsigma(*species).abs() > self.config.nsigma_cut {
                    continue;
                }
                registry.fill(&self.p_names[i], track.p)?;
                registry.fill(&self.pt_names[i], track.pt)?;
            }
        }
        Ok(())
    }
}
