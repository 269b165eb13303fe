//! # Analysis Tasks
//!
//! Per-pass consumers of the input streams and cluster tables. Each task
//! defines its histograms once in [`AnalysisTask::init`] and then fills them
//! from every processing pass it is handed.
//!
//! Tasks never mutate their input; the only state they write is their own
//! histogram registry.

pub mod emcal_qa;
pub mod event_qa;
pub mod event_track_qa;
pub mod nuclei;
pub mod spectra_tpc;
pub mod tof_pid_qa;

pub use emcal_qa::{EmcalClusterQaTask, EmcalConfig};
pub use event_qa::{EventQaConfig, EventQaTask};
pub use event_track_qa::{EventTrackQaConfig, EventTrackQaTask};
pub use nuclei::{NucleiConfig, NucleiGenTask, NucleiRecTask, NucleiVertexTask};
pub use spectra_tpc::{SpectraTpcConfig, SpectraTpcTask};
pub use tof_pid_qa::{TofPidQaConfig, TofPidQaTask};

use crate::event::{Collision, EventBatch};
use crate::histogram::{Axis, HistogramRegistry};
use crate::table::ClusterTables;
use crate::AodError;

/// Everything a task can read during one processing pass.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    pub batch: &'a EventBatch,
    pub clusters: &'a ClusterTables,
}

impl PassInput<'_> {
    /// The collision a track points to.
    pub fn collision(&self, index: crate::CollisionId) -> Result<&Collision, AodError> {
        self.batch
            .collisions
            .get(index.0 as usize)
            .ok_or_else(|| AodError::InvalidInput(format!("no collision {}", index.0)))
    }
}

/// A histogramming analysis step.
pub trait AnalysisTask {
    /// Workflow-unique task name; also names the task's registry.
    fn name(&self) -> &'static str;

    /// Define the task's histograms.
    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError>;

    /// Fill histograms from one processing pass.
    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError>;
}

/// Transverse momentum binning of the event and track QA tasks.
pub(crate) const PT_EDGES_QA: [f64; 21] = [
    0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 2.0, 5.0, 10.0,
    20.0, 50.0,
];

/// Transverse momentum binning of the nuclei efficiency tasks.
pub(crate) const PT_EDGES_NUCLEI: [f64; 27] = [
    0.0, 0.05, 0.1, 0.15, 0.2, 0.3, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.2, 2.4, 2.8,
    3.2, 3.6, 4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 14.0,
];

pub(crate) fn pt_axis(edges: &[f64], label: &str) -> Result<Axis, AodError> {
    Axis::variable(edges.to_vec(), label)
}
