//! # Workflow
//!
//! Assembles the enabled analysis tasks from a [`WorkflowConfig`], owns one
//! histogram registry per task and drives them over processing passes.
//!
//! ## Lifecycle
//!
//! 1. `Workflow::from_config` validates the configuration, builds the tasks
//!    and lets each define its histograms, then freezes the registries.
//! 2. `run` is called once per pass. The batch is validated and its
//!    clusters are stored before any task sees it.
//! 3. `into_output` hands back the filled registries.
//!
//! Configuration errors stop the workflow before the first pass.

use crate::event::EventBatch;
use crate::histogram::HistogramRegistry;
use crate::table::ClusterTables;
use crate::tasks::{
    AnalysisTask, EmcalClusterQaTask, EmcalConfig, EventQaConfig, EventQaTask,
    EventTrackQaConfig, EventTrackQaTask, NucleiConfig, NucleiGenTask, NucleiRecTask,
    NucleiVertexTask, PassInput, SpectraTpcConfig, SpectraTpcTask, TofPidQaConfig,
    TofPidQaTask,
};
use crate::{AodError, cluster_definition};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Which tasks run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskToggles {
    /// Generated vertex task.
    pub add_vertex: bool,
    /// Generated spectra task.
    pub add_gen: bool,
    /// Reconstructed spectra task.
    pub add_rec: bool,
    /// TOF beta histograms in the reconstructed spectra task.
    pub add_tof_histos: bool,
    pub spectra_tpc: bool,
    pub event_track_qa: bool,
    /// Full event QA.
    pub event_qa: bool,
    pub tof_pid_qa: bool,
    pub emcal_qa: bool,
}

impl Default for TaskToggles {
    fn default() -> Self {
        Self {
            add_vertex: true,
            add_gen: true,
            add_rec: true,
            add_tof_histos: false,
            spectra_tpc: true,
            event_track_qa: true,
            event_qa: false,
            tof_pid_qa: false,
            emcal_qa: true,
        }
    }
}

/// Complete workflow configuration. Every field has a default, so an empty
/// document is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub workflow: TaskToggles,
    pub spectra_tpc: SpectraTpcConfig,
    pub nuclei: NucleiConfig,
    pub event_track_qa: EventTrackQaConfig,
    pub event_qa: EventQaConfig,
    pub tof_pid_qa: TofPidQaConfig,
    pub emcal: EmcalConfig,
}

impl WorkflowConfig {
    /// Check value ranges and resolve the cluster definition name.
    pub fn validate(&self) -> Result<(), AodError> {
        if self.spectra_tpc.cut_vertex <= 0.0 {
            return Err(AodError::InvalidConfig(
                "spectra_tpc.cut_vertex must be positive".to_string(),
            ));
        }
        if self.spectra_tpc.nsigma_cut <= 0.0 {
            return Err(AodError::InvalidConfig(
                "spectra_tpc.nsigma_cut must be positive".to_string(),
            ));
        }
        if self.nuclei.cut_vertex <= 0.0 {
            return Err(AodError::InvalidConfig(
                "nuclei.cut_vertex must be positive".to_string(),
            ));
        }
        if self.nuclei.nsigma_cut_low >= self.nuclei.nsigma_cut_high {
            return Err(AodError::InvalidConfig(format!(
                "nuclei.nsigma_cut_low ({}) must be below nsigma_cut_high ({})",
                self.nuclei.nsigma_cut_low, self.nuclei.nsigma_cut_high
            )));
        }
        self.event_track_qa.validate()?;
        self.event_qa.validate()?;
        self.tof_pid_qa.validate()?;
        if let Some(max) = self.emcal.max_time_abs
            && max < 0.0
        {
            return Err(AodError::InvalidConfig(
                "emcal.max_time_abs must not be negative".to_string(),
            ));
        }
        cluster_definition::resolve(&self.emcal.cluster_definition)?;
        Ok(())
    }
}

// =============================================================================
// WORKFLOW
// =============================================================================

struct TaskSlot {
    task: Box<dyn AnalysisTask>,
    registry: HistogramRegistry,
}

/// The enabled tasks and their registries.
pub struct Workflow {
    slots: Vec<TaskSlot>,
    passes: u64,
}

impl Workflow {
    /// Build and initialize every enabled task.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, AodError> {
        config.validate()?;

        let toggles = &config.workflow;
        let mut tasks: Vec<Box<dyn AnalysisTask>> = Vec::new();
        if toggles.spectra_tpc {
            tasks.push(Box::new(SpectraTpcTask::new(config.spectra_tpc.clone())));
        }
        if toggles.add_vertex {
            tasks.push(Box::new(NucleiVertexTask));
        }
        if toggles.add_gen {
            tasks.push(Box::new(NucleiGenTask::new(config.nuclei.clone())));
        }
        if toggles.add_rec {
            tasks.push(Box::new(NucleiRecTask::new(
                config.nuclei.clone(),
                toggles.add_tof_histos,
            )));
        }
        if toggles.event_track_qa {
            tasks.push(Box::new(EventTrackQaTask::new(config.event_track_qa.clone())));
        }
        if toggles.event_qa {
            tasks.push(Box::new(EventQaTask::new(config.event_qa.clone())));
        }
        if toggles.tof_pid_qa {
            tasks.push(Box::new(TofPidQaTask::new(config.tof_pid_qa.clone())));
        }
        if toggles.emcal_qa {
            tasks.push(Box::new(EmcalClusterQaTask::new(config.emcal.clone())?));
        }

        let mut slots = Vec::with_capacity(tasks.len());
        for task in tasks {
            let mut registry = HistogramRegistry::new(task.name());
            task.init(&mut registry)?;
            registry.freeze();
            tracing::debug!(
                "Task {} defined {} histograms",
                task.name(),
                registry.len()
            );
            slots.push(TaskSlot { task, registry });
        }
        tracing::info!("Workflow initialized with {} tasks", slots.len());

        Ok(Self { slots, passes: 0 })
    }

    /// Names of the enabled tasks, in execution order.
    pub fn task_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|slot| slot.task.name())
    }

    /// Number of passes processed so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Process one batch. The batch's clusters are stored first.
    pub fn run(&mut self, batch: &EventBatch) -> Result<(), AodError> {
        batch.validate()?;
        let clusters = batch.cluster_tables()?;
        self.run_with_tables(batch, &clusters)
    }

    /// Process one batch against already-built cluster tables.
    pub fn run_with_tables(
        &mut self,
        batch: &EventBatch,
        clusters: &ClusterTables,
    ) -> Result<(), AodError> {
        let input = PassInput { batch, clusters };
        for slot in &mut self.slots {
            slot.task.process(&input, &mut slot.registry)?;
        }
        self.passes = self.passes.saturating_add(1);
        tracing::info!(
            "Pass {} done: {} collisions, {} tracks, {} clusters ({} matched, {} ambiguous)",
            self.passes,
            batch.collisions.len(),
            batch.tracks.len(),
            clusters.total_rows(),
            clusters.matched.len(),
            clusters.ambiguous.len()
        );
        Ok(())
    }

    /// The registry of a task, by task name.
    #[must_use]
    pub fn registry(&self, task: &str) -> Option<&HistogramRegistry> {
        self.slots
            .iter()
            .find(|slot| slot.task.name() == task)
            .map(|slot| &slot.registry)
    }

    /// Finish and hand back the registries.
    #[must_use]
    pub fn into_output(self) -> WorkflowOutput {
        WorkflowOutput {
            passes: self.passes,
            registries: self.slots.into_iter().map(|slot| slot.registry).collect(),
        }
    }
}

/// Filled histograms of a finished workflow.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutput {
    pub passes: u64,
    pub registries: Vec<HistogramRegistry>,
}

impl WorkflowOutput {
    /// The registry of a task, by task name.
    #[must_use]
    pub fn registry(&self, task: &str) -> Option<&HistogramRegistry> {
        self.registries.iter().find(|r| r.name() == task)
    }
}

// =============================================================================
// TESTS
// =============================================================================
