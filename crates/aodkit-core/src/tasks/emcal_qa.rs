//! EMCAL cluster quality assurance.
//!
//! Reads the matched and ambiguous cluster tables, keeps the rows of one
//! cluster definition that pass the energy, time and exoticity selection,
//! and fills shape and multiplicity distributions.

use super::{AnalysisTask, PassInput};
use crate::cluster::ClusterRecord;
use crate::cluster_definition::{self, ClusterDefinition};
use crate::histogram::{Axis, HistogramRegistry};
use crate::AodError;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Cluster selection of the QA task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmcalConfig {
    /// Name of the cluster definition to analyse.
    pub cluster_definition: String,
    /// Minimum cluster energy (GeV).
    pub min_energy: f32,
    /// Maximum |time| (ns); unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_abs: Option<f32>,
    /// Drop clusters flagged as exotic.
    pub reject_exotic: bool,
}

impl Default for EmcalConfig {
    fn default() -> Self {
        Self {
            cluster_definition: "kV3Default".to_string(),
            min_energy: 0.0,
            max_time_abs: None,
            reject_exotic: true,
        }
    }
}

/// Cluster QA for a single definition.
#[derive(Debug)]
pub struct EmcalClusterQaTask {
    config: EmcalConfig,
    definition: &'static ClusterDefinition,
}

impl EmcalClusterQaTask {
    /// Resolve the configured definition. Fails on an unknown name.
    pub fn new(config: EmcalConfig) -> Result<Self, AodError> {
        let definition = cluster_definition::resolve(&config.cluster_definition)?;
        if !definition.is_implemented() {
            tracing::warn!(
                "Cluster definition {} uses algorithm {}, which is not reconstructed; expect empty tables",
                definition.name,
                definition.algorithm
            );
        }
        Ok(Self { config, definition })
    }

    /// The definition the task selects on.
    #[must_use]
    pub fn definition(&self) -> &'static ClusterDefinition {
        self.definition
    }

    fn accepts(&self, record: &ClusterRecord) -> bool {
        if record.energy < self.config.min_energy {
            return false;
        }
        if !self.definition.accepts_time(f64::from(record.time)) {
            return false;
        }
        if let Some(max) = self.config.max_time_abs
            && record.time.abs() > max
        {
            return false;
        }
        !(self.config.reject_exotic && record.is_exotic)
    }
}

impl AnalysisTask for EmcalClusterQaTask {
    fn name(&self) -> &'static str {
        "emcal-cluster-qa"
    }

    fn init(&self, registry: &mut HistogramRegistry) -> Result<(), AodError> {
        let energy = Axis::uniform(200, 0.0, 100.0, "E (GeV)")?;

        registry.add_1d("Clusters/energy", "cluster energy", energy.clone())?;
        registry.add_2d(
            "Clusters/etaPhi",
            "cluster position",
            Axis::uniform(100, -1.0, 1.0, "#eta")?,
            Axis::uniform(100, 0.0, TAU, "#phi (rad)")?,
        )?;
        registry.add_1d(
            "Clusters/m02",
            "shower shape long axis",
            Axis::uniform(400, 0.0, 5.0, "#lambda_{0}^{2}")?,
        )?;
        registry.add_1d(
            "Clusters/nCells",
            "cells per cluster",
            Axis::uniform(50, 0.5, 50.5, "# cells")?,
        )?;
        registry.add_1d(
            "Clusters/time",
            "cluster time",
            Axis::uniform(1500, -600.0, 900.0, "t (ns)")?,
        )?;
        registry.add_1d(
            "Clusters/nlm",
            "local maxima",
            Axis::uniform(10, -0.5, 9.5, "# local maxima")?,
        )?;
        registry.add_1d(
            "Clusters/multiplicity",
            "clusters per collision",
            Axis::uniform(100, -0.5, 99.5, "# clusters")?,
        )?;
        registry.add_1d(
            "Clusters/association",
            "cluster association",
            Axis::uniform(2, 0.5, 2.5, "")?,
        )?;
        registry.set_bin_labels("Clusters/association", &["matched", "ambiguous"])?;
        registry.add_1d(
            "Clusters/ambiguous/energy",
            "ambiguous cluster energy",
            energy,
        )?;
        Ok(())
    }

    fn process(
        &mut self,
        input: &PassInput<'_>,
        registry: &mut HistogramRegistry,
    ) -> Result<(), AodError> {
        let matched = &input.clusters.matched;
        let mut per_collision = vec![0u32; matched.reference_bound() as usize];

        for row in matched.with_definition(self.definition) {
            let record = &row.record;
            if !self.accepts(record) {
                continue;
            }
            registry.fill("Clusters/energy", record.energy)?;
            registry.fill2("Clusters/etaPhi", record.eta, record.phi)?;
            registry.fill("Clusters/m02", record.m02)?;
            registry.fill("Clusters/nCells", record.n_cells)?;
            registry.fill("Clusters/time", record.time)?;
            registry.fill("Clusters/nlm", record.nlm)?;
            registry.fill_label("Clusters/association", "matched")?;
            if let Some(count) = per_collision.get_mut(row.association.index() as usize) {
                *count += 1;
            }
        }
        for count in per_collision {
            registry.fill("Clusters/multiplicity", count)?;
        }

        for row in input.clusters.ambiguous.with_definition(self.definition) {
            if !self.accepts(&row.record) {
                continue;
            }
            registry.fill("Clusters/ambiguous/energy", row.record.energy)?;
            registry.fill_label("Clusters/association", "ambiguous")?;
        }
        Ok(())
    }
}
