//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config;
use aodkit_core::cluster_definition::{self, ClusterDefinition};
use aodkit_core::{
    AodError, ClusterEntry, ClusterTable, ClusterTables, EventBatch, Workflow, WorkflowOutput,
    compute_blake3_hash, store_clusters, tables_from_bytes, tables_to_bytes,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a JSON input file (256 MB).
const MAX_JSON_INPUT_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum size of a binary table file (512 MB).
const MAX_TABLE_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AodError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AodError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AodError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AodError> {
    let canonical = path.canonicalize().map_err(|e| {
        AodError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AodError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against an existing parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, AodError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AodError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AodError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AodError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a size-checked input file.
fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>, AodError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated).map_err(|e| AodError::IoError(format!("Read file: {}", e)))
}

fn write_output(path: &Path, data: &[u8]) -> Result<PathBuf, AodError> {
    let validated = validate_output_path(path)?;
    std::fs::write(&validated, data)
        .map_err(|e| AodError::IoError(format!("Write file: {}", e)))?;
    Ok(validated)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<(), AodError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AodError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// DEFINITION COMMANDS
// =============================================================================

fn print_definition(def: &ClusterDefinition) {
    println!(
        "{:<14} {:>3}  {}  v{}  seed {:.2} GeV  cell {:.2} GeV  t [{}, {}] ns  gradient {}",
        def.name,
        def.id,
        def.algorithm,
        def.version,
        def.seed_energy,
        def.min_cell_energy,
        def.time_min,
        def.time_max,
        def.gradient_cut
    );
}

/// List all cluster definitions.
pub fn cmd_definitions(json_mode: bool) -> Result<(), AodError> {
    let all = cluster_definition::all();

    if json_mode {
        return print_json(&all);
    }

    println!("Cluster Definitions");
    println!("===================");
    for def in all {
        print_definition(def);
    }
    Ok(())
}

/// Show one cluster definition.
pub fn cmd_resolve(name: &str, json_mode: bool) -> Result<(), AodError> {
    let def = cluster_definition::resolve(name)?;

    if json_mode {
        return print_json(def);
    }

    print_definition(def);
    if !def.is_implemented() {
        println!("note: algorithm {} is not run by the reconstruction", def.algorithm);
    }
    Ok(())
}

// =============================================================================
// TABLE COMMANDS
// =============================================================================

/// Input of `build-tables`: the reference set sizes and the clusters of one
/// pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDescription {
    pub n_collisions: u32,
    pub n_bcs: u32,
    #[serde(default)]
    pub clusters: Vec<ClusterEntry>,
}

impl PassDescription {
    /// Append every cluster to the table of its reference kind.
    pub fn build(&self) -> Result<ClusterTables, AodError> {
        store_clusters(self.n_collisions, self.n_bcs, &self.clusters)
    }
}

/// Summary of one stored table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub origin: &'static str,
    pub description: &'static str,
    pub reference: &'static str,
    pub reference_bound: u32,
    pub rows: usize,
    pub referenced: usize,
    /// Row count per cluster definition name (or raw id if unknown).
    pub per_definition: BTreeMap<String, usize>,
    pub total_energy: f64,
}

impl TableSummary {
    #[must_use]
    pub fn of(table: &ClusterTable) -> Self {
        let spec = table.spec();
        let mut per_definition = BTreeMap::new();
        let mut total_energy = 0.0;
        for row in table {
            let key = cluster_definition::by_id(row.record.definition)
                .map(|def| def.name.to_string())
                .unwrap_or_else(|| format!("id {}", row.record.definition.0));
            *per_definition.entry(key).or_insert(0) += 1;
            total_energy += f64::from(row.record.energy);
        }
        Self {
            origin: spec.origin,
            description: spec.description,
            reference: spec.kind.name(),
            reference_bound: table.reference_bound(),
            rows: table.len(),
            referenced: table.grouped_by_reference().len(),
            per_definition,
            total_energy,
        }
    }

    fn print(&self) {
        println!("{}/{}", self.origin, self.description);
        println!("  Rows:           {}", self.rows);
        println!(
            "  References:     {} of {} {}",
            self.referenced, self.reference_bound, self.reference
        );
        println!("  Total energy:   {:.3} GeV", self.total_energy);
        for (name, count) in &self.per_definition {
            println!("  {:<15} {}", name, count);
        }
    }
}

/// Build cluster tables from a JSON pass description and persist them.
pub fn cmd_build_tables(input: &Path, output: &Path, json_mode: bool) -> Result<(), AodError> {
    tracing::info!("Building tables from {:?}", input);

    let contents = read_input(input, MAX_JSON_INPUT_FILE_SIZE)?;
    let description: PassDescription = serde_json::from_slice(&contents)
        .map_err(|e| AodError::DeserializationError(format!("Pass description: {}", e)))?;

    let tables = description.build()?;
    let data = tables_to_bytes(&tables)?;
    let written = write_output(output, &data)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "output": written.to_string_lossy(),
            "bytes": data.len(),
            "matched_rows": tables.matched.len(),
            "ambiguous_rows": tables.ambiguous.len(),
        }));
    }

    println!(
        "Wrote {} matched and {} ambiguous clusters ({} bytes) to {:?}",
        tables.matched.len(),
        tables.ambiguous.len(),
        data.len(),
        written
    );
    Ok(())
}

/// Load a table file.
pub fn load_tables(input: &Path) -> Result<ClusterTables, AodError> {
    let data = read_input(input, MAX_TABLE_FILE_SIZE)?;
    tables_from_bytes(&data)
}

/// Summarize a cluster table file.
pub fn cmd_inspect(input: &Path, json_mode: bool) -> Result<(), AodError> {
    let tables = load_tables(input)?;
    let matched = TableSummary::of(&tables.matched);
    let ambiguous = TableSummary::of(&tables.ambiguous);

    if json_mode {
        return print_json(&serde_json::json!({
            "matched": matched,
            "ambiguous": ambiguous,
        }));
    }

    println!("Cluster Tables: {:?}", input);
    println!("==============");
    matched.print();
    ambiguous.print();
    Ok(())
}

// =============================================================================
// WORKFLOW COMMANDS
// =============================================================================

/// Per-task summary of a workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub passes: u64,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task: String,
    pub histograms: usize,
    pub entries: u64,
}

impl RunSummary {
    #[must_use]
    pub fn of(output: &WorkflowOutput) -> Self {
        Self {
            passes: output.passes,
            tasks: output
                .registries
                .iter()
                .map(|registry| TaskSummary {
                    task: registry.name().to_string(),
                    histograms: registry.len(),
                    entries: registry.iter().map(|h| h.entries).sum(),
                })
                .collect(),
        }
    }
}

/// Run the configured workflow over a batch and return its output.
pub fn run_workflow(config_path: Option<&Path>, input: &Path) -> Result<WorkflowOutput, AodError> {
    let config = config::load_config(config_path)?;

    let contents = read_input(input, MAX_JSON_INPUT_FILE_SIZE)?;
    let batch: EventBatch = serde_json::from_slice(&contents)
        .map_err(|e| AodError::DeserializationError(format!("Event batch: {}", e)))?;

    let mut workflow = Workflow::from_config(&config)?;
    workflow.run(&batch)?;
    Ok(workflow.into_output())
}

/// Run the analysis workflow over one event batch.
pub fn cmd_run(
    config_path: Option<&Path>,
    input: &Path,
    output: Option<&Path>,
    json_mode: bool,
) -> Result<(), AodError> {
    let result = run_workflow(config_path, input)?;

    if let Some(output) = output {
        let data = serde_json::to_vec_pretty(&result)
            .map_err(|e| AodError::SerializationError(e.to_string()))?;
        let written = write_output(output, &data)?;
        tracing::info!("Histograms written to {:?}", written);
    }

    let summary = RunSummary::of(&result);
    if json_mode {
        return print_json(&summary);
    }

    println!("Workflow finished after {} pass(es)", summary.passes);
    for task in &summary.tasks {
        println!(
            "  {:<32} {:>4} histograms  {:>10} entries",
            task.task, task.histograms, task.entries
        );
    }
    Ok(())
}

/// Write the default workflow configuration.
pub fn cmd_init_config(output: &Path, force: bool) -> Result<(), AodError> {
    if output.exists() && !force {
        return Err(AodError::IoError(format!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    let text = config::default_config_toml()?;
    let written = write_output(output, text.as_bytes())?;
    println!("Wrote default configuration to {:?}", written);
    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 digest of a file.
pub fn cmd_hash(input: &Path, json_mode: bool) -> Result<(), AodError> {
    let data = read_input(input, MAX_TABLE_FILE_SIZE)?;
    let hash = compute_blake3_hash(&data);

    if json_mode {
        return print_json(&serde_json::json!({
            "algorithm": "BLAKE3",
            "hash": hash,
            "bytes": data.len(),
        }));
    }

    println!("BLAKE3: {}", hash);
    Ok(())
}
