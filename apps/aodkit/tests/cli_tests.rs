//! Integration tests for the CLI commands and configuration files.

#![allow(clippy::unwrap_used, clippy::panic)]

use aodkit::cli::{
    PassDescription, RunSummary, TableSummary, cmd_build_tables, cmd_hash, cmd_init_config,
    cmd_inspect, cmd_resolve, load_tables, print_json, run_workflow,
};
use aodkit::config;
use aodkit_core::AodError;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

const PASS_JSON: &str = r#"{
    "n_collisions": 2,
    "n_bcs": 4,
    "clusters": [
        {"collision": 1, "id": 1, "energy": 1.25, "core_energy": 1.0, "eta": 0.3, "phi": 1.1,
         "m02": 0.25, "m20": 0.1, "n_cells": 9, "time": 2.0, "is_exotic": false,
         "distance_to_bad_channel": 4.0, "nlm": 1, "definition": 10},
        {"bc": 3, "id": 2, "energy": 0.8, "core_energy": 0.7, "eta": -0.1, "phi": 2.0,
         "m02": 0.3, "m20": 0.1, "n_cells": 3, "time": -1.0, "is_exotic": false,
         "distance_to_bad_channel": 2.0, "nlm": 1, "definition": 11}
    ]
}"#;

const BATCH_JSON: &str = r#"{
    "collisions": [{"pos_z": 1.5, "sel8": true}],
    "bcs": [{}],
    "tracks": [{"collision": 0, "p": 1.1, "pt": 0.9, "eta": 0.2, "has_its": true,
                "has_tpc": true, "its_n_cls": 7}],
    "clusters": [
        {"collision": 0, "id": 1, "energy": 3.0, "core_energy": 2.5, "eta": 0.1, "phi": 1.0,
         "m02": 0.3, "m20": 0.1, "n_cells": 5, "time": 0.5, "is_exotic": false,
         "distance_to_bad_channel": 3.0, "nlm": 1, "definition": 10}
    ]
}"#;

// =============================================================================
// TABLE FILES
// =============================================================================

#[test]
fn build_then_inspect_tables() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pass.json");
    let output = dir.path().join("tables.bin");
    fs::write(&input, PASS_JSON).unwrap();

    cmd_build_tables(&input, &output, true).unwrap();
    cmd_inspect(&output, true).unwrap();

    let tables = load_tables(&output).unwrap();
    let matched = TableSummary::of(&tables.matched);
    assert_eq!(matched.description, "EMCALCLUSTERS");
    assert_eq!(matched.rows, 1);
    assert_eq!(matched.per_definition.get("kV3Default"), Some(&1));

    let ambiguous = TableSummary::of(&tables.ambiguous);
    assert_eq!(ambiguous.description, "EMCALAMBCLUS");
    assert_eq!(ambiguous.reference, "bc");
    assert_eq!(ambiguous.per_definition.get("kV3Variation1"), Some(&1));
}

#[test]
fn pass_with_dangling_reference_is_rejected() {
    let description: PassDescription = serde_json::from_str(PASS_JSON).unwrap();
    let shrunk = PassDescription {
        n_collisions: 1,
        ..description
    };
    assert!(matches!(
        shrunk.build(),
        Err(AodError::DanglingReference { .. })
    ));
}

#[test]
fn pass_description_matches_event_batch_tables() {
    let description: PassDescription = serde_json::from_str(PASS_JSON).unwrap();
    let from_description = description.build().unwrap();

    let batch = aodkit_core::EventBatch {
        collisions: vec![aodkit_core::Collision::default(); 2],
        bcs: vec![aodkit_core::BunchCrossing::default(); 4],
        clusters: description.clusters.clone(),
        ..aodkit_core::EventBatch::default()
    };
    let from_batch = batch.cluster_tables().unwrap();

    assert_eq!(
        from_description.matched.iter().collect::<Vec<_>>(),
        from_batch.matched.iter().collect::<Vec<_>>()
    );
    assert_eq!(
        from_description.ambiguous.iter().collect::<Vec<_>>(),
        from_batch.ambiguous.iter().collect::<Vec<_>>()
    );
}

#[test]
fn corrupted_table_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.bin");
    fs::write(&path, b"AODK\x01garbage").unwrap();
    assert!(load_tables(&path).is_err());
}

#[test]
fn hash_requires_existing_file() {
    let dir = TempDir::new().unwrap();
    assert!(cmd_hash(&dir.path().join("missing.bin"), false).is_err());

    let path = dir.path().join("data.bin");
    fs::write(&path, b"abc").unwrap();
    cmd_hash(&path, true).unwrap();
}

// =============================================================================
// DEFINITIONS
// =============================================================================

#[test]
fn resolve_command_fails_on_unknown_name() {
    cmd_resolve("kV3Default", true).unwrap();
    assert!(matches!(
        cmd_resolve("kV7Default", false),
        Err(AodError::UnknownClusterDefinition(_))
    ));
}

// =============================================================================
// CONFIGURATION AND WORKFLOW
// =============================================================================

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("workflow.toml");

    cmd_init_config(&path, false).unwrap();
    assert!(cmd_init_config(&path, false).is_err());
    cmd_init_config(&path, true).unwrap();

    let loaded = config::load_config(Some(path.as_path())).unwrap();
    assert_eq!(loaded, aodkit_core::WorkflowConfig::default());
}

#[test]
fn run_workflow_with_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("workflow.toml");
    let batch_path = dir.path().join("batch.json");
    fs::write(
        &config_path,
        "[workflow]\nadd_vertex = false\nadd_gen = false\n\n[emcal]\nmin_energy = 1.0\n",
    )
    .unwrap();
    fs::write(&batch_path, BATCH_JSON).unwrap();

    let output = run_workflow(Some(config_path.as_path()), &batch_path).unwrap();
    let summary = RunSummary::of(&output);
    let tasks: Vec<&str> = summary.tasks.iter().map(|t| t.task.as_str()).collect();
    assert_eq!(
        tasks,
        vec![
            "tpcspectra-task-skim-analyser",
            "nuclei-efficiency-rec",
            "qa-event-track-lite",
            "emcal-cluster-qa",
        ]
    );

    let emcal = output.registry("emcal-cluster-qa").unwrap();
    assert_eq!(emcal.get("Clusters/energy").unwrap().entries, 1);
}

#[test]
fn invalid_config_stops_run() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("workflow.toml");
    let batch_path = dir.path().join("batch.json");
    fs::write(&config_path, "[emcal]\ncluster_definition = \"nope\"\n").unwrap();
    fs::write(&batch_path, BATCH_JSON).unwrap();

    assert!(matches!(
        run_workflow(Some(config_path.as_path()), &batch_path),
        Err(AodError::UnknownClusterDefinition(_))
    ));
}

#[test]
fn histogram_output_is_json() {
    let dir = TempDir::new().unwrap();
    let batch_path = dir.path().join("batch.json");
    let out_path = dir.path().join("histos.json");
    fs::write(&batch_path, BATCH_JSON).unwrap();

    aodkit::cli::cmd_run(None, &batch_path, Some(out_path.as_path()), true).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&fs::read(&out_path).unwrap()).unwrap();
    assert_eq!(value["passes"], 1);
    assert_eq!(value["registries"].as_array().unwrap().len(), 6);
}

#[test]
fn json_output_reports_serialization_failure() {
    // JSON object keys must be strings.
    let mut map = BTreeMap::new();
    map.insert((1u8, 2u8), "pair");
    assert!(matches!(
        print_json(&map),
        Err(AodError::SerializationError(_))
    ));
    print_json(&serde_json::json!({"ok": true})).unwrap();
}
