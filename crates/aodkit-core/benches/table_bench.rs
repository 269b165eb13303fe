//! # Table Benchmarks
//!
//! Performance benchmarks for cluster table construction, grouping,
//! persistence and a full workflow pass.
//!
//! Run with: `cargo bench -p aodkit-core`

use aodkit_core::{
    ClusterEntry, ClusterPass, ClusterRecord, ClusterTables, Collision, CollisionId, DefinitionId,
    EventBatch, Track, Workflow, WorkflowConfig, tables_from_bytes, tables_to_bytes,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const N_COLLISIONS: u32 = 100;

fn record(i: usize) -> ClusterRecord {
    ClusterRecord {
        id: i as i32,
        energy: 0.5 + (i % 50) as f32 * 0.2,
        core_energy: 0.4,
        eta: -0.6 + (i % 12) as f32 * 0.1,
        phi: (i % 60) as f32 * 0.1,
        m02: 0.3,
        m20: 0.1,
        n_cells: (i % 20) as i32 + 1,
        time: (i % 40) as f32 - 20.0,
        is_exotic: i % 97 == 0,
        distance_to_bad_channel: 2.0,
        nlm: 1,
        definition: DefinitionId(if i % 3 == 0 { 11 } else { 10 }),
    }
}

/// Build tables with `size` matched clusters spread over the collisions.
fn create_tables(size: usize) -> ClusterTables {
    let mut pass = ClusterPass::new(N_COLLISIONS, 0);
    for i in 0..size {
        pass.append_matched(CollisionId(i as u32 % N_COLLISIONS), record(i))
            .expect("append");
    }
    pass.finish()
}

fn create_batch(n_tracks: usize, n_clusters: usize) -> EventBatch {
    EventBatch {
        collisions: (0..N_COLLISIONS)
            .map(|i| Collision {
                pos_z: (i % 20) as f32 - 10.0,
                sel8: i % 5 != 0,
                ..Collision::default()
            })
            .collect(),
        tracks: (0..n_tracks)
            .map(|i| Track {
                collision: CollisionId(i as u32 % N_COLLISIONS),
                p: 0.2 + (i % 30) as f32 * 0.1,
                pt: 0.1 + (i % 30) as f32 * 0.1,
                eta: -0.9 + (i % 18) as f32 * 0.1,
                has_its: true,
                has_tpc: true,
                its_n_cls: (i % 8) as u8,
                ..Track::default()
            })
            .collect(),
        clusters: (0..n_clusters)
            .map(|i| ClusterEntry {
                collision: Some(i as u32 % N_COLLISIONS),
                bc: None,
                record: record(i),
            })
            .collect(),
        ..EventBatch::default()
    }
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_append");

    for size in [1000, 10000, 100000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_tables(size)));
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by_collision");

    for size in [1000, 10000, 100000].iter() {
        let tables = create_tables(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tables, |b, tables| {
            b.iter(|| black_box(tables.matched.grouped_by_reference().len()));
        });
    }

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [1000, 10000].iter() {
        let tables = create_tables(*size);
        let bytes = tables_to_bytes(&tables).expect("encode");

        group.bench_with_input(BenchmarkId::new("encode", size), &tables, |b, tables| {
            b.iter(|| black_box(tables_to_bytes(tables).expect("encode")));
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
            b.iter(|| black_box(tables_from_bytes(bytes).expect("decode")));
        });
    }

    group.finish();
}

fn bench_workflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("workflow_pass");
    group.sample_size(20);

    for n_tracks in [1000, 10000].iter() {
        let batch = create_batch(*n_tracks, *n_tracks / 10);
        group.bench_with_input(BenchmarkId::from_parameter(n_tracks), &batch, |b, batch| {
            b.iter(|| {
                let mut workflow =
                    Workflow::from_config(&WorkflowConfig::default()).expect("workflow");
                workflow.run(batch).expect("run");
                black_box(workflow.passes())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_grouping,
    bench_persistence,
    bench_workflow
);
criterion_main!(benches);
