use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use dubscript::{
    core::store::{RawRecord, ScriptStore},
    row::RowPatch,
    timecode::Timecode,
};

fn record(i: u64) -> RawRecord {
    RawRecord {
        scene: None,
        in_time: Timecode::from_millis(i * 2_000).to_string(),
        out_time: Timecode::from_millis(i * 2_000 + 1_500).to_string(),
        character: if i % 2 == 0 {
            "ANA".to_string()
        } else {
            "JUAN".to_string()
        },
        dialogue: format!("Una palabra mas en la linea {i}."),
    }
}

fn seeded(rows: u64) -> ScriptStore {
    let records = (0..rows).map(record).collect();
    ScriptStore::from_records(records).expect("load")
}

fn bench_bulk_load(c: &mut Criterion) {
    c.bench_function("load_records_10k", |b| {
        b.iter(|| {
            let records: Vec<RawRecord> = (0..10_000).map(record).collect();
            let _ = ScriptStore::from_records(records).expect("load");
        });
    });
}

fn bench_edit_stream(c: &mut Criterion) {
    c.bench_function("edit_row_5k", |b| {
        b.iter(|| {
            let mut store = seeded(5_000);
            for i in 0..5_000u64 {
                store
                    .edit_row(i, RowPatch::dialogue(format!("Texto revisado {i}.")))
                    .expect("edit");
            }
        });
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    c.bench_function("undo_redo_1k", |b| {
        b.iter(|| {
            let mut store = seeded(1_000);
            for i in 0..1_000u64 {
                store
                    .edit_row(i, RowPatch::dialogue(format!("Edicion {i}.")))
                    .expect("edit");
            }
            while store.undo().is_ok() {}
            while store.redo().is_ok() {}
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for n in [100u64, 1_000u64, 10_000u64] {
        let store = seeded(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &store, |b, store| {
            b.iter(|| {
                let _ = store.search("palabra");
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bulk_load,
    bench_edit_stream,
    bench_undo_redo,
    bench_search
);
criterion_main!(benches);
