//! Criterion benchmarks for medcorpus-core.
//!
//! ## Benchmark groups
//!
//! 1. **schema**: DDL init overhead.
//! 2. **synth**: Description cleaning and template expansion.
//! 3. **hop_queries**: The three path patterns against a populated graph.
//! 4. **generate**: A small end-to-end run into a temp directory.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/medcorpus-core/Cargo.toml
//! # Run only the synth group:
//! cargo bench --manifest-path crates/medcorpus-core/Cargo.toml -- synth
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusqlite::Connection;

use medcorpus_core::models::{
    fields, EdgeRecord, HopClass, NodeLabel, NodeRecord, PathRecord, Relationship,
};
use medcorpus_core::query::paths::run_hop_query;
use medcorpus_core::sampler::generate;
use medcorpus_core::store::database::{init_schema, insert_edges, insert_nodes, GraphStore};
use medcorpus_core::store::schema::SCHEMA_STATEMENTS;
use medcorpus_core::synth::{clean, expand};
use medcorpus_core::GeneratorConfig;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `n` diseases, each with `fanout` drugs and symptoms, one group, one
/// chapter and one sub-disease.
fn graph_fixture(n: usize, fanout: usize) -> (Vec<NodeRecord>, Vec<EdgeRecord>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for i in 0..n {
        let d = format!("D{i}");
        let sub = format!("D{i}.1");
        let g = format!("G{i}");
        let c = format!("C{}", i % 22);
        nodes.push(
            NodeRecord::new(NodeLabel::Disease, &d, &format!("Bệnh {i}"))
                .with_description("Bệnh lý mạn tính của hệ tuần hoàn. Thường gặp."),
        );
        nodes.push(
            NodeRecord::new(NodeLabel::Disease, &sub, &format!("Thể bệnh {i}"))
                .with_description("Thể khởi phát muộn ở người cao tuổi"),
        );
        nodes.push(
            NodeRecord::new(NodeLabel::Group, &g, &format!("Nhóm {i}"))
                .with_description("Bệnh tim do thiếu máu cục bộ"),
        );
        nodes.push(
            NodeRecord::new(NodeLabel::Chapter, &c, &format!("Chương {}", i % 22))
                .with_description("Bệnh của hệ tuần hoàn"),
        );
        edges.push(EdgeRecord::new(NodeLabel::Disease, &sub, Relationship::IsA, NodeLabel::Disease, &d));
        edges.push(EdgeRecord::new(NodeLabel::Disease, &d, Relationship::BelongsTo, NodeLabel::Group, &g));
        edges.push(EdgeRecord::new(NodeLabel::Group, &g, Relationship::BelongsTo, NodeLabel::Chapter, &c));
        for k in 0..fanout {
            let dr = format!("DR{i}.{k}");
            let s = format!("S{i}.{k}");
            nodes.push(
                NodeRecord::new(NodeLabel::Drug, &dr, &format!("Thuốc {i}.{k}"))
                    .with_description("Thuốc chẹn beta chọn lọc dùng đường uống"),
            );
            nodes.push(NodeRecord::new(NodeLabel::Symptom, &s, &format!("triệu chứng {i}.{k}")));
            edges.push(EdgeRecord::new(NodeLabel::Drug, &dr, Relationship::Treats, NodeLabel::Disease, &d));
            edges.push(EdgeRecord::new(NodeLabel::Disease, &d, Relationship::HasSymptom, NodeLabel::Symptom, &s));
        }
    }
    (nodes, edges)
}

fn setup_db(n: usize, fanout: usize) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let (nodes, edges) = graph_fixture(n, fanout);
    insert_nodes(&conn, &nodes).unwrap();
    insert_edges(&conn, &edges).unwrap();
    conn
}

fn rich_record() -> PathRecord {
    PathRecord::new()
        .with(fields::DISEASE, Some("Tăng huyết áp"))
        .with(
            fields::DISEASE_DESC,
            Some("• Tình trạng áp lực máu lên thành động mạch tăng cao kéo dài. Có thể không triệu chứng."),
        )
        .with(fields::DRUG, Some("Amlodipin"))
        .with(fields::DRUG_DESC, Some("Thuốc chẹn kênh canxi nhóm dihydropyridin.\nDùng 1 lần/ngày"))
        .with(fields::SYMPTOM, Some("đau đầu"))
        .with(fields::GROUP_NAME, Some("Bệnh tăng huyết áp"))
        .with(fields::GROUP_DESC, Some("Các bệnh lý tăng huyết áp nguyên phát và thứ phát"))
        .with(fields::SUB_DISEASE, Some("Tăng huyết áp vô căn"))
        .with(fields::SUB_DESC, Some("Tăng huyết áp không rõ nguyên nhân"))
        .with(fields::CHAPTER_NAME, Some("Bệnh hệ tuần hoàn"))
        .with(fields::CHAPTER_DESC, Some("Chương IX của bảng phân loại"))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_schema_init(c: &mut Criterion) {
    c.bench_function("schema_init", |b| {
        b.iter(|| {
            let conn = Connection::open_in_memory().unwrap();
            for stmt in SCHEMA_STATEMENTS {
                conn.execute_batch(stmt).unwrap();
            }
            black_box(&conn);
        });
    });
}

fn bench_synth(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth");

    group.bench_function("clean_bulleted", |b| {
        b.iter(|| clean(black_box("  • - Thuốc giảm đau hạ sốt thông dụng. Dùng đường uống.")));
    });

    group.bench_function("clean_long", |b| {
        let long = format!("{}.", "mô tả rất dài ".repeat(200));
        b.iter(|| clean(black_box(&long)));
    });

    let record = rich_record();
    for hop in HopClass::ALL {
        group.bench_with_input(BenchmarkId::new("expand", hop), &hop, |b, hop| {
            b.iter(|| expand(black_box(&record), *hop));
        });
    }

    group.finish();
}

fn bench_hop_queries(c: &mut Criterion) {
    let conn = setup_db(500, 4);
    let mut group = c.benchmark_group("hop_queries");
    for hop in HopClass::ALL {
        group.bench_with_input(BenchmarkId::new("run_hop_query", hop), &hop, |b, hop| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % 500;
                run_hop_query(&conn, *hop, black_box(&format!("D{i}")), 8).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("bench.sqlite");
    let store = GraphStore::create(&db).unwrap();
    let (nodes, edges) = graph_fixture(300, 3);
    store.upsert_nodes(&nodes).unwrap();
    store.add_edges(&edges).unwrap();
    drop(store);

    let mut group = c.benchmark_group("generate");
    group.sample_size(10);
    for workers in [1usize, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, workers| {
            let store = GraphStore::open(&db, *workers as u32, 0).unwrap();
            b.iter(|| {
                let out = tempfile::tempdir().unwrap();
                let config = GeneratorConfig {
                    graph_db_path: db.clone(),
                    output_dir: out.path().to_path_buf(),
                    total_target: 2_000,
                    sentences_per_file: 500,
                    workers: *workers,
                    rng_seed: Some(7),
                    ..GeneratorConfig::default()
                };
                black_box(generate(&store, &config).unwrap())
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_schema_init,
    bench_synth,
    bench_hop_queries,
    bench_generate,
);
criterion_main!(benches);
