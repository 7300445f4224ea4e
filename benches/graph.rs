use codeschema::graph::{build, find_cycles};
use codeschema::model::{FileSchema, ImportKind, ImportRecord, Provenance};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// `count` python modules, each importing the next `fan_out` modules plus
/// a couple of externals; every 50th module closes a loop back to module 0.
fn synthetic_schemas(count: usize, fan_out: usize) -> Vec<FileSchema> {
    (0..count)
        .map(|idx| {
            let path = format!("pkg/mod_{idx:05}.py");
            let mut schema = FileSchema::new(path.clone(), "python", Provenance::NativeSyntaxTree);
            let mut targets: Vec<String> = (1..=fan_out)
                .map(|step| idx + step)
                .filter(|target| *target < count)
                .map(|target| format!("pkg.mod_{target:05}"))
                .collect();
            if idx % 50 == 49 {
                targets.push("pkg.mod_00000".to_string());
            }
            targets.push("os".to_string());
            targets.push("json".to_string());
            for (line, name) in targets.into_iter().enumerate() {
                schema.imports.push(ImportRecord {
                    name,
                    kind: ImportKind::Static,
                    members: Vec::new(),
                    file_path: path.clone(),
                    line: line + 1,
                });
            }
            schema
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    for count in [500usize, 5_000] {
        let schemas = synthetic_schemas(count, 3);
        group.bench_with_input(BenchmarkId::from_parameter(count), &schemas, |b, schemas| {
            b.iter(|| black_box(build(schemas.iter())))
        });
    }
    group.finish();
}

fn bench_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cycles");
    for count in [500usize, 5_000, 20_000] {
        let graph = build(synthetic_schemas(count, 3).iter());
        group.bench_with_input(BenchmarkId::from_parameter(count), &graph, |b, graph| {
            b.iter(|| black_box(find_cycles(graph)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_cycles);
criterion_main!(benches);
