use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sharpen_core::{LanguageLevel, Registry, SourceFile, Transformer};

const LEGACY_SERVICE: &str = include_str!("../tests/fixtures/legacy_service.cs");

fn sample_batch(files: usize) -> Vec<SourceFile> {
    (0..files)
        .map(|i| SourceFile::new(format!("src/Service{i}.cs"), LEGACY_SERVICE))
        .collect()
}

fn bench_single_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_file");
    let registry = Registry::builtin();
    let file = SourceFile::new("LegacyService.cs", LEGACY_SERVICE);

    for level in [LanguageLevel::CSharp7, LanguageLevel::CSharp10, LanguageLevel::CSharp13] {
        let transformer = Transformer::new(registry.by_level(level, true));
        group.bench_with_input(BenchmarkId::new("safe_rules", level.ordinal()), &file, |b, file| {
            b.iter(|| black_box(transformer.transform(black_box(file))));
        });
    }

    let transformer = Transformer::new(registry.by_level(LanguageLevel::CSharp13, false));
    group.bench_function("all_rules", |b| {
        b.iter(|| black_box(transformer.transform(black_box(&file))));
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let registry = Registry::builtin();
    let transformer = Transformer::new(registry.by_level(LanguageLevel::CSharp13, true));
    let files = sample_batch(64);

    group.bench_function("sequential", |b| {
        b.iter(|| black_box(transformer.transform_all(&files)));
    });
    for workers in [2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parallel", workers), &workers, |b, &workers| {
            b.iter(|| black_box(transformer.transform_all_parallel(&files, workers)));
        });
    }

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    c.bench_function("registry_builtin", |b| {
        b.iter(|| black_box(Registry::builtin()));
    });

    let registry = Registry::builtin();
    c.bench_function("registry_by_level", |b| {
        b.iter(|| black_box(registry.by_level(black_box(LanguageLevel::CSharp12), true)));
    });
}

criterion_group!(benches, bench_single_file, bench_batch, bench_registry);
criterion_main!(benches);
