use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mockapp_core::generate::{flat, layered, seeded_rng};
use mockapp_gen::{BuildFlavor, CodeBudget, FileSizes, ProjectGenerator, ProjectOptions};

const SIZES: FileSizes = FileSizes {
    swift: 120,
    objc: 90,
};

const TIERS: [(&str, usize, u64); 3] = [
    ("small", 20, 50_000),
    ("medium", 100, 250_000),
    ("large", 300, 750_000),
];

fn generator(flavor: BuildFlavor) -> ProjectGenerator {
    ProjectGenerator::with_file_sizes(
        ProjectOptions {
            flavor,
            ..ProjectOptions::default()
        },
        SIZES,
    )
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate.flat");
    let generator = generator(BuildFlavor::Buck);

    for (name, modules, loc) in TIERS {
        let Ok(graph) = flat(modules) else {
            continue;
        };
        let budget = CodeBudget {
            swift_loc: loc,
            objc_loc: 0,
        };
        group.throughput(Throughput::Elements(loc));
        group.bench_with_input(BenchmarkId::new("buck", name), &graph, |b, graph| {
            b.iter(|| black_box(generator.generate(graph, &budget, None)));
        });
    }

    group.finish();
}

fn bench_layered_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate.layered");

    for flavor in [BuildFlavor::Buck, BuildFlavor::Bazel, BuildFlavor::CocoaPods] {
        let mut rng = seeded_rng(Some(0x5EED));
        let Ok(graph) = layered(10, 10, 5, &mut rng) else {
            continue;
        };
        let budget = CodeBudget {
            swift_loc: 150_000,
            objc_loc: 50_000,
        };
        let generator = generator(flavor);
        group.bench_with_input(
            BenchmarkId::new(flavor.as_str(), "100x200k"),
            &graph,
            |b, graph| b.iter(|| black_box(generator.generate(graph, &budget, None))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_flat, bench_layered_mixed);
criterion_main!(benches);
