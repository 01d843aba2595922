use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dockinspect::io::parse_structure;
use dockinspect::sasa::{SurfaceComputer, SurfaceParams};
use std::path::PathBuf;

fn receptor() -> dockinspect::Molecule {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test_data")
        .join("2src.pdb");
    parse_structure(path).unwrap()
}

fn bench_receptor_sasa(c: &mut Criterion) {
    let molecule = receptor();

    let mut group = c.benchmark_group("receptor_sasa");
    for samples in [50, 100, 500] {
        let computer = SurfaceComputer::with_params(SurfaceParams {
            samples,
            ..SurfaceParams::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(samples), &computer, |b, computer| {
            b.iter(|| black_box(computer.atom_areas(&molecule)))
        });
    }
    group.finish();
}

criterion_group!(sasa_benches, bench_receptor_sasa);
criterion_main!(sasa_benches);
