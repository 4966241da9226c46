//! Transmission chain benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tympanic_sim::config::{MembraneParameters, Parameters};
use tympanic_sim::coupling::TransmissionOrchestrator;
use tympanic_sim::geometry::MembraneMesh;
use tympanic_sim::pathology::DiseaseStage;
use tympanic_sim::physics::MembraneSimulator;
use tympanic_sim::tick::TickContext;

fn bench_mesh_generation(c: &mut Criterion) {
    let params = MembraneParameters::default();

    c.bench_function("mesh_generation", |b| {
        b.iter(|| MembraneMesh::generate_conical(black_box(&params)))
    });
}

fn bench_membrane_deform(c: &mut Criterion) {
    let mut sim = MembraneSimulator::new(&MembraneParameters::default());
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("membrane_deform", |b| {
        b.iter(|| {
            let mut ctx = TickContext::new(0.016, 0.0, &mut rng);
            sim.deform(black_box(0.5), black_box(1000.0), &mut ctx)
        })
    });
}

fn bench_orchestrator_tick(c: &mut Criterion) {
    let mut sim = TransmissionOrchestrator::new(&Parameters::default());
    sim.receive_sound(0.5, 1000.0);
    sim.pathology_mut().trigger(DiseaseStage::Acute, 0.8);

    c.bench_function("orchestrator_tick", |b| b.iter(|| sim.tick(black_box(0.016))));
}

criterion_group!(
    benches,
    bench_mesh_generation,
    bench_membrane_deform,
    bench_orchestrator_tick
);
criterion_main!(benches);
