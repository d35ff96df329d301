//! Criterion benchmarks for full simulation steps.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use flotsam_bench::{reference_profile, stress_profile, DoubleGyre};
use flotsam_engine::{EulerIntegrator, MigrationPlan, Simulation};

/// Run `steps` steps so blocks hold a realistic population.
fn warmed(config: flotsam_engine::SimulationConfig, steps: usize) -> Simulation {
    let mut sim = Simulation::new(config).unwrap();
    for _ in 0..steps {
        sim.step(&DoubleGyre::default(), &EulerIntegrator).unwrap();
    }
    sim
}

fn bench_step_reference(c: &mut Criterion) {
    let mut sim = warmed(reference_profile(42).unwrap(), 200);
    let flow = DoubleGyre::default();

    c.bench_function("step_reference", |b| {
        b.iter(|| {
            let report = sim.step(&flow, &EulerIntegrator).unwrap();
            black_box(&report);
        });
    });
}

fn bench_step_stress(c: &mut Criterion) {
    let mut sim = warmed(stress_profile(42).unwrap(), 100);
    let flow = DoubleGyre::default();

    c.bench_function("step_stress", |b| {
        b.iter(|| {
            let report = sim.step(&flow, &EulerIntegrator).unwrap();
            black_box(&report);
        });
    });
}

/// Planning only: the parallel read-only pass, without applying it.
fn bench_migration_plan(c: &mut Criterion) {
    let sim = warmed(stress_profile(7).unwrap(), 100);
    let globals = sim.globals();

    c.bench_function("migration_plan_stress", |b| {
        b.iter(|| {
            let plan = MigrationPlan::build(
                sim.blocks(),
                &globals.grid,
                globals.tracer_lifetime,
                globals.max_cell_skip,
            );
            black_box(&plan);
        });
    });
}

fn bench_500_steps_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_run");
    group.sample_size(10);
    group.bench_function("500_steps_reference", |b| {
        b.iter(|| {
            let sim = warmed(reference_profile(42).unwrap(), 500);
            black_box(sim.tracer_count());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_step_reference,
    bench_step_stress,
    bench_migration_plan,
    bench_500_steps_reference
);
criterion_main!(benches);
