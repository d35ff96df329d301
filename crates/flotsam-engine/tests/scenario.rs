//! Integration test: end-to-end stepping on small grids.
//!
//! Drives a full [`Simulation`] through emission, integration and
//! migration and checks where tracers end up.

use flotsam_core::{BlockId, Point, SourceId, StepError, StepId, TracerId};
use flotsam_engine::{
    EulerIntegrator, PaperParams, Simulation, SourceConfig, TracerStatus, TracerVariant,
    VariantKind,
};
use flotsam_space::{BoundingBox, Shape};
use flotsam_test_utils::fixtures::{self, two_by_two, two_by_two_point_source};
use flotsam_test_utils::{BeachingIntegrator, ConstantVelocity, FailingSampler, HintRecorder};

fn block_box(min: (f64, f64), max: (f64, f64)) -> BoundingBox {
    BoundingBox::new(Point::xy(min.0, min.1), Point::xy(max.0, max.1)).unwrap()
}

// ── Emission and placement ──────────────────────────────────────────

#[test]
fn point_source_emits_one_tracer_per_step_into_its_block() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let still = ConstantVelocity(Point::ZERO);

    assert_eq!(sim.source_owner(SourceId(0)), Some(BlockId(0)));
    assert_eq!(
        *sim.block(BlockId(0)).unwrap().bbox(),
        block_box((0.0, 0.0), (5.0, 5.0))
    );

    for expected in 1..=4 {
        let report = sim.step(&still, &EulerIntegrator).unwrap();
        assert_eq!(report.metrics.emitted, 1);
        assert_eq!(sim.tracer_count(), expected);
    }
    assert_eq!(sim.block(BlockId(0)).unwrap().tracer_count(), 4);
    assert!(sim
        .tracers()
        .all(|t| t.block == BlockId(0) && t.position == Point::xy(1.0, 1.0)));
    assert_eq!(sim.next_tracer_id(), TracerId(4));
}

#[test]
fn velocity_moves_tracer_into_far_corner_block() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let drift = ConstantVelocity(Point::xy(5.0, 5.0));

    let report = sim.step(&drift, &EulerIntegrator).unwrap();
    assert_eq!(report.step, StepId(0));
    assert_eq!(report.metrics.migrated, 1);
    assert_eq!(report.metrics.large_displacements, 0);

    let tracers: Vec<_> = sim.tracers().collect();
    assert_eq!(tracers.len(), 1);
    assert_eq!(tracers[0].position, Point::xy(6.0, 6.0));
    assert_eq!(tracers[0].block, BlockId(3));
    assert_eq!(tracers[0].status, TracerStatus::Active);
    assert_eq!(
        *sim.block(BlockId(3)).unwrap().bbox(),
        block_box((5.0, 5.0), (10.0, 10.0))
    );
    assert_eq!(sim.block(BlockId(0)).unwrap().tracer_count(), 0);
}

#[test]
fn tracer_leaving_domain_is_reported_exited() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let drift = ConstantVelocity(Point::xy(5.0, 5.0));

    sim.step(&drift, &EulerIntegrator).unwrap();
    let report = sim.step(&drift, &EulerIntegrator).unwrap();

    assert_eq!(report.exited.len(), 1);
    let gone = &report.exited[0];
    assert_eq!(gone.id, TracerId(0));
    assert_eq!(gone.block, BlockId(3));
    assert_eq!(gone.position, Point::xy(11.0, 11.0));
    assert_eq!(gone.status, TracerStatus::Exited);

    // The second tracer took the first one's place.
    let live: Vec<_> = sim.tracers().map(|t| (t.id, t.block)).collect();
    assert_eq!(live, vec![(TracerId(1), BlockId(3))]);
    assert!(sim.tracers().all(|t| t.id != TracerId(0)));
}

#[test]
fn clock_advances_by_dt() {
    let mut cfg = two_by_two();
    cfg.start_time = 100.0;
    cfg.dt = 0.25;
    let mut sim = Simulation::new(cfg).unwrap();
    let still = ConstantVelocity(Point::ZERO);
    for _ in 0..4 {
        sim.step(&still, &EulerIntegrator).unwrap();
    }
    assert_eq!(sim.current_step(), StepId(4));
    assert_eq!(sim.time(), 101.0);
}

// ── Beaching ────────────────────────────────────────────────────────

#[test]
fn beached_tracers_stop_and_stay_owned() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let westward = ConstantVelocity(Point::xy(-3.0, 0.0));

    let report = sim.step(&westward, &BeachingIntegrator).unwrap();
    assert_eq!(report.metrics.beached, 1);
    assert!(report.exited.is_empty());

    let t = sim.tracers().next().unwrap();
    assert_eq!(t.status, TracerStatus::Inactive);
    assert_eq!(t.position, Point::xy(0.0, 1.0));
    assert_eq!(t.velocity, Point::ZERO);

    // Inactive tracers are not moved again but still age.
    sim.step(&westward, &BeachingIntegrator).unwrap();
    let first = sim.tracers().find(|t| t.id == TracerId(0)).unwrap();
    assert_eq!(first.position, Point::xy(0.0, 1.0));
    assert_eq!(first.age, 2.0);
    let counts = sim.block(BlockId(0)).unwrap().status_counts();
    assert_eq!(counts.inactive, 2);
}

#[test]
fn tracer_beached_in_another_block_is_relocated() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let north = ConstantVelocity(Point::xy(0.0, 20.0));

    sim.step(&north, &BeachingIntegrator).unwrap();
    let t = sim.tracers().next().unwrap();
    assert_eq!(t.status, TracerStatus::Inactive);
    assert_eq!(t.position, Point::xy(1.0, 10.0));
    assert_eq!(t.block, BlockId(2));
}

// ── Lifetime ────────────────────────────────────────────────────────

#[test]
fn tracers_expire_at_configured_lifetime() {
    let mut cfg = two_by_two_point_source();
    cfg.tracer_lifetime = Some(3.0);
    let mut sim = Simulation::new(cfg).unwrap();
    let still = ConstantVelocity(Point::ZERO);

    for _ in 0..2 {
        let report = sim.step(&still, &EulerIntegrator).unwrap();
        assert!(report.expired.is_empty());
    }
    let report = sim.step(&still, &EulerIntegrator).unwrap();
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].id, TracerId(0));
    assert_eq!(report.expired[0].age, 3.0);

    // Steady state: one in, one out.
    for _ in 0..5 {
        let report = sim.step(&still, &EulerIntegrator).unwrap();
        assert_eq!(report.expired.len(), 1);
        assert_eq!(sim.tracer_count(), 2);
    }
}

// ── Failure ─────────────────────────────────────────────────────────

#[test]
fn sampler_failure_is_fatal_for_the_step() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    // One tracer sampled in the first step, two in the second.
    let sampler = FailingSampler::new(Point::ZERO, 3);

    sim.step(&sampler, &EulerIntegrator).unwrap();
    sim.step(&sampler, &EulerIntegrator).unwrap();
    let err = sim.step(&sampler, &EulerIntegrator).unwrap_err();
    assert!(matches!(err, StepError::SamplerFailed { .. }));
    assert_eq!(sim.current_step(), StepId(2));
    assert_eq!(sim.tracer_count(), 2);
    assert_eq!(sim.next_tracer_id(), TracerId(2));
}

fn emitted_by(sim: &Simulation, id: u32) -> u64 {
    sim.source(SourceId(id)).unwrap().stats().particles_emitted
}

#[test]
fn failed_step_can_be_retried_without_double_emission() {
    let cfg = || {
        two_by_two().with_source(fixtures::area_source(
            0,
            Point::xy(1.0, 1.0),
            Point::xy(9.0, 9.0),
            2.0,
        ))
    };
    let still = ConstantVelocity(Point::ZERO);
    let mut clean = Simulation::new(cfg()).unwrap();
    clean.step(&still, &EulerIntegrator).unwrap();

    let mut sim = Simulation::new(cfg()).unwrap();
    let err = sim
        .step(&FailingSampler::new(Point::ZERO, 0), &EulerIntegrator)
        .unwrap_err();
    assert!(matches!(err, StepError::SamplerFailed { .. }));
    assert_eq!(sim.current_step(), StepId(0));
    assert_eq!(sim.tracer_count(), 0);
    assert_eq!(emitted_by(&sim, 0), 0);
    assert_eq!(sim.next_tracer_id(), TracerId(0));

    let report = sim.step(&still, &EulerIntegrator).unwrap();
    assert_eq!(report.metrics.emitted, 2);
    assert_eq!(sim.tracer_count(), clean.tracer_count());
    assert_eq!(emitted_by(&sim, 0), emitted_by(&clean, 0));
    assert_eq!(sim.next_tracer_id(), clean.next_tracer_id());
    let placed = |s: &Simulation| -> Vec<_> {
        s.tracers().map(|t| (t.id, t.block, t.position)).collect()
    };
    assert_eq!(placed(&sim), placed(&clean));
}

#[test]
fn failed_step_leaves_resident_tracers_untouched() {
    let mut sim = Simulation::new(two_by_two_point_source()).unwrap();
    let drift = ConstantVelocity(Point::xy(1.0, 0.0));
    sim.step(&drift, &EulerIntegrator).unwrap();
    let before: Vec<_> = sim.tracers().collect();

    // Two tracers to sample; the second sample fails.
    sim.step(
        &FailingSampler::new(Point::xy(1.0, 0.0), 1),
        &EulerIntegrator,
    )
    .unwrap_err();
    let after: Vec<_> = sim.tracers().collect();
    assert_eq!(after, before);
    assert_eq!(sim.current_step(), StepId(1));
}

#[test]
fn oversized_emission_fails_without_allocating() {
    let cfg = two_by_two().with_source(fixtures::area_source(
        0,
        Point::xy(1.0, 1.0),
        Point::xy(9.0, 9.0),
        1e18,
    ));
    let mut sim = Simulation::new(cfg).unwrap();
    let err = sim
        .step(&ConstantVelocity(Point::ZERO), &EulerIntegrator)
        .unwrap_err();
    assert!(matches!(err, StepError::AllocationFailed { .. }));
    assert_eq!(sim.tracer_count(), 0);
    assert_eq!(emitted_by(&sim, 0), 0);
    assert_eq!(sim.current_step(), StepId(0));
}

#[test]
fn container_limit_surfaces_as_allocation_failure() {
    let mut cfg = two_by_two().with_source(fixtures::point_source(0, Point::xy(1.0, 1.0), 3.0));
    cfg.container.initial_capacity = 2;
    cfg.container.max_capacity = 2;
    let mut sim = Simulation::new(cfg).unwrap();
    let err = sim
        .step(&ConstantVelocity(Point::ZERO), &EulerIntegrator)
        .unwrap_err();
    assert!(matches!(err, StepError::AllocationFailed { limit: 2, .. }));
}

// ── Variants ────────────────────────────────────────────────────────

#[test]
fn variant_reaches_integrator_through_hint() {
    let paper = PaperParams {
        particulate: false,
        density: 800.0,
        radius: 0.02,
        degradation_rate: 0.01,
    };
    let cfg = two_by_two().with_source(
        SourceConfig::new(
            SourceId(9),
            "newsprint",
            Shape::point(Point::xy(7.0, 2.0)).unwrap(),
            1.0,
        )
        .with_variant(TracerVariant::Paper(paper)),
    );
    let mut sim = Simulation::new(cfg).unwrap();
    let recorder = HintRecorder::new();
    sim.step(&ConstantVelocity(Point::ZERO), &recorder).unwrap();

    let hints = recorder.hints();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].kind, Some(VariantKind::Paper));
    assert_eq!(hints[0].density, Some(800.0));

    let t = sim.tracers().next().unwrap();
    assert_eq!(t.variant, TracerVariant::Paper(paper));
    assert_eq!(t.source, SourceId(9));
    assert_eq!(t.block, BlockId(1));
}
