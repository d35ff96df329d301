//! Integration test: recoverable anomalies and bookkeeping.
//!
//! Large jumps and non-finite positions must not stop the simulation;
//! they are counted, kept in the recent-event ring and reflected in the
//! step metrics.

use flotsam_core::{BlockId, Point, StepId, TracerId};
use flotsam_engine::{DiagnosticEvent, EulerIntegrator, Simulation};
use flotsam_test_utils::fixtures::{point_source, unit_grid};
use flotsam_test_utils::{ConstantVelocity, NanBeyond};

#[test]
fn large_displacement_is_recorded_and_tracer_still_placed() {
    let cfg = unit_grid(8).with_source(point_source(0, Point::xy(0.5, 0.5), 1.0));
    let mut sim = Simulation::new(cfg).unwrap();

    let report = sim
        .step(&ConstantVelocity(Point::xy(4.0, 0.0)), &EulerIntegrator)
        .unwrap();
    assert_eq!(report.metrics.large_displacements, 1);
    assert_eq!(report.metrics.migrated, 1);

    let t = sim.tracers().next().unwrap();
    assert_eq!(t.block, BlockId(4));

    let events: Vec<_> = sim.diagnostics().recent().cloned().collect();
    assert_eq!(
        events,
        vec![DiagnosticEvent::LargeDisplacement {
            step: StepId(0),
            tracer: TracerId(0),
            from: BlockId(0),
            to: BlockId(4),
            cells: 4,
        }]
    );
}

#[test]
fn raising_cell_skip_silences_warning() {
    let mut cfg = unit_grid(8).with_source(point_source(0, Point::xy(0.5, 0.5), 1.0));
    cfg.max_cell_skip = 4;
    let mut sim = Simulation::new(cfg).unwrap();
    let report = sim
        .step(&ConstantVelocity(Point::xy(4.0, 0.0)), &EulerIntegrator)
        .unwrap();
    assert_eq!(report.metrics.large_displacements, 0);
    assert_eq!(sim.diagnostics().counters().large_displacements, 0);
}

#[test]
fn non_finite_position_forces_removal() {
    let cfg = unit_grid(4)
        .with_source(point_source(0, Point::xy(0.5, 0.5), 1.0))
        .with_source(point_source(1, Point::xy(3.5, 0.5), 1.0));
    let mut sim = Simulation::new(cfg).unwrap();

    let report = sim.step(&NanBeyond { x: 2.0 }, &EulerIntegrator).unwrap();
    assert_eq!(report.metrics.forced_removals, 1);
    assert!(report.exited.is_empty());
    assert_eq!(sim.tracer_count(), 1);
    assert_eq!(sim.tracers().next().unwrap().id, TracerId(0));

    let counters = sim.diagnostics().counters();
    assert_eq!(counters.forced_removals, 1);
    assert!(matches!(
        sim.diagnostics().recent().last(),
        Some(DiagnosticEvent::ForcedRemoval {
            tracer: TracerId(1),
            block: BlockId(3),
            ..
        })
    ));

    // The simulation keeps going.
    for _ in 0..3 {
        sim.step(&NanBeyond { x: 2.0 }, &EulerIntegrator).unwrap();
    }
    assert_eq!(sim.diagnostics().counters().forced_removals, 4);
    assert_eq!(sim.tracer_count(), 4);
}

#[test]
fn event_ring_keeps_only_the_most_recent() {
    let mut cfg = unit_grid(8).with_source(point_source(0, Point::xy(0.5, 0.5), 1.0));
    cfg.diagnostics_capacity = 2;
    let mut sim = Simulation::new(cfg).unwrap();
    let jump = ConstantVelocity(Point::xy(0.0, 3.0));

    // Each tracer jumps three rows every step until it leaves the domain.
    for _ in 0..3 {
        sim.step(&jump, &EulerIntegrator).unwrap();
    }
    let counters = sim.diagnostics().counters();
    assert!(counters.large_displacements > 2);
    assert_eq!(sim.diagnostics().recent().count(), 2);
    assert_eq!(sim.diagnostics().capacity(), 2);
}

#[test]
fn memory_report_tracks_container_growth() {
    let mut cfg = unit_grid(2).with_source(point_source(0, Point::xy(0.5, 0.5), 5.0));
    cfg.container.initial_capacity = 4;
    let mut sim = Simulation::new(cfg).unwrap();
    let before = sim.memory_report().clone();
    assert_eq!(before.blocks.len(), 4);
    assert_eq!(before.tracers.used, 0);

    let report = sim
        .step(&ConstantVelocity(Point::ZERO), &EulerIntegrator)
        .unwrap();
    let after = sim.memory_report();
    assert_eq!(after.tracers.used, 5);
    assert_eq!(after.blocks[0].tracers.used, 5);
    assert_eq!(after.blocks[0].tracers.capacity, 8);
    assert_eq!(after.sources.used, 1);
    assert_eq!(report.metrics.memory_bytes, after.total_bytes());
    assert_eq!(report.metrics.live_tracers, 5);
    assert_eq!(sim.last_metrics(), &report.metrics);
    assert!(after.detailed().lines().count() == 6);
}
