//! # Controller Benchmarks
//!
//! Measures the cost of the command path through the facade.
//!
//! Run: `cargo bench --bench controller_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use canmotor_core::{ControlMode, DeviceFamily, LoopbackBackend, MotorController};

fn hardware_controller() -> MotorController {
    MotorController::hardware("bench", Box::new(LoopbackBackend::new(DeviceFamily::TalonFx, 1)))
}

/// Benchmark de-duplicated vs changing commands
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller_set");

    let mut repeated = hardware_controller();
    let _ = repeated.set(ControlMode::Position, 10.0, 0.0);
    group.bench_function("repeated_command", |b| {
        b.iter(|| black_box(repeated.set(ControlMode::Position, black_box(10.0), 0.0)))
    });

    let mut changing = hardware_controller();
    let mut demand = 0.0;
    group.bench_function("changing_command", |b| {
        b.iter(|| {
            demand += 1.0;
            black_box(changing.set(ControlMode::Position, demand, 0.0))
        })
    });

    group.finish();
}

/// Benchmark telemetry reads
fn bench_readback(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller_readback");

    let mut ctrl = hardware_controller();
    let _ = ctrl.set(ControlMode::PercentOutput, 0.5, 0.0);

    group.bench_function("position", |b| b.iter(|| black_box(ctrl.position())));
    group.bench_function("telemetry", |b| b.iter(|| black_box(ctrl.telemetry())));
    group.bench_function("within_tolerance", |b| {
        b.iter(|| black_box(ctrl.within_tolerance(0.01)))
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_readback);
criterion_main!(benches);
