//! # Simulation Benchmarks
//!
//! Measures one control-loop step of the simulated actuator.
//!
//! Run: `cargo bench --bench sim_bench`

use std::sync::Arc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use canmotor_core::{ControlMode, ManualClock, SimConfig, SimulatedActuator};

/// Benchmark update() per control mode
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sim_update");

    for mode in [ControlMode::PercentOutput, ControlMode::Velocity, ControlMode::Position] {
        let clock = ManualClock::new(0.0);
        let mut sim = match SimulatedActuator::new(SimConfig::new(9.0, 2048.0), Arc::new(clock.clone())) {
            Ok(sim) => sim,
            Err(_) => return,
        };
        sim.set(mode, 4096.0);

        group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |b, _| {
            b.iter(|| {
                clock.advance(0.02);
                sim.update();
                black_box(sim.position())
            })
        });
    }

    group.finish();
}

/// Benchmark a full settle from rest (500 cycles)
fn bench_settle(c: &mut Criterion) {
    c.bench_function("sim_settle_500_cycles", |b| {
        b.iter(|| {
            let clock = ManualClock::new(0.0);
            let Ok(mut sim) = SimulatedActuator::new(SimConfig::new(9.0, 1.0), Arc::new(clock.clone())) else {
                return 0.0;
            };
            sim.set(ControlMode::Position, black_box(9.0));
            for _ in 0..500 {
                clock.advance(0.02);
                sim.update();
            }
            sim.position()
        })
    });
}

criterion_group!(benches, bench_update, bench_settle);
criterion_main!(benches);
