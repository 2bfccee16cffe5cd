//! Benchmarks for one simulation step.
//!
//! Run with: cargo bench --bench step_bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use voxel_fluid::{FluidSimulation, SimulationConfig};

const GRID_SIZE: usize = 48;

fn simulation(use_spatial_index: bool) -> FluidSimulation {
    let config = SimulationConfig::default()
        .with_grid_size(GRID_SIZE)
        .with_gpu(false)
        .with_spatial_index(use_spatial_index);
    let mut sim = FluidSimulation::new(config).expect("valid benchmark configuration");
    let corner = (GRID_SIZE / 6) as f32;
    sim.add_force(corner, corner, corner, 2.0);
    sim.add_velocity(corner, corner, corner, 0.5, 0.5, 0.0);
    sim.step();
    sim
}

fn bench_step_full_grid(c: &mut Criterion) {
    let mut sim = simulation(false);
    c.bench_function("step_48_full_grid", |b| {
        b.iter(|| {
            sim.step();
            black_box(sim.state().density[0]);
        });
    });
}

fn bench_step_gated(c: &mut Criterion) {
    let mut sim = simulation(true);
    c.bench_function("step_48_gated", |b| {
        b.iter(|| {
            sim.step();
            black_box(sim.spatial_index().active_count());
        });
    });
}

fn bench_injection(c: &mut Criterion) {
    let mut sim = simulation(true);
    let centre = (GRID_SIZE / 2) as f32;
    c.bench_function("add_force_and_velocity", |b| {
        b.iter(|| {
            sim.add_force(black_box(centre), centre, centre, 0.1);
            sim.add_velocity(black_box(centre), centre, centre, 0.0, 0.1, 0.0);
        });
    });
}

criterion_group!(benches, bench_step_full_grid, bench_step_gated, bench_injection);
criterion_main!(benches);
