use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;
use voxel_fluid::conditions::*;
use voxel_fluid::plot::save_slice_png;
use voxel_fluid::visualization::{SliceFrame, SliceSink, run_simulation};
use voxel_fluid::{FieldKind, FluidSimulation, SimulationConfig};

fn main() -> ExitCode {
    env_logger::init();

    let config = SimulationConfig::default()
        .with_grid_size(DEMO_GRID_SIZE)
        .with_gpu(false);
    let depth = config.grid_size / 2;

    let frame = match SliceFrame::new(config.grid_size, depth) {
        Ok(frame) => Rc::new(RefCell::new(frame)),
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut simulation = match FluidSimulation::new(config) {
        Ok(simulation) => simulation.with_sink(Box::new(SliceSink::new(Rc::clone(&frame)))),
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let steps = match run_simulation(&mut simulation, &frame) {
        Ok(steps) => steps,
        Err(e) => {
            log::error!("viewer stopped: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "{} steps in {:?}, total density {:.3}",
        steps,
        start.elapsed(),
        simulation.state().total_density()
    );

    let grid = simulation.grid();
    let density = simulation.state().field(FieldKind::Density);
    if let Err(e) = save_slice_png(SNAPSHOT_PATH, &grid, density, depth, WINDOW_SCALE as u32) {
        log::error!("{}", e);
    }

    simulation.dispose();
    ExitCode::SUCCESS
}
