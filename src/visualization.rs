use crate::conditions::*;
use crate::error::RenderError;
use crate::grid::{FieldKind, Grid};
use crate::simulation::{FieldSink, FluidSimulation};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// One z-slab of the density field, as last published by the simulation.
#[derive(Clone, Debug)]
pub struct SliceFrame {
    size: usize,
    depth: usize,
    values: Vec<f32>,
    version: u64,
}

impl SliceFrame {
    pub fn new(size: usize, depth: usize) -> Result<Self, RenderError> {
        if depth >= size {
            return Err(RenderError::SliceOutOfRange { depth, size });
        }
        Ok(Self {
            size,
            depth,
            values: vec![0.0; size * size],
            version: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Row-major `(x, y)` values, x fastest.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of updates received so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn update(&mut self, field: &[f32]) {
        let grid = Grid::new(self.size);
        self.values.copy_from_slice(extract_slice(&grid, field, self.depth));
        self.version += 1;
    }
}

/// The z = `depth` slab of a field (depth saturates to the last slab).
pub fn extract_slice<'a>(grid: &Grid, field: &'a [f32], depth: usize) -> &'a [f32] {
    let slab = grid.slab_len();
    let depth = depth.min(grid.size() - 1);
    &field[depth * slab..(depth + 1) * slab]
}

/// Keeps the density slice of a [`SliceFrame`] up to date.
pub struct SliceSink {
    grid: Grid,
    frame: Rc<RefCell<SliceFrame>>,
}

impl SliceSink {
    pub fn new(frame: Rc<RefCell<SliceFrame>>) -> Self {
        let grid = Grid::new(frame.borrow().size());
        Self { grid, frame }
    }
}

impl FieldSink for SliceSink {
    fn publish(&mut self, kind: FieldKind, data: &[f32]) {
        if kind == FieldKind::Density && data.len() == self.grid.cell_count() {
            self.frame.borrow_mut().update(data);
        }
    }
}

// White for empty cells, deep blue for light density, toward red for heavy density
pub fn density_to_color(density: f32) -> u32 {
    let t = (density / DENSITY_DISPLAY_MAX).clamp(0.0, 1.0);
    if t <= 0.5 {
        let intensity = (255.0 * (1.0 - t / 0.5)) as u32;
        (intensity << 16) | (intensity << 8) | 0xFF
    } else {
        let red_intensity = (255.0 * ((t - 0.5) / 0.5)) as u32;
        (red_intensity << 16) | 0xFF
    }
}

/// Paint `frame` into a `size*scale` square pixel buffer, y axis pointing up.
pub fn render_slice(frame: &SliceFrame, buffer: &mut [u32], scale: usize) {
    let n = frame.size();
    let width = n * scale;
    for j in 0..n {
        let row = n - 1 - j;
        for i in 0..n {
            let color = density_to_color(frame.values()[i + j * n]);
            for dy in 0..scale {
                let start = (row * scale + dy) * width + i * scale;
                buffer[start..start + scale].fill(color);
            }
        }
    }
}

// Window pixel to grid cell on the displayed slab
fn pixel_to_cell(n: usize, scale: usize, px: f32, py: f32) -> (f32, f32) {
    let x = px / scale as f32;
    let y = n as f32 - 1.0 - py / scale as f32;
    (x, y)
}

/// Open a window on the mid-depth density slice and drive `simulation` once per frame.
///
/// Left mouse button injects density and drags the fluid, `R` resets, `Escape`
/// closes. Random drops fall from the upper part of the domain. Returns the
/// number of steps run.
pub fn run_simulation(
    simulation: &mut FluidSimulation,
    frame: &Rc<RefCell<SliceFrame>>,
) -> Result<u64, RenderError> {
    let n = simulation.grid().size();
    let depth = frame.borrow().depth() as f32;
    let width = n * WINDOW_SCALE;
    let height = n * WINDOW_SCALE;
    let mut buffer: Vec<u32> = vec![0; width * height];

    let mut window = Window::new(WINDOW_TITLE, width, height, WindowOptions::default())?;
    window.set_target_fps(TARGET_FPS);

    let mut rng = rand::rng();
    let mut last_mouse: Option<(f32, f32)> = None;
    let mut steps: u64 = 0;
    let start = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            simulation.reset();
            log::info!("simulation reset");
        }

        // Mouse injection
        let mouse = window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(px, py)| pixel_to_cell(n, WINDOW_SCALE, px, py));
        if let (Some((x, y)), true) = (mouse, window.get_mouse_down(MouseButton::Left)) {
            simulation.add_force(x, y, depth, MOUSE_DENSITY);
            if let Some((last_x, last_y)) = last_mouse {
                let vx = (x - last_x) * MOUSE_VELOCITY_SCALE;
                let vy = (y - last_y) * MOUSE_VELOCITY_SCALE;
                simulation.add_velocity(x, y, depth, vx, vy, 0.0);
            }
        }
        last_mouse = mouse;

        // Ambient drops and a warm source at the floor
        if rng.random_bool(DROP_CHANCE) {
            let x = rng.random_range(n / 4..3 * n / 4) as f32;
            let z = rng.random_range(n / 4..3 * n / 4) as f32;
            simulation.add_force(x, (3 * n / 4) as f32, z, DROP_AMOUNT);
        }
        if rng.random_bool(DROP_CHANCE) {
            simulation.add_heat((n / 2) as f32, 2.0, depth, DROP_HEAT);
        }

        simulation.step();
        steps += 1;

        render_slice(&frame.borrow(), &mut buffer, WINDOW_SCALE);
        window.update_with_buffer(&buffer, width, height)?;

        if steps % 100 == 0 {
            log::info!(
                "{} steps in {:?}, total density {:.3}",
                steps,
                start.elapsed(),
                simulation.state().total_density()
            );
        }
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn test_color_ramp() {
        assert_eq!(density_to_color(0.0), 0xFFFFFF);
        assert_eq!(density_to_color(-3.0), 0xFFFFFF);
        assert_eq!(density_to_color(DENSITY_DISPLAY_MAX * 0.5), 0x0000FF);
        assert_eq!(density_to_color(DENSITY_DISPLAY_MAX * 10.0), 0xFF00FF);
    }

    #[test]
    fn test_slice_frame_rejects_bad_depth() {
        assert!(matches!(
            SliceFrame::new(8, 8),
            Err(RenderError::SliceOutOfRange { depth: 8, size: 8 })
        ));
    }

    #[test]
    fn test_render_flips_y_axis() {
        let mut frame = SliceFrame::new(4, 1).unwrap();
        frame.values[0] = DENSITY_DISPLAY_MAX; // (0, 0): bottom-left cell
        let mut buffer = vec![0; 4 * 2 * 4 * 2];
        render_slice(&frame, &mut buffer, 2);

        let width = 8;
        assert_eq!(buffer[7 * width], 0xFF00FF, "bottom-left pixel shows cell (0, 0)");
        assert_eq!(buffer[0], 0xFFFFFF, "top-left pixel shows the empty cell (0, 3)");
    }

    #[test]
    fn test_sink_follows_published_density() {
        let frame = Rc::new(RefCell::new(SliceFrame::new(8, 4).unwrap()));
        let mut simulation = FluidSimulation::new(SimulationConfig::quiet(8, 4, 1.0 / 60.0))
            .unwrap()
            .with_sink(Box::new(SliceSink::new(Rc::clone(&frame))));

        simulation.add_force(3.0, 5.0, 4.0, 1.0);
        let frame = frame.borrow();
        assert_eq!(frame.version(), 1);
        assert_eq!(frame.values()[3 + 5 * 8], 1.0);
    }

    #[test]
    fn test_pixel_to_cell() {
        let (x, y) = pixel_to_cell(16, 4, 8.0, 0.0);
        assert_eq!(x, 2.0);
        assert_eq!(y, 15.0);
    }
}
