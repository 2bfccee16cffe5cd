use rayon::prelude::*;
use std::ops::Mul;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f32) -> Vector3 {
        Vector3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    // Return vector magnitude
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    // Divide by (magnitude + eps), never divides by zero for eps > 0
    pub fn normalize_eps(&self, eps: f32) -> Self {
        let len = self.magnitude() + eps;
        Self::new(self.x / len, self.y / len, self.z / len)
    }
}


/// Cubic grid geometry: maps 3D cell coordinates to flat buffer offsets.
///
/// Layout is x-fastest: `x + y*N + z*N²`. Every accessor taking signed
/// coordinates clamps them to `[0, N-1]`, so stencils near the walls never need
/// their own bounds checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    n: usize,
}

impl Grid {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn cell_count(&self) -> usize {
        self.n * self.n * self.n
    }

    // N² cells per z-slab
    pub fn slab_len(&self) -> usize {
        self.n * self.n
    }

    // Saturate a coordinate to the grid
    fn clamp_coord(&self, v: isize) -> usize {
        v.clamp(0, self.n as isize - 1) as usize
    }

    // Clamped flat index
    pub fn idx(&self, x: isize, y: isize, z: isize) -> usize {
        self.offset(self.clamp_coord(x), self.clamp_coord(y), self.clamp_coord(z))
    }

    // Floor, then clamp
    pub fn idx_f(&self, x: f32, y: f32, z: f32) -> usize {
        self.idx(floor_coord(x), floor_coord(y), floor_coord(z))
    }

    #[inline]
    pub fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.n && j < self.n && k < self.n, "Cell out of bounds: ({}, {}, {})", i, j, k);
        i + j * self.n + k * self.n * self.n
    }

    // Return the coordinates (i, j, k) of a flat index
    pub fn decode(&self, index: usize) -> (usize, usize, usize) {
        let n = self.n;
        (index % n, (index / n) % n, index / (n * n))
    }

    pub fn in_bounds(&self, x: isize, y: isize, z: isize) -> bool {
        let n = self.n as isize;
        (0..n).contains(&x) && (0..n).contains(&y) && (0..n).contains(&z)
    }

    // -x, +x, -y, +y, -z, +z
    #[inline]
    pub fn neighbors6(&self, index: usize) -> [usize; 6] {
        let n = self.n;
        let n2 = n * n;
        [index - 1, index + 1, index - n, index + n, index - n2, index + n2]
    }

    #[inline]
    pub fn neighbor_sum(&self, field: &[f32], index: usize) -> f32 {
        self.neighbors6(index).iter().map(|&nb| field[nb]).sum()
    }

    /// Trilinear interpolation of `field` at a continuous position.
    pub fn sample(&self, field: &[f32], x: f32, y: f32, z: f32) -> f32 {
        let i0 = x.floor();
        let j0 = y.floor();
        let k0 = z.floor();

        let s1 = x - i0;
        let s0 = 1.0 - s1;
        let t1 = y - j0;
        let t0 = 1.0 - t1;
        let u1 = z - k0;
        let u0 = 1.0 - u1;

        let (i0, j0, k0) = (i0 as isize, j0 as isize, k0 as isize);
        let (i1, j1, k1) = (i0 + 1, j0 + 1, k0 + 1);
        let at = |i, j, k| field[self.idx(i, j, k)];

        s0 * (t0 * (u0 * at(i0, j0, k0) + u1 * at(i0, j0, k1))
            + t1 * (u0 * at(i0, j1, k0) + u1 * at(i0, j1, k1)))
            + s1 * (t0 * (u0 * at(i1, j0, k0) + u1 * at(i1, j0, k1))
                + t1 * (u0 * at(i1, j1, k0) + u1 * at(i1, j1, k1)))
    }

    /// Update every interior cell of `dst` in place, one z-slab per task.
    ///
    /// `f` receives `(i, j, k, flat_index, cell)`. Boundary cells are left
    /// untouched. Only for passes whose output cell does not depend on other
    /// cells of `dst`.
    pub fn par_update_interior<F>(&self, dst: &mut [f32], f: F)
    where
        F: Fn(usize, usize, usize, usize, &mut f32) + Sync + Send,
    {
        let n = self.n;
        let slab = self.slab_len();
        dst.par_chunks_mut(slab).enumerate().for_each(|(k, plane)| {
            if k == 0 || k >= n - 1 {
                return;
            }
            for j in 1..n - 1 {
                for i in 1..n - 1 {
                    let local = i + j * n;
                    f(i, j, k, local + k * slab, &mut plane[local]);
                }
            }
        });
    }

    // Interior cells in sweep order, x fastest
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let last = self.n.saturating_sub(1);
        (1..last).flat_map(move |k| (1..last).flat_map(move |j| (1..last).map(move |i| (i, j, k))))
    }
}

fn floor_coord(v: f32) -> isize {
    // NaN maps to 0, infinities saturate
    v.floor() as isize
}


#[derive(Clone, Copy, Debug)]
pub struct VelocityRef<'a> {
    pub x: &'a [f32],
    pub y: &'a [f32],
    pub z: &'a [f32],
}


/// Names of the fields in a [`FluidState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Density,
    VelocityX,
    VelocityY,
    VelocityZ,
    // Curl magnitude
    Temp,
    Pressure,
    Temperature,
    Divergence,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Density,
        FieldKind::VelocityX,
        FieldKind::VelocityY,
        FieldKind::VelocityZ,
        FieldKind::Temp,
        FieldKind::Pressure,
        FieldKind::Temperature,
        FieldKind::Divergence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Density => "density",
            FieldKind::VelocityX => "velocityX",
            FieldKind::VelocityY => "velocityY",
            FieldKind::VelocityZ => "velocityZ",
            FieldKind::Temp => "temp",
            FieldKind::Pressure => "pressure",
            FieldKind::Temperature => "temperature",
            FieldKind::Divergence => "divergence",
        }
    }
}


/// One complete simulation snapshot: every field over the same grid.
#[derive(Clone, Debug, PartialEq)]
pub struct FluidState {
    pub density: Vec<f32>,
    pub velocity_x: Vec<f32>,
    pub velocity_y: Vec<f32>,
    pub velocity_z: Vec<f32>,
    pub temp: Vec<f32>,
    pub pressure: Vec<f32>,
    pub temperature: Vec<f32>,
    pub divergence: Vec<f32>,
}

impl FluidState {
    // Create a zero-filled state for the given grid
    pub fn new(grid: Grid) -> Self {
        let len = grid.cell_count();
        Self {
            density: vec![0.0; len],
            velocity_x: vec![0.0; len],
            velocity_y: vec![0.0; len],
            velocity_z: vec![0.0; len],
            temp: vec![0.0; len],
            pressure: vec![0.0; len],
            temperature: vec![0.0; len],
            divergence: vec![0.0; len],
        }
    }

    pub fn field(&self, kind: FieldKind) -> &[f32] {
        match kind {
            FieldKind::Density => &self.density,
            FieldKind::VelocityX => &self.velocity_x,
            FieldKind::VelocityY => &self.velocity_y,
            FieldKind::VelocityZ => &self.velocity_z,
            FieldKind::Temp => &self.temp,
            FieldKind::Pressure => &self.pressure,
            FieldKind::Temperature => &self.temperature,
            FieldKind::Divergence => &self.divergence,
        }
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> &mut [f32] {
        self.field_vec(kind)
    }

    pub fn velocity(&self) -> VelocityRef<'_> {
        VelocityRef {
            x: &self.velocity_x,
            y: &self.velocity_y,
            z: &self.velocity_z,
        }
    }

    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    // Zero every field without reallocating
    pub fn fill_zero(&mut self) {
        for kind in FieldKind::ALL {
            self.field_mut(kind).fill(0.0);
        }
    }

    pub fn copy_from(&mut self, other: &FluidState) {
        for kind in FieldKind::ALL {
            self.field_mut(kind).copy_from_slice(other.field(kind));
        }
    }

    pub fn is_finite(&self) -> bool {
        FieldKind::ALL
            .iter()
            .all(|&kind| self.field(kind).par_iter().all(|v| v.is_finite()))
    }

    pub fn is_zero(&self) -> bool {
        FieldKind::ALL
            .iter()
            .all(|&kind| self.field(kind).iter().all(|&v| v == 0.0))
    }

    // Compute the total density of the grid
    pub fn total_density(&self) -> f32 {
        self.density.par_iter().sum()
    }

    // Drop the arrays; the state is unusable afterwards
    pub fn release(&mut self) {
        for kind in FieldKind::ALL {
            *self.field_vec(kind) = Vec::new();
        }
    }

    fn field_vec(&mut self, kind: FieldKind) -> &mut Vec<f32> {
        match kind {
            FieldKind::Density => &mut self.density,
            FieldKind::VelocityX => &mut self.velocity_x,
            FieldKind::VelocityY => &mut self.velocity_y,
            FieldKind::VelocityZ => &mut self.velocity_z,
            FieldKind::Temp => &mut self.temp,
            FieldKind::Pressure => &mut self.pressure,
            FieldKind::Temperature => &mut self.temperature,
            FieldKind::Divergence => &mut self.divergence,
        }
    }
}


/// Two states, `current` and `next`, with an explicit active slot.
///
/// `swap` only flips the slot; field arrays are never copied to swap.
#[derive(Clone, Debug)]
pub struct BufferPair {
    slots: [FluidState; 2],
    current: usize,
}

impl BufferPair {
    pub fn new(grid: Grid) -> Self {
        Self {
            slots: [FluidState::new(grid), FluidState::new(grid)],
            current: 0,
        }
    }

    pub fn current(&self) -> &FluidState {
        &self.slots[self.current]
    }

    pub fn current_mut(&mut self) -> &mut FluidState {
        &mut self.slots[self.current]
    }

    pub fn next(&self) -> &FluidState {
        &self.slots[1 - self.current]
    }

    pub fn next_mut(&mut self) -> &mut FluidState {
        &mut self.slots[1 - self.current]
    }

    /// Borrow `current` for reading and `next` for writing at the same time.
    pub fn split_mut(&mut self) -> (&FluidState, &mut FluidState) {
        let (first, second) = self.slots.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    // Start a step from a copy of `current`
    pub fn seed_next(&mut self) {
        let (current, next) = self.split_mut();
        next.copy_from(current);
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    pub fn fill_zero(&mut self) {
        for slot in &mut self.slots {
            slot.fill_zero();
        }
    }

    pub fn release(&mut self) {
        for slot in &mut self.slots {
            slot.release();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idx_layout_is_x_fastest() {
        let grid = Grid::new(4);
        assert_eq!(grid.idx(1, 0, 0), 1);
        assert_eq!(grid.idx(0, 1, 0), 4);
        assert_eq!(grid.idx(0, 0, 1), 16);
        assert_eq!(grid.decode(grid.idx(3, 2, 1)), (3, 2, 1));
    }

    #[test]
    fn test_idx_saturates_out_of_range() {
        let grid = Grid::new(5);
        assert_eq!(grid.idx(-3, 2, 2), grid.idx(0, 2, 2));
        assert_eq!(grid.idx(2, 99, 2), grid.idx(2, 4, 2));
        assert_eq!(grid.idx_f(-0.5, 4.9, 7.2), grid.idx(0, 4, 4));
    }

    #[test]
    fn test_sample_at_cell_centre_returns_cell_value() {
        let grid = Grid::new(4);
        let mut field = vec![0.0; grid.cell_count()];
        field[grid.idx(1, 2, 1)] = 3.0;
        assert_eq!(grid.sample(&field, 1.0, 2.0, 1.0), 3.0);
        assert_eq!(grid.sample(&field, 1.5, 2.0, 1.0), 1.5);
    }

    #[test]
    fn test_interior_visits_only_inner_cells() {
        let grid = Grid::new(5);
        let cells: Vec<_> = grid.interior().collect();
        assert_eq!(cells.len(), 27);
        assert!(cells.iter().all(|&(i, j, k)| (1..4).contains(&i) && (1..4).contains(&j) && (1..4).contains(&k)));
        assert_eq!(cells[0], (1, 1, 1));
        assert_eq!(cells[1], (2, 1, 1));
    }

    #[test]
    fn test_par_update_interior_leaves_walls() {
        let grid = Grid::new(4);
        let mut field = vec![-1.0; grid.cell_count()];
        grid.par_update_interior(&mut field, |_, _, _, index, cell| *cell = index as f32);
        assert_eq!(field[grid.idx(1, 1, 1)], grid.idx(1, 1, 1) as f32);
        assert_eq!(field[grid.idx(0, 1, 1)], -1.0);
        assert_eq!(field[grid.idx(1, 1, 3)], -1.0);
    }

    #[test]
    fn test_buffer_swap_transfers_roles() {
        let grid = Grid::new(3);
        let mut buffers = BufferPair::new(grid);
        buffers.next_mut().density[0] = 2.0;
        buffers.swap();
        assert_eq!(buffers.current().density[0], 2.0);
        assert_eq!(buffers.next().density[0], 0.0);

        buffers.seed_next();
        assert_eq!(buffers.next().density[0], 2.0);
    }

    #[test]
    fn test_normalize_eps_handles_zero() {
        let v = Vector3::default().normalize_eps(1e-5);
        assert_eq!(v, Vector3::default());
        let u = Vector3::new(3.0, 0.0, 4.0).normalize_eps(0.0);
        assert!((u.magnitude() - 1.0).abs() < 1e-6);
    }
}
