use crate::error::RenderError;
use crate::grid::Grid;
use crate::visualization::extract_slice;
use plotters::prelude::*;
use std::path::Path;

// Blue (empty) to red (peak)
fn heat_color(t: f32) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    RGBColor((255.0 * t) as u8, (64.0 * (1.0 - t)) as u8, (255.0 * (1.0 - t)) as u8)
}

/// Write the z = `depth` slab of `field` as a PNG heat map, normalized to its own peak.
///
/// Each cell becomes a `scale`×`scale` square; the y axis points up.
pub fn save_slice_png(
    path: impl AsRef<Path>,
    grid: &Grid,
    field: &[f32],
    depth: usize,
    scale: u32,
) -> Result<(), RenderError> {
    let n = grid.size();
    if depth >= n {
        return Err(RenderError::SliceOutOfRange { depth, size: n });
    }
    let slice = extract_slice(grid, field, depth);
    let peak = slice.iter().copied().fold(0.0f32, f32::max).max(f32::EPSILON);

    let side = n as u32 * scale;
    let root = BitMapBackend::new(path.as_ref(), (side, side)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| RenderError::Snapshot(e.to_string()))?;

    // split_evenly yields rows from the top of the image
    let cells = root.split_evenly((n, n));
    for (area_index, area) in cells.iter().enumerate() {
        let i = area_index % n;
        let j = n - 1 - area_index / n;
        area.fill(&heat_color(slice[i + j * n] / peak))
            .map_err(|e| RenderError::Snapshot(e.to_string()))?;
    }

    root.present().map_err(|e| RenderError::Snapshot(e.to_string()))?;
    log::info!("saved density slice {} to {}", depth, path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(0.0), RGBColor(0, 64, 255));
        assert_eq!(heat_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(heat_color(7.0), RGBColor(255, 0, 0));
    }

    #[test]
    fn test_snapshot_is_written() {
        let grid = Grid::new(6);
        let mut field = vec![0.0; grid.cell_count()];
        field[grid.idx(2, 3, 3)] = 1.0;
        let path = std::env::temp_dir().join("voxel_fluid_slice_test.png");

        save_slice_png(&path, &grid, &field, 3, 2).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_snapshot_rejects_bad_depth() {
        let grid = Grid::new(4);
        let field = vec![0.0; grid.cell_count()];
        let result = save_slice_png(std::env::temp_dir().join("unused.png"), &grid, &field, 9, 1);
        assert!(matches!(result, Err(RenderError::SliceOutOfRange { depth: 9, size: 4 })));
    }
}
