//! QA artifacts: grayscale previews of emitted matrices

use crate::error::{PreprocessError, Result as PreprocessResult};
use ndarray::Array2;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Pixels per matrix cell in previews
const CELL_PX: u32 = 4;

/// Render up to `limit` matrices as PNG files named `matrix_00000.png`, ...
///
/// Time runs left to right, pitch bottom to top, intensity `max_intensity`
/// is white.
pub fn write_previews(
    output_dir: &Path,
    matrices: &[Array2<f32>],
    limit: usize,
    max_intensity: f32,
) -> PreprocessResult<Vec<PathBuf>> {
    if limit == 0 || matrices.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for (idx, matrix) in matrices.iter().take(limit).enumerate() {
        let path = output_dir.join(format!("matrix_{:05}.png", idx));
        draw_matrix(matrix, &path, max_intensity)?;
        written.push(path);
    }

    log::info!(
        "QA previews for {} matrices written to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

/// Gray level for an intensity
fn gray(value: f32, max_intensity: f32) -> RGBColor {
    let level = if max_intensity > 0.0 {
        (value / max_intensity).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let byte = (level * 255.0).round() as u8;
    RGBColor(byte, byte, byte)
}

fn draw_matrix(matrix: &Array2<f32>, path: &Path, max_intensity: f32) -> PreprocessResult<()> {
    let (rows, cols) = matrix.dim();
    if rows == 0 || cols == 0 {
        return Err(PreprocessError::ExportError(format!(
            "cannot preview an empty {}x{} matrix",
            rows, cols
        )));
    }

    let width = cols as u32 * CELL_PX;
    let height = rows as u32 * CELL_PX;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&BLACK).map_err(|e| {
        PreprocessError::ExportError(format!("Failed to fill preview background: {:?}", e))
    })?;

    let cell = CELL_PX as i32;
    for ((row, col), &value) in matrix.indexed_iter() {
        if value == 0.0 {
            continue;
        }
        // Row 0 is the lowest pitch, drawn at the bottom
        let top = (rows - 1 - row) as i32 * cell;
        let left = col as i32 * cell;
        root.draw(&Rectangle::new(
            [(left, top), (left + cell, top + cell)],
            gray(value, max_intensity).filled(),
        ))
        .map_err(|e| PreprocessError::ExportError(format!("Failed to draw cell: {:?}", e)))?;
    }

    root.present().map_err(|e| {
        PreprocessError::ExportError(format!("Failed to write {}: {:?}", path.display(), e))
    })?;
    Ok(())
}
