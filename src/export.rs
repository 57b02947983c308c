//! Matrix and report export

use crate::analysis::BatchReport;
use crate::error::{PreprocessError, Result as PreprocessResult};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Nested row-major representation: `rows[y][x]`
pub fn to_rows(matrix: &Array2<f32>) -> Vec<Vec<f32>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}

/// Rebuild a matrix from nested rows; every row must have the same length
pub fn from_rows(rows: &[Vec<f32>]) -> PreprocessResult<Array2<f32>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != n_cols) {
        return Err(PreprocessError::ExportError(
            "ragged matrix rows".to_string(),
        ));
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PreprocessError::ExportError(format!("bad matrix shape: {}", e)))
}

/// Write matrices as a JSON array of `rows[y][x]`
pub fn write_matrices<P: AsRef<Path>>(path: P, matrices: &[Array2<f32>]) -> PreprocessResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let nested: Vec<Vec<Vec<f32>>> = matrices.iter().map(to_rows).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &nested)?;
    writer.flush()?;

    log::info!("Exported {} matrices to {}", matrices.len(), path.display());
    Ok(())
}

/// Read matrices written by [`write_matrices`]
pub fn read_matrices<P: AsRef<Path>>(path: P) -> PreprocessResult<Vec<Array2<f32>>> {
    let reader = BufReader::new(File::open(path)?);
    let nested: Vec<Vec<Vec<f32>>> = serde_json::from_reader(reader)?;
    nested.iter().map(|rows| from_rows(rows)).collect()
}

/// Write the batch report as pretty JSON
pub fn write_report<P: AsRef<Path>>(path: P, report: &BatchReport) -> PreprocessResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
