//! Pass 5: Matrix Validation

use crate::config::Config;
use crate::error::Result as PreprocessResult;
use crate::state::{Candidate, DocumentState};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a candidate matrix was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    ShapeMismatch,
    Empty,
    TooFewPitches,
    TooFewNotes,
}

impl Rejection {
    pub fn name(&self) -> &'static str {
        match self {
            Rejection::ShapeMismatch => "shape_mismatch",
            Rejection::Empty => "empty",
            Rejection::TooFewPitches => "too_few_pitches",
            Rejection::TooFewNotes => "too_few_notes",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows holding at least one non-zero cell
pub fn occupied_rows(matrix: &Array2<f32>) -> usize {
    matrix
        .axis_iter(Axis(0))
        .filter(|row| row.iter().any(|&v| v != 0.0))
        .count()
}

/// Non-zero cells
pub fn occupied_cells(matrix: &Array2<f32>) -> usize {
    matrix.iter().filter(|&&v| v != 0.0).count()
}

/// Check a matrix against shape and content thresholds; the first failing
/// check is reported.
pub fn check(matrix: &Array2<f32>, config: &Config) -> Result<(), Rejection> {
    if matrix.nrows() != config.dimensions.y || matrix.ncols() != config.dimensions.x {
        return Err(Rejection::ShapeMismatch);
    }

    let cells = occupied_cells(matrix);
    if cells == 0 {
        return Err(Rejection::Empty);
    }
    if occupied_rows(matrix) < config.validation.minimum_different_pitches {
        return Err(Rejection::TooFewPitches);
    }
    if cells < config.validation.minimum_notes {
        return Err(Rejection::TooFewNotes);
    }
    Ok(())
}

pub fn is_valid(matrix: &Array2<f32>, config: &Config) -> bool {
    check(matrix, config).is_ok()
}

/// Keep a rendered matrix or tally why it was discarded
pub fn admit(state: &mut DocumentState, candidate: Candidate, config: &Config) {
    match check(&candidate.matrix, config) {
        Ok(()) => state.accepted.push(candidate.matrix),
        Err(reason) => {
            log::trace!(
                "  window {} shift {:+} rejected: {}",
                candidate.window_index,
                candidate.semitones,
                reason
            );
            *state.rejections.entry(reason).or_insert(0) += 1;
        }
    }
}

/// Run Pass 5
///
/// Windows without notes were never rendered; each of their (window, shift)
/// pairs is tallied as [`Rejection::Empty`] here.
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 5: Validation ({})", state.name);

    let skipped = state.candidate_count.saturating_sub(state.variants.len());
    if skipped > 0 {
        *state.rejections.entry(Rejection::Empty).or_insert(0) += skipped;
    }

    let rejected: usize = state.rejections.values().sum();
    log::debug!(
        "  accepted {} of {} matrices ({}x{}), rejected {}",
        state.accepted.len(),
        state.candidate_count,
        config.dimensions.y,
        config.dimensions.x,
        rejected
    );
    Ok(())
}
