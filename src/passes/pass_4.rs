//! Pass 4: Rasterization

use crate::config::Config;
use crate::error::Result as PreprocessResult;
use crate::midi::Note;
use crate::passes::pass_5;
use crate::state::{Candidate, DocumentState};
use ndarray::Array2;

/// Column span `[start, end)` covered by a note in a window of `window_ticks`
/// rendered into `columns` columns. Always at least one column wide.
pub fn column_span(note: &Note, window_ticks: u32, columns: usize) -> Option<(usize, usize)> {
    if window_ticks == 0 || columns == 0 {
        return None;
    }
    let window = u64::from(window_ticks);
    let cols = columns as u64;

    let start = (u64::from(note.onset_ticks) * cols / window).min(cols - 1);
    // ceil(end / window * columns), capped at the window edge
    let end = (u64::from(note.end_ticks()) * cols)
        .div_ceil(window)
        .min(cols)
        .max(start + 1);

    Some((start as usize, end as usize))
}

/// Render window-local notes into a `dimensions.y x dimensions.x` matrix.
///
/// Rows are pitches (see [`crate::config::PitchConfig::row_for`]), columns
/// are time steps. Overlapping notes keep the loudest intensity per cell.
pub fn render(notes: &[Note], config: &Config, window_ticks: u32) -> Array2<f32> {
    let rows = config.dimensions.y;
    let columns = config.dimensions.x;
    let mut matrix = Array2::<f32>::zeros((rows, columns));

    for note in notes {
        let Some(row) = config.pitch.row_for(note.pitch, rows) else {
            continue;
        };
        let Some((start, end)) = column_span(note, window_ticks, columns) else {
            continue;
        };
        let intensity = note.velocity.clamp(0.0, 1.0) * config.velocity.max_intensity;

        for col in start..end {
            let cell = &mut matrix[[row, col]];
            if intensity > *cell {
                *cell = intensity;
            }
        }
    }

    matrix
}

/// Run Pass 4
///
/// Each matrix goes straight to validation once rendered, so at most one
/// unvalidated matrix exists at a time.
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 4: Rasterization ({})", state.name);

    for idx in 0..state.variants.len() {
        let variant = &state.variants[idx];
        let candidate = Candidate {
            window_index: variant.window_index,
            semitones: variant.semitones,
            matrix: render(&variant.notes, config, variant.length_ticks),
        };
        pass_5::admit(state, candidate, config);
    }

    log::debug!(
        "  rendered {} candidate matrices ({}x{})",
        state.variants.len(),
        config.dimensions.y,
        config.dimensions.x
    );
    Ok(())
}
