//! Pass 1: Quantization

use crate::config::Config;
use crate::error::{PreprocessError, Result as PreprocessResult};
use crate::midi::Note;
use crate::state::DocumentState;

/// Snap a tick value down to the grid
pub fn snap_down(ticks: u32, step: u32) -> u32 {
    if step == 0 {
        return ticks;
    }
    ticks / step * step
}

/// Snap a note's onset and end down to the grid; pitch and velocity pass through
pub fn quantize_note(note: &Note, step: u32) -> Note {
    let onset = snap_down(note.onset_ticks, step);
    let end = snap_down(note.end_ticks(), step);
    Note {
        onset_ticks: onset,
        duration_ticks: end - onset,
        ..*note
    }
}

/// Quantize a note list. Idempotent for a fixed step.
pub fn quantize_notes(notes: &[Note], step: u32) -> Vec<Note> {
    notes.iter().map(|note| quantize_note(note, step)).collect()
}

/// Run Pass 1
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 1: Quantization ({})", state.name);

    let track = state.selected_track.as_ref().ok_or_else(|| {
        PreprocessError::NoValidTrack("quantization needs a selected track".to_string())
    })?;

    let step = config
        .quantize
        .horizontal_resolution
        .step_ticks(state.ppq());
    let quantized = quantize_notes(&track.notes, step);

    if quantized.is_empty() {
        return Err(PreprocessError::EmptyTrack(format!(
            "selected track (program {}) has no notes",
            track.instrument.program
        )));
    }

    log::debug!(
        "  quantized {} notes to a {}-tick grid ({})",
        quantized.len(),
        step,
        config.quantize.horizontal_resolution
    );

    state.quantization_step_ticks = step;
    state.quantized_notes = quantized;
    Ok(())
}
