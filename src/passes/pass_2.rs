//! Pass 2: Measure-aligned Segmentation
//!
//! Only the first declared time signature is honored; later meter changes
//! are ignored.

use crate::config::Config;
use crate::error::{PreprocessError, Result as PreprocessResult};
use crate::midi::Note;
use crate::state::{DocumentState, Window};
use std::collections::BTreeMap;

/// Number of windows of `window_ticks` needed to cover `[0, total_ticks)`
pub fn window_count(window_ticks: u32, total_ticks: u32) -> usize {
    if window_ticks == 0 {
        return 0;
    }
    total_ticks.div_ceil(window_ticks) as usize
}

/// Slice `notes` into windows of `window_ticks` covering `[0, total_ticks)`.
///
/// A note belongs to the window containing its onset and is never split;
/// its ticks are re-based to the window start. Only windows holding at
/// least one note are returned, in temporal order; see [`window_count`]
/// for the full count.
pub fn segment(notes: &[Note], window_ticks: u32, total_ticks: u32) -> Vec<Window> {
    let n_windows = window_count(window_ticks, total_ticks);
    if n_windows == 0 {
        return Vec::new();
    }
    let mut occupied: BTreeMap<usize, Window> = BTreeMap::new();

    for note in notes {
        let index = (note.onset_ticks / window_ticks) as usize;
        if index >= n_windows {
            continue;
        }
        let window = occupied.entry(index).or_insert_with(|| Window {
            index,
            start_ticks: index as u32 * window_ticks,
            length_ticks: window_ticks,
            notes: Vec::new(),
        });
        window.notes.push(Note {
            onset_ticks: note.onset_ticks - window.start_ticks,
            ..*note
        });
    }

    occupied.into_values().collect()
}

/// Run Pass 2
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 2: Segmentation ({})", state.name);

    let ppq = state.ppq();
    let time_signature = state
        .document
        .first_time_signature(config.segment.default_time_signature);
    if state.document.time_signatures.len() > 1 {
        log::debug!(
            "  {} declares {} meters, using the first ({})",
            state.name,
            state.document.time_signatures.len(),
            time_signature
        );
    }

    let ticks_per_measure = time_signature.ticks_per_measure(ppq);
    let window_ticks = ticks_per_measure
        .checked_mul(config.segment.step_size_x)
        .filter(|&ticks| ticks > 0)
        .ok_or_else(|| {
            PreprocessError::Decode(format!(
                "cannot build windows from {} at {} ticks per quarter note",
                time_signature, ppq
            ))
        })?;

    let total_ticks = state.document.total_duration_ticks;
    let windows = segment(&state.quantized_notes, window_ticks, total_ticks);
    let window_count = window_count(window_ticks, total_ticks);

    log::debug!(
        "  {} windows ({} with notes) of {} measures ({} ticks, meter {})",
        window_count,
        windows.len(),
        config.segment.step_size_x,
        window_ticks,
        time_signature
    );

    state.time_signature = Some(time_signature);
    state.ticks_per_measure = ticks_per_measure;
    state.window_count = window_count;
    state.windows = windows;
    Ok(())
}
