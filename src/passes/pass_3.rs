//! Pass 3: Transposition Augmentation

use crate::config::Config;
use crate::error::Result as PreprocessResult;
use crate::midi::Note;
use crate::state::{DocumentState, WindowVariant};

/// Shift every note by `semitones`, dropping notes pushed outside MIDI range.
///
/// Octave and pitch-class names are derived from `pitch`, so they follow
/// the shifted value automatically.
pub fn transpose(notes: &[Note], semitones: i32) -> Vec<Note> {
    notes
        .iter()
        .filter_map(|note| {
            let shifted = i32::from(note.pitch) + semitones;
            u8::try_from(shifted)
                .ok()
                .filter(|&pitch| pitch <= 127)
                .map(|pitch| Note { pitch, ..*note })
        })
        .collect()
}

/// The untransposed shift followed by each configured one
pub fn shifts(config: &Config) -> Vec<i32> {
    std::iter::once(0)
        .chain(config.augment.transpositions.iter().copied())
        .collect()
}

/// Run Pass 3
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 3: Transposition ({})", state.name);

    let shifts = shifts(config);
    let mut variants = Vec::with_capacity(state.windows.len() * shifts.len());

    for window in &state.windows {
        for &semitones in &shifts {
            let notes = if semitones == 0 {
                window.notes.clone()
            } else {
                transpose(&window.notes, semitones)
            };
            variants.push(WindowVariant {
                window_index: window.index,
                semitones,
                length_ticks: window.length_ticks,
                notes,
            });
        }
    }

    log::debug!(
        "  {} variants from {} non-empty windows (shifts {:?})",
        variants.len(),
        state.windows.len(),
        shifts
    );

    state.candidate_count = state.window_count.saturating_mul(shifts.len());
    state.variants = variants;
    Ok(())
}
