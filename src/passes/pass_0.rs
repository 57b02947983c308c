//! Pass 0: Track Selection

use crate::config::{Config, TrackSelectionConfig};
use crate::error::{PreprocessError, Result as PreprocessResult};
use crate::midi::{Instrument, Track};
use crate::state::DocumentState;

/// Is this instrument a pitched (chromatic) one?
pub fn is_pitched(instrument: &Instrument, config: &TrackSelectionConfig) -> bool {
    if config.skip_drum_channel && instrument.is_drum_channel() {
        return false;
    }
    config.pitched_programs.contains(&instrument.program)
}

/// Pick the pitched track with the most notes; ties go to the earliest track.
///
/// Returns the index of the track within `tracks`.
pub fn select_track(tracks: &[Track], config: &TrackSelectionConfig) -> PreprocessResult<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, track) in tracks.iter().enumerate() {
        if !is_pitched(&track.instrument, config) {
            continue;
        }
        let count = track.notes.len();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((idx, count)),
        }
    }

    best.map(|(idx, _)| idx).ok_or_else(|| {
        PreprocessError::NoValidTrack(format!(
            "none of {} tracks uses a pitched instrument",
            tracks.len()
        ))
    })
}

/// Run Pass 0
pub fn run(state: &mut DocumentState, config: &Config) -> PreprocessResult<()> {
    log::debug!("Pass 0: Track Selection ({})", state.name);

    let idx = select_track(&state.document.tracks, &config.tracks)?;
    let track = state.document.tracks[idx].clone();

    log::debug!(
        "  selected track {} of {} (program {}, channel {}, {} notes)",
        idx,
        state.document.tracks.len(),
        track.instrument.program,
        track.instrument.channel,
        track.notes.len()
    );

    state.selected_track_index = Some(idx);
    state.selected_track = Some(track);
    Ok(())
}
