//! Validation tests for Pass 1: Quantization

mod common;

use common::{document, track};
use midi2matrix::config::{Config, GridResolution};
use midi2matrix::midi::Note;
use midi2matrix::passes::{pass_0, pass_1};
use midi2matrix::{DocumentState, PreprocessError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Notes with arbitrary, unaligned timing
fn random_notes(seed: u64, count: usize) -> Vec<Note> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Note::new(
                rng.gen_range(0..20_000),
                rng.gen_range(0..2_000),
                rng.gen_range(0..128),
                rng.gen_range(0.0..=1.0),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_from_resolution() {
        // Eighth-note grid at 480 PPQ is 240 ticks, sixteenth is 120
        assert_eq!(GridResolution::new(1, 8).step_ticks(480), 240);
        assert_eq!(GridResolution::new(1, 16).step_ticks(480), 120);
        assert_eq!(GridResolution::new(1, 4).step_ticks(96), 96);
        // Dotted-eighth style fractions work too
        assert_eq!(GridResolution::new(3, 16).step_ticks(480), 360);
    }

    #[test]
    fn test_snaps_onset_and_end_down() {
        let note = Note::new(250, 500, 64, 0.5);
        let q = pass_1::quantize_note(&note, 240);
        // onset 250 -> 240, end 750 -> 720
        assert_eq!(q.onset_ticks, 240);
        assert_eq!(q.duration_ticks, 480);
        assert_eq!(q.pitch, 64);
        assert_eq!(q.velocity, 0.5);
    }

    #[test]
    fn test_short_note_collapses_to_zero_duration() {
        let note = Note::new(130, 50, 60, 1.0);
        let q = pass_1::quantize_note(&note, 120);
        assert_eq!(q.onset_ticks, 120);
        assert_eq!(q.duration_ticks, 0);
    }

    #[test]
    fn test_quantization_is_idempotent() {
        for seed in 0..10 {
            let notes = random_notes(seed, 200);
            for step in [1, 60, 120, 240, 333, 480] {
                let once = pass_1::quantize_notes(&notes, step);
                let twice = pass_1::quantize_notes(&once, step);
                assert_eq!(once, twice, "seed {} step {}", seed, step);
            }
        }
    }

    #[test]
    fn test_quantized_ticks_are_on_grid() {
        let notes = random_notes(42, 500);
        let quantized = pass_1::quantize_notes(&notes, 120);
        for note in &quantized {
            assert_eq!(note.onset_ticks % 120, 0);
            assert_eq!(note.end_ticks() % 120, 0);
        }
        // Input untouched
        assert_eq!(notes, random_notes(42, 500));
    }

    #[test]
    fn test_run_uses_document_ppq() {
        let mut config = Config::default();
        config.quantize.horizontal_resolution = GridResolution::new(1, 8);
        let notes = vec![Note::new(100, 100, 60, 1.0), Note::new(130, 200, 62, 1.0)];
        let mut state = DocumentState::new("q.mid", document(96, vec![track(0, 0, notes)]));

        pass_0::run(&mut state, &config).unwrap();
        pass_1::run(&mut state, &config).unwrap();

        assert_eq!(state.quantization_step_ticks, 48);
        assert_eq!(state.quantized_notes[0], Note::new(96, 96, 60, 1.0));
        assert_eq!(state.quantized_notes[1], Note::new(96, 192, 62, 1.0));
    }

    #[test]
    fn test_empty_selected_track_fails() {
        let config = Config::default();
        let mut state = DocumentState::new("silent.mid", document(480, vec![track(0, 0, vec![])]));
        pass_0::run(&mut state, &config).unwrap();
        let err = pass_1::run(&mut state, &config).unwrap_err();
        assert!(matches!(err, PreprocessError::EmptyTrack(_)));
    }

    #[test]
    fn test_missing_selection_fails() {
        let config = Config::default();
        let mut state = DocumentState::new("skipped.mid", document(480, vec![]));
        assert!(pass_1::run(&mut state, &config).is_err());
    }
}
