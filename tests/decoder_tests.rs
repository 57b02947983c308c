//! Validation tests for the MIDI decoder adapter

mod common;

use common::{midi_bytes, piano_file, FixtureTrack};
use midi2matrix::midi::{decode_smf, Decoder, MidlyDecoder, TimeSignature};
use midi2matrix::PreprocessError;
use midly::num::{u28, u4, u7};
use midly::{Format, Fps, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_notes_and_timing() {
        let bytes = piano_file(vec![(0, 480, 60, 127), (480, 240, 64, 64)], 1920);
        let doc = MidlyDecoder.decode(&bytes).unwrap();

        assert_eq!(doc.ticks_per_quarter_note, 480);
        assert_eq!(doc.time_signatures, vec![TimeSignature::new(4, 4)]);
        assert_eq!(doc.total_duration_ticks, 1920);
        assert_eq!(doc.tracks.len(), 1);

        let notes = &doc.tracks[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].onset_ticks, notes[0].duration_ticks, notes[0].pitch), (0, 480, 60));
        assert_eq!(notes[0].velocity, 1.0);
        assert_eq!((notes[1].onset_ticks, notes[1].duration_ticks, notes[1].pitch), (480, 240, 64));
        assert!((notes[1].velocity - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_instrument_from_program_change() {
        let tracks = [
            FixtureTrack {
                channel: 2,
                program: Some(33),
                notes: vec![(0, 480, 40, 100)],
            },
            FixtureTrack::drums(vec![(0, 120, 36, 100), (480, 120, 38, 100)]),
        ];
        let doc = decode_smf(&midi_bytes(480, None, 960, &tracks)).unwrap();

        assert_eq!(doc.tracks.len(), 2);
        assert_eq!(doc.tracks[0].instrument.program, 33);
        assert_eq!(doc.tracks[0].instrument.channel, 2);
        assert!(doc.tracks[1].instrument.is_drum_channel());
        assert_eq!(doc.tracks[1].instrument.program, 0);
        assert!(doc.time_signatures.is_empty());
    }

    #[test]
    fn test_splits_single_track_by_channel() {
        // Format-0 style: piano on channel 0 and drums on channel 9 in one track
        let events = vec![
            TrackEvent {
                delta: u28::from(0),
                kind: TrackEventKind::Midi {
                    channel: u4::from(0),
                    message: MidiMessage::NoteOn { key: u7::from(60), vel: u7::from(100) },
                },
            },
            TrackEvent {
                delta: u28::from(0),
                kind: TrackEventKind::Midi {
                    channel: u4::from(9),
                    message: MidiMessage::NoteOn { key: u7::from(36), vel: u7::from(100) },
                },
            },
            TrackEvent {
                delta: u28::from(240),
                kind: TrackEventKind::Midi {
                    channel: u4::from(9),
                    // Note-on with velocity zero ends the note
                    message: MidiMessage::NoteOn { key: u7::from(36), vel: u7::from(0) },
                },
            },
            TrackEvent {
                delta: u28::from(240),
                kind: TrackEventKind::Midi {
                    channel: u4::from(0),
                    message: MidiMessage::NoteOff { key: u7::from(60), vel: u7::from(0) },
                },
            },
            TrackEvent {
                delta: u28::from(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ];
        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(480.into())),
            tracks: vec![events],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();

        let doc = decode_smf(&bytes).unwrap();
        assert_eq!(doc.tracks.len(), 2);
        assert_eq!(doc.tracks[0].instrument.channel, 0);
        assert_eq!(doc.tracks[0].notes[0].duration_ticks, 480);
        assert_eq!(doc.tracks[1].instrument.channel, 9);
        assert_eq!(doc.tracks[1].notes[0].duration_ticks, 240);
    }

    #[test]
    fn test_unterminated_note_ends_with_track() {
        let events = vec![
            TrackEvent {
                delta: u28::from(100),
                kind: TrackEventKind::Midi {
                    channel: u4::from(0),
                    message: MidiMessage::NoteOn { key: u7::from(72), vel: u7::from(90) },
                },
            },
            TrackEvent {
                delta: u28::from(900),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ];
        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(480.into())),
            tracks: vec![events],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();

        let doc = decode_smf(&bytes).unwrap();
        assert_eq!(doc.total_duration_ticks, 1000);
        assert_eq!(doc.tracks[0].notes[0].onset_ticks, 100);
        assert_eq!(doc.tracks[0].notes[0].duration_ticks, 900);
    }

    #[test]
    fn test_repeated_key_pairs_first_in_first_out() {
        let bytes = piano_file(vec![(0, 960, 60, 100), (480, 960, 60, 50)], 1920);
        let doc = decode_smf(&bytes).unwrap();
        let notes = &doc.tracks[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].onset_ticks, 0);
        assert_eq!(notes[1].onset_ticks, 480);
        // First note-off closes the oldest sounding note
        assert_eq!(notes[0].duration_ticks, 960);
        assert_eq!(notes[1].duration_ticks, 960);
    }

    #[test]
    fn test_three_four_meter() {
        let bytes = midi_bytes(96, Some((3, 4)), 288, &[FixtureTrack::piano(vec![(0, 96, 60, 80)])]);
        let doc = decode_smf(&bytes).unwrap();
        assert_eq!(doc.time_signatures, vec![TimeSignature::new(3, 4)]);
        assert_eq!(doc.ticks_per_quarter_note, 96);
    }

    #[test]
    fn test_timecode_rejected() {
        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Timecode(Fps::Fps25, 40)),
            tracks: vec![vec![TrackEvent {
                delta: u28::from(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            }]],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();

        let err = decode_smf(&bytes).unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        let mut bytes = piano_file(vec![(0, 480, 60, 100)], 1920);
        bytes.truncate(10);
        assert!(matches!(decode_smf(&bytes), Err(PreprocessError::Decode(_))));
        assert!(matches!(decode_smf(&[]), Err(PreprocessError::Decode(_))));
    }
}
