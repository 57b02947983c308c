//! Shared fixtures: in-memory MIDI files and documents
#![allow(dead_code)]

use midi2matrix::midi::{Document, Instrument, Note, TimeSignature, Track};
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

/// One channel's worth of notes in a fixture file
#[derive(Debug, Clone)]
pub struct FixtureTrack {
    pub channel: u8,
    pub program: Option<u8>,
    /// (onset, duration, key, velocity 0-127)
    pub notes: Vec<(u32, u32, u8, u8)>,
}

impl FixtureTrack {
    pub fn piano(notes: Vec<(u32, u32, u8, u8)>) -> Self {
        Self {
            channel: 0,
            program: Some(0),
            notes,
        }
    }

    pub fn drums(notes: Vec<(u32, u32, u8, u8)>) -> Self {
        Self {
            channel: 9,
            program: None,
            notes,
        }
    }
}

enum Pending {
    Program(u8, u8),
    On(u8, u8, u8),
    Off(u8, u8),
    TimeSignature(u8, u8),
}

fn order(event: &Pending) -> u8 {
    // Meta and program first, then note-offs before note-ons on the same tick
    match event {
        Pending::TimeSignature(..) => 0,
        Pending::Program(..) => 1,
        Pending::Off(..) => 2,
        Pending::On(..) => 3,
    }
}

/// Encode a Standard MIDI File. Each fixture track becomes one SMF track;
/// the meter (if any) goes on the first track at tick 0, and every track
/// ends at `length_ticks` (or its last note-off, whichever is later).
pub fn midi_bytes(
    ppq: u16,
    time_signature: Option<(u8, u8)>,
    length_ticks: u32,
    tracks: &[FixtureTrack],
) -> Vec<u8> {
    let mut smf_tracks = Vec::new();

    for (track_idx, track) in tracks.iter().enumerate() {
        let mut pending: Vec<(u32, Pending)> = Vec::new();
        if track_idx == 0 {
            if let Some((num, den)) = time_signature {
                pending.push((0, Pending::TimeSignature(num, den.trailing_zeros() as u8)));
            }
        }
        if let Some(program) = track.program {
            pending.push((0, Pending::Program(track.channel, program)));
        }
        for &(onset, duration, key, vel) in &track.notes {
            pending.push((onset, Pending::On(track.channel, key, vel)));
            pending.push((onset + duration, Pending::Off(track.channel, key)));
        }
        pending.sort_by_key(|(tick, event)| (*tick, order(event)));

        let mut events = Vec::new();
        let mut current = 0u32;
        for (tick, event) in pending {
            let kind = match event {
                Pending::TimeSignature(num, den_log2) => {
                    TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_log2, 24, 8))
                }
                Pending::Program(channel, program) => TrackEventKind::Midi {
                    channel: u4::from(channel),
                    message: MidiMessage::ProgramChange {
                        program: u7::from(program),
                    },
                },
                Pending::On(channel, key, vel) => TrackEventKind::Midi {
                    channel: u4::from(channel),
                    message: MidiMessage::NoteOn {
                        key: u7::from(key),
                        vel: u7::from(vel),
                    },
                },
                Pending::Off(channel, key) => TrackEventKind::Midi {
                    channel: u4::from(channel),
                    message: MidiMessage::NoteOff {
                        key: u7::from(key),
                        vel: u7::from(0),
                    },
                },
            };
            events.push(TrackEvent {
                delta: u28::from(tick - current),
                kind,
            });
            current = tick;
        }

        events.push(TrackEvent {
            delta: u28::from(length_ticks.saturating_sub(current)),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf_tracks.push(events);
    }

    let format = if smf_tracks.len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let smf = Smf {
        header: Header::new(format, Timing::Metrical(u15::from(ppq))),
        tracks: smf_tracks,
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes).expect("fixture MIDI should encode");
    bytes
}

/// Single piano track at 480 PPQ in 4/4
pub fn piano_file(notes: Vec<(u32, u32, u8, u8)>, length_ticks: u32) -> Vec<u8> {
    midi_bytes(480, Some((4, 4)), length_ticks, &[FixtureTrack::piano(notes)])
}

/// Document with the given tracks, one 4/4 meter, duration covering all notes
pub fn document(ppq: u32, tracks: Vec<Track>) -> Document {
    let total = tracks
        .iter()
        .flat_map(|t| t.notes.iter().map(Note::end_ticks))
        .max()
        .unwrap_or(0);
    Document {
        tracks,
        ticks_per_quarter_note: ppq,
        time_signatures: vec![TimeSignature::new(4, 4)],
        total_duration_ticks: total,
    }
}

pub fn track(program: u8, channel: u8, notes: Vec<Note>) -> Track {
    Track::new(Instrument { program, channel }, notes)
}

/// Ascending run of quarter notes at 480 PPQ
pub fn scale_notes(start_pitch: u8, count: u32) -> Vec<Note> {
    (0..count)
        .map(|i| Note::new(i * 480, 480, start_pitch + i as u8, 0.8))
        .collect()
}
