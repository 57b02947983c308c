//! MIDI data model and decoding

use crate::error::{PreprocessError, Result as PreprocessResult};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A single note; values are replaced, never mutated, by later passes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub onset_ticks: u32,
    pub duration_ticks: u32,
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// Normalized velocity in [0, 1]
    pub velocity: f32,
}

impl Note {
    pub fn new(onset_ticks: u32, duration_ticks: u32, pitch: u8, velocity: f32) -> Self {
        Self {
            onset_ticks,
            duration_ticks,
            pitch,
            velocity,
        }
    }

    pub fn end_ticks(&self) -> u32 {
        self.onset_ticks.saturating_add(self.duration_ticks)
    }

    /// Scientific octave number (MIDI 60 = C4)
    pub fn octave(&self) -> i32 {
        i32::from(self.pitch) / 12 - 1
    }

    pub fn pitch_class_name(&self) -> &'static str {
        PITCH_CLASS_NAMES[usize::from(self.pitch % 12)]
    }

    /// Name with octave, e.g. "C4"
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_class_name(), self.octave())
    }
}

/// Instrument identifier of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// General MIDI program (0-based)
    pub program: u8,
    /// MIDI channel (0-based), 9 is the GM percussion channel
    pub channel: u8,
}

impl Instrument {
    pub const DRUM_CHANNEL: u8 = 9;

    pub fn is_drum_channel(&self) -> bool {
        self.channel == Self::DRUM_CHANNEL
    }
}

/// A note sequence played by one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub instrument: Instrument,
    pub notes: Vec<Note>,
}

impl Track {
    pub fn new(instrument: Instrument, notes: Vec<Note>) -> Self {
        Self { instrument, notes }
    }
}

/// Meter with the real denominator (not the SMF log2 encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator > 0 && self.denominator.is_power_of_two()
    }

    /// Ticks in one measure: `(numerator / denominator) * ppq * 4`
    pub fn ticks_per_measure(&self, ppq: u32) -> u32 {
        if self.denominator == 0 {
            return 0;
        }
        (u64::from(ppq) * 4 * u64::from(self.numerator) / u64::from(self.denominator)) as u32
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = PreprocessError;

    fn from_str(s: &str) -> PreprocessResult<Self> {
        let invalid = || {
            PreprocessError::InvalidConfigParameter(format!("'{}' is not a meter like 4/4", s))
        };
        let (num, den) = s.split_once('/').ok_or_else(invalid)?;
        let numerator = num.trim().parse::<u8>().map_err(|_| invalid())?;
        let denominator = den.trim().parse::<u8>().map_err(|_| invalid())?;
        Ok(Self::new(numerator, denominator))
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = PreprocessError;

    fn try_from(value: String) -> PreprocessResult<Self> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(value: TimeSignature) -> Self {
        value.to_string()
    }
}

/// Decoded MIDI file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tracks: Vec<Track>,
    pub ticks_per_quarter_note: u32,
    /// Declared meters in tick order
    pub time_signatures: Vec<TimeSignature>,
    pub total_duration_ticks: u32,
}

impl Document {
    /// First declared meter, or `fallback` when the file declares none
    pub fn first_time_signature(&self, fallback: TimeSignature) -> TimeSignature {
        self.time_signatures
            .iter()
            .copied()
            .find(TimeSignature::is_valid)
            .unwrap_or(fallback)
    }
}

/// Turns raw file bytes into a [`Document`]
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> PreprocessResult<Document>;
}

/// Standard MIDI File decoder backed by `midly`
#[derive(Debug, Clone, Copy, Default)]
pub struct MidlyDecoder;

impl Decoder for MidlyDecoder {
    fn decode(&self, bytes: &[u8]) -> PreprocessResult<Document> {
        decode_smf(bytes)
    }
}

/// Notes and program of one channel within one SMF track
#[derive(Default)]
struct ChannelNotes {
    program: Option<u8>,
    notes: Vec<Note>,
    /// Sounding notes per key: (onset tick, velocity), oldest first
    sounding: HashMap<u8, VecDeque<(u32, f32)>>,
}

impl ChannelNotes {
    fn note_on(&mut self, tick: u32, key: u8, vel: u8) {
        self.sounding
            .entry(key)
            .or_default()
            .push_back((tick, f32::from(vel) / 127.0));
    }

    fn note_off(&mut self, tick: u32, key: u8) {
        if let Some((onset, velocity)) = self.sounding.get_mut(&key).and_then(VecDeque::pop_front)
        {
            self.notes
                .push(Note::new(onset, tick.saturating_sub(onset), key, velocity));
        }
    }

    /// Close anything still sounding at `tick`
    fn finish(mut self, tick: u32) -> Vec<Note> {
        for (key, pending) in self.sounding.drain() {
            for (onset, velocity) in pending {
                self.notes
                    .push(Note::new(onset, tick.saturating_sub(onset), key, velocity));
            }
        }
        self.notes
            .sort_by(|a, b| a.onset_ticks.cmp(&b.onset_ticks).then(a.pitch.cmp(&b.pitch)));
        self.notes
    }
}

/// Decode Standard MIDI File bytes
pub fn decode_smf(bytes: &[u8]) -> PreprocessResult<Document> {
    let smf = Smf::parse(bytes)?;

    let ppq = match smf.header.timing {
        Timing::Metrical(ticks_per_beat) => u32::from(ticks_per_beat.as_int()),
        Timing::Timecode(fps, subframe) => {
            return Err(PreprocessError::Decode(format!(
                "timecode timing ({} fps, {} ticks/frame) is not supported",
                fps.as_f32(),
                subframe
            )))
        }
    };
    if ppq == 0 {
        return Err(PreprocessError::Decode(
            "header declares zero ticks per quarter note".to_string(),
        ));
    }
    if smf.tracks.is_empty() {
        return Err(PreprocessError::Decode("file contains no tracks".to_string()));
    }

    let mut tracks = Vec::new();
    let mut time_signatures: Vec<(u32, TimeSignature)> = Vec::new();
    let mut total_duration_ticks = 0u32;

    for track_events in &smf.tracks {
        let mut ticks = 0u32;
        // BTreeMap keeps channels in ascending order
        let mut channels: BTreeMap<u8, ChannelNotes> = BTreeMap::new();

        for event in track_events {
            ticks = ticks.saturating_add(event.delta.as_int());
            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let state = channels.entry(channel.as_int()).or_default();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            state.note_on(ticks, key.as_int(), vel.as_int());
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            state.note_off(ticks, key.as_int());
                        }
                        MidiMessage::ProgramChange { program } => {
                            state.program.get_or_insert(program.as_int());
                        }
                        _ => (),
                    }
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_log2, _, _)) => {
                    if let Some(denominator) = 1u8.checked_shl(u32::from(denominator_log2)) {
                        time_signatures.push((ticks, TimeSignature::new(numerator, denominator)));
                    }
                }
                _ => (),
            }
        }

        total_duration_ticks = total_duration_ticks.max(ticks);

        for (channel, state) in channels {
            let program = state.program.unwrap_or(0);
            let notes = state.finish(ticks);
            tracks.push(Track::new(Instrument { program, channel }, notes));
        }
    }

    // Stable sort keeps file order for meters declared on the same tick
    time_signatures.sort_by_key(|(tick, _)| *tick);

    log::debug!(
        "decoded {} SMF tracks into {} channel tracks (ppq {}, {} ticks)",
        smf.tracks.len(),
        tracks.len(),
        ppq,
        total_duration_ticks
    );

    Ok(Document {
        tracks,
        ticks_per_quarter_note: ppq,
        time_signatures: time_signatures.into_iter().map(|(_, ts)| ts).collect(),
        total_duration_ticks,
    })
}
