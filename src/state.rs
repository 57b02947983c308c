//! Per-document pipeline state

use crate::midi::{Document, Note, TimeSignature, Track};
use crate::passes::pass_5::Rejection;
use ndarray::Array2;
use std::collections::HashMap;

/// A measure-aligned slice of the quantized track
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Position in temporal order
    pub index: usize,
    /// Absolute tick where the window starts
    pub start_ticks: u32,
    /// Window length in ticks
    pub length_ticks: u32,
    /// Notes with onsets inside the window, re-based to window-local ticks
    pub notes: Vec<Note>,
}

/// A window's notes after a (possibly zero) transposition
#[derive(Debug, Clone, PartialEq)]
pub struct WindowVariant {
    pub window_index: usize,
    pub semitones: i32,
    pub length_ticks: u32,
    pub notes: Vec<Note>,
}

/// A rendered matrix on its way to validation
#[derive(Debug, Clone)]
pub struct Candidate {
    pub window_index: usize,
    pub semitones: i32,
    pub matrix: Array2<f32>,
}

/// State threaded through the passes for one document
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Name used in logs and reports
    pub name: String,
    pub document: Document,

    // Pass 0: Track selection
    pub selected_track: Option<Track>,
    pub selected_track_index: Option<usize>,

    // Pass 1: Quantization
    pub quantization_step_ticks: u32,
    pub quantized_notes: Vec<Note>,

    // Pass 2: Segmentation
    pub time_signature: Option<TimeSignature>,
    pub ticks_per_measure: u32,
    /// Every window covering the document, empty ones included
    pub window_count: usize,
    /// Windows holding at least one note
    pub windows: Vec<Window>,

    // Pass 3: Transposition
    pub variants: Vec<WindowVariant>,
    /// (window, shift) pairs before filtering, empty windows included
    pub candidate_count: usize,

    // Pass 4 renders, Pass 5 validates each matrix as it arrives
    pub accepted: Vec<Array2<f32>>,
    pub rejections: HashMap<Rejection, usize>,
}

impl DocumentState {
    /// Wrap a decoded document
    pub fn new(name: impl Into<String>, document: Document) -> Self {
        Self {
            name: name.into(),
            document,
            selected_track: None,
            selected_track_index: None,
            quantization_step_ticks: 0,
            quantized_notes: Vec::new(),
            time_signature: None,
            ticks_per_measure: 0,
            window_count: 0,
            windows: Vec::new(),
            variants: Vec::new(),
            candidate_count: 0,
            accepted: Vec::new(),
            rejections: HashMap::new(),
        }
    }

    pub fn ppq(&self) -> u32 {
        self.document.ticks_per_quarter_note
    }
}
