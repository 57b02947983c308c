//! MIDI-to-Matrix Preprocessing
//!
//! Turns batches of Standard MIDI Files into fixed-size piano-roll matrices
//! (pitch rows x time columns) suitable as training images for a
//! generative model.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod midi;
pub mod passes;
pub mod progress;
pub mod qa;
pub mod state;

pub use batch::{BatchOutput, BatchProcessor, CancellationToken, MidiInput};
pub use config::Config;
pub use error::{PreprocessError, Result as PreprocessResult};
pub use midi::{Decoder, Document, MidlyDecoder, Note, Track};
pub use state::DocumentState;

/// Runs the pass pipeline on decoded documents
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: Config,
}

impl Preprocessor {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every pass on a decoded document
    pub fn process_document(
        &self,
        name: impl Into<String>,
        document: Document,
    ) -> PreprocessResult<DocumentState> {
        let mut state = DocumentState::new(name, document);
        self.run_pipeline(&mut state)?;
        Ok(state)
    }

    /// Execute the complete multi-pass pipeline
    pub fn run_pipeline(&self, state: &mut DocumentState) -> PreprocessResult<()> {
        // Pass 0: Track Selection
        passes::pass_0::run(state, &self.config)?;

        // Pass 1: Quantization
        passes::pass_1::run(state, &self.config)?;

        // Pass 2: Measure-aligned Segmentation
        passes::pass_2::run(state, &self.config)?;

        // Pass 3: Transposition Augmentation
        passes::pass_3::run(state, &self.config)?;

        // Pass 4: Rasterization
        passes::pass_4::run(state, &self.config)?;

        // Pass 5: Validation
        passes::pass_5::run(state, &self.config)?;

        Ok(())
    }
}

/// Preprocess a batch with the default decoder and no progress reporting
pub fn preprocess(inputs: &[MidiInput], config: Config) -> PreprocessResult<BatchOutput> {
    BatchProcessor::new(config).run(inputs)
}
