//! Batch orchestration
//!
//! Documents are independent: one failing file is logged and skipped, never
//! aborting the batch. Output keeps input order (documents, then windows,
//! then the untransposed render before its transpositions) whether the batch
//! runs on one thread or several.

use crate::analysis::{BatchReport, DocumentReport};
use crate::config::{validate_config, Config};
use crate::error::{PreprocessError, Result as PreprocessResult};
use crate::midi::{Decoder, Document, MidlyDecoder};
use crate::progress::{NullProgress, ProgressSink};
use crate::Preprocessor;
use ndarray::Array2;
use std::path::Path;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One raw input file
#[derive(Debug, Clone)]
pub struct MidiInput {
    /// Identifies the file in logs and reports
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl MidiInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it by its path
    pub fn from_path<P: AsRef<Path>>(path: P) -> PreprocessResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            PreprocessError::FileError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::new(path.display().to_string(), bytes))
    }
}

/// Shared flag checked before each document starts
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Accepted matrices plus what happened to every input
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub matrices: Vec<Array2<f32>>,
    pub report: BatchReport,
}

type DocumentOutcome = (DocumentReport, Vec<Array2<f32>>);

/// Drives the pass pipeline over a collection of MIDI files
pub struct BatchProcessor {
    preprocessor: Preprocessor,
    decoder: Arc<dyn Decoder>,
    progress: Arc<dyn ProgressSink>,
    cancellation: CancellationToken,
}

impl BatchProcessor {
    pub fn new(config: Config) -> Self {
        Self {
            preprocessor: Preprocessor::new(config),
            decoder: Arc::new(MidlyDecoder),
            progress: Arc::new(NullProgress),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn with_shared_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &Config {
        self.preprocessor.config()
    }

    /// Process every input. Fails only when the configuration is invalid.
    pub fn run(&self, inputs: &[MidiInput]) -> PreprocessResult<BatchOutput> {
        validate_config(self.config())?;

        let workers = self.config().batch.workers.min(inputs.len()).max(1);
        log::info!(
            "Preprocessing {} MIDI files on {} worker(s)",
            inputs.len(),
            workers
        );

        let outcomes = if workers == 1 {
            self.run_sequential(inputs)
        } else {
            self.run_parallel(inputs, workers)
        };

        let mut matrices = Vec::new();
        let mut documents = Vec::with_capacity(outcomes.len());
        for (report, accepted) in outcomes {
            matrices.extend(accepted);
            documents.push(report);
        }

        let report = BatchReport::from_documents(documents, self.cancellation.is_cancelled());
        log::info!("{}", report.summary());
        self.progress
            .report(&format!("Preprocessing complete\n{}", report.summary()));
        self.yield_now();

        Ok(BatchOutput { matrices, report })
    }

    fn run_sequential(&self, inputs: &[MidiInput]) -> Vec<DocumentOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            outcomes.push(self.process_input(index, input, inputs.len()));
            self.yield_now();
        }
        outcomes
    }

    fn run_parallel(&self, inputs: &[MidiInput], workers: usize) -> Vec<DocumentOutcome> {
        let process = || {
            inputs
                .par_iter()
                .enumerate()
                .map(|(index, input)| self.process_input(index, input, inputs.len()))
                .collect::<Vec<_>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("midi2matrix-worker-{}", i))
            .build()
        {
            Ok(pool) => pool.install(process),
            Err(err) => {
                log::warn!("cannot start {} workers ({}), running sequentially", workers, err);
                self.run_sequential(inputs)
            }
        }
    }

    /// Decode and preprocess one input, isolating its failure
    fn process_input(&self, index: usize, input: &MidiInput, total: usize) -> DocumentOutcome {
        if self.cancellation.is_cancelled() {
            log::debug!("{}: {}", input.name, PreprocessError::Cancelled);
            return (DocumentReport::skipped(index, &input.name), Vec::new());
        }

        let result = self
            .decode(input)
            .and_then(|document| self.preprocessor.process_document(&input.name, document));

        let outcome = match result {
            Ok(mut state) => {
                let report = DocumentReport::processed(index, &state);
                (report, std::mem::take(&mut state.accepted))
            }
            Err(err) if err.is_per_document() => {
                log::warn!("Skipping {}: {}", input.name, err);
                (DocumentReport::failed(index, &input.name, &err), Vec::new())
            }
            Err(err) => {
                log::error!("Failed on {}: {}", input.name, err);
                (DocumentReport::failed(index, &input.name, &err), Vec::new())
            }
        };

        self.progress.report(&format!(
            "Preprocessing MIDI files\nfile {}/{}: {} ({} matrices)",
            index + 1,
            total,
            input.name,
            outcome.1.len()
        ));
        outcome
    }

    /// Decode on a helper thread when a timeout is configured
    fn decode(&self, input: &MidiInput) -> PreprocessResult<Document> {
        let Some(timeout_ms) = self.config().batch.decode_timeout_ms else {
            return self.decoder.decode(&input.bytes);
        };

        let (sender, receiver) = oneshot::channel();
        let decoder = Arc::clone(&self.decoder);
        let bytes = Arc::clone(&input.bytes);
        std::thread::Builder::new()
            .name("midi-decode".to_string())
            .spawn(move || {
                if sender.send(decoder.decode(&bytes)).is_err() {
                    log::debug!("decode finished after its deadline");
                }
            })
            .map_err(|e| PreprocessError::Decode(format!("cannot start decoder thread: {}", e)))?;

        match receiver.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(result) => result,
            Err(oneshot::RecvTimeoutError::Timeout) => Err(PreprocessError::Decode(format!(
                "decoding timed out after {} ms",
                timeout_ms
            ))),
            Err(oneshot::RecvTimeoutError::Disconnected) => Err(PreprocessError::Decode(
                "decoder stopped without a result".to_string(),
            )),
        }
    }

    fn yield_now(&self) {
        if self.config().batch.yield_between_documents {
            std::thread::yield_now();
        }
    }
}
