//! Batch statistics and per-document outcomes

use crate::passes::pass_5::Rejection;
use crate::state::DocumentState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened to one input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub name: String,
    /// Index in the input collection
    pub index: usize,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed {
        track_index: usize,
        program: u8,
        notes: usize,
        windows: usize,
        candidates: usize,
        accepted: usize,
        rejections: BTreeMap<Rejection, usize>,
    },
    Failed {
        code: String,
        message: String,
    },
    Skipped,
}

impl DocumentReport {
    /// Summarize a document that made it through every pass
    pub fn processed(index: usize, state: &DocumentState) -> Self {
        Self {
            name: state.name.clone(),
            index,
            status: DocumentStatus::Processed {
                track_index: state.selected_track_index.unwrap_or_default(),
                program: state
                    .selected_track
                    .as_ref()
                    .map(|t| t.instrument.program)
                    .unwrap_or_default(),
                notes: state.quantized_notes.len(),
                windows: state.window_count,
                candidates: state.candidate_count,
                accepted: state.accepted.len(),
                rejections: state.rejections.iter().map(|(k, v)| (*k, *v)).collect(),
            },
        }
    }

    pub fn failed(index: usize, name: &str, error: &crate::PreprocessError) -> Self {
        Self {
            name: name.to_string(),
            index,
            status: DocumentStatus::Failed {
                code: error.code().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn skipped(index: usize, name: &str) -> Self {
        Self {
            name: name.to_string(),
            index,
            status: DocumentStatus::Skipped,
        }
    }

    pub fn accepted(&self) -> usize {
        match &self.status {
            DocumentStatus::Processed { accepted, .. } => *accepted,
            _ => 0,
        }
    }
}

/// Summary of a whole batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents_total: usize,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub rejections: BTreeMap<Rejection, usize>,
    pub cancelled: bool,
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    /// Fold per-document reports (already in input order) into totals
    pub fn from_documents(documents: Vec<DocumentReport>, cancelled: bool) -> Self {
        let mut report = BatchReport {
            documents_total: documents.len(),
            cancelled,
            ..Default::default()
        };

        for doc in &documents {
            match &doc.status {
                DocumentStatus::Processed {
                    candidates,
                    accepted,
                    rejections,
                    ..
                } => {
                    report.documents_processed += 1;
                    report.candidates += candidates;
                    report.accepted += accepted;
                    for (reason, count) in rejections {
                        *report.rejections.entry(*reason).or_insert(0) += count;
                    }
                }
                DocumentStatus::Failed { .. } => report.documents_failed += 1,
                DocumentStatus::Skipped => report.documents_skipped += 1,
            }
        }

        report.documents = documents;
        report
    }

    /// One-line summary for logs and progress
    pub fn summary(&self) -> String {
        format!(
            "{} matrices from {}/{} files ({} failed, {} skipped, {} rejected)",
            self.accepted,
            self.documents_processed,
            self.documents_total,
            self.documents_failed,
            self.documents_skipped,
            self.rejections.values().sum::<usize>()
        )
    }
}
