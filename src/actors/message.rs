use std::{fmt::Display, path::PathBuf};

use crate::types::MetadataRecord;

/// A URL to process, with its position in the batch
#[derive(Debug, Clone)]
pub struct Job {
    /// 1-based position
    pub index: usize,
    pub total: usize,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The extractor could not resolve the video
    Unresolved,
    /// Selecting, downloading or muxing the streams failed
    FetchFailed,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unresolved => write!(f, "could not be resolved"),
            SkipReason::FetchFailed => write!(f, "could not be downloaded"),
        }
    }
}

/// Result of processing a single URL
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Downloaded {
        record: MetadataRecord,
        path: PathBuf,
    },
    Skipped {
        url: String,
        reason: SkipReason,
    },
}
