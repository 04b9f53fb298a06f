//! Append-only CSV log of the downloaded videos metadata.

use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use tracing::{error, info};

use crate::{
    io::{is_missing_or_empty, open_append},
    result::Result,
    types::MetadataRecord,
};

/// Writes one row per call to the metadata log.
///
/// Not meant to be shared between threads: in concurrent mode,
/// a single [`RecorderActor`](crate::actors::RecorderActor) owns it.
#[derive(Debug)]
pub struct MetadataRecorder {
    path: PathBuf,
}

impl MetadataRecorder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the record, writing the header first if the file is new
    pub fn append(&self, record: &MetadataRecord) -> Result<()> {
        let write_header = is_missing_or_empty(&self.path);
        let file = open_append(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        writer
            .serialize(record)
            .into_diagnostic()
            .wrap_err("Could not serialize metadata record")?;
        writer
            .flush()
            .into_diagnostic()
            .wrap_err("Could not flush metadata file")?;

        Ok(())
    }

    /// Append the record, logging instead of failing
    pub fn record(&self, record: &MetadataRecord) {
        match self.append(record) {
            Ok(()) => info!("Metadata of '{}' saved to {:?}", record.video_id, self.path),
            Err(err) => error!(
                "Could not save metadata of '{}' to {:?}: {err}",
                record.video_id, self.path
            ),
        }
    }
}
