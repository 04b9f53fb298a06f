use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use tempfile::TempPath;
use tracing::debug;

use crate::result::Result;

/// Create the directory and all its parents if needed
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        debug!("Creating directory {path:?}");
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Whether the file is missing or has no content yet
pub fn is_missing_or_empty(path: &Path) -> bool {
    fs::metadata(path).map_or(true, |meta| meta.len() == 0)
}

/// Open a file for appending, creating it and its parent directories if needed
pub fn open_append(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Random tag distinguishing the intermediate files of concurrent jobs
pub fn scratch_tag() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(SCRATCH_TAG_LEN)
        .collect()
}

const SCRATCH_TAG_LEN: usize = 6;

/// Reserve the path of an intermediate file `<out_dir>/<stem>_<suffix>.<ext>`.
///
/// The file will be deleted when the returned handle is dropped, whether it
/// has been written or not.
pub fn scratch_file(out_dir: &Path, stem: &str, suffix: &str, ext: &str) -> Result<TempPath> {
    let path: PathBuf = out_dir.join(format!("{stem}_{suffix}.{ext}"));
    Ok(TempPath::try_from_path(path)?)
}
