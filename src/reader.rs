//! Read the list of video URLs to process.

use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;
use tracing::{error, info, warn};

/// Name of the required input column
pub const URL_COLUMN: &str = "url";

#[derive(Debug, Deserialize)]
struct UrlRow {
    #[serde(default)]
    url: Option<String>,
}

/// Read the `url` column of a CSV file.
///
/// Values are trimmed and empty ones are skipped, other columns are ignored.
/// Never fails: a missing or unreadable file gives an empty list.
pub fn read_video_urls(path: &Path) -> Vec<String> {
    if !path.exists() {
        error!("File {path:?} not found");
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!("Could not open CSV file {path:?}: {err}");
            return Vec::new();
        }
    };

    let urls = read_video_urls_from(file);
    info!("Read {} URLs from {path:?}", urls.len());
    urls
}

/// Same as [`read_video_urls`] on any reader
pub fn read_video_urls_from<R: Read>(reader: R) -> Vec<String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    match rdr.headers() {
        Ok(headers) if headers.iter().any(|h| h == URL_COLUMN) => {}
        Ok(_) => {
            error!("No '{URL_COLUMN}' column in the CSV header");
            return Vec::new();
        }
        Err(err) => {
            error!("Could not read CSV header: {err}");
            return Vec::new();
        }
    }

    let mut urls = Vec::new();
    for result in rdr.deserialize::<UrlRow>() {
        match result {
            Ok(UrlRow { url: Some(url) }) if !url.trim().is_empty() => {
                urls.push(url.trim().to_owned())
            }
            Ok(_) => {}
            Err(err) => warn!("Skipping malformed CSV row: {err}"),
        }
    }
    urls
}
