use std::fmt::Display;

use serde::Serialize;
use time::{macros::format_description, Date};

/// Descriptive data of a video, as given by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub publish_date: Option<Date>,
}

impl Display for VideoMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "\tid: {}", self.id)?;
        writeln!(f, "\ttitle: {}", self.title)?;
        writeln!(f, "\tauthor: {}", self.author)?;
        match self.publish_date {
            Some(date) => writeln!(f, "\tpublish_date: {date}")?,
            None => writeln!(f, "\tpublish_date: unknown")?,
        }
        writeln!(f, "\tdescription: {} bytes long", self.description.len())?;
        writeln!(f, "}}")
    }
}

/// One row of the metadata log.
///
/// Field order is the column order of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    #[serde(rename = "Video ID")]
    pub video_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Publish Date")]
    pub publish_date: String,
}

#[cfg(test)]
impl MetadataRecord {
    pub const HEADER: [&'static str; 5] =
        ["Video ID", "Title", "Description", "Author", "Publish Date"];
}

impl From<&VideoMetadata> for MetadataRecord {
    fn from(metadata: &VideoMetadata) -> Self {
        let publish_date = metadata
            .publish_date
            .and_then(|date| date.format(format_description!("[year]-[month]-[day]")).ok())
            .unwrap_or_default();

        Self {
            video_id: metadata.id.clone(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            author: metadata.author.clone(),
            publish_date,
        }
    }
}
