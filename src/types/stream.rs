use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Adaptive stream carrying only video
    Video,
    /// Adaptive stream carrying only audio
    Audio,
    /// Progressive stream carrying both video and audio
    Muxed,
}

impl Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video-only"),
            StreamKind::Audio => write!(f, "audio-only"),
            StreamKind::Muxed => write!(f, "muxed"),
        }
    }
}

/// A stream offered by the extractor for a given video
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Identifier to give back to the extractor to download this stream
    pub format_id: String,
    pub kind: StreamKind,
    /// Container extension, without the leading dot
    pub ext: String,
    /// Vertical resolution in pixels
    pub height: Option<u32>,
    /// Audio bitrate in kbit/s
    pub abr: Option<f64>,
    /// Total bitrate in kbit/s
    pub tbr: Option<f64>,
}

impl StreamDescriptor {
    pub fn is_adaptive(&self) -> bool {
        self.kind != StreamKind::Muxed
    }

    /// Return the best video-only stream: highest resolution first,
    /// then highest total bitrate.
    pub fn best_video(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        streams
            .iter()
            .filter(|s| s.kind == StreamKind::Video)
            .max_by(|a, b| {
                a.height
                    .unwrap_or(0)
                    .cmp(&b.height.unwrap_or(0))
                    .then_with(|| a.tbr.unwrap_or(0.).total_cmp(&b.tbr.unwrap_or(0.)))
            })
    }

    /// Return the audio-only stream with the highest bitrate.
    pub fn best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        streams
            .iter()
            .filter(|s| s.kind == StreamKind::Audio)
            .max_by(|a, b| a.abr.unwrap_or(0.).total_cmp(&b.abr.unwrap_or(0.)))
    }
}

impl Display for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {}", self.format_id, self.kind, self.ext)?;
        if let Some(height) = self.height {
            write!(f, ", {height}p")?;
        }
        if let Some(abr) = self.abr {
            write!(f, ", {abr:.0}K")?;
        }
        write!(f, ")")
    }
}
