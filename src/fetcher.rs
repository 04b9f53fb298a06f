//! Download the best streams of a video and mux them into a single file.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::{
    io::{ensure_dir, scratch_file, scratch_tag},
    outside::{StreamMuxer, VideoExtractor},
    result::{Error, Result},
    types::{StreamDescriptor, StreamKind, VideoHandle},
};

/// Extension of the muxed output files
pub const OUTPUT_EXT: &str = "mp4";

#[derive(Debug)]
pub struct MediaFetcher<'a> {
    extractor: &'a dyn VideoExtractor,
    muxer: &'a dyn StreamMuxer,
    out_dir: &'a Path,
}

impl<'a> MediaFetcher<'a> {
    pub fn new(
        extractor: &'a dyn VideoExtractor,
        muxer: &'a dyn StreamMuxer,
        out_dir: &'a Path,
    ) -> Self {
        Self {
            extractor,
            muxer,
            out_dir,
        }
    }

    /// Download and mux the video, returning the output file path.
    ///
    /// Errors are logged and give `None`.
    pub fn fetch(&self, handle: &VideoHandle) -> Option<PathBuf> {
        match self.try_fetch(handle) {
            Ok(path) => {
                info!("Video muxed into {path:?}");
                Some(path)
            }
            Err(err) => {
                error!("Could not download video {}: {err}", handle.url);
                None
            }
        }
    }

    /// Download the best video-only and audio-only streams and mux them
    /// into `<out_dir>/<id>.mp4`.
    ///
    /// Nothing is written if one of the streams is missing.
    /// The intermediate files are always removed, and an existing output
    /// is only replaced once the mux succeeded.
    pub fn try_fetch(&self, handle: &VideoHandle) -> Result<PathBuf> {
        let (video, audio) = select_streams(&handle.streams)?;
        debug!("Selected video stream {video}");
        debug!("Selected audio stream {audio}");

        ensure_dir(self.out_dir)?;

        // The same video may be fetched by several workers at once
        let id = handle.id();
        let stem = format!("{id}_{}", scratch_tag());
        let video_file = scratch_file(self.out_dir, &stem, "video", &video.ext)?;
        let audio_file = scratch_file(self.out_dir, &stem, "audio", &audio.ext)?;
        let muxed_file = scratch_file(self.out_dir, &stem, "muxed", OUTPUT_EXT)?;

        info!("Downloading video stream {video}");
        self.extractor
            .download_stream(handle, video, &video_file)
            .map_err(|err| err.wrap_err_with(|| "Could not download the video stream"))?;

        info!("Downloading audio stream {audio}");
        self.extractor
            .download_stream(handle, audio, &audio_file)
            .map_err(|err| err.wrap_err_with(|| "Could not download the audio stream"))?;

        let output = self.out_dir.join(format!("{id}.{OUTPUT_EXT}"));
        info!("Muxing streams into {output:?}");
        self.muxer.mux(&video_file, &audio_file, &muxed_file)?;

        debug!("Moving {muxed_file:?} to {output:?}");
        muxed_file.persist(&output).map_err(|err| {
            Error::from(err.error)
                .wrap_err_with(|| format!("Could not move the muxed video to {output:?}"))
        })?;

        Ok(output)
    }
}

/// Pick the highest resolution video-only stream and
/// the highest bitrate audio-only stream
pub fn select_streams(
    streams: &[StreamDescriptor],
) -> Result<(&StreamDescriptor, &StreamDescriptor)> {
    let video = StreamDescriptor::best_video(streams).ok_or(Error::NoStream(StreamKind::Video))?;
    let audio = StreamDescriptor::best_audio(streams).ok_or(Error::NoStream(StreamKind::Audio))?;
    debug_assert!(video.is_adaptive() && audio.is_adaptive());
    Ok((video, audio))
}
