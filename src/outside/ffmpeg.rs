use std::{ffi::OsStr, fmt::Debug, path::Path};

use crate::result::Result;

use super::command::{assert_success_command, FFMPEG, FFXXX_DEFAULT_ARGS};

pub trait StreamMuxer: Sync + Debug {
    /// Combine a video-only stream and an audio-only stream into one file.
    ///
    /// The video stream is kept as-is, the audio stream may be transcoded
    /// to fit the output container.
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg;

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new() -> Result<Self> {
        assert_success_command(FFMPEG, |cmd| cmd.arg("-version"))?;

        Ok(Self)
    }
}

impl StreamMuxer for Ffmpeg {
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                .args([OsStr::new("-i"), video.as_os_str()])
                .args([OsStr::new("-i"), audio.as_os_str()])
                .args(["-map", "0:v:0", "-map", "1:a:0"])
                .args(["-c:v", "copy"])
                .args(["-c:a", "aac"])
                .arg(output)
        })
    }
}
