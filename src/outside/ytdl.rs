use std::{
    ffi::OsStr,
    fmt::Debug,
    path::Path,
    process::{Command, Output},
};

use miette::{Context, IntoDiagnostic};
use serde::Deserialize;
use time::{macros::format_description, Date};

use super::command::{assert_success_command, check_status, run_command, Capture, YT_DL, YT_DLP};
use crate::{
    credentials::{TokenPair, TokenProvider},
    result::{bail, Error, Result},
    types::{Proxy, StreamDescriptor, StreamKind, VideoHandle, VideoMetadata},
};

/// Interface for resolving videos and downloading their streams
pub trait VideoExtractor: Sync + Debug {
    /// Resolve the video metadata and available streams.
    ///
    /// The tokens are asked to the provider on every call,
    /// the proxy is used for every request if given.
    fn extract(
        &self,
        url: &str,
        proxy: Option<&Proxy>,
        tokens: &dyn TokenProvider,
    ) -> Result<VideoHandle>;

    /// Download a single stream of a resolved video to the given path
    fn download_stream(
        &self,
        handle: &VideoHandle,
        stream: &StreamDescriptor,
        path: &Path,
    ) -> Result<()>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug)]
pub struct Ytdl {
    program: &'static str,
}

impl Ytdl {
    /// Verify that the `yt-dlp` or `youtube-dl` binaries are reachable
    pub fn new() -> Result<Self> {
        // Check `yt-dlp`
        if assert_success_command(YT_DLP, |cmd| cmd.arg("--version")).is_ok() {
            Ok(Self { program: YT_DLP })
        } else if assert_success_command(YT_DL, |cmd| cmd.arg("--version")).is_ok() {
            // Check `youtube-dl`
            Ok(Self { program: YT_DL })
        } else {
            bail("Neither yt-dlp nor youtube-dl found")
        }
    }

    /// Run the command and check if it failed with saying the stream is unavailable.
    /// In that case, return [`Error::UnavailableStream`].
    ///
    /// In other cases, return the output handle.
    pub fn run_check_availability<F>(&self, f: F, capture: Capture) -> Result<Output>
    where
        F: FnOnce(&mut Command) -> &mut Command,
    {
        let res = run_command(self.program, f, capture | Capture::STDERR)?;

        let stderr = String::from_utf8_lossy(&res.stderr);
        let is_unavailable = stderr
            .lines()
            .any(|line| line.starts_with("ERROR:") && line.to_lowercase().contains("unavailable"));
        if is_unavailable {
            Err(Error::UnavailableStream)
        } else {
            Ok(res)
        }
    }
}

/// Arguments routing the request through the proxy and authorizing it with the tokens
fn access_args(proxy: Option<&Proxy>, tokens: &TokenPair) -> Vec<String> {
    let mut args = Vec::with_capacity(4);
    if let Some(proxy) = proxy {
        args.push("--proxy".to_owned());
        args.push(proxy.as_str().to_owned());
    }
    args.push("--extractor-args".to_owned());
    args.push(format!(
        "youtube:po_token=web.gvs+{};visitor_data={}",
        tokens.po_token, tokens.visitor_data
    ));
    args
}

impl VideoExtractor for Ytdl {
    fn extract(
        &self,
        url: &str,
        proxy: Option<&Proxy>,
        tokens: &dyn TokenProvider,
    ) -> Result<VideoHandle> {
        let tokens = tokens.provide()?;

        let res = self.run_check_availability(
            |cmd| {
                cmd.arg("-q")
                    .arg("--no-warnings")
                    .arg("--no-playlist")
                    .arg("--skip-download")
                    .arg("-J")
                    .args(access_args(proxy, &tokens))
                    .arg("--")
                    .arg(url)
            },
            Capture::STDOUT,
        )?;
        let res = check_status(self.program, res)?;
        let output = String::from_utf8_lossy(&res.stdout);

        let (metadata, streams) = parse_video_info(&output)?;

        Ok(VideoHandle {
            url: url.to_owned(),
            proxy: proxy.cloned(),
            tokens,
            metadata,
            streams,
        })
    }

    fn download_stream(
        &self,
        handle: &VideoHandle,
        stream: &StreamDescriptor,
        path: &Path,
    ) -> Result<()> {
        let res = self.run_check_availability(
            |cmd| {
                cmd.arg("-q")
                    .arg("--no-warnings")
                    .arg("--no-playlist")
                    .arg("--no-continue") // Or else fails when file already exists, even an empty one
                    .arg("--no-part")
                    .args(["-f", stream.format_id.as_str()])
                    .args([OsStr::new("-o"), path.as_os_str()])
                    .args(access_args(handle.proxy.as_ref(), &handle.tokens))
                    .arg("--")
                    .arg(&handle.url)
            },
            Capture::empty(),
        )?;

        check_status(self.program, res).map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct YtdlVideo {
    id: String,
    title: String,
    description: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    /// Formatted as `YYYYMMDD`
    upload_date: Option<String>,
    #[serde(default)]
    formats: Vec<YtdlFormat>,
}

#[derive(Debug, Deserialize)]
struct YtdlFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    abr: Option<f64>,
    tbr: Option<f64>,
}

impl YtdlFormat {
    /// Classify the format from its codecs.
    /// Formats without any known codec (storyboards, ...) are not streams.
    fn kind(&self) -> Option<StreamKind> {
        let has = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");

        match (has(&self.vcodec), has(&self.acodec)) {
            (true, true) => Some(StreamKind::Muxed),
            (true, false) => Some(StreamKind::Video),
            (false, true) => Some(StreamKind::Audio),
            (false, false) => None,
        }
    }
}

/// Parse the JSON dumped by `yt-dlp -J`
pub fn parse_video_info(json: &str) -> Result<(VideoMetadata, Vec<StreamDescriptor>)> {
    let video: YtdlVideo = serde_json::from_str(json)
        .into_diagnostic()
        .wrap_err("Could not parse yt-dlp JSON output")?;

    let publish_date = video.upload_date.as_deref().and_then(|date| {
        Date::parse(date, format_description!("[year][month][day]")).ok()
    });

    let streams = video
        .formats
        .into_iter()
        .filter_map(|format| {
            let kind = format.kind()?;
            Some(StreamDescriptor {
                kind,
                ext: format.ext.unwrap_or_else(|| "mp4".to_owned()),
                height: format.height,
                abr: format.abr,
                tbr: format.tbr,
                format_id: format.format_id,
            })
        })
        .collect();

    let metadata = VideoMetadata {
        id: video.id,
        title: video.title,
        description: video.description.unwrap_or_default(),
        author: video.uploader.or(video.channel).unwrap_or_default(),
        publish_date,
    };

    Ok((metadata, streams))
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::*;

    const SAMPLE: &str = r#"{
        "id": "jNQXAC9IVRw",
        "title": "Me at the zoo",
        "description": "The first video on YouTube.",
        "uploader": "jawed",
        "channel": "jawed",
        "upload_date": "20050424",
        "duration": 19,
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
            {"format_id": "139", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.5", "abr": 48.8, "tbr": 48.8},
            {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 132.0, "tbr": 132.0},
            {"format_id": "160", "ext": "mp4", "vcodec": "avc1.4d400c", "acodec": "none", "height": 144, "tbr": 80.1},
            {"format_id": "134", "ext": "mp4", "vcodec": "avc1.4d401e", "acodec": "none", "height": 360, "tbr": 250.3},
            {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "tbr": 378.0}
        ]
    }"#;

    #[test]
    fn parses_metadata() {
        let (metadata, _) = parse_video_info(SAMPLE).unwrap();

        assert_eq!(metadata.id, "jNQXAC9IVRw");
        assert_eq!(metadata.title, "Me at the zoo");
        assert_eq!(metadata.author, "jawed");
        assert_eq!(metadata.description, "The first video on YouTube.");
        assert_eq!(
            metadata.publish_date,
            Some(Date::from_calendar_date(2005, Month::April, 24).unwrap())
        );
    }

    #[test]
    fn classifies_streams_and_drops_storyboards() {
        let (_, streams) = parse_video_info(SAMPLE).unwrap();

        let kinds: Vec<_> = streams
            .iter()
            .map(|s| (s.format_id.as_str(), s.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                ("139", StreamKind::Audio),
                ("251", StreamKind::Audio),
                ("160", StreamKind::Video),
                ("134", StreamKind::Video),
                ("18", StreamKind::Muxed),
            ]
        );

        assert_eq!(StreamDescriptor::best_video(&streams).unwrap().format_id, "134");
        assert_eq!(StreamDescriptor::best_audio(&streams).unwrap().format_id, "251");
    }

    #[test]
    fn missing_optional_fields_are_tolerated() {
        let (metadata, streams) =
            parse_video_info(r#"{"id": "abc", "title": "t", "description": null}"#).unwrap();

        assert_eq!(metadata.description, "");
        assert_eq!(metadata.author, "");
        assert!(metadata.publish_date.is_none());
        assert!(streams.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_video_info("ERROR: not json").is_err());
    }

    #[test]
    fn access_args_carry_proxy_and_tokens() {
        let tokens = TokenPair {
            visitor_data: "VISITOR".to_owned(),
            po_token: "TOKEN".to_owned(),
        };
        let proxy: Proxy = "10.0.0.1:8080".parse().unwrap();

        assert_eq!(
            access_args(Some(&proxy), &tokens),
            [
                "--proxy",
                "http://10.0.0.1:8080",
                "--extractor-args",
                "youtube:po_token=web.gvs+TOKEN;visitor_data=VISITOR",
            ]
        );
        assert_eq!(access_args(None, &tokens).len(), 2);
    }
}
