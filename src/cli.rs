use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use tracing::Level;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("TUBEBATCH_", $v)
    };
}

/// Batch-download the videos listed in a CSV file.
///
/// The best video-only and audio-only streams of every video are downloaded
/// with `yt-dlp` and muxed with `ffmpeg`. The metadata of every downloaded
/// video is appended to a CSV log.
///
/// Options not given on the command line are read from the configuration file
/// then from `TUBEBATCH_*` environment variables (e.g. `TUBEBATCH_OUT_DIR`).
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The path to a TOML configuration file.
    /// Defaults to `tubebatch.toml` if it exists
    #[arg(long, env=arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// The CSV file listing the videos in its `url` column
    /// [default: files/video_urls.csv]
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// The CSV file the videos metadata is appended to
    /// [default: files/video_metadata.csv]
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// The directory to write the muxed videos to
    /// [default: videos]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// The file caching the visitorData and PoToken
    /// [default: po_token_cache.txt]
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Seconds to wait after each video, to avoid hammering the remote service
    /// [default: 5]
    #[arg(long)]
    pub delay_secs: Option<f64>,

    /// Process the videos concurrently with this many workers.
    /// Videos are processed one by one if not set
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    /// Comma-separated list of `host:port` proxies, one is picked randomly for each video
    #[arg(long, env = "PROXIES")]
    pub proxies: Option<String>,

    /// The maximum level of the logs
    #[arg(long, default_value_t = Level::INFO, env=arg_env!("LOG_LEVEL"))]
    pub log_level: Level,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "tubebatch",
            "--input",
            "list.csv",
            "--workers",
            "3",
            "--delay-secs",
            "0.5",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("list.csv")));
        assert_eq!(args.workers, NonZeroUsize::new(3));
        assert_eq!(args.delay_secs, Some(0.5));
        assert_eq!(args.log_level, Level::DEBUG);
    }

    #[test]
    fn env_file_feeds_env_backed_options() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "TUBEBATCH_CONFIG=from_env_file.toml\n").unwrap();

        dotenv::from_path(&path).unwrap();
        let args = Args::try_parse_from(["tubebatch"]).unwrap();

        assert_eq!(args.config, Some(PathBuf::from("from_env_file.toml")));
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(Args::try_parse_from(["tubebatch", "--workers", "0"]).is_err());
    }
}
