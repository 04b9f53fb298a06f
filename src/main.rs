mod actors;
mod batch;
mod cli;
mod credentials;
mod fetcher;
mod io;
mod logging;
mod outside;
mod reader;
mod recorder;
mod resolver;
mod result;
mod settings;
mod types;
mod utils;

use clap::Parser;
use miette::{miette, Context, Result};
use tracing::{debug, info, warn};

use crate::{
    batch::{Batch, VideoProcessor},
    cli::Args,
    credentials::{CredentialStore, Prompt, ProxyPool, TokenCache},
    fetcher::MediaFetcher,
    logging::init_logging,
    outside::{Ffmpeg, Ytdl},
    recorder::MetadataRecorder,
    resolver::VideoResolver,
    settings::Settings,
};

fn main() -> Result<()> {
    // Initialize the environment & CLI
    let env_file = dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_level)?;
    if let Some(path) = env_file {
        debug!("Loaded environment variables from {path:?}");
    }

    let settings = Settings::load(&args)?;
    debug!("{settings:?}");

    let urls = reader::read_video_urls(&settings.input);
    if urls.is_empty() {
        warn!(
            "The video URL list is empty. Check the CSV file {:?}",
            settings.input
        );
        return Ok(());
    }

    let (extractor, muxer) = load_external_components()?;

    let proxies = ProxyPool::new(settings.proxies()?);
    let credentials = CredentialStore::load(
        proxies,
        &TokenCache::new(&settings.token_cache),
        &Prompt::stdio(),
    )?;

    let processor = VideoProcessor::new(
        VideoResolver::new(&extractor, &credentials),
        MediaFetcher::new(&extractor, &muxer, &settings.out_dir),
    );
    let recorder = MetadataRecorder::new(&settings.metadata);
    let batch = Batch::new(&processor, &recorder, settings.delay());

    let report = match settings.workers {
        Some(workers) => batch
            .run_concurrent(&urls, workers)
            .map_err(miette::Report::from)
            .wrap_err("Concurrent batch failed")?,
        None => batch.run_sequential(&urls),
    };

    info!(
        "All tasks completed. {}/{} videos downloaded, metadata saved to {:?}",
        report.downloaded(),
        urls.len(),
        recorder.path()
    );
    Ok(())
}

/// Load the external components
fn load_external_components() -> Result<(Ytdl, Ffmpeg)> {
    // Construct the handles concurrently as executing an external program
    // is not instantaneous. That way we can avoid adding the costs
    let ytdl_thread = std::thread::spawn(Ytdl::new);
    let ffmpeg_thread = std::thread::spawn(Ffmpeg::new);

    let ytdl = ytdl_thread
        .join()
        .map_err(|_| miette!("Could not join thread"))?
        .map_err(miette::Report::from)
        .wrap_err("yt-dlp is required")?;
    let ffmpeg = ffmpeg_thread
        .join()
        .map_err(|_| miette!("Could not join thread"))?
        .map_err(miette::Report::from)
        .wrap_err("ffmpeg is required")?;

    Ok((ytdl, ffmpeg))
}
