//! Drive the resolve → fetch → record pipeline over a list of URLs.

use std::{num::NonZeroUsize, thread, time::Duration};

use crossbeam_channel::{bounded, unbounded};
use tracing::{error, info, info_span, warn};

use crate::{
    actors::{connect_actors, Actor, Job, Outcome, RecorderActor, SkipReason, WorkerActor},
    fetcher::MediaFetcher,
    recorder::MetadataRecorder,
    resolver::VideoResolver,
    result::{err_msg, Result},
    types::MetadataRecord,
};

/// Processing of a single URL, without recording
#[derive(Debug)]
pub struct VideoProcessor<'a> {
    resolver: VideoResolver<'a>,
    fetcher: MediaFetcher<'a>,
}

impl<'a> VideoProcessor<'a> {
    pub fn new(resolver: VideoResolver<'a>, fetcher: MediaFetcher<'a>) -> Self {
        Self { resolver, fetcher }
    }

    pub fn process(&self, job: &Job) -> Outcome {
        let url = job.url.as_str();
        let _span = info_span!("video", url).entered();
        info!("Processing video {}/{}", job.index, job.total);

        let Some(handle) = self.resolver.resolve(url) else {
            warn!("Skipping video");
            return Outcome::Skipped {
                url: url.to_owned(),
                reason: SkipReason::Unresolved,
            };
        };

        let record = MetadataRecord::from(&handle.metadata);
        info!("Starting download of '{}'", record.title);

        match self.fetcher.fetch(&handle) {
            Some(path) => Outcome::Downloaded { record, path },
            None => Outcome::Skipped {
                url: url.to_owned(),
                reason: SkipReason::FetchFailed,
            },
        }
    }
}

/// Outcomes of a whole batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Downloaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.downloaded()
    }
}

#[derive(Debug)]
pub struct Batch<'a> {
    processor: &'a VideoProcessor<'a>,
    recorder: &'a MetadataRecorder,
    delay: Duration,
}

impl<'a> Batch<'a> {
    pub fn new(
        processor: &'a VideoProcessor<'a>,
        recorder: &'a MetadataRecorder,
        delay: Duration,
    ) -> Self {
        Self {
            processor,
            recorder,
            delay,
        }
    }

    fn jobs(urls: &[String]) -> impl Iterator<Item = Job> + '_ {
        urls.iter().enumerate().map(move |(idx, url)| Job {
            index: idx + 1,
            total: urls.len(),
            url: url.clone(),
        })
    }

    /// Process every URL one after the other, in order,
    /// waiting the delay after each of them.
    pub fn run_sequential(&self, urls: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for job in Self::jobs(urls) {
            let outcome = self.processor.process(&job);
            if let Outcome::Downloaded { record, .. } = &outcome {
                self.recorder.record(record);
            }
            report.outcomes.push(outcome);

            thread::sleep(self.delay);
        }

        log_summary(&report);
        report
    }

    /// Process the URLs with a pool of workers.
    ///
    /// Every worker waits the delay after each of its URLs.
    /// Metadata rows are written by a single recorder actor.
    /// A URL listed twice may be fetched by two workers at once,
    /// each with its own intermediate files.
    pub fn run_concurrent(&self, urls: &[String], workers: NonZeroUsize) -> Result<BatchReport> {
        let workers = workers.get();
        info!("Processing {} videos with {workers} workers", urls.len());

        // Initialize the actors
        let mut worker_actors: Vec<_> = (0..workers)
            .map(|id| WorkerActor::new(id, self.processor, self.delay))
            .collect();
        let mut recorder_actor = RecorderActor::new(self.recorder);

        // Connect the actors together
        let (input, receive) = unbounded();
        for worker in &mut worker_actors {
            worker.set_receive_channel(receive.clone());
        }
        drop(receive);

        let (send, receive) = bounded(workers);
        for worker in &mut worker_actors {
            connect_actors(worker, &mut recorder_actor, (send.clone(), receive.clone()));
        }
        // Only the workers may keep the channel open
        drop((send, receive));

        let (send, output) = unbounded();
        recorder_actor.set_send_channel(send);

        let report = thread::scope(|scope| -> Result<BatchReport> {
            // Start the actors
            let mut handles = Vec::with_capacity(workers + 1);
            for (id, worker) in worker_actors.into_iter().enumerate() {
                handles.push(
                    thread::Builder::new()
                        .name(format!("worker-{id}"))
                        .spawn_scoped(scope, move || worker.run())?,
                );
            }
            handles.push(
                thread::Builder::new()
                    .name("recorder".to_owned())
                    .spawn_scoped(scope, move || recorder_actor.run())?,
            );

            // Fill the input channel with all the jobs
            for job in Self::jobs(urls) {
                input
                    .send(job)
                    .map_err(|_| err_msg("All workers stopped before the end of the batch"))?;
            }

            // Drop the input to indicate the end of the input data
            drop(input);

            // Wait for the output to be closed
            let report = BatchReport {
                outcomes: output.iter().collect(),
            };

            for handle in handles {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => error!("An actor stopped with an error: {err}"),
                    Err(_) => return Err(err_msg("An actor thread panicked")),
                }
            }

            Ok(report)
        })?;

        log_summary(&report);
        Ok(report)
    }
}

fn log_summary(report: &BatchReport) {
    info!(
        "Batch completed: {} downloaded, {} skipped",
        report.downloaded(),
        report.skipped()
    );
    for outcome in &report.outcomes {
        if let Outcome::Skipped { url, reason } = outcome {
            warn!("{url} {reason}");
        }
    }
}
