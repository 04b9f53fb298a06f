use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use miette::{miette, Context, IntoDiagnostic};
use tracing::debug;

use crate::{batch::VideoProcessor, result::Result};

use super::{Actor, Job, Outcome};

/// Run the whole per-URL pipeline on every received job,
/// waiting the politeness delay after each of them.
///
/// Many workers can consume the same job channel.
#[derive(Debug)]
pub struct WorkerActor<'a> {
    id: usize,
    processor: &'a VideoProcessor<'a>,
    delay: Duration,

    receive_channel: Option<Receiver<Job>>,
    send_channel: Option<Sender<Outcome>>,
}

impl Actor<Job, Outcome> for WorkerActor<'_> {
    fn set_receive_channel(&mut self, channel: Receiver<Job>) {
        self.receive_channel = Some(channel);
    }

    fn set_send_channel(&mut self, channel: Sender<Outcome>) {
        self.send_channel = Some(channel);
    }

    fn run(mut self) -> Result<()> {
        let receive_channel = self
            .receive_channel
            .take()
            .ok_or_else(|| miette!("Receive channel not set"))?;

        let send_channel = self
            .send_channel
            .take()
            .ok_or_else(|| miette!("Send channel not set"))?;

        debug!("{}: Actor started, waiting for a URL", self.id);

        for job in receive_channel {
            debug!("{}: Job {} received", self.id, job.index);

            let outcome = self.processor.process(&job);
            send_channel
                .send(outcome)
                .into_diagnostic()
                .wrap_err("Could not send message")?;

            std::thread::sleep(self.delay);
            debug!("{}: Iteration completed. Waiting for next URL", self.id);
        }

        debug!("{}: All iterations completed. Stopping the actor.", self.id);
        Ok(())
    }
}

impl<'a> WorkerActor<'a> {
    pub fn new(id: usize, processor: &'a VideoProcessor<'a>, delay: Duration) -> Self {
        Self {
            id,
            processor,
            delay,
            receive_channel: None,
            send_channel: None,
        }
    }
}
