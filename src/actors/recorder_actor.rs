use crossbeam_channel::{Receiver, Sender};
use miette::{miette, Context, IntoDiagnostic};
use tracing::debug;

use crate::{recorder::MetadataRecorder, result::Result};

use super::{Actor, Outcome};

/// Sole writer of the metadata file when workers run concurrently.
///
/// Records every downloaded video it receives, then forwards the outcome.
#[derive(Debug)]
pub struct RecorderActor<'a> {
    recorder: &'a MetadataRecorder,

    receive_channel: Option<Receiver<Outcome>>,
    send_channel: Option<Sender<Outcome>>,
}

impl Actor<Outcome, Outcome> for RecorderActor<'_> {
    fn set_receive_channel(&mut self, channel: Receiver<Outcome>) {
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

        debug!("Actor started, waiting for an outcome");

        for outcome in receive_channel {
            if let Outcome::Downloaded { record, .. } = &outcome {
                self.recorder.record(record);
            }

            send_channel
                .send(outcome)
                .into_diagnostic()
                .wrap_err("Could not send message")?;
        }

        debug!("All iterations completed. Stopping the actor.");
        Ok(())
    }
}

impl<'a> RecorderActor<'a> {
    pub fn new(recorder: &'a MetadataRecorder) -> Self {
        Self {
            recorder,
            receive_channel: None,
            send_channel: None,
        }
    }
}
