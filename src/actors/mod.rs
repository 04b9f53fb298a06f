mod message;
mod recorder_actor;
mod worker_actor;

use crossbeam_channel::{Receiver, Sender};
pub use message::*;
pub use recorder_actor::RecorderActor;
pub use worker_actor::WorkerActor;

use crate::result::Result;

pub trait Actor<From, To> {
    fn set_receive_channel(&mut self, channel: Receiver<From>);

    fn set_send_channel(&mut self, channel: Sender<To>);

    fn run(self) -> Result<()>;
}

pub fn connect_actors<From, Shared, To>(
    from: &mut dyn Actor<From, Shared>,
    to: &mut dyn Actor<Shared, To>,
    (send, receive): (Sender<Shared>, Receiver<Shared>),
) {
    from.set_send_channel(send);
    to.set_receive_channel(receive);
}
