use tokio::sync::mpsc;

use crate::{error::DataSourceError, objective::Objective};

/// Notifications for whatever renders the game.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    ZoneRadiusChanged { radius: f64 },
    ZoneClosed,
    ObjectivesLoaded { objectives: Vec<Objective> },
    ObjectiveCaptured { objective: Objective, score: u32 },
    CountdownTick { remaining_ms: u64 },
    DataSourceError { error: DataSourceError },
}

pub type EventStream = mpsc::UnboundedReceiver<SessionEvent>;

/// Sending half of the event channel.
///
/// Events are dropped silently once the receiver is gone; a game keeps running without a
/// listener.
#[derive(Clone, Debug)]
pub struct EventSink(mpsc::UnboundedSender<SessionEvent>);

impl EventSink {
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.0.send(event);
    }
}
