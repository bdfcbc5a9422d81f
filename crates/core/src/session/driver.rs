//! Runs a [`GameSession`] on a tokio task and drives its clocks.
//!
//! All triggers (start, player moves, shrink and countdown timers) go through one command
//! queue and are handled strictly one after another. A trigger that arrives while a load is in
//! flight waits in the queue until that transition is done.

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::debug;

use super::{EventSink, EventStream, GameSession, GameTunables, SessionConfig, SessionState};
use crate::{
    error::{GameError, Result},
    position::Coordinate,
    registry::Capture,
    source::ObjectiveSource,
    zone::{CountdownGeneration, SafeZone},
};

enum Command {
    Start {
        config: SessionConfig,
        reply: oneshot::Sender<Result<()>>,
    },
    PlayerMoved {
        position: Coordinate,
        reply: Option<oneshot::Sender<Vec<Capture>>>,
    },
    Shrink {
        epoch: u64,
        cycle: u64,
    },
    CountdownTick {
        generation: CountdownGeneration,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    End,
    Shutdown,
}

/// Point-in-time view of a driven session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub score: u32,
    pub zone: Option<SafeZone>,
    pub objectives_left: usize,
    pub remaining_ms: Option<u64>,
    /// Shrinks left until the zone closes
    pub shrinks_left: Option<u64>,
    pub player: Option<Coordinate>,
    pub player_in_zone: Option<bool>,
}

impl SessionSnapshot {
    fn of(session: &GameSession) -> Self {
        let zone = session.zone();
        let player = session.player_position();

        Self {
            state: session.state(),
            score: session.score(),
            zone,
            objectives_left: session.objectives().len(),
            remaining_ms: session
                .countdown()
                .is_running()
                .then(|| session.countdown().remaining_ms()),
            shrinks_left: session.remaining_shrinks(),
            player,
            player_in_zone: zone.zip(player).map(|(zone, player)| zone.contains(player)),
        }
    }
}

/// Cloneable handle to a session running on its own task.
///
/// The task stops once every handle is dropped or [`SessionHandle::shutdown`] is called.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Spawn a session driver on the current tokio runtime.
    pub fn spawn(
        source: Arc<dyn ObjectiveSource>,
        tunables: GameTunables,
    ) -> Result<(Self, EventStream, JoinHandle<()>)> {
        let (sink, stream) = EventSink::channel();
        let session = GameSession::new(source, tunables, sink)?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let driver = Driver {
            session,
            timer_commands: commands.downgrade(),
            shrink_timer: None,
            countdown_timer: None,
        };
        let task = tokio::spawn(driver.run(receiver));

        Ok((Self { commands }, stream, task))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| GameError::DriverStopped)
    }

    /// Start (or restart) the game and wait for the initial load.
    pub async fn start(&self, config: SessionConfig) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start { config, reply })?;
        response.await.map_err(|_| GameError::DriverStopped)?
    }

    /// Report a new player position without waiting for the result
    pub fn player_moved(&self, position: Coordinate) -> Result<()> {
        self.send(Command::PlayerMoved {
            position,
            reply: None,
        })
    }

    /// Report a new player position and wait for the objectives it captured
    pub async fn move_player(&self, position: Coordinate) -> Result<Vec<Capture>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::PlayerMoved {
            position,
            reply: Some(reply),
        })?;
        response.await.map_err(|_| GameError::DriverStopped)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        response.await.map_err(|_| GameError::DriverStopped)
    }

    /// Abandon the current game; the driver keeps running
    pub fn end(&self) -> Result<()> {
        self.send(Command::End)
    }

    /// Stop the driver task. Calling this on a stopped driver does nothing.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// A repeating trigger, aborted when dropped.
struct Timer {
    tag: (u64, u64),
    handle: JoinHandle<()>,
}

impl Timer {
    fn spawn(
        tag: (u64, u64),
        period: Duration,
        commands: mpsc::WeakUnboundedSender<Command>,
        command: impl Fn() -> Command + Send + 'static,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(commands) = commands.upgrade() else {
                    break;
                };
                if commands.send(command()).is_err() {
                    break;
                }
            }
        });

        Self { tag, handle }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Driver {
    session: GameSession,
    // weak so timers alone never keep the driver alive
    timer_commands: mpsc::WeakUnboundedSender<Command>,
    shrink_timer: Option<Timer>,
    countdown_timer: Option<Timer>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Start { config, reply } => {
                    let result = self.session.start(config).await;
                    let _ = reply.send(result);
                }
                Command::PlayerMoved { position, reply } => {
                    let captures = self.session.on_player_move(position);
                    if let Some(reply) = reply {
                        let _ = reply.send(captures);
                    }
                }
                Command::Shrink { epoch, cycle } => {
                    if (epoch, cycle) == (self.session.epoch(), self.session.shrink_cycle()) {
                        self.session.shrink().await;
                    } else {
                        debug!("dropping shrink trigger from game {epoch} cycle {cycle}");
                    }
                }
                Command::CountdownTick { generation } => {
                    self.session.countdown_tick(generation);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(SessionSnapshot::of(&self.session));
                }
                Command::End => self.session.end(),
                Command::Shutdown => break,
            }

            self.sync_timers();
        }

        debug!("session driver stopped");
    }

    /// Make the running timers match what the session currently needs.
    fn sync_timers(&mut self) {
        let shrink_tag = (self.session.state() == SessionState::Active)
            .then(|| (self.session.epoch(), self.session.shrink_cycle()));
        if self.shrink_timer.as_ref().map(|t| t.tag) != shrink_tag {
            self.shrink_timer = shrink_tag.map(|tag| {
                let (epoch, cycle) = tag;
                Timer::spawn(
                    tag,
                    self.session.tunables().shrink_interval(),
                    self.timer_commands.clone(),
                    move || Command::Shrink { epoch, cycle },
                )
            });
        }

        let countdown_tag = match self.session.state() {
            SessionState::Active => self
                .session
                .countdown()
                .active_generation()
                .map(|generation| (self.session.epoch(), generation)),
            _ => None,
        };
        if self.countdown_timer.as_ref().map(|t| t.tag) != countdown_tag {
            self.countdown_timer = countdown_tag.map(|tag| {
                let generation = tag.1;
                Timer::spawn(
                    tag,
                    self.session.tunables().countdown_step(),
                    self.timer_commands.clone(),
                    move || Command::CountdownTick { generation },
                )
            });
        }
    }
}
