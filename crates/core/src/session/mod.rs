//! The game session state machine.
//!
//! A [`GameSession`] owns everything one game needs: the objective registry, the shrink
//! scheduler and the countdown. It has no clock; shrink and countdown triggers come from
//! outside, normally from a [`driver::SessionHandle`]. Every operation takes `&mut self`, so
//! triggers can never interleave, and the internal `Loading` phase of a shrink cycle is never
//! visible to callers.

pub mod config;
pub mod driver;
pub mod events;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::{DataSourceError, Result},
    objective::{Category, Objective},
    position::Coordinate,
    registry::{Capture, ObjectiveRegistry},
    source::ObjectiveSource,
    zone::{Countdown, CountdownGeneration, SafeZone, ShrinkScheduler, ShrinkTick},
};

pub use config::{GameTunables, SessionConfig};
pub use events::{EventSink, EventStream, SessionEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Active,
    Closed,
}

/// Result of one shrink trigger
#[derive(Clone, Debug, PartialEq)]
pub enum ShrinkOutcome {
    /// The session was not active
    Ignored,
    Shrunk {
        radius: f64,
        /// Number of objectives loaded, or why the previous set was kept
        reload: std::result::Result<usize, DataSourceError>,
    },
    Closed,
}

pub struct GameSession {
    tunables: GameTunables,
    registry: ObjectiveRegistry,
    scheduler: Option<ShrinkScheduler>,
    countdown: Countdown,
    config: Option<SessionConfig>,
    state: SessionState,
    score: u32,
    player: Option<Coordinate>,
    epoch: u64,
    events: EventSink,
}

impl GameSession {
    pub fn new(
        source: Arc<dyn ObjectiveSource>,
        tunables: GameTunables,
        events: EventSink,
    ) -> Result<Self> {
        tunables.validate()?;

        Ok(Self {
            countdown: Countdown::new(tunables.countdown_step_ms),
            tunables,
            registry: ObjectiveRegistry::new(source),
            scheduler: None,
            config: None,
            state: SessionState::Idle,
            score: 0,
            player: None,
            epoch: 0,
            events,
        })
    }

    /// A session together with the receiving end of its events
    pub fn with_channel(
        source: Arc<dyn ObjectiveSource>,
        tunables: GameTunables,
    ) -> Result<(Self, EventStream)> {
        let (sink, stream) = EventSink::channel();
        Ok((Self::new(source, tunables, sink)?, stream))
    }

    /// Begin a new game, tearing down any game in progress.
    ///
    /// An invalid configuration is rejected before anything changes. If the first load fails
    /// the session stays in [`SessionState::Loading`] until `start` is called again.
    pub async fn start(&mut self, config: SessionConfig) -> Result<()> {
        config.validate()?;
        let scheduler =
            ShrinkScheduler::new(config.initial_radius_meters, self.tunables.shrink_step_meters)?;

        self.teardown();
        self.epoch += 1;
        self.state = SessionState::Loading;

        info!(
            "starting game {}: {:?} around {:?}, radius {}m",
            self.epoch, config.categories, config.center, config.initial_radius_meters
        );

        let loaded = self
            .registry
            .load(
                &config.categories,
                config.center,
                config.initial_radius_meters,
            )
            .await
            .map(<[Objective]>::to_vec);
        let initial_radius = config.initial_radius_meters;
        self.config = Some(config);

        match loaded {
            Ok(objectives) => {
                self.scheduler = Some(scheduler);
                self.state = SessionState::Active;
                self.events.emit(SessionEvent::ZoneRadiusChanged {
                    radius: initial_radius,
                });
                self.events
                    .emit(SessionEvent::ObjectivesLoaded { objectives });
                self.countdown.start(self.tunables.shrink_interval_ms);
                Ok(())
            }
            Err(error) => {
                warn!("initial objective load failed: {error}");
                self.events.emit(SessionEvent::DataSourceError {
                    error: error.clone(),
                });
                Err(error.into())
            }
        }
    }

    /// Handle a new player position. Ignored unless the session is active.
    pub fn on_player_move(&mut self, position: Coordinate) -> Vec<Capture> {
        if self.state != SessionState::Active {
            debug!("ignoring player move while {:?}", self.state);
            return Vec::new();
        }

        self.player = Some(position);
        let captures = self
            .registry
            .visit(position, self.tunables.capture_radius_meters);

        for capture in &captures {
            self.score += 1;
            info!(
                "captured {} ({:.1}m away), score {}",
                capture.objective.id, capture.distance_meters, self.score
            );
            self.events.emit(SessionEvent::ObjectiveCaptured {
                objective: capture.objective.clone(),
                score: self.score,
            });
        }

        captures
    }

    /// Run one full shrink cycle: contract the zone, reload objectives, restart the countdown.
    ///
    /// A failed reload keeps the previous objectives; the game goes on.
    pub async fn shrink(&mut self) -> ShrinkOutcome {
        if self.state != SessionState::Active {
            debug!("ignoring shrink trigger while {:?}", self.state);
            return ShrinkOutcome::Ignored;
        }
        let (Some(scheduler), Some(config)) = (self.scheduler.as_mut(), self.config.as_ref())
        else {
            return ShrinkOutcome::Ignored;
        };

        // the interval is over even if its last countdown step has not been delivered yet
        if let Some(remaining_ms) = self.countdown.expire() {
            self.events
                .emit(SessionEvent::CountdownTick { remaining_ms });
        }

        let radius = match scheduler.tick() {
            ShrinkTick::ZoneClosed => {
                info!("safe zone closed, final score {}", self.score);
                self.state = SessionState::Closed;
                self.countdown.cancel();
                self.registry.clear_active();
                self.events.emit(SessionEvent::ZoneClosed);
                return ShrinkOutcome::Closed;
            }
            ShrinkTick::Shrunk { radius } => radius,
        };

        debug!("safe zone shrunk to {radius}m");
        self.events.emit(SessionEvent::ZoneRadiusChanged { radius });

        self.state = SessionState::Loading;
        let reload = match self
            .registry
            .load(&config.categories, config.center, radius)
            .await
        {
            Ok(objectives) => {
                let count = objectives.len();
                self.events.emit(SessionEvent::ObjectivesLoaded {
                    objectives: objectives.to_vec(),
                });
                Ok(count)
            }
            Err(error) => {
                warn!("reload after shrink failed, keeping previous objectives: {error}");
                self.events.emit(SessionEvent::DataSourceError {
                    error: error.clone(),
                });
                Err(error)
            }
        };
        self.state = SessionState::Active;
        self.countdown.start(self.tunables.shrink_interval_ms);

        ShrinkOutcome::Shrunk { radius, reload }
    }

    /// Advance the countdown run identified by `generation` by one step.
    pub fn countdown_tick(&mut self, generation: CountdownGeneration) -> Option<u64> {
        if self.state != SessionState::Active {
            return None;
        }

        let remaining_ms = self.countdown.advance(generation)?;
        self.events
            .emit(SessionEvent::CountdownTick { remaining_ms });
        Some(remaining_ms)
    }

    /// Abandon the current game and return to idle
    pub fn end(&mut self) {
        if self.state != SessionState::Idle {
            info!("ending game {} with score {}", self.epoch, self.score);
        }
        self.teardown();
        self.state = SessionState::Idle;
    }

    fn teardown(&mut self) {
        self.countdown.cancel();
        self.scheduler = None;
        self.registry.clear();
        self.config = None;
        self.score = 0;
        self.player = None;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn zone(&self) -> Option<SafeZone> {
        let config = self.config.as_ref()?;
        Some(SafeZone {
            center: config.center,
            radius: self
                .scheduler
                .as_ref()
                .map_or(config.initial_radius_meters, ShrinkScheduler::radius),
        })
    }

    pub fn categories(&self) -> Option<&BTreeSet<Category>> {
        self.config.as_ref().map(|c| &c.categories)
    }

    pub fn objectives(&self) -> &[Objective] {
        self.registry.active()
    }

    pub fn registry(&self) -> &ObjectiveRegistry {
        &self.registry
    }

    pub fn player_position(&self) -> Option<Coordinate> {
        self.player
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn tunables(&self) -> &GameTunables {
        &self.tunables
    }

    /// Bumped on every start; tags shrink triggers of one game
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Shrink cycles completed in the current game
    pub fn shrink_cycle(&self) -> u64 {
        self.scheduler.as_ref().map_or(0, ShrinkScheduler::ticks)
    }

    /// Shrink cycles left before the zone closes
    pub fn remaining_shrinks(&self) -> Option<u64> {
        self.scheduler.as_ref().map(ShrinkScheduler::remaining_ticks)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        error::GameError,
        objective::test_support::{north_of, point_feature},
        position::distance_meters,
        source::test_support::ScriptedSource,
    };

    const CENTER: Coordinate = Coordinate::new(49.01578, 8.39137);

    fn session(source: &ScriptedSource) -> (GameSession, EventStream) {
        GameSession::with_channel(Arc::new(source.clone()), GameTunables::default()).unwrap()
    }

    fn drain(events: &mut EventStream) -> Vec<SessionEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    fn three_cafes() -> Vec<geojson::Feature> {
        vec![
            point_feature(north_of(CENTER, 10.0), "cafe", "near"),
            point_feature(north_of(CENTER, 4000.0), "cafe", "middle"),
            point_feature(north_of(CENTER, 5900.0), "cafe", "edge"),
        ]
    }

    fn cafe_config(radius: f64) -> SessionConfig {
        SessionConfig::new([Category::Cafe], CENTER, radius)
    }

    #[tokio::test]
    async fn test_capture_near_cafe() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, mut events) = session(&source);

        session.start(cafe_config(6000.0)).await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.objectives().len(), 3);
        drain(&mut events);

        let player = north_of(CENTER, 20.0);
        let captures = session.on_player_move(player);

        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].objective.name(), Some("near"));
        assert!(distance_meters(player, captures[0].objective.position) <= 50.0);
        assert_eq!(session.score(), 1);
        assert_eq!(session.objectives().len(), 2);
        assert_eq!(session.player_position(), Some(player));

        assert_eq!(
            drain(&mut events),
            vec![SessionEvent::ObjectiveCaptured {
                objective: captures[0].objective.clone(),
                score: 1,
            }]
        );
    }

    #[tokio::test]
    async fn test_start_emits_radius_and_objectives() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, mut events) = session(&source);

        session.start(cafe_config(6000.0)).await.unwrap();

        let events = drain(&mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SessionEvent::ZoneRadiusChanged { radius: 6000.0 });
        assert!(
            matches!(&events[1], SessionEvent::ObjectivesLoaded { objectives } if objectives.len() == 3)
        );

        assert!(session.countdown().is_running());
        assert_eq!(session.countdown().remaining_ms(), 60_000);
        assert_eq!(
            session.zone(),
            Some(SafeZone {
                center: CENTER,
                radius: 6000.0
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_configuration_stays_idle() {
        let source = ScriptedSource::new();
        let (mut session, mut events) = session(&source);

        let empty = SessionConfig::new(BTreeSet::new(), CENTER, 6000.0);
        assert!(matches!(
            session.start(empty).await,
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            session.start(cafe_config(0.0)).await,
            Err(GameError::InvalidConfiguration(_))
        ));

        assert_eq!(session.state(), SessionState::Idle);
        assert!(source.queries().is_empty());
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_failed_start_stays_loading_until_retried() {
        let source = ScriptedSource::new();
        source
            .respond(Err(DataSourceError::Status(503)))
            .respond(Ok(three_cafes()));
        let (mut session, mut events) = session(&source);

        let err = session.start(cafe_config(6000.0)).await.unwrap_err();
        assert!(matches!(err, GameError::DataSource(DataSourceError::Status(503))));
        assert_eq!(session.state(), SessionState::Loading);
        assert_eq!(
            drain(&mut events),
            vec![SessionEvent::DataSourceError {
                error: DataSourceError::Status(503)
            }]
        );

        // nothing is processed while loading
        assert!(session.on_player_move(north_of(CENTER, 10.0)).is_empty());
        assert_eq!(session.shrink().await, ShrinkOutcome::Ignored);
        assert!(!session.countdown().is_running());

        session.start(cafe_config(6000.0)).await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.objectives().len(), 3);
    }

    #[tokio::test]
    async fn test_moves_ignored_when_idle() {
        let source = ScriptedSource::new();
        let (mut session, _events) = session(&source);

        assert!(session.on_player_move(CENTER).is_empty());
        assert_eq!(session.player_position(), None);
        assert_eq!(session.shrink().await, ShrinkOutcome::Ignored);
        assert_eq!(session.countdown_tick(0), None);
    }

    #[tokio::test]
    async fn test_shrink_cycle_reloads_for_new_radius() {
        let source = ScriptedSource::new();
        source
            .respond(Ok(three_cafes()))
            .respond(Ok(three_cafes()[..2].to_vec()));
        let (mut session, mut events) = session(&source);
        session.start(cafe_config(6000.0)).await.unwrap();
        let first_generation = session.countdown().generation();
        drain(&mut events);

        let outcome = session.shrink().await;
        assert_eq!(
            outcome,
            ShrinkOutcome::Shrunk {
                radius: 5000.0,
                reload: Ok(2)
            }
        );
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.objectives().len(), 2);
        assert_eq!(session.zone().map(|z| z.radius), Some(5000.0));
        assert_eq!(source.queries()[1].radius_meters, 5000.0);

        // countdown restarted, the old run is dead
        assert_ne!(session.countdown().generation(), first_generation);
        assert_eq!(session.countdown_tick(first_generation), None);

        let events = drain(&mut events);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], SessionEvent::CountdownTick { remaining_ms: 0 });
        assert_eq!(events[1], SessionEvent::ZoneRadiusChanged { radius: 5000.0 });
        assert!(matches!(&events[2], SessionEvent::ObjectivesLoaded { objectives } if objectives.len() == 2));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_game_running() {
        let source = ScriptedSource::new();
        source
            .respond(Ok(three_cafes()))
            .respond(Err(DataSourceError::Timeout));
        let (mut session, mut events) = session(&source);
        session.start(cafe_config(6000.0)).await.unwrap();
        let before: Vec<_> = session.objectives().to_vec();
        let first_generation = session.countdown().generation();
        drain(&mut events);

        let outcome = session.shrink().await;
        assert_eq!(
            outcome,
            ShrinkOutcome::Shrunk {
                radius: 5000.0,
                reload: Err(DataSourceError::Timeout)
            }
        );
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.objectives(), &before[..]);
        assert!(session.countdown().is_running());
        assert_eq!(session.countdown().remaining_ms(), 60_000);
        assert_ne!(session.countdown().generation(), first_generation);

        assert_eq!(
            drain(&mut events),
            vec![
                SessionEvent::CountdownTick { remaining_ms: 0 },
                SessionEvent::ZoneRadiusChanged { radius: 5000.0 },
                SessionEvent::DataSourceError {
                    error: DataSourceError::Timeout
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_zone_closes_and_stays_closed() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, mut events) = session(&source);
        session.start(cafe_config(2000.0)).await.unwrap();

        assert!(matches!(
            session.shrink().await,
            ShrinkOutcome::Shrunk { radius, .. } if radius == 1000.0
        ));
        drain(&mut events);

        assert_eq!(session.shrink().await, ShrinkOutcome::Closed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.countdown().is_running());
        assert!(session.objectives().is_empty());
        assert_eq!(session.zone().map(|z| z.radius), Some(0.0));
        assert_eq!(
            drain(&mut events),
            vec![
                SessionEvent::CountdownTick { remaining_ms: 0 },
                SessionEvent::ZoneClosed
            ]
        );

        // terminal
        assert_eq!(session.shrink().await, ShrinkOutcome::Ignored);
        assert!(session.on_player_move(north_of(CENTER, 10.0)).is_empty());
        assert!(drain(&mut events).is_empty());
        assert_eq!(source.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_countdown_ticks_are_forwarded() {
        let source = ScriptedSource::new();
        let tunables = GameTunables {
            shrink_interval_ms: 3000,
            ..GameTunables::default()
        };
        let (mut session, mut events) =
            GameSession::with_channel(Arc::new(source.clone()), tunables).unwrap();
        session.start(cafe_config(6000.0)).await.unwrap();
        drain(&mut events);

        let generation = session.countdown().generation();
        let ticks: Vec<_> = std::iter::from_fn(|| session.countdown_tick(generation)).collect();
        assert_eq!(ticks, vec![2000, 1000, 0]);
        assert_eq!(
            drain(&mut events),
            vec![
                SessionEvent::CountdownTick { remaining_ms: 2000 },
                SessionEvent::CountdownTick { remaining_ms: 1000 },
                SessionEvent::CountdownTick { remaining_ms: 0 },
            ]
        );

        // zero was already reported, the shrink does not repeat it
        assert!(matches!(session.shrink().await, ShrinkOutcome::Shrunk { .. }));
        assert_eq!(drain(&mut events)[0], SessionEvent::ZoneRadiusChanged { radius: 5000.0 });
    }

    #[tokio::test]
    async fn test_shrink_reports_zero_before_new_countdown() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let tunables = GameTunables {
            shrink_interval_ms: 3000,
            ..GameTunables::default()
        };
        let (mut session, mut events) =
            GameSession::with_channel(Arc::new(source.clone()), tunables).unwrap();
        session.start(cafe_config(6000.0)).await.unwrap();
        let generation = session.countdown().generation();
        assert_eq!(session.countdown_tick(generation), Some(2000));
        assert_eq!(session.countdown_tick(generation), Some(1000));
        drain(&mut events);

        // the last step of the interval races the shrink and loses
        session.shrink().await;
        assert_eq!(session.countdown_tick(generation), None);

        let events = drain(&mut events);
        assert_eq!(events[0], SessionEvent::CountdownTick { remaining_ms: 0 });
        assert_eq!(events[1], SessionEvent::ZoneRadiusChanged { radius: 5000.0 });
        assert_eq!(session.countdown().remaining_ms(), 3000);
        assert!(session.countdown().is_running());
    }

    #[tokio::test]
    async fn test_restart_resets_everything() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, _events) = session(&source);

        session.start(cafe_config(6000.0)).await.unwrap();
        session.shrink().await;
        assert_eq!(session.on_player_move(CENTER).len(), 1);
        let epoch = session.epoch();

        session
            .start(SessionConfig::new([Category::Cafe], CENTER, 3000.0))
            .await
            .unwrap();

        assert_eq!(session.epoch(), epoch + 1);
        assert_eq!(session.score(), 0);
        assert_eq!(session.shrink_cycle(), 0);
        assert_eq!(session.player_position(), None);
        assert_eq!(session.registry().visited_count(), 0);
        // the captured cafe is back
        assert_eq!(session.objectives().len(), 3);
        assert_eq!(session.zone().map(|z| z.radius), Some(3000.0));
    }

    #[tokio::test]
    async fn test_invalid_restart_keeps_running_game() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, _events) = session(&source);
        session.start(cafe_config(6000.0)).await.unwrap();

        assert!(session.start(cafe_config(-1.0)).await.is_err());
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.objectives().len(), 3);
    }

    #[tokio::test]
    async fn test_score_counts_distinct_captures() {
        let source = ScriptedSource::new();
        let features: Vec<_> = (0..40)
            .map(|i| point_feature(north_of(CENTER, i as f64 * 70.0), "cafe", "c"))
            .collect();
        source.respond(Ok(features));
        let (mut session, _events) = session(&source);
        session.start(cafe_config(6000.0)).await.unwrap();

        let mut seen = HashSet::new();
        // walk north and back, reloading along the way
        let path = (0..=120).chain((0..=120).rev());
        for (step, i) in path.enumerate() {
            for capture in session.on_player_move(north_of(CENTER, i as f64 * 25.0)) {
                assert!(seen.insert(capture.objective.id.clone()), "captured twice");
            }
            if step % 50 == 49 {
                session.shrink().await;
            }
        }

        assert_eq!(session.score() as usize, seen.len());
        assert_eq!(seen.len(), 40);
    }

    #[tokio::test]
    async fn test_end_returns_to_idle() {
        let source = ScriptedSource::new();
        source.respond(Ok(three_cafes()));
        let (mut session, _events) = session(&source);
        session.start(cafe_config(6000.0)).await.unwrap();

        session.end();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.objectives().is_empty());
        assert!(!session.countdown().is_running());
        assert_eq!(session.zone(), None);
    }
}
