//! # zone-hunt-core
//!
//! Game engine for a shrinking safe zone scavenger hunt.
//!
//! A player visits real-world points of interest (objectives) while a circular safe zone around
//! a fixed center contracts on a timer.
//!
//! ## Features
//!
//! - **Session state machine**: start, shrink cycles, captures and closing in one owned object
//! - **Deduplicated objectives**: an objective is captured at most once per game
//! - **Partial-failure tolerance**: a failed reload keeps the previous objectives
//! - **Pluggable sources**: fetch objectives over HTTP or serve them from memory
//! - **Driver**: run a session on a tokio task with cancelable shrink and countdown timers
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use zone_hunt_core::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = StaticSource::new(Vec::new());
//! let (mut session, _events) =
//!     GameSession::with_channel(Arc::new(source), GameTunables::default()).unwrap();
//!
//! let center = Coordinate::new(49.01578, 8.39137);
//! session
//!     .start(SessionConfig::new([Category::Cafe], center, 6000.0))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(session.state(), SessionState::Active);
//! assert!(session.on_player_move(center).is_empty());
//! # }
//! ```

pub mod error;
pub mod identifiers;
pub mod objective;
pub mod position;
pub mod registry;
pub mod session;
pub mod source;
pub mod zone;

pub mod prelude {
    pub use crate::error::{DataSourceError, GameError};
    pub use crate::identifiers::ObjectiveId;
    pub use crate::objective::{
        AttributeValue, Category, Objective,
        details::{ObjectiveDetails, details},
    };
    pub use crate::position::{Coordinate, distance_meters, objective_key};
    pub use crate::registry::{Capture, ObjectiveRegistry};
    pub use crate::session::{
        EventStream, GameSession, GameTunables, SessionConfig, SessionEvent, SessionState,
        ShrinkOutcome,
        driver::{SessionHandle, SessionSnapshot},
    };
    pub use crate::source::{ObjectiveSource, PoiQuery, ProxySource, StaticSource};
    pub use crate::zone::{Countdown, SafeZone, ShrinkScheduler, ShrinkTick};
}

pub use prelude::*;
