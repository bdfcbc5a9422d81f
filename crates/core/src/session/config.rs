use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, Result},
    objective::Category,
    position::Coordinate,
};

pub const DEFAULT_SHRINK_STEP_METERS: f64 = 1000.0;
pub const DEFAULT_SHRINK_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_CAPTURE_RADIUS_METERS: f64 = 50.0;
pub const DEFAULT_COUNTDOWN_STEP_MS: u64 = 1000;
pub const DEFAULT_INITIAL_RADIUS_METERS: f64 = 6000.0;

/// Game rules that stay fixed for the lifetime of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTunables {
    pub shrink_step_meters: f64,
    pub shrink_interval_ms: u64,
    pub capture_radius_meters: f64,
    pub countdown_step_ms: u64,
}

impl Default for GameTunables {
    fn default() -> Self {
        Self {
            shrink_step_meters: DEFAULT_SHRINK_STEP_METERS,
            shrink_interval_ms: DEFAULT_SHRINK_INTERVAL_MS,
            capture_radius_meters: DEFAULT_CAPTURE_RADIUS_METERS,
            countdown_step_ms: DEFAULT_COUNTDOWN_STEP_MS,
        }
    }
}

impl GameTunables {
    pub fn from_json(json: &str) -> Result<Self> {
        let tunables: Self = serde_json::from_str(json)
            .map_err(|e| GameError::InvalidConfiguration(format!("tunables: {e}")))?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.shrink_step_meters.is_finite() || self.shrink_step_meters <= 0.0 {
            return Err(GameError::InvalidConfiguration(format!(
                "shrink_step_meters must be positive, got {}",
                self.shrink_step_meters
            )));
        }
        if self.shrink_interval_ms == 0 {
            return Err(GameError::InvalidConfiguration(
                "shrink_interval_ms must be positive".into(),
            ));
        }
        if !self.capture_radius_meters.is_finite() || self.capture_radius_meters < 0.0 {
            return Err(GameError::InvalidConfiguration(format!(
                "capture_radius_meters must not be negative, got {}",
                self.capture_radius_meters
            )));
        }
        if self.countdown_step_ms == 0 {
            return Err(GameError::InvalidConfiguration(
                "countdown_step_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn shrink_interval(&self) -> Duration {
        Duration::from_millis(self.shrink_interval_ms)
    }

    pub fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }
}

/// What a player picks before starting a game.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub categories: BTreeSet<Category>,
    pub center: Coordinate,
    pub initial_radius_meters: f64,
}

impl SessionConfig {
    pub fn new(
        categories: impl IntoIterator<Item = Category>,
        center: Coordinate,
        initial_radius_meters: f64,
    ) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            center,
            initial_radius_meters,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(GameError::InvalidConfiguration(
                "no objective categories selected".into(),
            ));
        }
        if !self.center.is_finite() {
            return Err(GameError::InvalidConfiguration(format!(
                "center is not a valid coordinate: {:?}",
                self.center
            )));
        }
        if !self.initial_radius_meters.is_finite() || self.initial_radius_meters <= 0.0 {
            return Err(GameError::InvalidConfiguration(format!(
                "initial radius must be positive, got {}",
                self.initial_radius_meters
            )));
        }
        Ok(())
    }
}
