pub mod countdown;
pub mod scheduler;

pub use countdown::{Countdown, CountdownGeneration};
pub use scheduler::{SchedulerState, ShrinkScheduler, ShrinkTick};

use crate::position::{Coordinate, distance_meters};

/// The circular play area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SafeZone {
    pub center: Coordinate,
    pub radius: f64,
}

impl SafeZone {
    pub fn contains(&self, position: Coordinate) -> bool {
        distance_meters(self.center, position) <= self.radius
    }

    pub fn is_closed(&self) -> bool {
        self.radius <= 0.0
    }
}
