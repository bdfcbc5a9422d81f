use crate::error::{GameError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Armed,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShrinkTick {
    Shrunk { radius: f64 },
    ZoneClosed,
}

/// Contracts the safe zone radius by a fixed step per tick.
///
/// Has no clock of its own; whoever owns it decides when a tick happens.
#[derive(Clone, Debug)]
pub struct ShrinkScheduler {
    initial_radius: f64,
    step: f64,
    ticks: u64,
    /// Tick on which the radius reaches zero
    closing_tick: u64,
    radius: f64,
    state: SchedulerState,
}

impl ShrinkScheduler {
    pub fn new(initial_radius: f64, step: f64) -> Result<Self> {
        if !initial_radius.is_finite() || initial_radius <= 0.0 {
            return Err(GameError::InvalidConfiguration(format!(
                "initial radius must be positive, got {initial_radius}"
            )));
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(GameError::InvalidConfiguration(format!(
                "shrink step must be positive, got {step}"
            )));
        }

        Ok(Self {
            initial_radius,
            step,
            ticks: 0,
            closing_tick: (initial_radius / step).ceil().max(1.0) as u64,
            radius: initial_radius,
            state: SchedulerState::Armed,
        })
    }

    pub fn tick(&mut self) -> ShrinkTick {
        if self.state == SchedulerState::Closed {
            return ShrinkTick::ZoneClosed;
        }

        self.ticks += 1;
        // derived from the initial radius so rounding does not accumulate
        let radius = self.initial_radius - self.ticks as f64 * self.step;

        if self.ticks >= self.closing_tick || radius <= 0.0 {
            self.radius = 0.0;
            self.state = SchedulerState::Closed;
            ShrinkTick::ZoneClosed
        } else {
            self.radius = radius;
            ShrinkTick::Shrunk { radius }
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SchedulerState::Closed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks left until the zone closes
    pub fn remaining_ticks(&self) -> u64 {
        self.closing_tick.saturating_sub(self.ticks)
    }
}
