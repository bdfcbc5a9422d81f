/// Identifies one run of a [`Countdown`]. Restarting produces a new generation.
pub type CountdownGeneration = u64;

pub const DEFAULT_STEP_MS: u64 = 1000;

/// Time left until the next shrink, advanced one step at a time.
///
/// Purely informational: nothing in the game reacts to it reaching zero.
#[derive(Clone, Debug)]
pub struct Countdown {
    step_ms: u64,
    remaining_ms: u64,
    generation: CountdownGeneration,
    running: bool,
}

impl Countdown {
    pub fn new(step_ms: u64) -> Self {
        Self {
            step_ms: step_ms.max(1),
            remaining_ms: 0,
            generation: 0,
            running: false,
        }
    }

    /// Start over from `duration_ms`, discarding whatever was left of the previous run.
    pub fn start(&mut self, duration_ms: u64) -> CountdownGeneration {
        self.generation += 1;
        self.remaining_ms = duration_ms;
        self.running = true;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Advance one step of the run identified by `generation`.
    ///
    /// Returns the new remaining time, or `None` if that run is no longer current. The run
    /// stops after reporting zero.
    pub fn advance(&mut self, generation: CountdownGeneration) -> Option<u64> {
        if !self.running || generation != self.generation {
            return None;
        }

        self.remaining_ms = self.remaining_ms.saturating_sub(self.step_ms);
        if self.remaining_ms == 0 {
            self.running = false;
        }
        Some(self.remaining_ms)
    }

    /// Run the current countdown out at once.
    ///
    /// Returns zero when a run was in progress, `None` if there was nothing left to report.
    pub fn expire(&mut self) -> Option<u64> {
        if !self.running {
            return None;
        }

        self.remaining_ms = 0;
        self.running = false;
        Some(0)
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> CountdownGeneration {
        self.generation
    }

    /// Generation of the current run, if one is in progress
    pub fn active_generation(&self) -> Option<CountdownGeneration> {
        self.running.then_some(self.generation)
    }

    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_MS)
    }
}
