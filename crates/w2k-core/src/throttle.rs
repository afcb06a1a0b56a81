//! Submission throttling by polling the engine.
//!
//! Active process counts change on the scale of minutes, so a fixed-interval
//! poll is enough. There is no retry bound and no cancellation.
use std::time::Duration;

use tracing::{debug, instrument};

use crate::engine::{Engine, EngineError};

/// Ceiling on active (created or waiting) processes of one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Submission pauses while at least this many processes are active.
    pub ceiling: usize,
    /// Sleep between two polls.
    pub interval: Duration,
    /// Sleep before the first poll, giving the engine time to register the last submission.
    pub initial_delay: Duration,
}

impl Throttle {
    pub fn new(ceiling: usize, interval: Duration) -> Self {
        Self {
            ceiling,
            interval,
            initial_delay: Duration::ZERO,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Count processes of `entry_point` that are created or waiting.
    pub async fn count_active(
        engine: &dyn Engine,
        entry_point: &str,
    ) -> Result<usize, EngineError> {
        let mut active = 0;
        for handle in engine.query(entry_point).await? {
            if engine.status(&handle).await?.is_active() {
                active += 1;
            }
        }
        Ok(active)
    }

    /// Block until fewer than `ceiling` processes of `entry_point` are active.
    ///
    /// Returns the number of polls performed. A `ceiling` of zero never returns.
    #[instrument(level = "debug", skip(self, engine), fields(engine = engine.name(), ceiling = self.ceiling))]
    pub async fn wait_below_ceiling(
        &self,
        engine: &dyn Engine,
        entry_point: &str,
    ) -> Result<usize, EngineError> {
        if !self.initial_delay.is_zero() {
            tokio::time::sleep(self.initial_delay).await;
        }

        let mut polls = 0;
        loop {
            polls += 1;
            let active = Self::count_active(engine, entry_point).await?;
            if active < self.ceiling {
                debug!(active, polls, "below ceiling");
                return Ok(polls);
            }
            debug!(active, "ceiling reached; waiting {:?}", self.interval);
            tokio::time::sleep(self.interval).await;
        }
    }
}
