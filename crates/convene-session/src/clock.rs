//! Elapsed meeting time.

use std::time::Duration;

use convene_common::helpers::format_elapsed;
use tokio::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct SessionClock {
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start instant. Later calls keep the original start.
    pub fn start(&mut self) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(Instant::now());
        true
    }

    /// Freezes elapsed time. Has no effect before `start` or after a prior `stop`.
    pub fn stop(&mut self) {
        if self.started_at.is_some() && self.stopped_at.is_none() {
            self.stopped_at = Some(Instant::now());
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.stopped_at) {
            (None, _) => Duration::ZERO,
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
        }
    }

    /// `MM:SS`, or `H:MM:SS` past the first hour.
    pub fn label(&self) -> String {
        format_elapsed(self.elapsed())
    }
}
