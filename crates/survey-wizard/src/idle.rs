use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Interaction classes that count as respondent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Pointer,
    Key,
    Touch,
    Scroll,
    VisibilityChange,
    ValueChange,
}

/// Tracks time since the last interaction and guards the forced
/// submission so it runs at most once at a time.
#[derive(Debug, Clone)]
pub struct IdleMonitor {
    threshold: Duration,
    last_activity: OffsetDateTime,
    in_flight: bool,
}

impl IdleMonitor {
    pub fn new(threshold: Duration, now: OffsetDateTime) -> Self {
        Self {
            threshold,
            last_activity: now,
            in_flight: false,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn last_activity(&self) -> OffsetDateTime {
        self.last_activity
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    pub fn idle_for(&self, now: OffsetDateTime) -> Duration {
        (now - self.last_activity).max(Duration::ZERO)
    }

    pub fn is_idle(&self, now: OffsetDateTime) -> bool {
        self.idle_for(now) >= self.threshold
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claims the forced-submission slot when the threshold has passed and
    /// no forced submission is already running.
    pub fn try_begin(&mut self, now: OffsetDateTime) -> bool {
        if self.in_flight || !self.is_idle(now) {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Releases the slot and restarts the idle clock.
    pub fn finish(&mut self, now: OffsetDateTime) {
        self.in_flight = false;
        self.last_activity = now;
    }
}
