use survey_spec::Step;
use time::{Duration, OffsetDateTime};

/// Single-slot countdown. Arming replaces any live deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoAdvanceTimer {
    armed: Option<Armed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    step: Step,
    deadline: OffsetDateTime,
    total: Duration,
}

/// A deadline that has passed; carries the step it was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub step: Step,
}

impl AutoAdvanceTimer {
    pub fn schedule(&mut self, step: Step, now: OffsetDateTime, after: Duration) {
        self.armed = Some(Armed {
            step,
            deadline: now + after,
            total: after,
        });
    }

    pub fn clear(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.armed.map(|armed| armed.deadline)
    }

    pub fn total(&self) -> Option<Duration> {
        self.armed.map(|armed| armed.total)
    }

    /// `deadline - now`, clamped at zero.
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        self.armed
            .map(|armed| (armed.deadline - now).max(Duration::ZERO))
    }

    /// Whole seconds left, rounded up, for countdown notices.
    pub fn seconds_left(&self, now: OffsetDateTime) -> Option<u64> {
        self.remaining(now).map(|remaining| {
            let millis = remaining.whole_milliseconds().max(0) as u64;
            millis.div_ceil(1000)
        })
    }

    /// Disarms and reports the deadline once it has passed.
    pub fn poll(&mut self, now: OffsetDateTime) -> Option<Expired> {
        let armed = self.armed?;
        if now < armed.deadline {
            return None;
        }
        self.armed = None;
        Some(Expired { step: armed.step })
    }
}
