//! Consecutive-failure counter driving remediation.

use std::fmt;
use std::num::NonZeroU32;

/// State-machine view of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// No unhealthy poll since the last reset.
    Healthy,
    /// `n` consecutive unhealthy polls, below the threshold.
    Degraded(u32),
    /// Threshold reached; a restart is due before the next reset.
    Remediating,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(n) => write!(f, "degraded({n})"),
            Self::Remediating => write!(f, "remediating"),
        }
    }
}

/// Counts consecutive unhealthy polls.
///
/// Level-triggered: a single healthy poll discards all progress, so only an
/// unbroken run of `threshold` unhealthy polls triggers remediation.
#[derive(Debug, Clone)]
pub struct FailureCounter {
    count: u32,
    threshold: NonZeroU32,
}

impl FailureCounter {
    #[must_use]
    pub const fn new(threshold: NonZeroU32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn threshold(&self) -> NonZeroU32 {
        self.threshold
    }

    #[must_use]
    pub const fn state(&self) -> HealthState {
        if self.count == 0 {
            HealthState::Healthy
        } else if self.count < self.threshold.get() {
            HealthState::Degraded(self.count)
        } else {
            HealthState::Remediating
        }
    }

    /// Record an unhealthy poll. Returns `true` once the threshold is reached;
    /// the caller remediates and then calls [`reset`](Self::reset).
    pub fn record_unhealthy(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count >= self.threshold.get()
    }

    /// Record a healthy poll.
    pub fn record_healthy(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(threshold: u32) -> FailureCounter {
        FailureCounter::new(NonZeroU32::new(threshold).unwrap())
    }

    #[test]
    fn test_states() {
        let mut c = counter(3);
        assert_eq!(c.state(), HealthState::Healthy);

        assert!(!c.record_unhealthy());
        assert_eq!(c.state(), HealthState::Degraded(1));

        assert!(!c.record_unhealthy());
        assert_eq!(c.state(), HealthState::Degraded(2));

        assert!(c.record_unhealthy());
        assert_eq!(c.state(), HealthState::Remediating);

        c.reset();
        assert_eq!(c.state(), HealthState::Healthy);
    }

    #[test]
    fn test_threshold_of_one_triggers_immediately() {
        let mut c = counter(1);
        assert!(c.record_unhealthy());
        assert_eq!(c.state(), HealthState::Remediating);
    }

    #[test]
    fn test_healthy_poll_resets_progress() {
        let mut c = counter(3);
        c.record_unhealthy();
        c.record_unhealthy();
        c.record_healthy();
        assert_eq!(c.count(), 0);
        assert!(!c.record_unhealthy());
        assert!(!c.record_unhealthy());
    }

    /// Replays a sequence of polls (`true` = unhealthy) and checks that the
    /// count always equals the trailing unhealthy run since the last reset.
    #[test]
    fn test_count_tracks_trailing_run() {
        let polls = [
            true, false, true, true, false, true, true, true, true, false, false, true,
        ];
        let mut c = counter(3);
        let mut run = 0u32;
        let mut triggers = 0;

        for unhealthy in polls {
            if unhealthy {
                run += 1;
                if c.record_unhealthy() {
                    triggers += 1;
                    c.reset();
                    run = 0;
                }
            } else {
                c.record_healthy();
                run = 0;
            }
            assert_eq!(c.count(), run);
            assert!(c.count() < c.threshold().get());
        }

        assert_eq!(triggers, 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(HealthState::Degraded(2).to_string(), "degraded(2)");
    }
}
