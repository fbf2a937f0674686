//! Instance health state machine.
//!
//! # Transitions
//! ```text
//! any → Passing:  2xx response
//! any → Critical: non-2xx, timeout or connection error
//! ```
//!
//! Warning is never entered automatically. One probe decides one status;
//! there is no hysteresis and no retry within a tick.

use std::time::{Duration, Instant};

use crate::health::probe::ProbeError;
use crate::registry::HealthStatus;

/// Status implied by a single probe outcome.
pub fn status_for(result: &Result<u16, ProbeError>) -> HealthStatus {
    match result {
        Ok(_) => HealthStatus::Passing,
        Err(_) => HealthStatus::Critical,
    }
}

/// Tracks how long an instance has been continuously critical.
#[derive(Debug, Default)]
pub struct CriticalTimer {
    since: Option<Instant>,
}

impl CriticalTimer {
    /// Feed the latest status; returns how long it has been critical.
    pub fn observe(&mut self, status: HealthStatus, now: Instant) -> Duration {
        if status == HealthStatus::Critical {
            let since = *self.since.get_or_insert(now);
            now.saturating_duration_since(since)
        } else {
            self.since = None;
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_probe_outcomes() {
        assert_eq!(status_for(&Ok(200)), HealthStatus::Passing);
        assert_eq!(status_for(&Ok(204)), HealthStatus::Passing);
        assert_eq!(status_for(&Err(ProbeError::Status(500))), HealthStatus::Critical);
        assert_eq!(
            status_for(&Err(ProbeError::Timeout(Duration::from_secs(1)))),
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_critical_timer_accumulates_and_resets() {
        let mut timer = CriticalTimer::default();
        let t0 = Instant::now();

        assert_eq!(timer.observe(HealthStatus::Critical, t0), Duration::ZERO);
        assert_eq!(
            timer.observe(HealthStatus::Critical, t0 + Duration::from_secs(20)),
            Duration::from_secs(20)
        );

        assert_eq!(
            timer.observe(HealthStatus::Passing, t0 + Duration::from_secs(30)),
            Duration::ZERO
        );
        assert_eq!(
            timer.observe(HealthStatus::Critical, t0 + Duration::from_secs(40)),
            Duration::ZERO
        );
    }
}
