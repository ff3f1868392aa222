//! The command schedule.

use chrono::{DateTime, TimeDelta, Utc};
use lectern_common::config::{AppConfig, SchedulerConfig};

/// Releases matured affiliate commissions.
pub const RELEASE_COMMISSIONS: &str = "affiliate:release-commissions";
/// Resets demo data.
pub const DEMO_CLEANUP: &str = "demo:cleanup";

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

/// How often a command runs. All times are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// At the top of every hour.
    Hourly,
    /// Once a day.
    Daily {
        /// Seconds after midnight.
        offset: i64,
    },
}

impl Cadence {
    /// Daily at `hour:minute`.
    #[must_use]
    pub const fn daily_at(hour: i64, minute: i64) -> Self {
        Self::Daily {
            offset: hour.rem_euclid(24) * HOUR + minute.rem_euclid(60) * 60,
        }
    }

    /// The first slot strictly after `now`.
    #[must_use]
    pub fn next_after(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = now.timestamp();
        let (period, offset) = match self {
            Self::Hourly => (HOUR, 0),
            Self::Daily { offset } => (DAY, offset),
        };

        let mut next = secs.div_euclid(period) * period + offset;
        if next <= secs {
            next += period;
        }

        DateTime::from_timestamp(next, 0).unwrap_or_else(|| now + TimeDelta::seconds(period))
    }
}

/// A console command and its cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCommand {
    /// Console command name, e.g. `demo:cleanup`.
    pub name: String,
    /// When it runs.
    pub cadence: Cadence,
}

impl ScheduledCommand {
    #[must_use]
    pub fn new(name: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            name: name.into(),
            cadence,
        }
    }
}

/// The commands this deployment runs.
///
/// Demo cleanup is only registered on demo deployments that opt in.
#[must_use]
pub fn default_schedule(scheduler: &SchedulerConfig, app: &AppConfig) -> Vec<ScheduledCommand> {
    let mut schedule = vec![ScheduledCommand::new(
        RELEASE_COMMISSIONS,
        Cadence::daily_at(0, 0),
    )];

    if scheduler.demo_cleanup && app.demo_mode {
        schedule.push(ScheduledCommand::new(DEMO_CLEANUP, Cadence::Hourly));
    }

    schedule
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_hourly_next_after() {
        assert_eq!(
            Cadence::Hourly.next_after(at("2024-03-01T10:15:30Z")),
            at("2024-03-01T11:00:00Z")
        );
        // exactly on the slot moves to the next one
        assert_eq!(
            Cadence::Hourly.next_after(at("2024-03-01T11:00:00Z")),
            at("2024-03-01T12:00:00Z")
        );
    }

    #[test]
    fn test_daily_midnight_next_after() {
        let midnight = Cadence::daily_at(0, 0);

        assert_eq!(
            midnight.next_after(at("2024-03-01T10:15:30Z")),
            at("2024-03-02T00:00:00Z")
        );
        assert_eq!(
            midnight.next_after(at("2024-12-31T23:59:59Z")),
            at("2025-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_daily_with_offset() {
        let cadence = Cadence::daily_at(6, 30);

        assert_eq!(
            cadence.next_after(at("2024-03-01T05:00:00Z")),
            at("2024-03-01T06:30:00Z")
        );
        assert_eq!(
            cadence.next_after(at("2024-03-01T07:00:00Z")),
            at("2024-03-02T06:30:00Z")
        );
    }

    #[test]
    fn test_default_schedule() {
        let schedule = default_schedule(&SchedulerConfig::default(), &AppConfig::default());

        assert_eq!(
            schedule,
            vec![ScheduledCommand::new(
                RELEASE_COMMISSIONS,
                Cadence::daily_at(0, 0)
            )]
        );
    }

    #[test]
    fn test_demo_cleanup_needs_both_flags() {
        let opted_in = SchedulerConfig {
            demo_cleanup: true,
            ..SchedulerConfig::default()
        };
        let demo = AppConfig { demo_mode: true };

        assert_eq!(default_schedule(&opted_in, &AppConfig::default()).len(), 1);
        assert_eq!(default_schedule(&SchedulerConfig::default(), &demo).len(), 1);

        let schedule = default_schedule(&opted_in, &demo);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[1], ScheduledCommand::new(DEMO_CLEANUP, Cadence::Hourly));
    }
}
