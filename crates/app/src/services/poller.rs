use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use pipeline::is_weekend;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::BoardConfig;
use crate::error::Result;
use crate::services::DashboardService;
use crate::util::time::local_datetime;

/// When the background poller is allowed to run a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub weekdays_only: bool,
    pub active_from: Option<NaiveTime>,
    pub active_until: Option<NaiveTime>,
    pub timezone: Tz,
}

impl PollSchedule {
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        let (active_from, active_until) = config.active_hours()?;
        Ok(Self {
            interval: Duration::from_secs(config.poll.interval_secs.max(1)),
            weekdays_only: config.poll.weekdays_only,
            active_from,
            active_until,
            timezone: config.timezone()?,
        })
    }

    /// `active_from` is inclusive, `active_until` exclusive, both local.
    pub fn should_poll(&self, now: DateTime<Utc>) -> bool {
        let local = local_datetime(now, &self.timezone);
        if self.weekdays_only && is_weekend(local.date()) {
            return false;
        }
        let time = local.time();
        if self.active_from.is_some_and(|from| time < from) {
            return false;
        }
        if self.active_until.is_some_and(|until| time >= until) {
            return false;
        }
        true
    }
}

/// Spawns the polling loop. The first tick fires immediately.
pub fn spawn_poller(service: DashboardService, schedule: PollSchedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            if !schedule.should_poll(now) {
                tracing::debug!("outside active polling hours; skipping tick");
                continue;
            }
            let snapshot = service.refresh_at(now).await;
            match snapshot.warning.as_deref() {
                Some(warning) => tracing::warn!(warning, "published degraded board"),
                None => tracing::debug!(
                    issues = snapshot.issues.len(),
                    celebrations = snapshot.celebrations.len(),
                    "published board"
                ),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> PollSchedule {
        PollSchedule {
            interval: Duration::from_secs(60),
            weekdays_only: true,
            active_from: NaiveTime::from_hms_opt(7, 0, 0),
            active_until: NaiveTime::from_hms_opt(16, 0, 0),
            timezone: Tz::America__New_York,
        }
    }

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("ts")
            .with_timezone(&Utc)
    }

    #[test]
    fn polls_inside_weekday_hours() {
        // Monday 09:00 in New York.
        assert!(schedule().should_poll(at("2024-06-03T13:00:00Z")));
        // Exactly 07:00 local is inside.
        assert!(schedule().should_poll(at("2024-06-03T11:00:00Z")));
    }

    #[test]
    fn skips_outside_hours_and_on_weekends() {
        // 06:59 and 16:00 local.
        assert!(!schedule().should_poll(at("2024-06-03T10:59:00Z")));
        assert!(!schedule().should_poll(at("2024-06-03T20:00:00Z")));
        // Saturday noon.
        assert!(!schedule().should_poll(at("2024-06-08T16:00:00Z")));
    }

    #[test]
    fn unbounded_schedule_always_polls() {
        let open = PollSchedule {
            weekdays_only: false,
            active_from: None,
            active_until: None,
            ..schedule()
        };
        assert!(open.should_poll(at("2024-06-08T03:00:00Z")));
    }
}
