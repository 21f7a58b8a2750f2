//! Backup scheduling
//!
//! A 5-field cron expression (each field `*` or a single numeric value)
//! evaluated in the configured IANA timezone. The runner is a spawned
//! task that sleeps until the next occurrence, runs the orchestrator, and
//! reschedules; runs are sequential by construction, so a slow backup
//! delays the next one instead of overlapping it.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::services::backup::BackupService;

/// Schedule configuration errors; these fail startup
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScheduleError {
    #[error("backup cron expression must have 5 fields (minute hour day-of-month month day-of-week), got {0}")]
    FieldCount(usize),
    #[error("invalid cron field '{0}'")]
    InvalidField(String),
    #[error("cron field '{value}' out of range ({min}-{max})")]
    OutOfRange { value: String, min: u32, max: u32 },
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Parsed cron schedule; `None` means the field is `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Option<u32>,
    hour: Option<u32>,
    day_of_month: Option<u32>,
    month: Option<u32>,
    day_of_week: Option<u32>,
    raw: String,
}

impl CronSchedule {
    /// Parse a 5-field cron expression.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(ScheduleError::FieldCount(parts.len()));
        }

        let minute = parse_field(parts[0], 0, 59)?;
        let hour = parse_field(parts[1], 0, 23)?;
        let day_of_month = parse_field(parts[2], 1, 31)?;
        let month = parse_field(parts[3], 1, 12)?;
        let day_of_week = parse_field(parts[4], 0, 7)?;

        Ok(Self {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
            raw: trimmed.to_string(),
        })
    }

    /// The expression as configured
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Compute the next occurrence strictly after `now`, scanning forward
    /// minute by minute for up to 366 days.
    pub fn next_after<Z: TimeZone>(&self, now: DateTime<Z>) -> Option<DateTime<Z>> {
        let base = truncate_to_minute(now);
        let max_minutes = 366 * 24 * 60;
        for offset in 1..=max_minutes {
            let candidate = base.clone() + Duration::minutes(offset);
            if self.matches(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Whether a timestamp matches the schedule. When both day-of-month
    /// and day-of-week are restricted, either may match (vixie cron).
    pub fn matches<Z: TimeZone>(&self, candidate: &DateTime<Z>) -> bool {
        if let Some(minute) = self.minute {
            if candidate.minute() != minute {
                return false;
            }
        }
        if let Some(hour) = self.hour {
            if candidate.hour() != hour {
                return false;
            }
        }
        if let Some(month) = self.month {
            if candidate.month() != month {
                return false;
            }
        }

        let dom_matches = self
            .day_of_month
            .map_or(true, |dom| candidate.day() == dom);
        let dow_matches = self.day_of_week.map_or(true, |dow| {
            let normalized = if dow == 7 { 0 } else { dow };
            candidate.weekday().num_days_from_sunday() == normalized
        });

        match (self.day_of_month.is_some(), self.day_of_week.is_some()) {
            (true, true) => dom_matches || dow_matches,
            _ => dom_matches && dow_matches,
        }
    }
}

fn parse_field(raw: &str, min: u32, max: u32) -> Result<Option<u32>, ScheduleError> {
    if raw == "*" {
        return Ok(None);
    }
    let value: u32 = raw
        .parse()
        .map_err(|_| ScheduleError::InvalidField(raw.to_string()))?;
    if value < min || value > max {
        return Err(ScheduleError::OutOfRange {
            value: raw.to_string(),
            min,
            max,
        });
    }
    Ok(Some(value))
}

fn truncate_to_minute<Z: TimeZone>(t: DateTime<Z>) -> DateTime<Z> {
    let seconds = i64::from(t.second());
    let nanos = i64::from(t.nanosecond() / 1_000_000);
    t - Duration::seconds(seconds) - Duration::milliseconds(nanos)
}

/// Resolve an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

/// Spawn the scheduled backup loop.
pub fn spawn_backup_task(
    service: Arc<BackupService>,
    schedule: CronSchedule,
    timezone: Tz,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = chrono::Utc::now().with_timezone(&timezone);
            let Some(next) = schedule.next_after(now.clone()) else {
                tracing::warn!(
                    "Backup schedule '{}' has no occurrence within a year; stopping scheduler",
                    schedule.raw()
                );
                return;
            };

            let wait = (next.clone() - now)
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));
            tracing::info!("Next scheduled backup at {}", next.to_rfc3339());
            tokio::time::sleep(wait).await;

            match service.run().await {
                Ok(outcome) => tracing::info!(
                    "Scheduled backup finished: {} ({} bytes)",
                    outcome.path.display(),
                    outcome.size_bytes
                ),
                Err(e) => tracing::error!("Scheduled backup failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert_eq!(
            CronSchedule::parse("0 3 * *"),
            Err(ScheduleError::FieldCount(4))
        );
        assert_eq!(
            CronSchedule::parse("0 3 * * 0 extra"),
            Err(ScheduleError::FieldCount(6))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_field() {
        assert!(matches!(
            CronSchedule::parse("*/5 * * * *"),
            Err(ScheduleError::InvalidField(_))
        ));
        assert!(matches!(
            CronSchedule::parse("zero 3 * * 0"),
            Err(ScheduleError::InvalidField(_))
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(matches!(
            CronSchedule::parse("60 3 * * 0"),
            Err(ScheduleError::OutOfRange { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0 24 * * 0"),
            Err(ScheduleError::OutOfRange { .. })
        ));
        assert!(matches!(
            CronSchedule::parse("0 3 0 * *"),
            Err(ScheduleError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_weekly_sunday_three_am() {
        let schedule = CronSchedule::parse("0 3 * * 0").expect("valid cron");
        // Wednesday 2026-03-11 12:00 UTC
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();

        let next = schedule.next_after(now).expect("has occurrence");

        assert_eq!(next.weekday().num_days_from_sunday(), 0);
        assert_eq!(next.hour(), 3);
        assert_eq!(next.minute(), 0);
        assert_eq!(next.day(), 15); // the following Sunday
    }

    #[test]
    fn test_daily_schedule_rolls_to_next_day() {
        let schedule = CronSchedule::parse("30 2 * * *").expect("valid cron");
        // Already past 02:30 today
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();

        let next = schedule.next_after(now).expect("has occurrence");

        assert_eq!(next.day(), 12);
        assert_eq!(next.hour(), 2);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn test_next_is_strictly_after_now() {
        let schedule = CronSchedule::parse("0 3 * * *").expect("valid cron");
        // Exactly at an occurrence
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 3, 0, 0).unwrap();

        let next = schedule.next_after(now).expect("has occurrence");
        assert!(next > now);
        assert_eq!(next.day(), 12);
    }

    #[test]
    fn test_dom_dow_or_semantics() {
        // Both day-of-month and day-of-week restricted: either matches
        let schedule = CronSchedule::parse("0 0 15 * 1").expect("valid cron");
        // 2026-03-14 is a Saturday; the 15th (Sunday) comes before the
        // next Monday (the 16th)
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let next = schedule.next_after(now).expect("has occurrence");
        assert_eq!(next.day(), 15);

        // And from the 15th, the next occurrence is Monday the 16th
        let next2 = schedule.next_after(next).expect("has occurrence");
        assert_eq!(next2.day(), 16);
    }

    #[test]
    fn test_timezone_evaluation() {
        let schedule = CronSchedule::parse("0 3 * * *").expect("valid cron");
        let tz = parse_timezone("America/New_York").expect("valid timezone");
        // 06:59 UTC == 02:59 EDT on this date
        let now = Utc
            .with_ymd_and_hms(2026, 6, 10, 6, 59, 0)
            .unwrap()
            .with_timezone(&tz);

        let next = schedule.next_after(now).expect("has occurrence");

        assert_eq!(next.hour(), 3);
        assert_eq!(next.minute(), 0);
        // One minute later in local time
        assert_eq!(next.with_timezone(&Utc).hour(), 7);
    }

    #[test]
    fn test_parse_timezone_rejects_unknown() {
        assert_eq!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(ScheduleError::UnknownTimezone("Mars/Olympus_Mons".to_string()))
        );
    }

    #[test]
    fn test_sunday_as_seven() {
        let schedule = CronSchedule::parse("0 3 * * 7").expect("valid cron");
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();

        let next = schedule.next_after(now).expect("has occurrence");
        assert_eq!(next.weekday().num_days_from_sunday(), 0);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// The computed occurrence is strictly in the future and matches
        /// every restricted field.
        #[test]
        fn next_occurrence_matches_fields(
            minute in 0u32..60,
            hour in 0u32..24,
            start_day in 1u32..28,
            start_hour in 0u32..24,
        ) {
            let schedule = CronSchedule::parse(&format!("{} {} * * *", minute, hour))
                .expect("valid cron");
            let now = Utc.with_ymd_and_hms(2026, 5, start_day, start_hour, 17, 23).unwrap();

            let next = schedule.next_after(now).expect("daily schedule always has a next");

            prop_assert!(next > now);
            prop_assert_eq!(next.minute(), minute);
            prop_assert_eq!(next.hour(), hour);
            prop_assert_eq!(next.second(), 0);
        }
    }
}
