//! Scheduler for the daily reminder run
//!
//! Manages the single daily job with support for:
//! - Timezone-aware scheduling (the reminder hour is in the source zone)
//! - Sleep/wake detection via time-jump polling
//! - Missed run handling (runs if within grace period)

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::ReminderError;
use crate::mailer::SmtpMailer;
use crate::run_log::CsvRunLog;
use crate::runner;
use crate::sheet::WorkbookSource;
use crate::types::Config;

/// Grace period for a missed run (2 hours)
const MISSED_RUN_GRACE_PERIOD_SECS: i64 = 7200;

/// Time jump threshold to detect sleep/wake (5 minutes)
const TIME_JUMP_THRESHOLD_SECS: i64 = 300;

/// Poll interval for the scheduler loop (1 minute)
const POLL_INTERVAL_SECS: u64 = 60;

/// Scheduler for the daily reminder
pub struct Scheduler {
    config: Config,
}

impl Scheduler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the scheduler loop.
    ///
    /// This runs indefinitely, checking once a minute whether the daily
    /// reminder is due. Run failures are logged, never fatal to the loop.
    pub async fn run(&self) -> Result<(), ReminderError> {
        let schedule = daily_schedule(self.config.reminder_hour)?;
        let tz = self.config.source_timezone()?;

        log::info!(
            "Scheduler started; daily reminder at {:02}:00 {}",
            self.config.reminder_hour,
            self.config.timezone
        );

        let mut last_check = Utc::now();
        let mut last_run: Option<DateTime<Utc>> = None;

        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

            let now = Utc::now();

            // Detect sleep: time jumped more than 5 minutes
            let time_jump = (now - last_check).num_seconds();
            if time_jump > TIME_JUMP_THRESHOLD_SECS {
                log::info!(
                    "Detected system wake (time jumped {} seconds), checking for a missed run",
                    time_jump
                );
                if let Some(slot) = find_missed_run(&schedule, tz, last_run, now) {
                    log::info!("Found missed reminder run scheduled for {}, running now", slot);
                    last_run = Some(slot);
                    self.fire();
                }
            }

            if let Some(slot) = due_slot(&schedule, tz, last_run, now) {
                last_run = Some(slot);
                self.fire();
            }

            last_check = now;
        }
    }

    /// Execute one reminder run with production collaborators
    fn fire(&self) {
        let source = match WorkbookSource::from_config(&self.config) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Reminder run aborted: {}", e);
                return;
            }
        };
        let mailer = SmtpMailer::new(self.config.smtp.clone());
        let run_log = CsvRunLog::for_config(&self.config);

        match runner::run_digest(&self.config, &source, &mailer, &run_log) {
            Ok(outcome) if outcome.email_sent => {
                log::info!(
                    "Reminder run complete: {} due today, {} upcoming",
                    outcome.stats.today_tasks,
                    outcome.stats.advance_tasks
                );
            }
            Ok(_) => log::info!("Reminder run complete: nothing due"),
            Err(e) => log::error!("Reminder run failed: {}", e),
        }
    }
}

/// Build the daily schedule for a reminder hour (minute 0, every day)
pub fn daily_schedule(hour: u8) -> Result<Schedule, ReminderError> {
    parse_cron(&format!("0 {} * * *", hour))
}

/// Parse a cron expression
pub fn parse_cron(expr: &str) -> Result<Schedule, ReminderError> {
    // The cron crate expects 6 fields (with seconds), but we use 5-field format
    // Add "0" for seconds at the start
    let full_expr = format!("0 {}", expr);

    full_expr.parse::<Schedule>().map_err(|e| {
        ReminderError::Configuration(format!("Invalid cron expression '{}': {}", expr, e))
    })
}

/// The scheduled slot that is due right now, if any.
///
/// A slot is due when the current time is within two minutes of it (wide
/// window so a poll delayed by load still matches) and it has not already
/// been satisfied.
fn due_slot(
    schedule: &Schedule,
    tz: Tz,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let now_local = now.with_timezone(&tz);
    let mut upcoming = schedule.after(&(now_local - chrono::Duration::minutes(2)));

    let slot = upcoming.next()?.with_timezone(&Utc);
    let diff = (now - slot).num_seconds().abs();
    if diff >= 120 {
        return None;
    }
    if let Some(last) = last_run {
        if last >= slot {
            return None; // Already ran
        }
    }
    Some(slot)
}

/// Find a run missed during sleep, within the grace period
fn find_missed_run(
    schedule: &Schedule,
    tz: Tz,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let now_local = now.with_timezone(&tz);
    let grace_start = now_local - chrono::Duration::seconds(MISSED_RUN_GRACE_PERIOD_SECS);

    for scheduled in schedule.after(&grace_start) {
        let slot = scheduled.with_timezone(&Utc);

        // Stop once we've passed now
        if slot > now {
            break;
        }

        if let Some(last) = last_run {
            if last >= slot {
                continue; // Already ran
            }
        }

        return Some(slot);
    }

    None
}

/// Get the next scheduled run time, for startup logging
pub fn next_run_time(hour: u8, tz: Tz) -> Result<DateTime<Utc>, ReminderError> {
    let schedule = daily_schedule(hour)?;
    let next = schedule
        .upcoming(tz)
        .next()
        .ok_or_else(|| ReminderError::Configuration("No upcoming scheduled time".to_string()))?;
    Ok(next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ZONE: Tz = chrono_tz::America::New_York;

    #[test]
    fn test_parse_cron_daily_8am() {
        let result = parse_cron("0 8 * * *");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_cron_invalid() {
        let result = parse_cron("not a cron");
        assert!(result.is_err());
    }

    #[test]
    fn test_daily_schedule_all_hours() {
        for hour in 0..24u8 {
            assert!(daily_schedule(hour).is_ok(), "hour {}", hour);
        }
    }

    #[test]
    fn test_due_slot_at_reminder_hour() {
        let schedule = daily_schedule(8).unwrap();
        // 08:00:30 local, 30 seconds past the slot
        let now = ZONE
            .with_ymd_and_hms(2024, 1, 15, 8, 0, 30)
            .unwrap()
            .with_timezone(&Utc);

        let slot = due_slot(&schedule, ZONE, None, now).expect("slot should be due");
        assert_eq!(
            slot,
            ZONE.with_ymd_and_hms(2024, 1, 15, 8, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn test_due_slot_not_due_mid_morning() {
        let schedule = daily_schedule(8).unwrap();
        let now = ZONE
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        assert!(due_slot(&schedule, ZONE, None, now).is_none());
    }

    #[test]
    fn test_due_slot_deduplicates() {
        let schedule = daily_schedule(8).unwrap();
        let slot_time = ZONE
            .with_ymd_and_hms(2024, 1, 15, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let now = slot_time + chrono::Duration::seconds(90);

        assert!(due_slot(&schedule, ZONE, Some(slot_time), now).is_none());
    }

    #[test]
    fn test_missed_run_within_grace() {
        let schedule = daily_schedule(8).unwrap();
        // Woke up at 09:30, 90 minutes after the slot; inside the 2h grace
        let now = ZONE
            .with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        let slot = find_missed_run(&schedule, ZONE, None, now).expect("missed run expected");
        assert_eq!(
            slot,
            ZONE.with_ymd_and_hms(2024, 1, 15, 8, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn test_missed_run_outside_grace() {
        let schedule = daily_schedule(8).unwrap();
        // Woke up at 11:30, past the 2h grace window
        let now = ZONE
            .with_ymd_and_hms(2024, 1, 15, 11, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        assert!(find_missed_run(&schedule, ZONE, None, now).is_none());
    }

    #[test]
    fn test_missed_run_skips_already_satisfied_slot() {
        let schedule = daily_schedule(8).unwrap();
        let slot_time = ZONE
            .with_ymd_and_hms(2024, 1, 15, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let now = slot_time + chrono::Duration::minutes(45);

        assert!(find_missed_run(&schedule, ZONE, Some(slot_time), now).is_none());
    }

    #[test]
    fn test_next_run_time() {
        let result = next_run_time(8, ZONE);
        assert!(result.is_ok());
    }
}
