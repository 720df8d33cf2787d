//! Single-pass reminder pipeline.
//!
//! Sequences validate → load → classify → bucket → format → send → record.
//! Row-level date errors are logged with row context and skipped; anything
//! that fails before or outside row iteration aborts the run and no partial
//! email is sent. Re-running on unchanged data produces the same email.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::classifier;
use crate::digest::{self, DateBucket};
use crate::error::ReminderError;
use crate::mailer::MailTransport;
use crate::run_log::RunLog;
use crate::sheet::SheetSource;
use crate::types::{Config, ScanStats, Task, TaskBuckets};

/// Outcome of one pipeline pass
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub stats: ScanStats,
    pub email_sent: bool,
}

/// Run the pipeline against the current instant
pub fn run_digest(
    config: &Config,
    source: &dyn SheetSource,
    mailer: &dyn MailTransport,
    run_log: &dyn RunLog,
) -> Result<RunOutcome, ReminderError> {
    run_digest_at(Utc::now(), config, source, mailer, run_log)
}

/// Run the pipeline against an explicit instant.
///
/// "Today" and the advance day are both derived from `now` in the source's
/// time zone, so the whole pass is reproducible in tests.
pub fn run_digest_at(
    now: DateTime<Utc>,
    config: &Config,
    source: &dyn SheetSource,
    mailer: &dyn MailTransport,
    run_log: &dyn RunLog,
) -> Result<RunOutcome, ReminderError> {
    run_log.info("Starting daily reminder check", None);

    if let Err(e) = config.validate() {
        run_log.error(
            "Configuration validation failed",
            Some(json!({ "error": e.to_string() })),
        );
        return Err(e);
    }

    let tz = source.timezone();
    let today_day = classifier::day_string(now, tz);
    let advance_day = classifier::day_string(now + Duration::days(config.advance_days as i64), tz);

    let rows = match source.read_rows() {
        Ok(rows) => rows,
        Err(e) => {
            run_log.error("Sheet read failed", Some(json!({ "error": e.to_string() })));
            return Err(e);
        }
    };

    let mut today = TaskBuckets::default();
    let mut advance = TaskBuckets::default();
    let mut stats = ScanStats::default();

    for row in &rows {
        stats.total_rows += 1;

        let (Some(date), Some(action)) = (&row.date, &row.action) else {
            stats.empty_rows += 1;
            continue;
        };

        let day = match classifier::resolve_day(date, tz) {
            Ok(day) => day,
            Err(e) => {
                run_log.error(
                    &format!("Invalid date in row {}", row.row_number),
                    Some(json!({ "date": e.raw, "action": action })),
                );
                continue;
            }
        };

        let task = Task {
            text: classifier::task_text(action, row.time.as_deref()),
            priority: classifier::classify_priority(row.priority.as_deref()),
        };

        match digest::bucket_for(&day, &today_day, &advance_day, config.advance_days) {
            Some(DateBucket::Today) => today.push(task),
            Some(DateBucket::Upcoming) => advance.push(task),
            None => {}
        }
    }

    stats.today_tasks = today.len();
    stats.advance_tasks = advance.len();

    run_log.info(
        "Sheet scan completed",
        Some(json!({
            "totalRows": stats.total_rows,
            "emptyRows": stats.empty_rows,
            "todayTasks": stats.today_tasks,
            "advanceTasks": stats.advance_tasks,
            "date": today_day,
        })),
    );

    if today.is_empty() && advance.is_empty() {
        run_log.info("No tasks due today or upcoming", None);
        return Ok(RunOutcome {
            stats,
            email_sent: false,
        });
    }

    let subject = digest::build_subject(&today, &advance);
    let body = digest::build_html_body(
        &today,
        &advance,
        &today_day,
        &advance_day,
        &source.label(),
        source.sheet_name(),
        config.advance_days,
    );

    if let Err(e) = mailer.send(&config.recipient, &subject, &body) {
        run_log.error(
            "Reminder email failed",
            Some(json!({ "error": e.to_string() })),
        );
        return Err(e);
    }

    run_log.success(
        "Reminder email sent",
        Some(json!({
            "todayTaskCount": stats.today_tasks,
            "advanceTaskCount": stats.advance_tasks,
            "todayTasks": today,
            "advanceTasks": advance,
        })),
    );

    Ok(RunOutcome {
        stats,
        email_sent: true,
    })
}
