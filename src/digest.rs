//! Bucketing and email rendering for the daily digest.
//!
//! Pure transformation from classified tasks to (subject, HTML body); no
//! side effects, always produces a value. The caller decides whether an
//! empty digest is worth sending (it isn't).

use crate::types::{Priority, TaskBuckets};

/// Which date bucket a resolved day falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Today,
    Upcoming,
}

/// Fixed display mapping per priority level, rendered High → Medium → Low
const PRIORITY_DISPLAY: &[(Priority, &str, &str, &str, bool)] = &[
    (Priority::High, "🔴", "High Priority", "#d32f2f", true),
    (Priority::Medium, "🟡", "Medium Priority", "#f57c00", false),
    (Priority::Low, "🟢", "Low Priority", "#388e3c", false),
];

/// Pick the bucket for a day string, or none.
///
/// Today wins over the advance day, and the advance bucket is disabled
/// entirely when the offset is 0. A row lands in at most one bucket.
pub fn bucket_for(
    day: &str,
    today_day: &str,
    advance_day: &str,
    advance_days: u32,
) -> Option<DateBucket> {
    if day == today_day {
        Some(DateBucket::Today)
    } else if advance_days > 0 && day == advance_day {
        Some(DateBucket::Upcoming)
    } else {
        None
    }
}

/// Build the one-line email subject.
///
/// "N Due Today + M Upcoming" when both buckets have tasks, otherwise the
/// single non-empty bucket's count with singular/plural wording; a trailing
/// 🔴 marks any high-priority task in either bucket.
pub fn build_subject(today: &TaskBuckets, advance: &TaskBuckets) -> String {
    let today_total = today.len();
    let advance_total = advance.len();

    let mut subject = String::new();

    if today_total > 0 && advance_total > 0 {
        subject.push_str(&format!("{} Due Today + {} Upcoming", today_total, advance_total));
    } else if today_total > 0 {
        subject.push_str(&format!("{} Task{} Due Today", today_total, plural(today_total)));
    } else {
        subject.push_str(&format!("{} Task{} Coming Up", advance_total, plural(advance_total)));
    }

    if today.has_high() || advance.has_high() {
        subject.push_str(" 🔴");
    }

    subject
}

/// Build the HTML email body.
///
/// One section per non-empty bucket (today first), a sub-list per non-empty
/// priority level, and a footer naming the workbook and worksheet.
pub fn build_html_body(
    today: &TaskBuckets,
    advance: &TaskBuckets,
    today_date: &str,
    advance_date: &str,
    workbook_name: &str,
    sheet_name: &str,
    advance_days: u32,
) -> String {
    let mut html = String::from("<div style=\"font-family: Arial, sans-serif; max-width: 600px;\">");

    if !today.is_empty() {
        html.push_str(&format!(
            "<h2 style=\"color: #1976d2;\">📅 Tasks Due Today ({})</h2>",
            today_date
        ));
        html.push_str(&priority_sections(today));
    }

    if !advance.is_empty() {
        html.push_str(&format!(
            "<h2 style=\"color: #7b1fa2; margin-top: 30px;\">⏳ Upcoming in {} Day{} ({})</h2>",
            advance_days,
            if advance_days > 1 { "s" } else { "" },
            advance_date
        ));
        html.push_str(&priority_sections(advance));
    }

    html.push_str(
        "<div style=\"margin-top: 30px; padding: 15px; background-color: #f5f5f5; border-radius: 5px;\">",
    );
    html.push_str(&format!(
        "<p style=\"color: #666; font-style: italic; margin: 0;\">📊 Source: {} - {}</p>",
        escape_html(workbook_name),
        escape_html(sheet_name)
    ));
    html.push_str("</div></div>");

    html
}

/// Render the sub-lists for one bucket, skipping empty priority levels
fn priority_sections(buckets: &TaskBuckets) -> String {
    let mut html = String::new();

    for &(priority, icon, heading, color, bold) in PRIORITY_DISPLAY {
        let tasks = match priority {
            Priority::High => &buckets.high,
            Priority::Medium => &buckets.medium,
            Priority::Low => &buckets.low,
        };
        if tasks.is_empty() {
            continue;
        }

        html.push_str(&format!(
            "<h3 style=\"color: {}; margin-bottom: 10px;\">{} {} ({})</h3>",
            color,
            icon,
            heading,
            tasks.len()
        ));
        html.push_str("<ul style=\"margin-top: 5px;\">");
        for task in tasks {
            let weight = if bold { " font-weight: bold;" } else { "" };
            html.push_str(&format!(
                "<li style=\"color: {};{} margin-bottom: 5px;\">{}</li>",
                color,
                weight,
                escape_html(&task.text)
            ));
        }
        html.push_str("</ul>");
    }

    html
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Cell text is untrusted; escape the three characters that matter in HTML
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
