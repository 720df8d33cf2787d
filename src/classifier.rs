//! Row classification: priority mapping and calendar-day resolution.
//!
//! Matching is done on `yyyy-MM-dd` strings rendered in the source time
//! zone, never on raw timestamps. Two tasks are "the same day" exactly when
//! their rendered day strings are equal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::types::Priority;

/// Calendar-day rendering used for all date matching
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Plain date formats accepted in free-text date cells
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Raw payload of a date cell before day resolution
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    /// Native spreadsheet date/time cell, already wall-clock in the source zone
    DateTime(NaiveDateTime),
    /// Free-text cell, parsed during classification
    Text(String),
}

/// A date cell that could not be resolved to a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date value {raw:?}")]
pub struct DateParseError {
    pub raw: String,
}

/// Determine priority level from a raw cell value.
///
/// Case-insensitive: anything containing "high" or "urgent", or exactly "1",
/// is high; anything containing "low", or exactly "3", is low; everything
/// else (including an absent cell) is medium. Note only the exact numerals
/// "1" and "3" match; "2" and any other number fall through to medium.
pub fn classify_priority(raw: Option<&str>) -> Priority {
    let Some(raw) = raw else {
        return Priority::Medium;
    };
    let p = raw.trim().to_lowercase();
    if p.contains("high") || p.contains("urgent") || p == "1" {
        return Priority::High;
    }
    if p.contains("low") || p == "3" {
        return Priority::Low;
    }
    Priority::Medium
}

/// Resolve a date cell to its `yyyy-MM-dd` day string in the source zone.
///
/// Native datetime cells are already wall-clock in the sheet's zone and
/// format directly. Text cells accept RFC 3339 (converted into the source
/// zone) and a small set of plain date formats. Anything else is a row-level
/// error; the caller records it and moves on.
pub fn resolve_day(value: &DateValue, tz: Tz) -> Result<String, DateParseError> {
    match value {
        DateValue::DateTime(dt) => Ok(dt.date().format(DAY_FORMAT).to_string()),
        DateValue::Text(raw) => {
            let text = raw.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
                return Ok(ts.with_timezone(&tz).format(DAY_FORMAT).to_string());
            }
            for format in TEXT_DATE_FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                    return Ok(date.format(DAY_FORMAT).to_string());
                }
            }
            Err(DateParseError { raw: raw.clone() })
        }
    }
}

/// Render an instant as a `yyyy-MM-dd` day string in the source zone
pub fn day_string(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DAY_FORMAT).to_string()
}

/// Merge a time annotation into the action text, if present.
///
/// e.g. ("Call dentist", Some("14:30")) → "Call dentist ⏰ 14:30"
pub fn task_text(action: &str, time: Option<&str>) -> String {
    match time {
        Some(time) => format!("{} ⏰ {}", action, time),
        None => action.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;

    const NEW_YORK: Tz = chrono_tz::America::New_York;

    #[test]
    fn test_priority_high_variants() {
        assert_eq!(classify_priority(Some("High")), Priority::High);
        assert_eq!(classify_priority(Some("HIGH PRIORITY")), Priority::High);
        assert_eq!(classify_priority(Some("urgent!")), Priority::High);
        assert_eq!(classify_priority(Some("1")), Priority::High);
        assert_eq!(classify_priority(Some(" 1 ")), Priority::High);
    }

    #[test]
    fn test_priority_low_variants() {
        assert_eq!(classify_priority(Some("Low")), Priority::Low);
        assert_eq!(classify_priority(Some("lowish")), Priority::Low);
        assert_eq!(classify_priority(Some("3")), Priority::Low);
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        assert_eq!(classify_priority(None), Priority::Medium);
        assert_eq!(classify_priority(Some("")), Priority::Medium);
        assert_eq!(classify_priority(Some("Medium")), Priority::Medium);
        assert_eq!(classify_priority(Some("whenever")), Priority::Medium);
    }

    #[test]
    fn test_priority_other_numerals_fall_through() {
        // Only the exact numerals "1" and "3" are mapped
        assert_eq!(classify_priority(Some("2")), Priority::Medium);
        assert_eq!(classify_priority(Some("0")), Priority::Medium);
        assert_eq!(classify_priority(Some("13")), Priority::Medium);
    }

    #[test]
    fn test_resolve_day_native_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        let day = resolve_day(&DateValue::DateTime(dt), NEW_YORK).unwrap();
        assert_eq!(day, "2024-01-15");
    }

    #[test]
    fn test_resolve_day_plain_text_formats() {
        for raw in ["2024-01-15", "2024/01/15", "01/15/2024"] {
            let day = resolve_day(&DateValue::Text(raw.to_string()), NEW_YORK).unwrap();
            assert_eq!(day, "2024-01-15", "format {:?}", raw);
        }
    }

    #[test]
    fn test_resolve_day_normalizes_short_fields() {
        let day = resolve_day(&DateValue::Text("2024-1-5".to_string()), NEW_YORK).unwrap();
        assert_eq!(day, "2024-01-05");
    }

    #[test]
    fn test_resolve_day_rfc3339_converts_to_source_zone() {
        // 02:00 UTC on the 16th is still the evening of the 15th in New York
        let day = resolve_day(
            &DateValue::Text("2024-01-16T02:00:00Z".to_string()),
            NEW_YORK,
        )
        .unwrap();
        assert_eq!(day, "2024-01-15");
    }

    #[test]
    fn test_resolve_day_rejects_garbage() {
        let err = resolve_day(&DateValue::Text("next Tuesday".to_string()), NEW_YORK)
            .unwrap_err();
        assert_eq!(err.raw, "next Tuesday");
    }

    #[test]
    fn test_day_string_uses_source_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 16, 2, 0, 0).unwrap();
        assert_eq!(day_string(instant, NEW_YORK), "2024-01-15");
        assert_eq!(day_string(instant, chrono_tz::UTC), "2024-01-16");
    }

    #[test]
    fn test_task_text_with_and_without_time() {
        assert_eq!(
            task_text("Call dentist", Some("14:30")),
            "Call dentist ⏰ 14:30"
        );
        assert_eq!(task_text("Call dentist", None), "Call dentist");
    }
}
