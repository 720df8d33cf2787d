//! Spreadsheet row loading.
//!
//! `SheetSource` is the narrow interface the pipeline reads through; the
//! production implementation opens local workbook files with calamine.
//! Coordinates are absolute and 1-based, matching the spreadsheet UI and the
//! configuration file.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono_tz::Tz;

use crate::classifier::DateValue;
use crate::error::ReminderError;
use crate::types::Config;

/// A raw spreadsheet row before classification.
///
/// Cells are already reduced to text (or a date payload); empty and
/// whitespace-only cells are absent.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based worksheet row number, kept for error context
    pub row_number: u32,
    pub date: Option<DateValue>,
    pub action: Option<String>,
    pub priority: Option<String>,
    pub time: Option<String>,
}

/// Read-only task source: a block of rows plus the zone its dates live in
pub trait SheetSource {
    /// The time zone the source's dates are interpreted in
    fn timezone(&self) -> Tz;

    /// Read every data row from the configured start row to the last row
    fn read_rows(&self) -> Result<Vec<RawRow>, ReminderError>;

    /// Display name of the source, for the email footer
    fn label(&self) -> String;

    /// Name of the worksheet tab being scanned
    fn sheet_name(&self) -> &str;
}

/// Workbook-file implementation of `SheetSource` (.xlsx, .xls, .xlsb, .ods)
pub struct WorkbookSource {
    path: PathBuf,
    sheet_name: String,
    date_column: u32,
    action_column: u32,
    priority_column: Option<u32>,
    time_column: Option<u32>,
    start_row: u32,
    tz: Tz,
}

impl WorkbookSource {
    pub fn from_config(config: &Config) -> Result<Self, ReminderError> {
        Ok(Self {
            path: PathBuf::from(&config.workbook_path),
            sheet_name: config.sheet_name.clone(),
            date_column: config.date_column,
            action_column: config.action_column,
            priority_column: config.priority_column,
            time_column: config.time_column,
            start_row: config.start_row,
            tz: config.source_timezone()?,
        })
    }
}

impl SheetSource for WorkbookSource {
    fn timezone(&self) -> Tz {
        self.tz
    }

    fn label(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("workbook")
            .to_string()
    }

    fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn read_rows(&self) -> Result<Vec<RawRow>, ReminderError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            ReminderError::SheetAccess(format!("open {}: {}", self.path.display(), e))
        })?;

        if !workbook.sheet_names().iter().any(|name| name == &self.sheet_name) {
            return Err(ReminderError::SheetAccess(format!(
                "worksheet \"{}\" not found in {}",
                self.sheet_name,
                self.path.display()
            )));
        }

        let range = workbook.worksheet_range(&self.sheet_name).map_err(|e| {
            ReminderError::SheetAccess(format!("worksheet \"{}\": {}", self.sheet_name, e))
        })?;

        let required_columns = [
            Some(self.date_column),
            Some(self.action_column),
            self.priority_column,
            self.time_column,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(1);
        let end = range.end();
        let available_columns = end.map_or(0, |(_, column)| column + 1);
        if available_columns < required_columns {
            return Err(ReminderError::SheetAccess(format!(
                "worksheet \"{}\" only has {} columns, need at least {}",
                self.sheet_name, available_columns, required_columns
            )));
        }

        let Some((end_row, _)) = end else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for row_index in (self.start_row - 1)..=end_row {
            rows.push(RawRow {
                row_number: row_index + 1,
                date: date_cell(range.get_value((row_index, self.date_column - 1))),
                action: text_cell(range.get_value((row_index, self.action_column - 1))),
                priority: self
                    .priority_column
                    .and_then(|column| text_cell(range.get_value((row_index, column - 1)))),
                time: self
                    .time_column
                    .and_then(|column| text_cell(range.get_value((row_index, column - 1)))),
            });
        }

        Ok(rows)
    }
}

/// Reduce a cell to trimmed text; empty and whitespace-only cells are absent
fn text_cell(cell: Option<&Data>) -> Option<String> {
    let text = match cell? {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Reduce a date-column cell to its payload for day resolution.
///
/// Native date cells keep their wall-clock datetime; anything else is kept
/// as text and parsed (or rejected) by the classifier.
fn date_cell(cell: Option<&Data>) -> Option<DateValue> {
    match cell? {
        Data::Empty => None,
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(DateValue::DateTime)
                .unwrap_or_else(|| DateValue::Text(format!("{}", dt))),
        ),
        Data::DateTimeIso(s) => Some(DateValue::Text(s.clone())),
        other => text_cell(Some(other)).map(DateValue::Text),
    }
}

/// Derive the run-log path for a workbook (a .log.csv sibling)
pub fn default_log_path(workbook_path: &Path) -> PathBuf {
    workbook_path.with_extension("log.csv")
}
