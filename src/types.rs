use serde::{Deserialize, Serialize};

/// Task priority level (three-tier: high / medium / low)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A single task due on some calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Action text, with an optional `⏰ time` suffix already merged in
    pub text: String,
    pub priority: Priority,
}

/// Tasks grouped by priority.
///
/// Insertion order within each level follows row scan order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskBuckets {
    pub high: Vec<Task>,
    pub medium: Vec<Task>,
    pub low: Vec<Task>,
}

impl TaskBuckets {
    /// Append a task to the list for its own priority level
    pub fn push(&mut self, task: Task) {
        match task.priority {
            Priority::High => self.high.push(task),
            Priority::Medium => self.medium.push(task),
            Priority::Low => self.low.push(task),
        }
    }

    /// Total task count across all three levels
    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when at least one high-priority task is present
    pub fn has_high(&self) -> bool {
        !self.high.is_empty()
    }
}

/// Scan counters reported after each run
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub total_rows: usize,
    pub empty_rows: usize,
    pub today_tasks: usize,
    pub advance_tasks: usize,
}

/// Configuration stored in ~/.sheetminder/config.json
///
/// Column and row indices are 1-based, matching what a spreadsheet UI shows
/// (column A = 1). `priorityColumn` and `timeColumn` are optional; leaving
/// them out reads every row as medium priority with no time annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the workbook file (.xlsx, .xls, .xlsb or .ods)
    pub workbook_path: String,
    /// Worksheet tab to scan
    pub sheet_name: String,
    #[serde(default = "default_date_column")]
    pub date_column: u32,
    #[serde(default = "default_action_column")]
    pub action_column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column: Option<u32>,
    /// First row with data (2 = skip one header row)
    #[serde(default = "default_start_row")]
    pub start_row: u32,
    /// Hour of day to send the reminder (0-23), in the source time zone
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u8,
    /// Days ahead for the advance bucket (0 = advance reminders disabled)
    #[serde(default = "default_advance_days")]
    pub advance_days: u32,
    /// IANA time zone the sheet's dates live in (e.g. "America/New_York").
    /// Workbook files carry no zone of their own, so it is configured here.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Address the summary email is sent to
    pub recipient: String,
    pub smtp: SmtpConfig,
    /// Run log file; defaults to a .log.csv sibling of the workbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

/// SMTP delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

fn default_date_column() -> u32 {
    1
}

fn default_action_column() -> u32 {
    2
}

fn default_start_row() -> u32 {
    2
}

fn default_reminder_hour() -> u8 {
    8
}

fn default_advance_days() -> u32 {
    1
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_smtp_port() -> u16 {
    587
}
