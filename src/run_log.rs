//! Leveled run log.
//!
//! Every run appends INFO/ERROR/SUCCESS records with an optional structured
//! payload. The file-backed implementation writes CSV next to the workbook,
//! creating the file with a header row on first use. Appending is
//! best-effort: a sink failure degrades to the process logger and never
//! aborts the run. Entries are mirrored to `log::*` either way.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

/// Log level for run records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
            Self::Success => write!(f, "SUCCESS"),
        }
    }
}

/// Append-only sink for leveled, timestamped run records
pub trait RunLog {
    fn append(&self, level: LogLevel, message: &str, payload: Option<Value>);

    fn info(&self, message: &str, payload: Option<Value>) {
        self.append(LogLevel::Info, message, payload);
    }

    fn error(&self, message: &str, payload: Option<Value>) {
        self.append(LogLevel::Error, message, payload);
    }

    fn success(&self, message: &str, payload: Option<Value>) {
        self.append(LogLevel::Success, message, payload);
    }
}

const LOG_HEADER: &str = "Timestamp,Level,Message,Data\n";

/// CSV-file implementation of `RunLog`
pub struct CsvRunLog {
    path: PathBuf,
}

impl CsvRunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the log file for a config: explicit path, or workbook sibling
    pub fn for_config(config: &crate::types::Config) -> Self {
        let path = config
            .log_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                crate::sheet::default_log_path(Path::new(&config.workbook_path))
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record(
        &self,
        level: LogLevel,
        message: &str,
        payload: Option<&Value>,
    ) -> std::io::Result<()> {
        let is_new = !self.path.exists();
        if is_new {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if is_new {
            file.write_all(LOG_HEADER.as_bytes())?;
        }

        let timestamp = Utc::now().to_rfc3339();
        let data = payload.map(|p| p.to_string()).unwrap_or_default();
        let line = format!(
            "{},{},{},{}\n",
            timestamp,
            level,
            csv_field(message),
            csv_field(&data)
        );
        file.write_all(line.as_bytes())
    }
}

impl RunLog for CsvRunLog {
    fn append(&self, level: LogLevel, message: &str, payload: Option<Value>) {
        // Mirror to the process logger first; the file is secondary storage
        match level {
            LogLevel::Error => log::error!("{}{}", message, payload_suffix(&payload)),
            _ => log::info!("{}{}", message, payload_suffix(&payload)),
        }

        if let Err(e) = self.write_record(level, message, payload.as_ref()) {
            log::warn!("Run log append failed ({}): {}", self.path.display(), e);
        }
    }
}

fn payload_suffix(payload: &Option<Value>) -> String {
    payload.as_ref().map(|p| format!(" {}", p)).unwrap_or_default()
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_written_exactly_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = CsvRunLog::new(dir.path().join("runs.log.csv"));

        log.info("first", None);
        log.error("second", Some(json!({"rows": 3})));

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Level,Message,Data");
        assert!(lines[1].contains(",INFO,first,"));
        assert!(lines[2].contains(",ERROR,second,"));
        assert_eq!(content.matches("Timestamp,Level").count(), 1);
    }

    #[test]
    fn test_payload_serialized_into_data_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = CsvRunLog::new(dir.path().join("runs.log.csv"));

        log.success("sent", Some(json!({"todayTaskCount": 2})));

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("SUCCESS"));
        assert!(content.contains("todayTaskCount"));
    }

    #[test]
    fn test_creates_parent_directory_on_first_use() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = CsvRunLog::new(dir.path().join("nested").join("runs.log.csv"));

        log.info("hello", None);

        assert!(log.path().exists());
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
