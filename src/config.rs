//! Configuration loading and validation.
//!
//! The config file lives at `~/.sheetminder/config.json`. Validation runs
//! before any row scan; a failure aborts the run with no email sent.

use std::fs;
use std::path::PathBuf;

use chrono_tz::Tz;

use crate::error::ReminderError;
use crate::types::Config;

/// Get the canonical config file path (~/.sheetminder/config.json)
pub fn config_path() -> Result<PathBuf, ReminderError> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReminderError::Configuration("Could not find home directory".to_string()))?;
    Ok(home.join(".sheetminder").join("config.json"))
}

/// Load and validate configuration from ~/.sheetminder/config.json
pub fn load_config() -> Result<Config, ReminderError> {
    let path = config_path()?;

    if !path.exists() {
        return Err(ReminderError::Configuration(format!(
            "Config file not found at {}. Create it with at least: {{ \"workbookPath\": ..., \"sheetName\": ..., \"recipient\": ..., \"smtp\": {{ ... }} }}",
            path.display()
        )));
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| ReminderError::Configuration(format!("Failed to read config: {}", e)))?;

    let config: Config = serde_json::from_str(&content)
        .map_err(|e| ReminderError::Configuration(format!("Failed to parse config: {}", e)))?;

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Check every field the pipeline depends on.
    ///
    /// Covers identifiers, 1-based indices, the reminder hour range, and the
    /// time zone name. Whether the workbook is actually readable is left to
    /// the sheet source, which reports it as an access failure.
    pub fn validate(&self) -> Result<(), ReminderError> {
        if self.workbook_path.trim().is_empty() {
            return Err(ReminderError::Configuration(
                "workbookPath is not set".to_string(),
            ));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(ReminderError::Configuration(
                "sheetName is not set".to_string(),
            ));
        }
        if self.date_column < 1 || self.action_column < 1 || self.start_row < 1 {
            return Err(ReminderError::Configuration(
                "Column and row numbers are 1-based; 0 is not a valid index".to_string(),
            ));
        }
        if self.priority_column == Some(0) || self.time_column == Some(0) {
            return Err(ReminderError::Configuration(
                "priorityColumn and timeColumn are 1-based; 0 is not a valid index".to_string(),
            ));
        }
        if self.reminder_hour > 23 {
            return Err(ReminderError::Configuration(format!(
                "reminderHour must be 0-23, got {}",
                self.reminder_hour
            )));
        }
        self.source_timezone()?;
        if self.recipient.trim().is_empty() {
            return Err(ReminderError::Configuration(
                "recipient is not set".to_string(),
            ));
        }
        if self.smtp.server.trim().is_empty() || self.smtp.from_address.trim().is_empty() {
            return Err(ReminderError::Configuration(
                "smtp.server and smtp.fromAddress are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse the configured source time zone
    pub fn source_timezone(&self) -> Result<Tz, ReminderError> {
        self.timezone.parse().map_err(|_| {
            ReminderError::Configuration(format!("Invalid timezone: {}", self.timezone))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SmtpConfig;

    fn valid_config() -> Config {
        Config {
            workbook_path: "/data/tasks.xlsx".to_string(),
            sheet_name: "Reminder".to_string(),
            date_column: 1,
            action_column: 2,
            priority_column: Some(3),
            time_column: Some(4),
            start_row: 2,
            reminder_hour: 8,
            advance_days: 1,
            timezone: "America/New_York".to_string(),
            recipient: "me@example.com".to_string(),
            smtp: SmtpConfig {
                server: "smtp.example.com".to_string(),
                port: 587,
                username: "me@example.com".to_string(),
                password: "app-password".to_string(),
                from_address: "me@example.com".to_string(),
            },
            log_path: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_workbook_path() {
        let mut config = valid_config();
        config.workbook_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_sheet_name() {
        let mut config = valid_config();
        config.sheet_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_column() {
        let mut config = valid_config();
        config.date_column = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.priority_column = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_start_row() {
        let mut config = valid_config();
        config.start_row = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_hour() {
        let mut config = valid_config();
        config.reminder_hour = 24;
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let mut config = valid_config();
        config.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_recipient() {
        let mut config = valid_config();
        config.recipient = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_timezone_parses() {
        let config = valid_config();
        let tz = config.source_timezone().expect("zone should parse");
        assert_eq!(tz, chrono_tz::America::New_York);
    }
}
