//! Error types for the reminder pipeline
//!
//! Errors are classified by where they stop the run:
//! - Configuration: detected before any row scan, aborts with no email
//! - Collaborator (sheet access, mail send): aborts the remaining pipeline
//!
//! Row-level date errors are not represented here; they are recorded in the
//! run log with row context and the scan continues.

use thiserror::Error;

/// Error types for a reminder run
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sheet access failed: {0}")]
    SheetAccess(String),

    #[error("Mail send failed: {0}")]
    MailSend(String),
}

impl ReminderError {
    /// Returns true if this error was caught before any row was scanned
    pub fn is_configuration(&self) -> bool {
        matches!(self, ReminderError::Configuration(_))
    }
}
