//! Mail delivery.
//!
//! `MailTransport` is the narrow send interface the pipeline hands the
//! finished digest to; the production implementation relays over SMTP.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::ReminderError;
use crate::types::SmtpConfig;

/// Send one email to one recipient
pub trait MailTransport {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ReminderError>;
}

/// SMTP implementation of `MailTransport`
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), ReminderError> {
        let message = Message::builder()
            .from(self.config.from_address.parse().map_err(|e| {
                ReminderError::MailSend(format!(
                    "invalid from address {:?}: {}",
                    self.config.from_address, e
                ))
            })?)
            .to(to.parse().map_err(|e| {
                ReminderError::MailSend(format!("invalid recipient {:?}: {}", to, e))
            })?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| ReminderError::MailSend(format!("build message: {}", e)))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mailer = SmtpTransport::relay(&self.config.server)
            .map_err(|e| {
                ReminderError::MailSend(format!("SMTP relay {}: {}", self.config.server, e))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(&message)
            .map_err(|e| ReminderError::MailSend(format!("SMTP send: {}", e)))?;

        Ok(())
    }
}
