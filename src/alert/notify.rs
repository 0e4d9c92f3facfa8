use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{Result, WatchError};

/// Everything the transport needs for one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub artifact: PathBuf,
}

/// Delivers alerts to a human. Failures are reported, never retried by the caller.
pub trait Notifier: Send {
    fn send(&self, message: &AlertMessage) -> Result<()>;
}

/// Secret that stays out of `Debug` output and logs.
#[derive(Clone)]
struct Secret(String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Email transport over an SMTP relay with STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    server: String,
    port: u16,
    sender: String,
    recipient: String,
    password: Secret,
}

impl SmtpNotifier {
    /// Build from config, reading the password from the environment variable it names.
    ///
    /// # Errors
    /// A config error when the variable is unset or empty.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let password = std::env::var(&config.password_env)
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                WatchError::config(format!(
                    "environment variable `{}` holding the SMTP password is not set",
                    config.password_env
                ))
            })?;
        Ok(Self::new(config, password))
    }

    pub fn new(config: &EmailConfig, password: impl Into<String>) -> Self {
        Self {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            sender: config.sender.clone(),
            recipient: config.recipient.clone(),
            password: Secret(password.into()),
        }
    }

    /// Assemble the MIME message with the artifact attached as a JPEG.
    pub fn build_message(&self, message: &AlertMessage) -> Result<Message> {
        let image = std::fs::read(&message.artifact)?;
        let filename = message
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wildfire.jpg".to_string());
        let jpeg = ContentType::parse("image/jpeg").map_err(|e| WatchError::notify(e.to_string()))?;

        let email = Message::builder()
            .from(self.sender.parse()?)
            .to(self.recipient.parse()?)
            .subject(message.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(message.body.clone()))
                    .singlepart(Attachment::new(filename).body(image, jpeg)),
            )?;
        Ok(email)
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        let email = self.build_message(message)?;
        let mailer = SmtpTransport::starttls_relay(&self.server)?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.0.clone()))
            .build();
        mailer.send(&email)?;
        info!(recipient = %self.recipient, "Potential wildfire detected. Email alert sent.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            sender: "watch@example.com".to_string(),
            recipient: "ops@example.com".to_string(),
            password_env: "EMBERWATCH_TEST_UNSET_PASSWORD_VAR".to_string(),
        }
    }

    #[test]
    fn missing_password_variable_is_a_config_error() {
        let err = SmtpNotifier::from_config(&email_config()).unwrap_err();
        assert!(matches!(err, WatchError::Config(_)));
    }

    #[test]
    fn debug_output_hides_password() {
        let notifier = SmtpNotifier::new(&email_config(), "hunter2");
        let debug = format!("{:?}", notifier);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn message_carries_subject_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("wildfire_20260101_120000.jpg");
        std::fs::write(&artifact, b"\xFF\xD8\xFF\xD9").unwrap();
        let notifier = SmtpNotifier::new(&email_config(), "secret");

        let email = notifier
            .build_message(&AlertMessage {
                subject: "Wildfire Smoke Detected".to_string(),
                body: "Smoke / Fire detected".to_string(),
                artifact,
            })
            .unwrap();

        let raw = String::from_utf8_lossy(&email.formatted()).into_owned();
        assert!(raw.contains("Subject: Wildfire Smoke Detected"));
        assert!(raw.contains("wildfire_20260101_120000.jpg"));
        assert!(raw.contains("image/jpeg"));
    }

    #[test]
    fn missing_artifact_fails_to_build() {
        let notifier = SmtpNotifier::new(&email_config(), "secret");
        let result = notifier.build_message(&AlertMessage {
            subject: "s".to_string(),
            body: "b".to_string(),
            artifact: PathBuf::from("/nonexistent/wildfire.jpg"),
        });
        assert!(matches!(result, Err(WatchError::Io(_))));
    }
}
