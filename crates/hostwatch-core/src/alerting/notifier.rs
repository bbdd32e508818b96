//! Notification delivery for alerts

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::SmtpConfig;
use crate::models::AlertMessage;

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Credentials or addressing are missing or invalid; nothing was sent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection, handshake, authentication, or send failed
    #[error("Transport error: {source}")]
    Transport {
        /// Underlying cause
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl NotifyError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap a transport failure, keeping its cause
    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }
}

/// Delivers alert messages to a recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Verify credentials and addressing without touching the network
    fn check_config(&self) -> Result<(), NotifyError>;

    /// Deliver one message. No retries.
    async fn send(&self, message: AlertMessage) -> Result<(), NotifyError>;
}

/// Sends alerts as plain-text email over SMTP with STARTTLS
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn mailboxes(&self) -> Result<(Mailbox, Mailbox), NotifyError> {
        let from = self.config.from.parse::<Mailbox>().map_err(|e| {
            NotifyError::configuration(format!("invalid sender {:?}: {e}", self.config.from))
        })?;
        let to = self.config.to.parse::<Mailbox>().map_err(|e| {
            NotifyError::configuration(format!("invalid recipient {:?}: {e}", self.config.to))
        })?;
        Ok((from, to))
    }

    fn password(&self) -> Result<&str, NotifyError> {
        self.config
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| NotifyError::configuration("smtp.password is not set"))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn check_config(&self) -> Result<(), NotifyError> {
        let required = [
            ("smtp.host", self.config.host.as_str()),
            ("smtp.from", self.config.from.as_str()),
            ("smtp.to", self.config.to.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(NotifyError::configuration(format!("{name} is not set")));
            }
        }
        if self.config.port == 0 {
            return Err(NotifyError::configuration("smtp.port must be non-zero"));
        }

        self.password()?;
        self.mailboxes()?;
        Ok(())
    }

    async fn send(&self, message: AlertMessage) -> Result<(), NotifyError> {
        self.check_config()?;

        let (from, to) = self.mailboxes()?;
        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| NotifyError::configuration(format!("could not build email: {e}")))?;

        let credentials = Credentials::new(
            self.config.login().to_string(),
            self.password()?.to_string(),
        );

        // Built per call: the session is opened and closed within this send.
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(NotifyError::transport)?
            .port(self.config.port)
            .credentials(credentials)
            .timeout(Some(self.config.timeout()))
            .build();

        debug!(host = %self.config.host, port = self.config.port, "Opening SMTP session");

        mailer.send(email).await.map_err(NotifyError::transport)?;

        info!(to = %self.config.to, "Email alert sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: Some("app-secret".to_string()),
            from: "watch@example.com".to_string(),
            to: "ops@example.com".to_string(),
            timeout_seconds: 2,
        }
    }

    fn message() -> AlertMessage {
        AlertMessage {
            subject: "Server Alert: High Usage".to_string(),
            body: "CPU Usage: 75.0% (Limit: 50%)".to_string(),
        }
    }

    #[test]
    fn test_complete_config_passes() {
        assert!(SmtpNotifier::new(smtp_config()).check_config().is_ok());
    }

    #[test]
    fn test_missing_password() {
        let mut config = smtp_config();
        config.password = Some(String::new());

        let err = SmtpNotifier::new(config).check_config().unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(ref m) if m.contains("password")));
    }

    #[test]
    fn test_missing_recipient() {
        let mut config = smtp_config();
        config.to = "  ".to_string();

        let err = SmtpNotifier::new(config).check_config().unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(ref m) if m.contains("smtp.to")));
    }

    #[test]
    fn test_invalid_sender_address() {
        let mut config = smtp_config();
        config.from = "not-an-email".to_string();

        let err = SmtpNotifier::new(config).check_config().unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(ref m) if m.contains("invalid sender")));
    }

    #[tokio::test]
    async fn test_send_checks_config_before_connecting() {
        let mut config = smtp_config();
        config.host = String::new();

        let err = SmtpNotifier::new(config).send(message()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let mut config = smtp_config();
        config.host = "localhost".to_string();
        config.port = 1;

        let err = SmtpNotifier::new(config).send(message()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport { .. }));
    }

    #[test]
    fn test_transport_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = NotifyError::transport(cause);

        assert_eq!(err.to_string(), "Transport error: refused");
        assert!(std::error::Error::source(&err).is_some());
    }
}
