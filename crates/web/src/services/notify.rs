//! Registration notices for the site admin.
//!
//! Sending is best-effort: [`NotificationService::dispatch`] runs the send on
//! a detached task and only logs the outcome. Nothing here can fail a
//! registration.
//!
//! SMTP delivery uses lettre with an Askama plain-text template.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::task::JoinHandle;

use portal_core::Email;

use crate::config::EmailConfig;
use crate::models::User;

/// Subject line of every registration notice.
pub const REGISTRATION_SUBJECT: &str = "New User Registration";

/// Plain text body of the registration notice.
#[derive(Template)]
#[template(path = "email/new_user.txt")]
struct NewUserEmailText<'a> {
    name: &'a str,
    address: &'a str,
    phone: &'a str,
    email: &'a str,
}

/// Errors that can occur when sending a notice.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Mail credentials or recipient are not configured.
    #[error("mail is not configured")]
    NotConfigured,
}

/// What the admin is told about a new account. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationNotice {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Email,
}

impl From<&User> for RegistrationNotice {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
        }
    }
}

impl RegistrationNotice {
    /// Render the plain text body.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Template` if rendering fails.
    pub fn render_text(&self) -> Result<String, NotifyError> {
        let body = NewUserEmailText {
            name: &self.name,
            address: &self.address,
            phone: &self.phone,
            email: self.email.as_str(),
        }
        .render()?;
        Ok(body)
    }
}

/// Delivers registration notices.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notice.
    async fn send(&self, notice: &RegistrationNotice) -> Result<(), NotifyError>;
}

/// Notifier that sends through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    admin_address: String,
}

impl SmtpNotifier {
    /// Create a notifier from configuration.
    ///
    /// No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the STARTTLS parameters cannot be built.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notice: &RegistrationNotice) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(self
                .admin_address
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(self.admin_address.clone()))?)
            .subject(REGISTRATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(notice.render_text()?)?;

        self.mailer.send(email).await?;

        tracing::info!(to = %self.admin_address, subject = REGISTRATION_SUBJECT, "Email sent successfully");
        Ok(())
    }
}

/// Notifier used when mail is not configured. Every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _notice: &RegistrationNotice) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Fire-and-forget front for a [`Notifier`].
#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Build the service from optional mail settings.
    ///
    /// Falls back to [`DisabledNotifier`] when mail is not configured or the
    /// transport cannot be built.
    #[must_use]
    pub fn from_config(config: Option<&EmailConfig>) -> Self {
        let Some(config) = config else {
            return Self::new(Arc::new(DisabledNotifier));
        };

        match SmtpNotifier::new(config) {
            Ok(notifier) => Self::new(Arc::new(notifier)),
            Err(e) => {
                tracing::error!(error = %e, smtp_host = %config.smtp_host, "Failed to build SMTP transport");
                Self::new(Arc::new(DisabledNotifier))
            }
        }
    }

    /// Send `notice` on a detached task.
    ///
    /// Failures are logged and dropped. The handle is only useful to callers
    /// that want to wait for the attempt to finish.
    pub fn dispatch(&self, notice: RegistrationNotice) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            match notifier.send(&notice).await {
                Ok(()) => tracing::info!(email = %notice.email, "Registration notice sent"),
                Err(e) => {
                    tracing::warn!(error = %e, email = %notice.email, "Mail Error: registration notice not sent");
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    fn notice() -> RegistrationNotice {
        RegistrationNotice {
            name: "Ada Lovelace".to_string(),
            address: "12 St James's Square".to_string(),
            phone: "555-0100".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
        }
    }

    struct CountingNotifier(AtomicUsize);

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _notice: &RegistrationNotice) -> Result<(), NotifyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_render_text_lists_profile() {
        let body = notice().render_text().unwrap();

        assert!(body.starts_with("New User Registered:"));
        assert!(body.contains("Name: Ada Lovelace"));
        assert!(body.contains("Address: 12 St James's Square"));
        assert!(body.contains("Phone: 555-0100"));
        assert!(body.contains("Email: ada@example.com"));
    }

    #[test]
    fn test_notice_from_user_drops_password() {
        let user = User {
            id: portal_core::UserId::new(1),
            name: "Ada Lovelace".to_string(),
            address: "12 St James's Square".to_string(),
            phone: "555-0100".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "$argon2id$v=19$secret-hash".to_string(),
            created_at: chrono::Utc::now(),
        };

        let notice = RegistrationNotice::from(&user);
        assert_eq!(notice, self::notice());
        assert!(!notice.render_text().unwrap().contains("argon2"));
    }

    #[tokio::test]
    async fn test_dispatch_runs_notifier() {
        let notifier = Arc::new(CountingNotifier(AtomicUsize::new(0)));
        let service = NotificationService::new(notifier.clone());

        service.dispatch(notice()).await.unwrap();

        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let service = NotificationService::from_config(None);
        assert!(service.dispatch(notice()).await.is_ok());
    }

    #[tokio::test]
    async fn test_smtp_unreachable_is_an_error() {
        let config = EmailConfig {
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: 1,
            smtp_username: "mailer@example.org".to_string(),
            smtp_password: SecretString::from("pw"),
            from_address: "mailer@example.org".to_string(),
            admin_address: "admin@example.org".to_string(),
            timeout: Duration::from_secs(2),
        };
        let notifier = SmtpNotifier::new(&config).unwrap();

        assert!(notifier.send(&notice()).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_admin_address() {
        let config = EmailConfig {
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: 1,
            smtp_username: "mailer@example.org".to_string(),
            smtp_password: SecretString::from("pw"),
            from_address: "mailer@example.org".to_string(),
            admin_address: "not an address".to_string(),
            timeout: Duration::from_secs(2),
        };
        let notifier = SmtpNotifier::new(&config).unwrap();

        assert!(matches!(
            notifier.send(&notice()).await,
            Err(NotifyError::InvalidAddress(_))
        ));
    }
}
