//! Delivery of signup confirmation codes.
//!
//! [`SmtpMailer`] sends through the `lettre` async SMTP transport. When no
//! SMTP host is configured the server falls back to [`LogMailer`], which only
//! writes the code to the log.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{MailConfig, SmtpConfig};

/// Error type for confirmation mail failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `code` to `email`, addressed to `username`.
    async fn send_confirmation_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError>;
}

/// Pick the mailer matching the configuration.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp.clone(), &config.from_address)),
        None => Arc::new(LogMailer),
    }
}

fn confirmation_body(username: &str, code: &str) -> String {
    format!("Hello, {username}!\n\nYour confirmation code: {code}\n")
}

pub struct SmtpMailer {
    smtp: SmtpConfig,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(smtp: SmtpConfig, from_address: &str) -> Self {
        Self {
            smtp,
            from_address: from_address.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(email.parse()?)
            .subject("YaMDb confirmation code")
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(username, code))
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?
            .port(self.smtp.port);

        if let (Some(user), Some(pass)) = (&self.smtp.username, &self.smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder.build().send(message).await?;
        info!(to = %email, "Confirmation code sent");
        Ok(())
    }
}

/// Console backend: the code only ever reaches the server log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        info!(to = %email, "{}", confirmation_body(username, code));
        Ok(())
    }
}
