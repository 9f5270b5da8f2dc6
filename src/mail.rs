use std::sync::Arc;

use axum::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::SmtpConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    TwoFactor,
    PasswordReset,
}

impl MailKind {
    fn subject(self) -> &'static str {
        match self {
            MailKind::TwoFactor => "Your login verification code",
            MailKind::PasswordReset => "Your password reset code",
        }
    }

    fn body(self, code: &str) -> String {
        match self {
            MailKind::TwoFactor => format!(
                "Use this code to finish signing in: {code}\n\nIt expires in 15 minutes."
            ),
            MailKind::PasswordReset => format!(
                "Use this code to reset your password: {code}\n\nIt expires in 15 minutes."
            ),
        }
    }
}

/// Mail delivery abstraction. Delivery is best-effort: callers dispatch in the
/// background and a failure never rolls back the verification code write.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, kind: MailKind, code: &str) -> anyhow::Result<()>;
}

/// Dev/test sender that logs the message instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, kind: MailKind, _code: &str) -> anyhow::Result<()> {
        info!(to = %to, kind = ?kind, "mail send stub");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, kind: MailKind, code: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(kind.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(kind.body(code))?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Fire-and-forget dispatch; errors are logged, never surfaced to the caller.
pub fn dispatch(mailer: Arc<dyn Mailer>, to: String, kind: MailKind, code: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, kind, &code).await {
            warn!(error = %e, to = %to, kind = ?kind, "mail dispatch failed");
        }
    });
}
