use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("smtp relay")?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .port(config.smtp_port)
            .pool_config(PoolConfig::new().max_size(4))
            .build();
        let sender = config.sender.parse().context("smtp sender address")?;
        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(to.parse().context("recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;
        self.transport.send(message).await.context("smtp send")?;
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured; the message is logged, not sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(%to, %subject, %body, "smtp not configured, logging email instead");
        Ok(())
    }
}

/// Fire-and-forget delivery: the calling operation's outcome never depends
/// on it. The spawned task inspects the result and drops failures after
/// logging them.
pub fn send_detached(mailer: Arc<dyn Mailer>, to: String, subject: &'static str, body: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, subject, &body).await {
            warn!(error = %e, %to, "email delivery failed");
        }
    });
}

pub fn verification_body(base_url: &str, token: &str) -> String {
    format!(
        "Welcome to Authbase!\n\
        \n\
        Please verify your email by clicking on the following link:\n\
        \n\
        {base_url}/api/v1/auth/verify/{token}\n\
        \n\
        If you did not create an account, you can ignore this email.\n"
    )
}

pub fn reset_body(base_url: &str, token: &str, ttl_minutes: i64) -> String {
    format!(
        "Hello,\n\
        \n\
        A password reset was requested for your account.\n\
        \n\
        To choose a new password, click on the following link:\n\
        \n\
        {base_url}/api/v1/auth/reset-password/{token}\n\
        \n\
        This link will expire in {ttl_minutes} minutes.\n\
        \n\
        If you did not request this reset, you can ignore this email.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.into(), subject.into(), body.into()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn recording_mailer_captures_message() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
        };
        mailer
            .send("user@example.com", "Verify your email", "hello")
            .await
            .expect("send should succeed");

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "user@example.com");
        assert_eq!(sent[0].1, "Verify your email");
    }

    #[test]
    fn verification_body_contains_link_and_token() {
        let body = verification_body("http://localhost:8080", "abc123");
        assert!(body.contains("http://localhost:8080/api/v1/auth/verify/abc123"));
        assert!(body.contains("verify your email"));
    }

    #[test]
    fn reset_body_contains_link_and_expiry() {
        let body = reset_body("https://app.example.com", "deadbeef", 10);
        assert!(body.contains("https://app.example.com/api/v1/auth/reset-password/deadbeef"));
        assert!(body.contains("expire in 10 minutes"));
        assert!(body.contains("did not request this reset"));
    }
}
