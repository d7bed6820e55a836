use async_trait::async_trait;
use tracing::info;

/// Outbound mail, fully rendered by the caller.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Email delivery abstraction. Delivery failures propagate to the caller;
/// retry policy is the caller's concern, not ours.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Local dev mailer that logs the message instead of delivering it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            text = %message.text,
            html_len = message.html.len(),
            "email send stub"
        );
        Ok(())
    }
}

pub fn confirm_account_email(to: &str, first_name: &str, url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Confirm your account".into(),
        text: format!("Hi {first_name}, confirm your account: {url}"),
        html: format!(
            "<p>Hi {first_name},</p><p><a href=\"{url}\">Confirm your account</a></p>"
        ),
    }
}

pub fn password_reset_email(to: &str, first_name: &str, url: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Change your password".into(),
        text: format!("Hi {first_name}, change your password: {url}"),
        html: format!(
            "<p>Hi {first_name},</p><p><a href=\"{url}\">Change your password</a></p>"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_accepts_messages() {
        let message = confirm_account_email("a@b.com", "Alice", "https://x/confirm?token=t");
        assert!(LogMailer.send(&message).await.is_ok());
        assert_eq!(message.to, "a@b.com");
        assert!(message.text.contains("token=t"));
    }
}
