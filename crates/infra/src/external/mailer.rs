use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("email could not be delivered: {0}")]
pub struct MailError(pub String);

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, body = %message.body, "email sent");
        Ok(())
    }
}

/// Keeps sent messages in memory; can be switched to fail every send.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError("delivery disabled".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MailError("lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "john@gmail.com".into(),
            subject: "Password reset token".into(),
            body: "PUT http://localhost/api/v1/auth/resetpassword/abc".into(),
        }
    }

    #[tokio::test]
    async fn memory_mailer_records_or_fails() {
        let mailer = MemoryMailer::new();
        mailer.send(message()).await.unwrap();
        assert_eq!(mailer.sent(), vec![message()]);

        assert!(MemoryMailer::failing().send(message()).await.is_err());
        assert!(LogMailer.send(message()).await.is_ok());
    }
}
