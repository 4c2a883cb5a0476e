// apps/order_admin/src/services/mail_mock.rs
use async_trait::async_trait;
use order_lifecycle::{MailError, Mailer, OutgoingEmail, SentEmail};
use tracing::{info, warn};

/// Mail transport for local development: logs each message instead of sending it.
#[derive(Debug, Clone)]
pub struct LoggingMailer {
  sender: String,
}

impl LoggingMailer {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into() }
  }
}

#[async_trait]
impl Mailer for LoggingMailer {
  async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, MailError> {
    info!(
      "Simulating sending email: To='{}', From='{}', Subject='{}'",
      email.to, self.sender, email.subject
    );
    tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

    if email.to.ends_with(".invalid") {
      warn!("Simulated email failure for recipient: {}", email.to);
      return Err(MailError::Transport("Simulated email send failure".to_string()));
    }

    let body_preview = email.text_body.chars().take(50).collect::<String>();
    let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
    info!(preview = %body_preview, "Mock email sent successfully. Message ID: {}", message_id);
    Ok(SentEmail { message_id })
  }
}
