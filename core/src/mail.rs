// core/src/mail.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, MailError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
  pub to: String,
  pub to_name: String,
  pub subject: String,
  pub html_body: String,
  pub text_body: String,
}

/// Receipt returned by a transport after it accepted a message.
#[derive(Debug, Clone)]
pub struct SentEmail {
  pub message_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, MailError>;
}

/// Outbound mail settings shared by every transport.
#[derive(Debug, Clone)]
pub struct MailSettings {
  pub api_url: String,
  pub api_key: String,
  pub sender_email: String,
  pub sender_name: String,
}

impl MailSettings {
  /// Checks that credentials and sender are present before anything is sent.
  pub fn validate(&self) -> Result<(), LifecycleError> {
    let missing: Vec<&str> = [
      ("api_url", self.api_url.trim().is_empty()),
      ("api_key", self.api_key.trim().is_empty()),
      ("sender_email", !self.sender_email.contains('@')),
    ]
    .iter()
    .filter(|(_, missing)| *missing)
    .map(|(name, _)| *name)
    .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(LifecycleError::Configuration(format!(
        "Outbound mail is not configured (missing or invalid: {})",
        missing.join(", ")
      )))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn settings() -> MailSettings {
    MailSettings {
      api_url: "https://mail.example.com/v3/smtp/email".into(),
      api_key: "key".into(),
      sender_email: "shop@example.com".into(),
      sender_name: "Shop".into(),
    }
  }

  #[test]
  fn complete_settings_validate() {
    assert!(settings().validate().is_ok());
  }

  #[test]
  fn missing_credentials_are_reported_together() {
    let mut s = settings();
    s.api_key = " ".into();
    s.sender_email = "nobody".into();
    match s.validate() {
      Err(LifecycleError::Configuration(msg)) => {
        assert!(msg.contains("api_key"));
        assert!(msg.contains("sender_email"));
        assert!(!msg.contains("api_url"));
      }
      other => panic!("Expected Configuration error, got {:?}", other),
    }
  }
}
