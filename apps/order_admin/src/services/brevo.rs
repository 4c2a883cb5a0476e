// apps/order_admin/src/services/brevo.rs
use async_trait::async_trait;
use order_lifecycle::{LifecycleResult, MailError, MailSettings, Mailer, OutgoingEmail, SentEmail};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct Contact<'a> {
  email: &'a str,
  name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
  sender: Contact<'a>,
  to: [Contact<'a>; 1],
  subject: &'a str,
  html_content: &'a str,
  text_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
  message_id: String,
}

/// Transactional email through the Brevo HTTP API.
#[derive(Debug, Clone)]
pub struct BrevoMailer {
  client: reqwest::Client,
  settings: MailSettings,
}

impl BrevoMailer {
  /// Fails when the API key or sender address is missing.
  pub fn new(settings: MailSettings) -> LifecycleResult<Self> {
    settings.validate()?;
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());
    Ok(Self { client, settings })
  }

  fn headers(&self) -> Result<HeaderMap, MailError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let key = HeaderValue::from_str(&self.settings.api_key)
      .map_err(|e| MailError::Transport(format!("invalid API key header: {}", e)))?;
    headers.insert("api-key", key);
    Ok(headers)
  }
}

#[async_trait]
impl Mailer for BrevoMailer {
  #[instrument(name = "brevo::send", skip(self, email), fields(to = %email.to), err(Display))]
  async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, MailError> {
    let body = SendRequest {
      sender: Contact {
        email: &self.settings.sender_email,
        name: &self.settings.sender_name,
      },
      to: [Contact {
        email: &email.to,
        name: &email.to_name,
      }],
      subject: &email.subject,
      html_content: &email.html_body,
      text_content: &email.text_body,
    };

    let response = self
      .client
      .post(&self.settings.api_url)
      .headers(self.headers()?)
      .json(&body)
      .send()
      .await
      .map_err(|e| MailError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_client_error() {
      let detail = response.text().await.unwrap_or_default();
      return Err(MailError::Rejected(format!("{}: {}", status, detail)));
    }
    if !status.is_success() {
      return Err(MailError::Transport(format!("mail API answered {}", status)));
    }

    let receipt: SendResponse = response
      .json()
      .await
      .map_err(|e| MailError::Transport(format!("unreadable mail API response: {}", e)))?;
    debug!("Mail API accepted message {}.", receipt.message_id);
    Ok(SentEmail {
      message_id: receipt.message_id,
    })
  }
}
