// apps/order_admin/src/services/stripe.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use order_lifecycle::{DateRange, GatewayError, PaymentGateway, PaymentRecord};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct PaymentIntentPage {
  data: Vec<PaymentIntent>,
  has_more: bool,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
  id: String,
  amount: i64,
  currency: String,
  created: i64,
  status: String,
  #[serde(default)]
  customer: Option<String>,
  #[serde(default)]
  metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

impl PaymentIntent {
  fn into_record(self) -> Result<PaymentRecord, GatewayError> {
    let created = DateTime::<Utc>::from_timestamp(self.created, 0)
      .ok_or_else(|| GatewayError::Decode(format!("payment {} has an invalid timestamp {}", self.id, self.created)))?;
    Ok(PaymentRecord {
      id: self.id,
      amount_minor: self.amount,
      currency: self.currency,
      created,
      customer: self.customer,
      metadata: self.metadata,
    })
  }
}

/// Reads succeeded payments from the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl StripeGateway {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());
    Self {
      client,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    }
  }

  fn auth_headers(&self) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", self.secret_key))
      .map_err(|e| GatewayError::Unreachable(format!("invalid API key header: {}", e)))?;
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
  }

  async fn fetch_page(&self, range: &DateRange, starting_after: Option<&str>) -> Result<PaymentIntentPage, GatewayError> {
    let mut query: Vec<(&str, String)> = vec![
      ("created[gte]", range.start_instant().timestamp().to_string()),
      ("created[lte]", range.end_instant().timestamp().to_string()),
      ("limit", PAGE_SIZE.to_string()),
    ];
    if let Some(cursor) = starting_after {
      query.push(("starting_after", cursor.to_string()));
    }

    let response = self
      .client
      .get(format!("{}/v1/payment_intents", self.api_base))
      .headers(self.auth_headers()?)
      .query(&query)
      .send()
      .await
      .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
      };
      return Err(GatewayError::Api {
        status: status.as_u16(),
        message,
      });
    }
    response
      .json::<PaymentIntentPage>()
      .await
      .map_err(|e| GatewayError::Decode(e.to_string()))
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  /// Walks every page for the range before returning; any page failure fails the whole call.
  #[instrument(name = "stripe::list_succeeded", skip(self), fields(start = %range.start, end = %range.end), err(Display))]
  async fn list_succeeded(&self, range: &DateRange) -> Result<Vec<PaymentRecord>, GatewayError> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
      let page = self.fetch_page(range, cursor.as_deref()).await?;
      cursor = page.data.last().map(|p| p.id.clone());
      let has_more = page.has_more && cursor.is_some();
      for intent in page.data {
        if intent.status == "succeeded" {
          records.push(intent.into_record()?);
        }
      }
      if !has_more {
        break;
      }
    }
    debug!("Fetched {} succeeded payments.", records.len());
    Ok(records)
  }
}
