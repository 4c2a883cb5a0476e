// apps/order_admin/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use order_lifecycle::{MailSettings, NotificationSettings};
use std::env;

/// Which mail transport delivers shipment emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
  Brevo,
  /// Logs messages instead of sending them.
  Mock,
  Disabled,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Storefront base URL, used for order-detail links in customer emails.
  pub app_base_url: String,
  pub shop_name: String,

  pub stripe_secret_key: String,
  pub stripe_api_base: String,

  pub mail_transport: MailTransport,
  pub mail: MailSettings,

  /// Runs the bundled schema.sql on startup.
  pub apply_schema: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
    let shop_name = get_env("SHOP_NAME").unwrap_or_else(|_| "Fragrance Store".to_string());

    let stripe_secret_key = get_env("STRIPE_SECRET_KEY")?;
    let stripe_api_base = get_env("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());

    let mail_transport = match get_env("MAIL_TRANSPORT").ok().as_deref().map(str::trim) {
      None | Some("") => MailTransport::Disabled,
      Some(v) if v.eq_ignore_ascii_case("brevo") => MailTransport::Brevo,
      Some(v) if v.eq_ignore_ascii_case("mock") => MailTransport::Mock,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid MAIL_TRANSPORT '{}'. Valid values: brevo, mock",
          other
        )))
      }
    };
    // The mock transport needs no credentials of its own.
    let (default_key, default_sender) = match mail_transport {
      MailTransport::Mock => ("mock", "noreply@example.com"),
      _ => ("", ""),
    };
    let mail = MailSettings {
      api_url: get_env("MAIL_API_URL").unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
      api_key: get_env("MAIL_API_KEY").unwrap_or_else(|_| default_key.to_string()),
      sender_email: get_env("MAIL_SENDER_EMAIL").unwrap_or_else(|_| default_sender.to_string()),
      sender_name: get_env("MAIL_SENDER_NAME").unwrap_or_else(|_| shop_name.clone()),
    };

    let apply_schema = get_env("APPLY_SCHEMA")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid APPLY_SCHEMA value: {}", e)))?;

    tracing::info!(mail_transport = ?mail_transport, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      shop_name,
      stripe_secret_key,
      stripe_api_base,
      mail_transport,
      mail,
      apply_schema,
    })
  }

  pub fn notification_settings(&self) -> NotificationSettings {
    NotificationSettings {
      shop_name: self.shop_name.clone(),
      storefront_base_url: self.app_base_url.clone(),
    }
  }
}
