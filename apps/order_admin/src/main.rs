// apps/order_admin/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, MailTransport};
use crate::db::{PgDirectory, PgOrderStore};
use crate::services::{BrevoMailer, LoggingMailer, StripeGateway};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use order_lifecycle::{
  BulkActionCoordinator, Mailer, NotificationDispatcher, OrderExporter, OrderStore, ReconciliationJob,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

/// Builds the mail transport and dispatcher, or `None` when mail is disabled.
fn build_notifier(
  config: &AppConfig,
  store: Arc<dyn OrderStore>,
  directory: Arc<PgDirectory>,
) -> anyhow::Result<Option<Arc<NotificationDispatcher>>> {
  let mailer: Arc<dyn Mailer> = match config.mail_transport {
    MailTransport::Disabled => {
      tracing::warn!("MAIL_TRANSPORT is not set; bulk requests asking for shipment emails will be refused.");
      return Ok(None);
    }
    MailTransport::Mock => Arc::new(LoggingMailer::new(config.mail.sender_email.clone())),
    MailTransport::Brevo => Arc::new(BrevoMailer::new(config.mail.clone()).context("Invalid mail settings")?),
  };
  let dispatcher = NotificationDispatcher::new(
    store,
    directory.clone(),
    directory,
    mailer,
    &config.mail,
    config.notification_settings(),
  )
  .context("Invalid mail settings")?;
  Ok(Some(Arc::new(dispatcher)))
}

async fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
  let db_pool = PgPool::connect(&config.database_url)
    .await
    .context("Failed to connect to the database")?;
  tracing::info!("Successfully connected to the database.");

  if config.apply_schema {
    db::apply_schema(&db_pool).await.context("Failed to apply schema")?;
  }

  let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(db_pool.clone()));
  let directory = Arc::new(PgDirectory::new(db_pool));
  let gateway = Arc::new(StripeGateway::new(
    config.stripe_api_base.clone(),
    config.stripe_secret_key.clone(),
  ));

  let exporter = OrderExporter::new(directory.clone(), directory.clone());
  let reconciliation = Arc::new(ReconciliationJob::new(
    Arc::clone(&store),
    directory.clone(),
    gateway,
    exporter.clone(),
  ));
  let notifier = build_notifier(&config, Arc::clone(&store), directory.clone())?;
  let coordinator = Arc::new(BulkActionCoordinator::new(
    Arc::clone(&store),
    notifier,
    exporter.clone(),
    Arc::clone(&reconciliation),
  ));

  Ok(AppState {
    store,
    authorizer: directory,
    coordinator,
    reconciliation,
    exporter,
    config,
  })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting order admin server...");

  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);
  let app_state = build_state(app_config.clone()).await?;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;
  Ok(())
}
