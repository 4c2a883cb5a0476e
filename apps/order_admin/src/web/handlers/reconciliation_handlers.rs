// apps/order_admin/src/web/handlers/reconciliation_handlers.rs

use actix_web::{web, HttpResponse};
use order_lifecycle::DateRange;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::auth::AdminUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct SyncPayload {
  pub start: String,
  pub end: String,
}

/// Runs reconciliation for the range without producing a CSV.
#[instrument(name = "handler::reconciliation_sync", skip(app_state, payload, _admin), fields(start = %payload.start, end = %payload.end))]
pub async fn sync_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SyncPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let range = DateRange::parse(&payload.start, &payload.end)?;
  let run = app_state.reconciliation.sync(&range).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": format!(
        "{}件の決済を照合しました（新規{}件 / 既存{}件）",
        run.summary.payments_seen, run.summary.orders_created, run.summary.orders_reused
      ),
      "summary": run.summary
  })))
}
