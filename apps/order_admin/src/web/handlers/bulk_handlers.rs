// apps/order_admin/src/web/handlers/bulk_handlers.rs

use actix_web::{web, HttpResponse};
use order_lifecycle::BulkActionPayload;
use tracing::{info, instrument};

use super::auth::AdminUser;
use crate::errors::AppError;
use crate::state::AppState;

#[instrument(
    name = "handler::bulk_action",
    skip(app_state, payload, admin),
    fields(admin_id = %admin.user_id.as_str(), action = %payload.action, orders = payload.order_ids.len())
)]
pub async fn bulk_action_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<BulkActionPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let report = app_state.coordinator.execute_payload(payload.into_inner()).await?;
  info!(
    "Bulk action '{}' by {}: {} updated, {} failed.",
    report.action,
    admin.user_id.as_str(),
    report.updated_count,
    report.failed_count
  );
  Ok(HttpResponse::Ok().json(report))
}
