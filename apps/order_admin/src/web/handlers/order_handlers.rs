// apps/order_admin/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use order_lifecycle::{OrderFilter, OrderId, StatusTransitionEngine};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::auth::AdminUser;
use super::parse_optional_status;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub include_deleted: bool,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotesPayload {
  pub admin_notes: Option<String>,
}

#[instrument(name = "handler::list_orders", skip(app_state, query, _admin))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListOrdersQuery>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let filter = OrderFilter {
    status: parse_optional_status(query.status.as_deref())?,
    created: None,
    include_deleted: query.include_deleted,
  };
  let orders = app_state.store.list(&filter).await?;
  info!("Listed {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(json!({
      "count": orders.len(),
      "orders": orders
  })))
}

/// Soft-deleted orders stay addressable by id.
#[instrument(name = "handler::get_order", skip(app_state, path, _admin), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = OrderId::new(path.into_inner());
  match app_state.store.get(&id).await? {
    Some(order) => Ok(HttpResponse::Ok().json(json!({ "order": order }))),
    None => {
      warn!("Order with ID {} not found.", id);
      Err(AppError::NotFound(format!("Order {} not found.", id)))
    }
  }
}

#[instrument(name = "handler::update_order_status", skip(app_state, path, payload, admin), fields(order_id = %path.as_ref(), admin_id = %admin.user_id.as_str()))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<UpdateStatusPayload>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let status = StatusTransitionEngine::parse_status(&payload.status)?;
  let id = OrderId::new(path.into_inner());
  let transition = app_state.coordinator.transitions().apply_status(&id, status).await?;
  info!(
    "Order {} moved {} -> {}.",
    id, transition.previous_status, transition.order.status
  );
  Ok(HttpResponse::Ok().json(json!({
      "order": transition.order,
      "previousStatus": transition.previous_status,
      "overwrittenShippedAt": transition.overwritten_shipped_at
  })))
}

#[instrument(name = "handler::update_order_notes", skip(app_state, path, payload, _admin), fields(order_id = %path.as_ref()))]
pub async fn update_order_notes_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<UpdateNotesPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let id = OrderId::new(path.into_inner());
  let notes = payload.into_inner().admin_notes.filter(|n| !n.trim().is_empty());
  let order = app_state.store.set_admin_notes(&id, notes).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}
