// apps/order_admin/src/web/handlers/export_handlers.rs

use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::{web, HttpResponse};
use order_lifecycle::export::dated_filename;
use order_lifecycle::{CsvDocument, DateRange, OrderFilter, OrderStatus};
use serde::Deserialize;
use tracing::{info, instrument};

use super::auth::AdminUser;
use super::parse_optional_status;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct ExportQuery {
  pub start: String,
  pub end: String,
  #[serde(default)]
  pub status: Option<String>,
}

impl ExportQuery {
  fn parse(&self) -> Result<(DateRange, Option<OrderStatus>), AppError> {
    let range = DateRange::parse(&self.start, &self.end)?;
    let status = parse_optional_status(self.status.as_deref())?;
    Ok((range, status))
  }
}

fn csv_response(doc: CsvDocument) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/csv; charset=UTF-8")
    .insert_header((CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", doc.filename)))
    .body(doc.content)
}

/// Reconciles the range against the payment provider and downloads the result as CSV.
#[instrument(name = "handler::export_orders", skip(app_state, query, _admin), fields(start = %query.start, end = %query.end))]
pub async fn export_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ExportQuery>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let (range, status) = query.parse()?;
  let doc = app_state.reconciliation.export(&range, status).await?;
  info!("Exported {} reconciled orders to {}.", doc.row_count, doc.filename);
  Ok(csv_response(doc))
}

/// One row per line item of the local orders created in the range.
#[instrument(name = "handler::export_line_items", skip(app_state, query, _admin), fields(start = %query.start, end = %query.end))]
pub async fn export_line_items_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ExportQuery>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let (range, status) = query.parse()?;
  let orders = app_state
    .store
    .list(&OrderFilter {
      status,
      created: Some(range),
      include_deleted: false,
    })
    .await?;
  let doc = app_state
    .exporter
    .line_items_csv(orders, dated_filename("order-items"))
    .await?;
  info!("Exported {} line items to {}.", doc.row_count, doc.filename);
  Ok(csv_response(doc))
}
