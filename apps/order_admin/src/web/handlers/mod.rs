// apps/order_admin/src/web/handlers/mod.rs

pub mod auth;
pub mod bulk_handlers;
pub mod export_handlers;
pub mod order_handlers;
pub mod reconciliation_handlers;

use order_lifecycle::{OrderStatus, StatusTransitionEngine};

use crate::errors::AppError;

/// Blank or absent means "no status filter".
pub(crate) fn parse_optional_status(raw: Option<&str>) -> Result<Option<OrderStatus>, AppError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(value) => Ok(Some(StatusTransitionEngine::parse_status(value)?)),
  }
}
