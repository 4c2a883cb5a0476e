// apps/order_admin/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use order_lifecycle::{GatewayError, LifecycleError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Required: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Payment Provider Error: {0}")]
  Payment(#[from] GatewayError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(id) => AppError::NotFound(format!("Order {} not found.", id)),
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl From<LifecycleError> for AppError {
  fn from(err: LifecycleError) -> Self {
    match err {
      LifecycleError::UnknownAction(_)
      | LifecycleError::InvalidStatus { .. }
      | LifecycleError::Validation(_)
      | LifecycleError::NotShipped { .. } => AppError::Validation(err.to_string()),
      LifecycleError::NotFound(id) => AppError::NotFound(format!("Order {} not found.", id)),
      LifecycleError::Configuration(m) => AppError::Config(m),
      LifecycleError::Gateway(e) => AppError::Payment(e),
      LifecycleError::Store(e) => AppError::from(e),
    }
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Unauthorized(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Payment(e) => HttpResponse::InternalServerError()
        .json(json!({"error": "Payment provider error", "detail": e.to_string()})),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;
  use order_lifecycle::OrderId;

  #[test]
  fn lifecycle_errors_map_to_status_codes() {
    let cases = [
      (LifecycleError::UnknownAction("archive".into()), StatusCode::BAD_REQUEST),
      (
        LifecycleError::InvalidStatus { value: "LOST".into(), valid: "PENDING".into() },
        StatusCode::BAD_REQUEST,
      ),
      (LifecycleError::NotFound(OrderId::new("o1")), StatusCode::NOT_FOUND),
      (LifecycleError::Configuration("no mail".into()), StatusCode::INTERNAL_SERVER_ERROR),
      (
        LifecycleError::Gateway(GatewayError::Unreachable("timeout".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, expected) in cases {
      assert_eq!(AppError::from(err).error_response().status(), expected);
    }
  }

  #[test]
  fn store_errors_map_to_status_codes() {
    let missing = AppError::from(StoreError::NotFound(OrderId::new("o1")));
    assert!(matches!(missing, AppError::NotFound(_)));
    assert_eq!(missing.error_response().status(), StatusCode::NOT_FOUND);

    let conflict = AppError::from(StoreError::Conflict("order number ORD-1 already exists".into()));
    assert!(matches!(conflict, AppError::Internal(_)));
    assert_eq!(conflict.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
