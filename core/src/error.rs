// core/src/error.rs
use thiserror::Error;

use crate::model::OrderId;

/// Failures raised by an [`OrderStore`](crate::store::OrderStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Order not found: {0}")]
  NotFound(OrderId),

  #[error("Conflicting write: {0}")]
  Conflict(String),

  #[error("Storage backend failure: {0}")]
  Backend(String),
}

/// Failures talking to the external payment provider.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("Payment provider unreachable: {0}")]
  Unreachable(String),

  #[error("Payment provider returned an error (status {status}): {message}")]
  Api { status: u16, message: String },

  #[error("Could not decode payment provider response: {0}")]
  Decode(String),
}

/// Failures from the outbound mail transport.
#[derive(Debug, Error)]
pub enum MailError {
  #[error("Mail transport failure: {0}")]
  Transport(String),

  #[error("Mail rejected by provider: {0}")]
  Rejected(String),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error("Unknown bulk action '{0}'")]
  UnknownAction(String),

  #[error("Invalid status '{value}'. Valid values: {valid}")]
  InvalidStatus { value: String, valid: String },

  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("Order not found: {0}")]
  NotFound(OrderId),

  #[error("Order {order_id} is {status}, only shipped orders can be reshipped")]
  NotShipped { order_id: OrderId, status: String },

  #[error("Configuration error: {0}")]
  Configuration(String),

  #[error(transparent)]
  Store(StoreError),

  #[error(transparent)]
  Gateway(#[from] GatewayError),
}

impl From<StoreError> for LifecycleError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(id) => LifecycleError::NotFound(id),
      other => LifecycleError::Store(other),
    }
  }
}

pub type LifecycleResult<T, E = LifecycleError> = std::result::Result<T, E>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
