// core/src/transition.rs

//! Status Transition Engine: validates and applies a status change to one order.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{LifecycleError, LifecycleResult};
use crate::model::{Order, OrderId, OrderStatus};
use crate::store::OrderStore;

/// Result of a single status write.
#[derive(Debug, Clone)]
pub struct Transition {
  pub order: Order,
  pub previous_status: OrderStatus,
  /// Ship date that existed before this write and was replaced by a new one.
  pub overwritten_shipped_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct StatusTransitionEngine {
  store: Arc<dyn OrderStore>,
}

impl StatusTransitionEngine {
  pub fn new(store: Arc<dyn OrderStore>) -> Self {
    Self { store }
  }

  /// Parses a raw status value, rejecting anything outside the four known statuses.
  pub fn parse_status(raw: &str) -> LifecycleResult<OrderStatus> {
    raw.parse()
  }

  /// Writes `target` to the order.
  ///
  /// Entering `Shipped` stamps `shipped_at` with the current time, also when
  /// the order already was shipped. No other target touches `shipped_at`, so
  /// a later move to `Delivered` (or back to `Pending`) keeps the ship date.
  #[instrument(name = "transition::apply_status", skip(self), fields(order_id = %order_id, target = %target), err(Display))]
  pub async fn apply_status(&self, order_id: &OrderId, target: OrderStatus) -> LifecycleResult<Transition> {
    let current = self
      .store
      .get(order_id)
      .await?
      .ok_or_else(|| LifecycleError::NotFound(order_id.clone()))?;

    let stamp = (target == OrderStatus::Shipped).then(Utc::now);
    let overwritten = if stamp.is_some() { current.shipped_at } else { None };
    if let Some(previous) = overwritten {
      warn!(previous_shipped_at = %previous, "Ship date of order {} replaced by a new shipment.", order_id);
    }

    let order = self.store.update_status(order_id, target, stamp).await?;
    debug!("Order {} moved {} -> {}.", order_id, current.status, order.status);
    Ok(Transition {
      order,
      previous_status: current.status,
      overwritten_shipped_at: overwritten,
    })
  }

  /// Re-stamps the ship date of an order that is already shipped
  /// (e.g. a returned parcel sent out again).
  #[instrument(name = "transition::reship", skip(self), fields(order_id = %order_id), err(Display))]
  pub async fn reship(&self, order_id: &OrderId) -> LifecycleResult<Transition> {
    let current = self
      .store
      .get(order_id)
      .await?
      .ok_or_else(|| LifecycleError::NotFound(order_id.clone()))?;
    if current.status != OrderStatus::Shipped {
      return Err(LifecycleError::NotShipped {
        order_id: order_id.clone(),
        status: current.status.to_string(),
      });
    }
    let order = self
      .store
      .update_status(order_id, OrderStatus::Shipped, Some(Utc::now()))
      .await?;
    Ok(Transition {
      order,
      previous_status: current.status,
      overwritten_shipped_at: current.shipped_at,
    })
  }
}
