// core/src/store/mod.rs

//! The Order Store: the single persisted ledger every lifecycle component reads and writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{DateRange, NewOrder, Order, OrderId, OrderStatus};

pub mod memory;

pub use memory::InMemoryOrderStore;

/// Listing filter. Soft-deleted orders are excluded unless `include_deleted` is set.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub status: Option<OrderStatus>,
  pub created: Option<DateRange>,
  pub include_deleted: bool,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    (self.include_deleted || !order.is_deleted)
      && self.status.map_or(true, |s| order.status == s)
      && self.created.map_or(true, |r| r.contains(order.created_at))
  }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Fetches one order by id, soft-deleted or not.
  async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>>;

  /// Fetches the orders among `ids` that exist, in the order requested.
  async fn get_many(&self, ids: &[OrderId]) -> StoreResult<Vec<Order>>;

  async fn find_by_payment_id(&self, payment_id: &str) -> StoreResult<Option<Order>>;

  /// Order numbers are unique across all orders, soft-deleted included.
  async fn find_by_order_number(&self, order_number: &str) -> StoreResult<Option<Order>>;

  /// Newest first.
  async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

  async fn insert(&self, order: NewOrder) -> StoreResult<Order>;

  /// Create-if-absent keyed on `stripe_payment_intent_id`.
  ///
  /// Returns the stored order and whether this call created it. Two calls
  /// with the same payment id never produce two orders. An `order_number`
  /// already held by a different payment's order is a `Conflict`.
  async fn insert_for_payment(&self, order: NewOrder) -> StoreResult<(Order, bool)>;

  /// Writes `status`. `shipped_at` is written only when `Some`; an existing
  /// timestamp is never cleared.
  async fn update_status(
    &self,
    id: &OrderId,
    status: OrderStatus,
    shipped_at: Option<DateTime<Utc>>,
  ) -> StoreResult<Order>;

  /// Atomically flips `notification_sent` from false to true.
  /// Returns `false` when the flag was already set.
  async fn mark_notified(&self, id: &OrderId) -> StoreResult<bool>;

  async fn soft_delete(&self, id: &OrderId, at: DateTime<Utc>) -> StoreResult<Order>;

  async fn set_admin_notes(&self, id: &OrderId, notes: Option<String>) -> StoreResult<Order>;
}
