// core/src/store/memory.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{OrderFilter, OrderStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{NewOrder, Order, OrderId, OrderStatus};

#[derive(Debug, Default)]
struct Inner {
  orders: HashMap<OrderId, Order>,
  by_payment: HashMap<String, OrderId>,
  failing_writes: HashSet<OrderId>,
}

/// `OrderStore` held in process memory.
///
/// Used by the test suites and by local runs without a database. The lock is
/// never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
  inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds an order verbatim, keeping its id and flags.
  pub fn put(&self, order: Order) {
    let mut guard = self.inner.write();
    if let Some(pid) = &order.stripe_payment_intent_id {
      guard.by_payment.insert(pid.clone(), order.id.clone());
    }
    guard.orders.insert(order.id.clone(), order);
  }

  /// Makes every subsequent write to `id` fail with a backend error.
  pub fn fail_writes_for(&self, id: &OrderId) {
    self.inner.write().failing_writes.insert(id.clone());
  }

  pub fn len(&self) -> usize {
    self.inner.read().orders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn snapshot(&self, id: &OrderId) -> Option<Order> {
    self.inner.read().orders.get(id).cloned()
  }

  fn mutate<F>(&self, id: &OrderId, f: F) -> StoreResult<Order>
  where
    F: FnOnce(&mut Order),
  {
    let mut guard = self.inner.write();
    if guard.failing_writes.contains(id) {
      return Err(StoreError::Backend(format!("write rejected for order {}", id)));
    }
    let order = guard.orders.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    f(order);
    order.updated_at = Utc::now();
    Ok(order.clone())
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> {
    Ok(self.inner.read().orders.get(id).cloned())
  }

  async fn get_many(&self, ids: &[OrderId]) -> StoreResult<Vec<Order>> {
    let guard = self.inner.read();
    Ok(ids.iter().filter_map(|id| guard.orders.get(id).cloned()).collect())
  }

  async fn find_by_payment_id(&self, payment_id: &str) -> StoreResult<Option<Order>> {
    let guard = self.inner.read();
    Ok(
      guard
        .by_payment
        .get(payment_id)
        .and_then(|id| guard.orders.get(id))
        .cloned(),
    )
  }

  async fn find_by_order_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
    let guard = self.inner.read();
    Ok(guard.orders.values().find(|o| o.order_number == order_number).cloned())
  }

  async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
    let guard = self.inner.read();
    let mut orders: Vec<Order> = guard.orders.values().filter(|o| filter.matches(o)).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
  }

  async fn insert(&self, order: NewOrder) -> StoreResult<Order> {
    let mut guard = self.inner.write();
    if guard.orders.values().any(|o| o.order_number == order.order_number) {
      return Err(StoreError::Conflict(format!(
        "order number {} already exists",
        order.order_number
      )));
    }
    if let Some(pid) = &order.stripe_payment_intent_id {
      if guard.by_payment.contains_key(pid) {
        return Err(StoreError::Conflict(format!("payment {} already has an order", pid)));
      }
    }
    let stored = order.into_order(OrderId::generate(), Utc::now());
    if let Some(pid) = &stored.stripe_payment_intent_id {
      guard.by_payment.insert(pid.clone(), stored.id.clone());
    }
    guard.orders.insert(stored.id.clone(), stored.clone());
    Ok(stored)
  }

  async fn insert_for_payment(&self, order: NewOrder) -> StoreResult<(Order, bool)> {
    let payment_id = order
      .stripe_payment_intent_id
      .clone()
      .ok_or_else(|| StoreError::Conflict("payment-keyed insert without a payment id".to_string()))?;

    let mut guard = self.inner.write();
    if let Some(existing) = guard.by_payment.get(&payment_id).and_then(|id| guard.orders.get(id)) {
      return Ok((existing.clone(), false));
    }
    if guard.orders.values().any(|o| o.order_number == order.order_number) {
      return Err(StoreError::Conflict(format!(
        "order number {} already exists",
        order.order_number
      )));
    }
    let stored = order.into_order(OrderId::generate(), Utc::now());
    guard.by_payment.insert(payment_id, stored.id.clone());
    guard.orders.insert(stored.id.clone(), stored.clone());
    Ok((stored, true))
  }

  async fn update_status(
    &self,
    id: &OrderId,
    status: OrderStatus,
    shipped_at: Option<DateTime<Utc>>,
  ) -> StoreResult<Order> {
    self.mutate(id, |order| {
      order.status = status;
      if let Some(at) = shipped_at {
        order.shipped_at = Some(at);
      }
    })
  }

  async fn mark_notified(&self, id: &OrderId) -> StoreResult<bool> {
    let mut guard = self.inner.write();
    if guard.failing_writes.contains(id) {
      return Err(StoreError::Backend(format!("write rejected for order {}", id)));
    }
    let order = guard.orders.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
    if order.notification_sent {
      return Ok(false);
    }
    order.notification_sent = true;
    order.updated_at = Utc::now();
    Ok(true)
  }

  async fn soft_delete(&self, id: &OrderId, at: DateTime<Utc>) -> StoreResult<Order> {
    self.mutate(id, |order| {
      order.is_deleted = true;
      order.deleted_at = Some(at);
    })
  }

  async fn set_admin_notes(&self, id: &OrderId, notes: Option<String>) -> StoreResult<Order> {
    self.mutate(id, |order| order.admin_notes = notes)
  }
}
