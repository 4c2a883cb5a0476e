// core/src/reconcile.rs

//! Payment Reconciliation Job: brings local orders in line with the payment
//! provider's ledger for a date range.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::directory::UserDirectory;
use crate::error::{LifecycleResult, StoreError};
use crate::export::{dated_filename, AddressSource, CsvDocument, OrderExporter};
use crate::gateway::PaymentGateway;
use crate::model::{
  disambiguated_order_number, order_number_for_payment, Customer, DateRange, NewOrder, Order, OrderStatus, PaymentRecord, ShippingAddress, UserId,
};
use crate::store::OrderStore;
use crate::transition::StatusTransitionEngine;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
  pub payments_seen: usize,
  pub orders_created: usize,
  pub orders_reused: usize,
  pub orders_advanced: usize,
}

#[derive(Debug, Clone)]
pub struct ReconciliationRun {
  pub summary: ReconciliationSummary,
  /// Local orders matching each payment, in payment creation order.
  pub orders: Vec<Order>,
}

pub struct ReconciliationJob {
  store: Arc<dyn OrderStore>,
  users: Arc<dyn UserDirectory>,
  gateway: Arc<dyn PaymentGateway>,
  transitions: StatusTransitionEngine,
  exporter: OrderExporter,
}

impl ReconciliationJob {
  pub fn new(
    store: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    exporter: OrderExporter,
  ) -> Self {
    let transitions = StatusTransitionEngine::new(Arc::clone(&store));
    Self {
      store,
      users,
      gateway,
      transitions,
      exporter,
    }
  }

  /// Customer behind a payment: metadata user id first, then the provider's customer reference.
  async fn resolve_customer(&self, payment: &PaymentRecord) -> LifecycleResult<Option<Customer>> {
    if let Some(uid) = payment.metadata_user_id() {
      if let Some(customer) = self.users.find_user(&UserId::new(uid)).await? {
        return Ok(Some(customer));
      }
      debug!("Payment {} names user {} which no longer exists.", payment.id, uid);
    }
    if let Some(customer_ref) = payment.customer.as_deref() {
      if let Some(customer) = self.users.find_by_stripe_customer(customer_ref).await? {
        return Ok(Some(customer));
      }
    }
    Ok(None)
  }

  /// The short number for `payment_id`, or a longer hash-suffixed one when
  /// another payment's order already holds it.
  async fn free_order_number(&self, payment_id: &str) -> LifecycleResult<String> {
    let short = order_number_for_payment(payment_id);
    if self.store.find_by_order_number(&short).await?.is_none() {
      return Ok(short);
    }
    for digits in (6..=64).step_by(2) {
      let candidate = disambiguated_order_number(payment_id, digits);
      if self.store.find_by_order_number(&candidate).await?.is_none() {
        debug!("Order number {} is taken, payment {} gets {}.", short, payment_id, candidate);
        return Ok(candidate);
      }
    }
    Err(StoreError::Conflict(format!("no free order number for payment {}", payment_id)).into())
  }

  async fn backfill_order(&self, payment: &PaymentRecord) -> LifecycleResult<NewOrder> {
    let customer = self.resolve_customer(payment).await?;
    let unknown = ShippingAddress::unknown();
    let shipping_address = match &customer {
      Some(c) => c.address_over(&unknown),
      None => unknown,
    };
    Ok(NewOrder {
      order_number: self.free_order_number(&payment.id).await?,
      status: OrderStatus::Pending,
      total_amount: payment.amount_major(),
      shipping_address,
      user_id: customer.map(|c| c.id),
      items: Vec::new(),
      stripe_payment_intent_id: Some(payment.id.clone()),
      created_at: payment.created,
    })
  }

  /// Upserts one local order per succeeded payment and moves pending ones to processing.
  ///
  /// The whole ledger page set is fetched before any write, so an unreachable
  /// provider aborts the run without touching the store. Running it again
  /// over the same range reuses the orders it created.
  #[instrument(name = "reconcile::sync", skip(self), fields(start = %range.start, end = %range.end), err(Display))]
  pub async fn sync(&self, range: &DateRange) -> LifecycleResult<ReconciliationRun> {
    let mut payments = self.gateway.list_succeeded(range).await.map_err(|e| {
      error!("Reconciliation aborted, payment provider failed: {}", e);
      e
    })?;
    payments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

    let mut summary = ReconciliationSummary {
      payments_seen: payments.len(),
      ..Default::default()
    };
    let mut orders = Vec::with_capacity(payments.len());

    for payment in &payments {
      let order = match self.store.find_by_payment_id(&payment.id).await? {
        Some(existing) => {
          summary.orders_reused += 1;
          existing
        }
        None => {
          let new_order = self.backfill_order(payment).await?;
          let (order, created) = self.store.insert_for_payment(new_order).await?;
          if created {
            info!("Backfilled order {} for payment {}.", order.order_number, payment.id);
            summary.orders_created += 1;
          } else {
            summary.orders_reused += 1;
          }
          order
        }
      };

      let order = if order.status == OrderStatus::Pending {
        summary.orders_advanced += 1;
        self.transitions.apply_status(&order.id, OrderStatus::Processing).await?.order
      } else {
        order
      };
      orders.push(order);
    }

    info!(
      payments = summary.payments_seen,
      created = summary.orders_created,
      reused = summary.orders_reused,
      advanced = summary.orders_advanced,
      "Reconciliation run finished."
    );
    Ok(ReconciliationRun { summary, orders })
  }

  /// Runs [`sync`](Self::sync) and renders one CSV row per reconciled order,
  /// optionally keeping only orders currently in `status`.
  ///
  /// Addresses come from the customer's current profile; the order snapshot
  /// is used only when the customer no longer exists.
  pub async fn export(&self, range: &DateRange, status: Option<OrderStatus>) -> LifecycleResult<CsvDocument> {
    let (_, doc) = self.export_orders(range, status).await?;
    Ok(doc)
  }

  /// Like [`export`](Self::export), also returning the orders behind the rows.
  #[instrument(name = "reconcile::export", skip(self), fields(start = %range.start, end = %range.end), err(Display))]
  pub async fn export_orders(
    &self,
    range: &DateRange,
    status: Option<OrderStatus>,
  ) -> LifecycleResult<(Vec<Order>, CsvDocument)> {
    let run = self.sync(range).await?;
    let orders: Vec<Order> = run
      .orders
      .into_iter()
      .filter(|o| status.map_or(true, |s| o.status == s))
      .collect();
    let doc = self
      .exporter
      .orders_csv(orders.clone(), AddressSource::CurrentProfile, dated_filename("stripe-orders"))
      .await?;
    Ok((orders, doc))
  }
}
