// core/src/mock.rs

//! In-process stand-ins for the storefront collaborators.
//!
//! Used by the test suites and for running the admin service locally without
//! a payment provider or mail account.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::directory::{Authorizer, Catalog, UserDirectory};
use crate::error::{GatewayError, MailError, StoreResult};
use crate::gateway::PaymentGateway;
use crate::mail::{Mailer, OutgoingEmail, SentEmail};
use crate::model::{Customer, DateRange, PaymentRecord, ProductId, ProductSummary, UserId};

/// Users, admin roles and products held in memory.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
  users: Arc<RwLock<HashMap<UserId, Customer>>>,
  admins: Arc<RwLock<HashSet<UserId>>>,
  products: Arc<RwLock<HashMap<ProductId, ProductSummary>>>,
}

impl MockDirectory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_user(&self, customer: Customer) {
    self.users.write().insert(customer.id.clone(), customer);
  }

  pub fn remove_user(&self, id: &UserId) {
    self.users.write().remove(id);
  }

  pub fn add_admin(&self, id: UserId) {
    self.admins.write().insert(id);
  }

  pub fn add_product(&self, product: ProductSummary) {
    self.products.write().insert(product.id.clone(), product);
  }
}

#[async_trait]
impl UserDirectory for MockDirectory {
  async fn find_user(&self, id: &UserId) -> StoreResult<Option<Customer>> {
    Ok(self.users.read().get(id).cloned())
  }

  async fn find_by_stripe_customer(&self, customer_ref: &str) -> StoreResult<Option<Customer>> {
    Ok(
      self
        .users
        .read()
        .values()
        .find(|c| c.stripe_customer_id.as_deref() == Some(customer_ref))
        .cloned(),
    )
  }
}

#[async_trait]
impl Authorizer for MockDirectory {
  async fn is_admin(&self, user_id: &UserId) -> StoreResult<bool> {
    Ok(self.admins.read().contains(user_id))
  }
}

#[async_trait]
impl Catalog for MockDirectory {
  async fn products(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, ProductSummary>> {
    let guard = self.products.read();
    Ok(
      ids
        .iter()
        .filter_map(|id| guard.get(id).map(|p| (id.clone(), p.clone())))
        .collect(),
    )
  }
}

/// Payment ledger fixed up front. Can be switched to fail like an unreachable provider.
#[derive(Debug, Clone, Default)]
pub struct StaticPaymentGateway {
  payments: Arc<RwLock<Vec<PaymentRecord>>>,
  unreachable: Arc<RwLock<bool>>,
  calls: Arc<AtomicUsize>,
}

impl StaticPaymentGateway {
  pub fn new(payments: Vec<PaymentRecord>) -> Self {
    Self {
      payments: Arc::new(RwLock::new(payments)),
      ..Default::default()
    }
  }

  pub fn push(&self, payment: PaymentRecord) {
    self.payments.write().push(payment);
  }

  pub fn set_unreachable(&self, unreachable: bool) {
    *self.unreachable.write() = unreachable;
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl PaymentGateway for StaticPaymentGateway {
  async fn list_succeeded(&self, range: &DateRange) -> Result<Vec<PaymentRecord>, GatewayError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if *self.unreachable.read() {
      return Err(GatewayError::Unreachable("connection refused (mock)".to_string()));
    }
    Ok(
      self
        .payments
        .read()
        .iter()
        .filter(|p| range.contains(p.created))
        .cloned()
        .collect(),
    )
  }
}

/// Mail transport that records every accepted message.
///
/// Recipients listed with [`fail_for`](Self::fail_for) are rejected with a
/// transport error; an optional delay simulates network latency.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
  sent: Arc<Mutex<Vec<OutgoingEmail>>>,
  failing: Arc<RwLock<HashSet<String>>>,
  delay: Option<Duration>,
}

impl RecordingMailer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_delay(delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Default::default()
    }
  }

  pub fn fail_for(&self, recipient: &str) {
    self.failing.write().insert(recipient.to_string());
  }

  pub fn sent(&self) -> Vec<OutgoingEmail> {
    self.sent.lock().clone()
  }

  pub fn sent_to(&self, recipient: &str) -> usize {
    self.sent.lock().iter().filter(|m| m.to == recipient).count()
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, MailError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.failing.read().contains(&email.to) {
      return Err(MailError::Transport(format!("connection reset while sending to {}", email.to)));
    }
    let mut sent = self.sent.lock();
    sent.push(email.clone());
    Ok(SentEmail {
      message_id: format!("recorded-{}", sent.len()),
    })
  }
}
