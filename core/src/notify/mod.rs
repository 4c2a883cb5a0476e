// core/src/notify/mod.rs

//! Notification Dispatcher: sends the shipment email for an order at most once.

mod message;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::directory::{Catalog, UserDirectory};
use crate::error::LifecycleResult;
use crate::mail::{MailSettings, Mailer};
use crate::model::{Order, OrderId, ShippingAddress};
use crate::store::OrderStore;
use message::{ShipmentMessage, GENERIC_RECIPIENT_NAME};

/// Presentation settings for customer emails.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
  pub shop_name: String,
  /// Base URL of the storefront; order links are `{base}/account/orders/{id}`.
  pub storefront_base_url: String,
}

impl NotificationSettings {
  fn order_url(&self, id: &OrderId) -> String {
    format!("{}/account/orders/{}", self.storefront_base_url.trim_end_matches('/'), id)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
  AlreadyNotified,
  InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
  Sent { email: String },
  Skipped(SkipReason),
  Failed { email: Option<String>, error: String },
}

/// Per-order line of a notification report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
  pub order_id: OrderId,
  pub order_number: String,
  pub email: Option<String>,
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
  pub emails_sent: usize,
  pub emails_failed: usize,
  pub skipped: usize,
  pub details: Vec<NotificationDetail>,
}

impl NotificationReport {
  pub fn record(&mut self, order: &Order, outcome: NotificationOutcome) {
    match outcome {
      NotificationOutcome::Sent { email } => {
        self.emails_sent += 1;
        self.details.push(NotificationDetail {
          order_id: order.id.clone(),
          order_number: order.order_number.clone(),
          email: Some(email),
          success: true,
          error: None,
        });
      }
      NotificationOutcome::Failed { email, error } => {
        self.emails_failed += 1;
        self.details.push(NotificationDetail {
          order_id: order.id.clone(),
          order_number: order.order_number.clone(),
          email,
          success: false,
          error: Some(error),
        });
      }
      NotificationOutcome::Skipped(_) => self.skipped += 1,
    }
  }
}

/// Removes the order from the in-flight set when dropped.
struct InFlightClaim {
  set: Arc<Mutex<HashSet<OrderId>>>,
  id: OrderId,
}

impl InFlightClaim {
  fn acquire(set: &Arc<Mutex<HashSet<OrderId>>>, id: &OrderId) -> Option<Self> {
    if set.lock().insert(id.clone()) {
      Some(InFlightClaim { set: Arc::clone(set), id: id.clone() })
    } else {
      None
    }
  }
}

impl Drop for InFlightClaim {
  fn drop(&mut self) {
    self.set.lock().remove(&self.id);
  }
}

struct Recipient {
  email: String,
  name: String,
}

fn usable_email(candidate: Option<&str>) -> Option<&str> {
  candidate
    .map(str::trim)
    .filter(|e| e.contains('@') && *e != ShippingAddress::UNKNOWN)
}

fn usable_name(candidate: Option<&str>) -> Option<&str> {
  candidate
    .map(str::trim)
    .filter(|n| !n.is_empty() && *n != ShippingAddress::UNKNOWN)
}

pub struct NotificationDispatcher {
  store: Arc<dyn OrderStore>,
  users: Arc<dyn UserDirectory>,
  catalog: Arc<dyn Catalog>,
  mailer: Arc<dyn Mailer>,
  settings: NotificationSettings,
  in_flight: Arc<Mutex<HashSet<OrderId>>>,
}

impl NotificationDispatcher {
  /// Builds a dispatcher, refusing to start when the mail settings are incomplete.
  pub fn new(
    store: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn Catalog>,
    mailer: Arc<dyn Mailer>,
    mail: &MailSettings,
    settings: NotificationSettings,
  ) -> LifecycleResult<Self> {
    mail.validate()?;
    Ok(Self {
      store,
      users,
      catalog,
      mailer,
      settings,
      in_flight: Arc::new(Mutex::new(HashSet::new())),
    })
  }

  async fn resolve_recipient(&self, order: &Order) -> Result<Recipient, String> {
    let user = match &order.user_id {
      Some(uid) => match self.users.find_user(uid).await {
        Ok(user) => user,
        Err(e) => {
          warn!("User lookup for order {} failed, using shipping address: {}", order.id, e);
          None
        }
      },
      None => None,
    };

    let addr = &order.shipping_address;
    let email = usable_email(user.as_ref().and_then(|u| u.email.as_deref()))
      .or_else(|| usable_email(Some(addr.email.as_str())))
      .ok_or_else(|| "No recipient email address on the order or its customer.".to_string())?;
    let name = usable_name(user.as_ref().and_then(|u| u.name.as_deref()))
      .or_else(|| usable_name(Some(addr.name.as_str())))
      .unwrap_or(GENERIC_RECIPIENT_NAME);

    Ok(Recipient {
      email: email.to_string(),
      name: name.to_string(),
    })
  }

  /// Sends the shipment email for `order` unless it was already sent.
  ///
  /// The stored order is re-read after claiming it, so concurrent callers for
  /// the same order produce at most one email. A failed send leaves
  /// `notification_sent` false; re-running picks it up again.
  #[instrument(name = "notify::shipment", skip(self, order), fields(order_id = %order.id))]
  pub async fn notify_shipment(&self, order: &Order) -> NotificationOutcome {
    if order.notification_sent {
      return NotificationOutcome::Skipped(SkipReason::AlreadyNotified);
    }
    let _claim = match InFlightClaim::acquire(&self.in_flight, &order.id) {
      Some(claim) => claim,
      None => {
        info!("Notification for order {} already in flight, skipping.", order.id);
        return NotificationOutcome::Skipped(SkipReason::InFlight);
      }
    };

    let current = match self.store.get(&order.id).await {
      Ok(Some(current)) => current,
      Ok(None) => {
        return NotificationOutcome::Failed {
          email: None,
          error: format!("Order {} no longer exists.", order.id),
        }
      }
      Err(e) => return NotificationOutcome::Failed { email: None, error: e.to_string() },
    };
    if current.notification_sent {
      return NotificationOutcome::Skipped(SkipReason::AlreadyNotified);
    }

    let recipient = match self.resolve_recipient(&current).await {
      Ok(r) => r,
      Err(error) => {
        warn!("Cannot notify order {}: {}", current.id, error);
        return NotificationOutcome::Failed { email: None, error };
      }
    };

    let product_ids: Vec<_> = current.items.iter().map(|i| i.product_id.clone()).collect();
    let products = self.catalog.products(&product_ids).await.unwrap_or_else(|e| {
      warn!("Catalog lookup for order {} failed, listing product ids: {}", current.id, e);
      Default::default()
    });

    let email = ShipmentMessage {
      shop_name: &self.settings.shop_name,
      order: &current,
      recipient_email: &recipient.email,
      recipient_name: &recipient.name,
      shipped_at: current.shipped_at.unwrap_or_else(Utc::now),
      products: &products,
      order_url: self.settings.order_url(&current.id),
    }
    .render();

    match self.mailer.send(&email).await {
      Ok(receipt) => match self.store.mark_notified(&current.id).await {
        Ok(_) => {
          info!(
            "Shipment email for order {} sent to {}. Message ID: {}",
            current.order_number, recipient.email, receipt.message_id
          );
          NotificationOutcome::Sent { email: recipient.email }
        }
        Err(e) => {
          error!("Shipment email for order {} sent but flag not saved: {}", current.id, e);
          NotificationOutcome::Failed {
            email: Some(recipient.email),
            error: format!("Email sent but notification flag could not be saved: {}", e),
          }
        }
      },
      Err(e) => {
        warn!("Shipment email for order {} to {} failed: {}", current.id, recipient.email, e);
        NotificationOutcome::Failed {
          email: Some(recipient.email),
          error: e.to_string(),
        }
      }
    }
  }

  /// Notifies each order in turn and aggregates the outcomes.
  pub async fn notify_all(&self, orders: &[Order]) -> NotificationReport {
    let mut report = NotificationReport::default();
    for order in orders {
      let outcome = self.notify_shipment(order).await;
      report.record(order, outcome);
    }
    info!(
      sent = report.emails_sent,
      failed = report.emails_failed,
      skipped = report.skipped,
      "Shipment notifications dispatched."
    );
    report
  }
}
