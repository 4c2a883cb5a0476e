// core/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::customer::UserId;
use super::status::OrderStatus;

/// Opaque order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
  pub fn new(id: impl Into<String>) -> Self {
    OrderId(id.into())
  }

  /// Fresh random id for orders created by this subsystem.
  pub fn generate() -> Self {
    OrderId(uuid::Uuid::new_v4().simple().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for OrderId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Shipping address captured when the order was placed.
///
/// This is a snapshot, not a reference to the customer's profile: the customer
/// may move afterwards and the order must keep the address it shipped to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub name: String,
  pub postal_code: String,
  pub prefecture: String,
  pub city: String,
  pub address: String,
  pub phone: String,
  pub email: String,
}

impl ShippingAddress {
  pub const UNKNOWN: &'static str = "Unknown";

  /// Address with every field set to the "Unknown" placeholder.
  pub fn unknown() -> Self {
    let u = || Self::UNKNOWN.to_string();
    ShippingAddress {
      name: u(),
      postal_code: u(),
      prefecture: u(),
      city: u(),
      address: u(),
      phone: u(),
      email: u(),
    }
  }
}

/// One purchased line. `unit_price` is the price at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub product_id: ProductId,
  pub quantity: i32,
  pub unit_price: i64,
}

impl OrderItem {
  pub fn subtotal(&self) -> i64 {
    self.unit_price * i64::from(self.quantity)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: OrderId,
  pub order_number: String,
  pub status: OrderStatus,
  /// Whole yen; there are no fractional subunits.
  pub total_amount: i64,
  pub shipping_address: ShippingAddress,
  /// `None` once the customer account has been deleted; orders are never cascaded.
  pub user_id: Option<UserId>,
  pub items: Vec<OrderItem>,
  pub stripe_payment_intent_id: Option<String>,
  pub notification_sent: bool,
  pub shipped_at: Option<DateTime<Utc>>,
  pub admin_notes: Option<String>,
  pub is_deleted: bool,
  pub deleted_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Data required to create an order. Lifecycle flags start cleared.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order_number: String,
  pub status: OrderStatus,
  pub total_amount: i64,
  pub shipping_address: ShippingAddress,
  pub user_id: Option<UserId>,
  pub items: Vec<OrderItem>,
  pub stripe_payment_intent_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl NewOrder {
  pub fn into_order(self, id: OrderId, now: DateTime<Utc>) -> Order {
    Order {
      id,
      order_number: self.order_number,
      status: self.status,
      total_amount: self.total_amount,
      shipping_address: self.shipping_address,
      user_id: self.user_id,
      items: self.items,
      stripe_payment_intent_id: self.stripe_payment_intent_id,
      notification_sent: false,
      shipped_at: None,
      admin_notes: None,
      is_deleted: false,
      deleted_at: None,
      created_at: self.created_at,
      updated_at: now,
    }
  }
}

/// Order number for an order backfilled from a payment record.
///
/// Uses the last eight characters of the payment id, uppercased, so the same
/// payment always yields the same number.
pub fn order_number_for_payment(payment_id: &str) -> String {
  let chars: Vec<char> = payment_id.chars().collect();
  let start = chars.len().saturating_sub(8);
  let tail: String = chars[start..].iter().collect();
  format!("ORD-{}", tail.to_uppercase())
}

/// Longer order number for a payment whose short number is already held by
/// another payment's order: the short number plus the first `digits` hex
/// digits of the SHA-256 of the full payment id.
///
/// `digits` is clamped to `2..=64`.
pub fn disambiguated_order_number(payment_id: &str, digits: usize) -> String {
  let digest = Sha256::digest(payment_id.as_bytes());
  let hex: String = digest.iter().map(|b| format!("{:02X}", b)).collect();
  let digits = digits.clamp(2, hex.len());
  format!("{}-{}", order_number_for_payment(payment_id), &hex[..digits])
}
