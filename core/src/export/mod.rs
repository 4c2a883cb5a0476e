// core/src/export/mod.rs

//! CSV exports of orders for the back-office.
//!
//! Two granularities exist on purpose: the operator export writes one row per
//! order with its items collapsed into one cell, the analytics export writes
//! one row per line item.

pub mod csv;
pub mod rows;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

use crate::directory::{Catalog, UserDirectory};
use crate::error::StoreResult;
use crate::model::{jst, Customer, Order, ProductId, ProductSummary, ShippingAddress, UserId};
pub use self::csv::{escape_field, CsvBuilder};
pub use rows::{LINE_ITEM_EXPORT_HEADERS, ORDER_EXPORT_HEADERS};

/// A rendered CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
  pub filename: String,
  pub content: String,
  /// Data rows, header excluded.
  pub row_count: usize,
}

/// CSV payload as handed to the admin client for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
  pub filename: String,
  pub content_base64: String,
  pub row_count: usize,
}

impl CsvDocument {
  pub fn to_download(&self) -> CsvExport {
    CsvExport {
      filename: self.filename.clone(),
      content_base64: STANDARD.encode(self.content.as_bytes()),
      row_count: self.row_count,
    }
  }
}

/// `<prefix>-<YYYY-MM-DD>.csv`, dated today in Japan.
pub fn dated_filename(prefix: &str) -> String {
  format!("{}-{}.csv", prefix, Utc::now().with_timezone(&jst()).format("%Y-%m-%d"))
}

/// Which address wins when an order has both a snapshot and a live customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
  /// The address captured at order time; profile fields only fill blanks.
  Snapshot,
  /// The customer's current profile; the snapshot only fills blanks.
  CurrentProfile,
}

fn fill_blanks(primary: &ShippingAddress, fallback: &ShippingAddress) -> ShippingAddress {
  let pick = |p: &String, f: &String| if p.trim().is_empty() { f.clone() } else { p.clone() };
  ShippingAddress {
    name: pick(&primary.name, &fallback.name),
    postal_code: pick(&primary.postal_code, &fallback.postal_code),
    prefecture: pick(&primary.prefecture, &fallback.prefecture),
    city: pick(&primary.city, &fallback.city),
    address: pick(&primary.address, &fallback.address),
    phone: pick(&primary.phone, &fallback.phone),
    email: pick(&primary.email, &fallback.email),
  }
}

pub fn resolve_address(order: &Order, customer: Option<&Customer>, source: AddressSource) -> ShippingAddress {
  let snapshot = &order.shipping_address;
  match (customer, source) {
    (None, _) => snapshot.clone(),
    (Some(c), AddressSource::CurrentProfile) => c.address_over(snapshot),
    (Some(c), AddressSource::Snapshot) => fill_blanks(snapshot, &c.address_over(&ShippingAddress::default())),
  }
}

/// Loads the customers and products an export needs and renders the CSV.
#[derive(Clone)]
pub struct OrderExporter {
  users: Arc<dyn UserDirectory>,
  catalog: Arc<dyn Catalog>,
}

impl OrderExporter {
  pub fn new(users: Arc<dyn UserDirectory>, catalog: Arc<dyn Catalog>) -> Self {
    Self { users, catalog }
  }

  async fn customers(&self, orders: &[Order]) -> StoreResult<HashMap<UserId, Customer>> {
    let ids: HashSet<&UserId> = orders.iter().filter_map(|o| o.user_id.as_ref()).collect();
    let mut found = HashMap::with_capacity(ids.len());
    for id in ids {
      if let Some(customer) = self.users.find_user(id).await? {
        found.insert(id.clone(), customer);
      }
    }
    Ok(found)
  }

  async fn prepare(
    &self,
    orders: Vec<Order>,
    source: AddressSource,
  ) -> StoreResult<(Vec<(Order, ShippingAddress)>, HashMap<ProductId, ProductSummary>)> {
    let customers = self.customers(&orders).await?;
    let mut product_ids: Vec<ProductId> = orders
      .iter()
      .flat_map(|o| o.items.iter().map(|i| i.product_id.clone()))
      .collect();
    product_ids.sort_by(|a, b| a.0.cmp(&b.0));
    product_ids.dedup();
    let products = self.catalog.products(&product_ids).await?;
    if products.len() < product_ids.len() {
      warn!(
        "{} product(s) referenced by exported orders are missing from the catalog.",
        product_ids.len() - products.len()
      );
    }

    let entries = orders
      .into_iter()
      .map(|order| {
        let customer = order.user_id.as_ref().and_then(|id| customers.get(id));
        let addr = resolve_address(&order, customer, source);
        (order, addr)
      })
      .collect();
    Ok((entries, products))
  }

  /// One row per order.
  pub async fn orders_csv(&self, orders: Vec<Order>, source: AddressSource, filename: String) -> StoreResult<CsvDocument> {
    let row_count = orders.len();
    let (entries, products) = self.prepare(orders, source).await?;
    let mut csv = CsvBuilder::with_bom();
    rows::write_order_rows(&mut csv, &entries, &products);
    Ok(CsvDocument {
      filename,
      content: csv.finish(),
      row_count,
    })
  }

  /// One row per line item.
  pub async fn line_items_csv(&self, orders: Vec<Order>, filename: String) -> StoreResult<CsvDocument> {
    let (entries, products) = self.prepare(orders, AddressSource::Snapshot).await?;
    let mut csv = CsvBuilder::with_bom();
    rows::write_line_item_rows(&mut csv, &entries, &products);
    let row_count = csv.rows().saturating_sub(1);
    Ok(CsvDocument {
      filename,
      content: csv.finish(),
      row_count,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OrderId, OrderStatus};

  fn order_with(addr: ShippingAddress, user: Option<&str>) -> Order {
    let now = Utc::now();
    Order {
      id: OrderId::new("o1"),
      order_number: "ORD-1".into(),
      status: OrderStatus::Pending,
      total_amount: 1000,
      shipping_address: addr,
      user_id: user.map(UserId::new),
      items: vec![],
      stripe_payment_intent_id: None,
      notification_sent: false,
      shipped_at: None,
      admin_notes: None,
      is_deleted: false,
      deleted_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn current_profile_wins_over_snapshot() {
    let snapshot = ShippingAddress {
      name: "旧姓".into(),
      city: "大阪市".into(),
      ..ShippingAddress::default()
    };
    let order = order_with(snapshot, Some("u1"));
    let customer = Customer {
      id: UserId::new("u1"),
      name: Some("新姓".into()),
      ..Default::default()
    };
    let addr = resolve_address(&order, Some(&customer), AddressSource::CurrentProfile);
    assert_eq!(addr.name, "新姓");
    assert_eq!(addr.city, "大阪市");

    let addr = resolve_address(&order, Some(&customer), AddressSource::Snapshot);
    assert_eq!(addr.name, "旧姓");
  }

  #[test]
  fn orphaned_orders_use_their_snapshot() {
    let order = order_with(ShippingAddress::unknown(), None);
    let addr = resolve_address(&order, None, AddressSource::CurrentProfile);
    assert_eq!(addr, ShippingAddress::unknown());
  }

  #[test]
  fn download_payload_is_base64_of_the_content() {
    let doc = CsvDocument {
      filename: "orders-export-2024-01-01.csv".into(),
      content: "a,b\r\n".into(),
      row_count: 0,
    };
    let export = doc.to_download();
    assert_eq!(export.content_base64, "YSxiDQo=");
    assert_eq!(STANDARD.decode(export.content_base64).unwrap(), b"a,b\r\n");
  }

  #[test]
  fn dated_filename_has_iso_date() {
    let name = dated_filename("orders-export");
    assert!(name.starts_with("orders-export-"));
    assert!(name.ends_with(".csv"));
    assert_eq!(name.len(), "orders-export-".len() + 10 + 4);
  }
}
