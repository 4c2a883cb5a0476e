// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use order_lifecycle::mock::{MockDirectory, RecordingMailer, StaticPaymentGateway};
use order_lifecycle::{
  BulkActionCoordinator, Customer, MailSettings, NotificationDispatcher, NotificationSettings, Order, OrderExporter,
  OrderId, OrderItem, OrderStatus, PaymentRecord, ProductId, ProductSummary, ReconciliationJob, ShippingAddress,
  UserId, InMemoryOrderStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn mail_settings() -> MailSettings {
  MailSettings {
    api_url: "https://mail.test/v3/smtp/email".to_string(),
    api_key: "test-key".to_string(),
    sender_email: "shop@example.com".to_string(),
    sender_name: "Fragrance Store".to_string(),
  }
}

pub fn notification_settings() -> NotificationSettings {
  NotificationSettings {
    shop_name: "Fragrance Store".to_string(),
    storefront_base_url: "https://shop.example.com".to_string(),
  }
}

/// Every collaborator in memory, plus the services wired on top of them.
pub struct Fixture {
  pub store: InMemoryOrderStore,
  pub directory: MockDirectory,
  pub gateway: StaticPaymentGateway,
  pub mailer: RecordingMailer,
  pub exporter: OrderExporter,
  pub dispatcher: Arc<NotificationDispatcher>,
  pub reconciliation: Arc<ReconciliationJob>,
  pub coordinator: BulkActionCoordinator,
}

impl Fixture {
  pub fn new() -> Self {
    Self::build(RecordingMailer::new(), true)
  }

  pub fn with_mailer(mailer: RecordingMailer) -> Self {
    Self::build(mailer, true)
  }

  /// Coordinator without any mail transport.
  pub fn without_mail() -> Self {
    Self::build(RecordingMailer::new(), false)
  }

  fn build(mailer: RecordingMailer, with_notifier: bool) -> Self {
    setup_tracing();
    let store = InMemoryOrderStore::new();
    let directory = MockDirectory::new();
    let gateway = StaticPaymentGateway::default();

    let dispatcher = Arc::new(
      NotificationDispatcher::new(
        Arc::new(store.clone()),
        Arc::new(directory.clone()),
        Arc::new(directory.clone()),
        Arc::new(mailer.clone()),
        &mail_settings(),
        notification_settings(),
      )
      .unwrap(),
    );
    let exporter = OrderExporter::new(Arc::new(directory.clone()), Arc::new(directory.clone()));
    let reconciliation = Arc::new(ReconciliationJob::new(
      Arc::new(store.clone()),
      Arc::new(directory.clone()),
      Arc::new(gateway.clone()),
      exporter.clone(),
    ));
    let coordinator = BulkActionCoordinator::new(
      Arc::new(store.clone()),
      with_notifier.then(|| Arc::clone(&dispatcher)),
      exporter.clone(),
      Arc::clone(&reconciliation),
    );

    Fixture {
      store,
      directory,
      gateway,
      mailer,
      exporter,
      dispatcher,
      reconciliation,
      coordinator,
    }
  }

  pub fn order(&self, id: &str) -> Order {
    self.store.snapshot(&OrderId::new(id)).unwrap()
  }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn address(name: &str, email: &str) -> ShippingAddress {
  ShippingAddress {
    name: name.to_string(),
    postal_code: "150-0001".to_string(),
    prefecture: "東京都".to_string(),
    city: "渋谷区".to_string(),
    address: "神宮前1-2-3".to_string(),
    phone: "03-1234-5678".to_string(),
    email: email.to_string(),
  }
}

pub fn customer(id: &str, name: &str, email: &str) -> Customer {
  Customer {
    id: UserId::new(id),
    name: Some(name.to_string()),
    email: Some(email.to_string()),
    phone: Some("090-0000-0000".to_string()),
    postal_code: Some("530-0001".to_string()),
    prefecture: Some("大阪府".to_string()),
    city: Some("大阪市北区".to_string()),
    address: Some("梅田1-1-1".to_string()),
    stripe_customer_id: None,
  }
}

pub fn product(id: &str, name: &str, price: i64) -> ProductSummary {
  ProductSummary {
    id: ProductId(id.to_string()),
    name: name.to_string(),
    price,
  }
}

/// A pending order with one line item, created on 2024-04-01.
pub fn pending_order(id: &str, user: Option<&str>) -> Order {
  let created = at(2024, 4, 1, 3);
  Order {
    id: OrderId::new(id),
    order_number: format!("ORD-{}", id.to_uppercase()),
    status: OrderStatus::Pending,
    total_amount: 8800,
    shipping_address: address("配送 太郎", &format!("{}@ship.example.com", id)),
    user_id: user.map(UserId::new),
    items: vec![OrderItem {
      product_id: ProductId("p-rose".to_string()),
      quantity: 1,
      unit_price: 8800,
    }],
    stripe_payment_intent_id: Some(format!("pi_test_{}", id)),
    notification_sent: false,
    shipped_at: None,
    admin_notes: None,
    is_deleted: false,
    deleted_at: None,
    created_at: created,
    updated_at: created,
  }
}

pub fn payment(id: &str, amount_minor: i64, created: DateTime<Utc>, user_id: Option<&str>) -> PaymentRecord {
  let mut metadata = HashMap::new();
  if let Some(uid) = user_id {
    metadata.insert("userId".to_string(), uid.to_string());
  }
  PaymentRecord {
    id: id.to_string(),
    amount_minor,
    currency: "jpy".to_string(),
    created,
    customer: None,
    metadata,
  }
}
