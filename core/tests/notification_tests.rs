// tests/notification_tests.rs
mod common;

use common::*;
use order_lifecycle::mock::RecordingMailer;
use order_lifecycle::notify::SkipReason;
use order_lifecycle::{
  LifecycleError, MailSettings, NotificationDispatcher, NotificationOutcome, OrderStatus, StatusTransitionEngine,
};
use std::sync::Arc;
use std::time::Duration;

async fn ship(fx: &Fixture, id: &str) -> order_lifecycle::Order {
  StatusTransitionEngine::new(Arc::new(fx.store.clone()))
    .apply_status(&order_lifecycle::OrderId::new(id), OrderStatus::Shipped)
    .await
    .unwrap()
    .order
}

#[tokio::test]
async fn test_sends_to_linked_user_and_marks_notified() {
  let fx = Fixture::new();
  fx.directory.add_user(customer("u1", "田中", "tanaka@example.com"));
  fx.directory.add_product(product("p-rose", "Rose Eau de Parfum", 8800));
  fx.store.put(pending_order("o1", Some("u1")));
  let order = ship(&fx, "o1").await;

  let outcome = fx.dispatcher.notify_shipment(&order).await;

  assert_eq!(
    outcome,
    NotificationOutcome::Sent {
      email: "tanaka@example.com".to_string()
    }
  );
  assert!(fx.order("o1").notification_sent);
  let sent = fx.mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to_name, "田中");
  assert!(sent[0].text_body.contains("ORD-O1"));
  assert!(sent[0].text_body.contains("Rose Eau de Parfum × 1"));
  assert!(sent[0].text_body.contains("https://shop.example.com/account/orders/o1"));
}

#[tokio::test]
async fn test_second_dispatch_is_a_silent_no_op() {
  let fx = Fixture::new();
  fx.store.put(pending_order("o1", None));
  let order = ship(&fx, "o1").await;

  let first = fx.dispatcher.notify_shipment(&order).await;
  assert!(matches!(first, NotificationOutcome::Sent { .. }));

  // Stale copy still says false; the dispatcher re-reads the stored flag.
  let second = fx.dispatcher.notify_shipment(&order).await;
  assert_eq!(second, NotificationOutcome::Skipped(SkipReason::AlreadyNotified));

  let fresh = fx.order("o1");
  let third = fx.dispatcher.notify_shipment(&fresh).await;
  assert_eq!(third, NotificationOutcome::Skipped(SkipReason::AlreadyNotified));

  assert_eq!(fx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_guest_orders_fall_back_to_shipping_address() {
  let fx = Fixture::new();
  fx.store.put(pending_order("guest", None));
  let order = ship(&fx, "guest").await;

  let outcome = fx.dispatcher.notify_shipment(&order).await;

  assert_eq!(
    outcome,
    NotificationOutcome::Sent {
      email: "guest@ship.example.com".to_string()
    }
  );
  assert_eq!(fx.mailer.sent()[0].to_name, "配送 太郎");
}

#[tokio::test]
async fn test_deleted_user_falls_back_and_blank_name_uses_placeholder() {
  let fx = Fixture::new();
  let mut order = pending_order("o7", Some("u-deleted"));
  order.shipping_address.name = "  ".to_string();
  fx.store.put(order);
  let order = ship(&fx, "o7").await;

  fx.dispatcher.notify_shipment(&order).await;

  let sent = fx.mailer.sent();
  assert_eq!(sent[0].to, "o7@ship.example.com");
  assert_eq!(sent[0].to_name, "お客様");
}

#[tokio::test]
async fn test_transport_failure_is_recorded_and_not_marked() {
  let mailer = RecordingMailer::new();
  mailer.fail_for("o1@ship.example.com");
  let fx = Fixture::with_mailer(mailer);
  fx.store.put(pending_order("o1", None));
  let order = ship(&fx, "o1").await;

  match fx.dispatcher.notify_shipment(&order).await {
    NotificationOutcome::Failed { email, error } => {
      assert_eq!(email.as_deref(), Some("o1@ship.example.com"));
      assert!(error.contains("connection reset"));
    }
    other => panic!("Expected Failed, got {:?}", other),
  }
  assert!(!fx.order("o1").notification_sent);
}

#[tokio::test]
async fn test_order_without_any_email_fails_without_sending() {
  let fx = Fixture::new();
  let mut order = pending_order("o8", None);
  order.shipping_address.email = "Unknown".to_string();
  fx.store.put(order);
  let order = ship(&fx, "o8").await;

  let outcome = fx.dispatcher.notify_shipment(&order).await;

  assert!(matches!(outcome, NotificationOutcome::Failed { email: None, .. }));
  assert!(fx.mailer.sent().is_empty());
  assert!(!fx.order("o8").notification_sent);
}

#[tokio::test]
async fn test_concurrent_dispatch_sends_a_single_email() {
  let fx = Fixture::with_mailer(RecordingMailer::with_delay(Duration::from_millis(50)));
  fx.store.put(pending_order("race", None));
  let order = ship(&fx, "race").await;

  let (a, b) = tokio::join!(
    fx.dispatcher.notify_shipment(&order),
    fx.dispatcher.notify_shipment(&order)
  );

  let sent = [&a, &b]
    .iter()
    .filter(|o| matches!(o, NotificationOutcome::Sent { .. }))
    .count();
  assert_eq!(sent, 1, "outcomes: {:?} / {:?}", a, b);
  assert_eq!(fx.mailer.sent_to("race@ship.example.com"), 1);
  assert!(fx.order("race").notification_sent);
}

#[tokio::test]
async fn test_dispatcher_refuses_incomplete_mail_settings() {
  let fx = Fixture::new();
  let settings = MailSettings {
    api_key: String::new(),
    ..mail_settings()
  };
  let result = NotificationDispatcher::new(
    Arc::new(fx.store.clone()),
    Arc::new(fx.directory.clone()),
    Arc::new(fx.directory.clone()),
    Arc::new(fx.mailer.clone()),
    &settings,
    notification_settings(),
  );
  assert!(matches!(result, Err(LifecycleError::Configuration(_))));
}
