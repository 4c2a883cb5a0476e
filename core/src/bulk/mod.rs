// core/src/bulk/mod.rs

//! Bulk Action Coordinator: applies one action to many orders with per-item
//! success and failure tracking.

mod report;
mod request;

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{LifecycleError, LifecycleResult};
use crate::export::{dated_filename, AddressSource, OrderExporter};
use crate::model::{Order, OrderId, OrderStatus};
use crate::notify::{NotificationDetail, NotificationDispatcher, NotificationReport};
use crate::reconcile::ReconciliationJob;
use crate::store::OrderStore;
use crate::transition::StatusTransitionEngine;
use report::ItemOutcomes;

pub use report::{BulkActionReport, FailureCode, ItemFailure, ItemSuccess};
pub use request::{BulkAction, BulkActionPayload, BulkActionRequest};

pub struct BulkActionCoordinator {
  store: Arc<dyn OrderStore>,
  transitions: StatusTransitionEngine,
  notifier: Option<Arc<NotificationDispatcher>>,
  exporter: OrderExporter,
  reconciliation: Arc<ReconciliationJob>,
}

fn with_failures(message: String, failed: usize) -> String {
  if failed == 0 {
    message
  } else {
    format!("{}（{}件失敗）", message, failed)
  }
}

impl BulkActionCoordinator {
  /// `notifier` is `None` when no mail transport is configured; requests that
  /// ask for customer emails are then refused up front.
  pub fn new(
    store: Arc<dyn OrderStore>,
    notifier: Option<Arc<NotificationDispatcher>>,
    exporter: OrderExporter,
    reconciliation: Arc<ReconciliationJob>,
  ) -> Self {
    let transitions = StatusTransitionEngine::new(Arc::clone(&store));
    Self {
      store,
      transitions,
      notifier,
      exporter,
      reconciliation,
    }
  }

  pub fn transitions(&self) -> &StatusTransitionEngine {
    &self.transitions
  }

  /// Validates a raw payload and executes it.
  pub async fn execute_payload(&self, payload: BulkActionPayload) -> LifecycleResult<BulkActionReport> {
    self.execute(BulkActionRequest::try_from(payload)?).await
  }

  #[instrument(name = "bulk::execute", skip(self, request), fields(action = request.action.name(), orders = request.order_ids.len()), err(Display))]
  pub async fn execute(&self, request: BulkActionRequest) -> LifecycleResult<BulkActionReport> {
    let BulkActionRequest { action, order_ids } = request;
    let report = match action {
      BulkAction::UpdateStatus {
        status,
        send_notification,
      } => self.update_status(&order_ids, status, send_notification).await?,
      BulkAction::Reship { send_notification } => self.reship(&order_ids, send_notification).await?,
      BulkAction::SoftDelete => self.soft_delete(&order_ids).await,
      BulkAction::ExportCsv => self.export_csv(&order_ids).await?,
      BulkAction::ExportRange { range, status } => {
        let (orders, doc) = self.reconciliation.export_orders(&range, status).await?;
        let mut outcomes = ItemOutcomes::default();
        for order in orders {
          outcomes.ok(order);
        }
        let mut report = outcomes.into_report(
          "export-range",
          doc.row_count,
          format!("{}件の決済をエクスポートしました", doc.row_count),
        );
        report.export = Some(doc.to_download());
        report
      }
    };
    info!(
      updated = report.updated_count,
      failed = report.failed_count,
      "Bulk action '{}' finished: {}",
      report.action,
      report.message
    );
    Ok(report)
  }

  /// Runs `op` on each id in turn. A failing item is recorded and the batch moves on.
  async fn for_each_order<F, Fut>(&self, ids: &[OrderId], code: FailureCode, op: F) -> ItemOutcomes
  where
    F: Fn(OrderId) -> Fut,
    Fut: Future<Output = LifecycleResult<Order>>,
  {
    let mut outcomes = ItemOutcomes::default();
    for id in ids {
      match op(id.clone()).await {
        Ok(order) => outcomes.ok(order),
        Err(e) => {
          warn!("Bulk item {} failed: {}", id, e);
          outcomes.fail(id.clone(), code, e);
        }
      }
    }
    outcomes
  }

  fn require_notifier(&self, wanted: bool) -> LifecycleResult<Option<&Arc<NotificationDispatcher>>> {
    match (wanted, &self.notifier) {
      (false, _) => Ok(None),
      (true, Some(n)) => Ok(Some(n)),
      (true, None) => Err(LifecycleError::Configuration(
        "Shipment notifications requested but no mail transport is configured".to_string(),
      )),
    }
  }

  /// Re-reads the orders that were just updated and emails those not yet notified.
  /// Email failures never undo the status change.
  async fn notify_updated(&self, notifier: &NotificationDispatcher, updated: &[Order]) -> NotificationReport {
    let ids: Vec<OrderId> = updated.iter().map(|o| o.id.clone()).collect();
    match self.store.get_many(&ids).await {
      Ok(current) => {
        let pending: Vec<Order> = current.into_iter().filter(|o| !o.notification_sent).collect();
        notifier.notify_all(&pending).await
      }
      Err(e) => {
        warn!("Could not reload updated orders for notification: {}", e);
        let mut report = NotificationReport::default();
        for order in updated {
          report.emails_failed += 1;
          report.details.push(NotificationDetail {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            email: None,
            success: false,
            error: Some(e.to_string()),
          });
        }
        report
      }
    }
  }

  async fn update_status(
    &self,
    ids: &[OrderId],
    status: OrderStatus,
    send_notification: bool,
  ) -> LifecycleResult<BulkActionReport> {
    let notifier = self.require_notifier(send_notification && status == OrderStatus::Shipped)?;

    let outcomes = self
      .for_each_order(ids, FailureCode::UpdateFailed, |id| async move {
        self.transitions.apply_status(&id, status).await.map(|t| t.order)
      })
      .await;

    let notification = match notifier {
      Some(n) => Some(self.notify_updated(n, &outcomes.orders).await),
      None => None,
    };

    let mut message = with_failures(
      format!("{}件の注文を「{}」に更新しました", outcomes.succeeded.len(), status.label()),
      outcomes.failed.len(),
    );
    if let Some(n) = &notification {
      message.push_str(&format!(
        "。発送通知メール: 送信{}件 / 失敗{}件",
        n.emails_sent, n.emails_failed
      ));
    }

    let mut report = outcomes.into_report("update-status", ids.len(), message);
    report.notification = notification;
    Ok(report)
  }

  async fn reship(&self, ids: &[OrderId], send_notification: bool) -> LifecycleResult<BulkActionReport> {
    let notifier = self.require_notifier(send_notification)?;

    let outcomes = self
      .for_each_order(ids, FailureCode::UpdateFailed, |id| async move {
        self.transitions.reship(&id).await.map(|t| t.order)
      })
      .await;

    let notification = match notifier {
      Some(n) => Some(self.notify_updated(n, &outcomes.orders).await),
      None => None,
    };
    let message = with_failures(
      format!("{}件の注文の発送日を更新しました", outcomes.succeeded.len()),
      outcomes.failed.len(),
    );
    let mut report = outcomes.into_report("reship", ids.len(), message);
    report.notification = notification;
    Ok(report)
  }

  async fn soft_delete(&self, ids: &[OrderId]) -> BulkActionReport {
    let now = Utc::now();
    let outcomes = self
      .for_each_order(ids, FailureCode::DeleteFailed, |id| async move {
        self.store.soft_delete(&id, now).await.map_err(LifecycleError::from)
      })
      .await;
    let message = with_failures(
      format!("{}件の注文を削除しました", outcomes.succeeded.len()),
      outcomes.failed.len(),
    );
    outcomes.into_report("soft-delete", ids.len(), message)
  }

  async fn export_csv(&self, ids: &[OrderId]) -> LifecycleResult<BulkActionReport> {
    let found = self.store.get_many(ids).await?;

    let mut outcomes = ItemOutcomes::default();
    for id in ids {
      match found.iter().find(|o| &o.id == id) {
        Some(order) => outcomes.ok(order.clone()),
        None => outcomes.fail(id.clone(), FailureCode::ExportFailed, LifecycleError::NotFound(id.clone())),
      }
    }

    let orders = std::mem::take(&mut outcomes.orders);
    let doc = self
      .exporter
      .orders_csv(orders, AddressSource::Snapshot, dated_filename("orders-export"))
      .await?;

    let message = with_failures(
      format!("{}件の注文をエクスポートしました", outcomes.succeeded.len()),
      outcomes.failed.len(),
    );
    let mut report = outcomes.into_report("export-csv", ids.len(), message);
    report.export = Some(doc.to_download());
    Ok(report)
  }
}
