// core/src/bulk/report.rs
use serde::Serialize;

use crate::export::CsvExport;
use crate::model::{Order, OrderId, OrderStatus};
use crate::notify::NotificationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
  UpdateFailed,
  DeleteFailed,
  ExportFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSuccess {
  pub id: OrderId,
  pub order_number: String,
  pub status: OrderStatus,
}

impl From<&Order> for ItemSuccess {
  fn from(order: &Order) -> Self {
    ItemSuccess {
      id: order.id.clone(),
      order_number: order.order_number.clone(),
      status: order.status,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
  pub id: OrderId,
  pub code: FailureCode,
  pub error: String,
}

/// Outcome of one bulk request. A batch with some failures is still a report,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionReport {
  pub action: String,
  pub total_requested: usize,
  pub updated_count: usize,
  pub failed_count: usize,
  pub succeeded: Vec<ItemSuccess>,
  pub failed: Vec<ItemFailure>,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notification: Option<NotificationReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub export: Option<CsvExport>,
}

/// Per-item results gathered while a batch runs.
#[derive(Debug, Default)]
pub(crate) struct ItemOutcomes {
  pub succeeded: Vec<ItemSuccess>,
  pub failed: Vec<ItemFailure>,
  /// Orders as stored after their successful write.
  pub orders: Vec<Order>,
}

impl ItemOutcomes {
  pub fn ok(&mut self, order: Order) {
    self.succeeded.push(ItemSuccess::from(&order));
    self.orders.push(order);
  }

  pub fn fail(&mut self, id: OrderId, code: FailureCode, error: impl ToString) {
    self.failed.push(ItemFailure {
      id,
      code,
      error: error.to_string(),
    });
  }

  pub fn into_report(self, action: &str, total_requested: usize, message: String) -> BulkActionReport {
    BulkActionReport {
      action: action.to_string(),
      total_requested,
      updated_count: self.succeeded.len(),
      failed_count: self.failed.len(),
      succeeded: self.succeeded,
      failed: self.failed,
      message,
      notification: None,
      export: None,
    }
  }
}
