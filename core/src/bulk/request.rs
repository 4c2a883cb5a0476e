// core/src/bulk/request.rs
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use crate::error::{LifecycleError, LifecycleResult};
use crate::model::{DateRange, OrderId, OrderStatus};

/// Bulk action body as it arrives over the wire, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionPayload {
  pub action: String,
  #[serde(default)]
  pub order_ids: Vec<String>,
  #[serde(default)]
  pub data: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
  status: String,
  #[serde(default)]
  send_notification: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotifyData {
  #[serde(default)]
  send_notification: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RangeData {
  start: String,
  end: String,
  #[serde(default)]
  status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
  UpdateStatus { status: OrderStatus, send_notification: bool },
  Reship { send_notification: bool },
  SoftDelete,
  /// Export exactly the given orders from the local store.
  ExportCsv,
  /// Export whatever the payment provider reports for a date range.
  ExportRange { range: DateRange, status: Option<OrderStatus> },
}

impl BulkAction {
  pub fn name(&self) -> &'static str {
    match self {
      BulkAction::UpdateStatus { .. } => "update-status",
      BulkAction::Reship { .. } => "reship",
      BulkAction::SoftDelete => "soft-delete",
      BulkAction::ExportCsv => "export-csv",
      BulkAction::ExportRange { .. } => "export-range",
    }
  }

  fn takes_order_ids(&self) -> bool {
    !matches!(self, BulkAction::ExportRange { .. })
  }
}

/// A validated bulk request with a concretely typed payload per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkActionRequest {
  pub action: BulkAction,
  pub order_ids: Vec<OrderId>,
}

fn data_as<T: DeserializeOwned>(action: &str, data: Option<JsonValue>) -> LifecycleResult<T> {
  let data = data.ok_or_else(|| LifecycleError::Validation(format!("'{}' requires a data object", action)))?;
  serde_json::from_value(data).map_err(|e| LifecycleError::Validation(format!("Invalid data for '{}': {}", action, e)))
}

impl TryFrom<BulkActionPayload> for BulkActionRequest {
  type Error = LifecycleError;

  fn try_from(payload: BulkActionPayload) -> Result<Self, Self::Error> {
    let BulkActionPayload { action, order_ids, data } = payload;

    let action = match action.as_str() {
      "update-status" => {
        let data: StatusData = data_as(&action, data)?;
        BulkAction::UpdateStatus {
          status: data.status.parse()?,
          send_notification: data.send_notification,
        }
      }
      "reship" => {
        let data: NotifyData = match data {
          Some(d) => data_as(&action, Some(d))?,
          None => NotifyData::default(),
        };
        BulkAction::Reship {
          send_notification: data.send_notification,
        }
      }
      "soft-delete" => BulkAction::SoftDelete,
      "export-csv" => BulkAction::ExportCsv,
      "export-range" => {
        let data: RangeData = data_as(&action, data)?;
        let status = match data.status.as_deref().map(str::trim) {
          None | Some("") => None,
          Some(raw) => Some(raw.parse()?),
        };
        BulkAction::ExportRange {
          range: DateRange::parse(&data.start, &data.end)?,
          status,
        }
      }
      _ => return Err(LifecycleError::UnknownAction(action)),
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(order_ids.len());
    for raw in order_ids {
      let id = raw.trim();
      if id.is_empty() {
        return Err(LifecycleError::Validation("orderIds must not contain empty ids".to_string()));
      }
      if seen.insert(id.to_string()) {
        ids.push(OrderId::new(id));
      }
    }
    if action.takes_order_ids() && ids.is_empty() {
      return Err(LifecycleError::Validation(format!(
        "'{}' requires at least one order id",
        action.name()
      )));
    }

    Ok(BulkActionRequest { action, order_ids: ids })
  }
}
