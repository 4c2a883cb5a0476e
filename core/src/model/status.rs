// core/src/model/status.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LifecycleError;

/// Admin-managed lifecycle status of an order.
///
/// The happy path is `Pending -> Processing -> Shipped -> Delivered`, but the
/// back-office may reassign any of the four values in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
  ];

  /// Wire / storage representation.
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
    }
  }

  /// Customer-facing label, used verbatim in exports and emails.
  pub fn label(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "未発送",
      OrderStatus::Processing => "発送準備中",
      OrderStatus::Shipped => "発送済み",
      OrderStatus::Delivered => "配達済み",
    }
  }

  /// Comma separated list of accepted values, for error messages.
  pub fn valid_values() -> String {
    Self::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = LifecycleError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == value)
      .ok_or_else(|| LifecycleError::InvalidStatus {
        value: value.to_string(),
        valid: Self::valid_values(),
      })
  }
}
