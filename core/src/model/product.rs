// core/src/model/product.rs

use serde::{Deserialize, Serialize};

use super::order::ProductId;

/// Catalog view of a product, as needed for exports and shipment emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
  pub id: ProductId,
  pub name: String,
  pub price: i64,
}
