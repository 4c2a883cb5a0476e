// core/src/directory.rs

//! Read-only collaborators owned by the rest of the storefront: the user
//! provider, the role check and the product catalog.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::StoreResult;
use crate::model::{Customer, ProductId, ProductSummary, UserId};

#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn find_user(&self, id: &UserId) -> StoreResult<Option<Customer>>;

  /// Looks a customer up by the payment provider's customer reference.
  async fn find_by_stripe_customer(&self, customer_ref: &str) -> StoreResult<Option<Customer>>;
}

/// Capability check injected into every admin entry point.
#[async_trait]
pub trait Authorizer: Send + Sync {
  async fn is_admin(&self, user_id: &UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
  /// Returns the products that exist among `ids`, keyed by id. Unknown ids are omitted.
  async fn products(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, ProductSummary>>;
}
