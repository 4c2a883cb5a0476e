// apps/order_admin/src/db/directory.rs
use async_trait::async_trait;
use order_lifecycle::{Authorizer, Catalog, Customer, ProductId, ProductSummary, StoreResult, UserDirectory, UserId};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use super::store_error;

#[derive(Debug, FromRow)]
struct UserRow {
  id: String,
  name: Option<String>,
  email: Option<String>,
  phone: Option<String>,
  postal_code: Option<String>,
  prefecture: Option<String>,
  city: Option<String>,
  address: Option<String>,
  stripe_customer_id: Option<String>,
}

impl From<UserRow> for Customer {
  fn from(row: UserRow) -> Self {
    Customer {
      id: UserId::new(row.id),
      name: row.name,
      email: row.email,
      phone: row.phone,
      postal_code: row.postal_code,
      prefecture: row.prefecture,
      city: row.city,
      address: row.address,
      stripe_customer_id: row.stripe_customer_id,
    }
  }
}

#[derive(Debug, FromRow)]
struct ProductRow {
  id: String,
  name: String,
  price: i64,
}

const USER_COLUMNS: &str = "id, name, email, phone, postal_code, prefecture, city, address, stripe_customer_id";

/// Users, roles and products read from the storefront database.
#[derive(Debug, Clone)]
pub struct PgDirectory {
  pool: PgPool,
}

impl PgDirectory {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl UserDirectory for PgDirectory {
  async fn find_user(&self, id: &UserId) -> StoreResult<Option<Customer>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(row.map(Customer::from))
  }

  async fn find_by_stripe_customer(&self, customer_ref: &str) -> StoreResult<Option<Customer>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
      "SELECT {} FROM users WHERE stripe_customer_id = $1",
      USER_COLUMNS
    ))
    .bind(customer_ref)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(row.map(Customer::from))
  }
}

#[async_trait]
impl Authorizer for PgDirectory {
  async fn is_admin(&self, user_id: &UserId) -> StoreResult<bool> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
      .bind(user_id.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(role.as_deref() == Some("ADMIN"))
  }
}

#[async_trait]
impl Catalog for PgDirectory {
  async fn products(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, ProductSummary>> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }
    let raw: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
    let rows: Vec<ProductRow> = sqlx::query_as("SELECT id, name, price FROM products WHERE id = ANY($1)")
      .bind(&raw)
      .fetch_all(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(
      rows
        .into_iter()
        .map(|row| {
          let id = ProductId(row.id);
          (
            id.clone(),
            ProductSummary {
              id,
              name: row.name,
              price: row.price,
            },
          )
        })
        .collect(),
    )
  }
}
