// apps/order_admin/src/db/orders.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use order_lifecycle::{
  NewOrder, Order, OrderFilter, OrderId, OrderItem, OrderStatus, OrderStore, ProductId, ShippingAddress, StoreError,
  StoreResult, UserId,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::store_error;

const ORDER_COLUMNS: &str = "id, order_number, status, total_amount, shipping_address, user_id, \
  stripe_payment_intent_id, notification_sent, shipped_at, admin_notes, is_deleted, deleted_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
  id: String,
  order_number: String,
  status: String,
  total_amount: i64,
  shipping_address: Json<ShippingAddress>,
  user_id: Option<String>,
  stripe_payment_intent_id: Option<String>,
  notification_sent: bool,
  shipped_at: Option<DateTime<Utc>>,
  admin_notes: Option<String>,
  is_deleted: bool,
  deleted_at: Option<DateTime<Utc>>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
    let status: OrderStatus = self
      .status
      .parse()
      .map_err(|e| StoreError::Backend(format!("order {} has an unreadable status: {}", self.id, e)))?;
    Ok(Order {
      id: OrderId::new(self.id),
      order_number: self.order_number,
      status,
      total_amount: self.total_amount,
      shipping_address: self.shipping_address.0,
      user_id: self.user_id.map(UserId::new),
      items,
      stripe_payment_intent_id: self.stripe_payment_intent_id,
      notification_sent: self.notification_sent,
      shipped_at: self.shipped_at,
      admin_notes: self.admin_notes,
      is_deleted: self.is_deleted,
      deleted_at: self.deleted_at,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct ItemRow {
  order_id: String,
  product_id: String,
  quantity: i32,
  unit_price: i64,
}

/// `OrderStore` backed by the `orders` and `order_items` tables.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn load_items(&self, order_ids: &[String]) -> StoreResult<HashMap<String, Vec<OrderItem>>> {
    if order_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let rows: Vec<ItemRow> = sqlx::query_as(
      "SELECT order_id, product_id, quantity, unit_price FROM order_items \
       WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;

    let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      items.entry(row.order_id).or_default().push(OrderItem {
        product_id: ProductId(row.product_id),
        quantity: row.quantity,
        unit_price: row.unit_price,
      });
    }
    Ok(items)
  }

  /// Attaches line items to a set of order rows, keeping their order.
  async fn hydrate(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut items = self.load_items(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let own = items.remove(&row.id).unwrap_or_default();
        row.into_order(own)
      })
      .collect()
  }

  async fn hydrate_one(&self, row: Option<OrderRow>, id: &OrderId) -> StoreResult<Order> {
    let row = row.ok_or_else(|| StoreError::NotFound(id.clone()))?;
    let mut orders = self.hydrate(vec![row]).await?;
    orders.pop().ok_or_else(|| StoreError::NotFound(id.clone()))
  }

  async fn insert_items(tx: &mut Transaction<'_, Postgres>, order_id: &str, items: &[OrderItem]) -> StoreResult<()> {
    for (position, item) in items.iter().enumerate() {
      sqlx::query(
        "INSERT INTO order_items (order_id, position, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(order_id)
      .bind(position as i32)
      .bind(&item.product_id.0)
      .bind(item.quantity)
      .bind(item.unit_price)
      .execute(&mut **tx)
      .await
      .map_err(store_error)?;
    }
    Ok(())
  }

  /// Inserts the order row. With `on_payment_conflict` a row for an already
  /// known payment id is left alone and `None` is returned.
  async fn insert_row(&self, order: NewOrder, on_payment_conflict: bool) -> StoreResult<Option<Order>> {
    let stored = order.into_order(OrderId::generate(), Utc::now());
    let mut tx = self.pool.begin().await.map_err(store_error)?;

    let conflict_clause = if on_payment_conflict {
      " ON CONFLICT (stripe_payment_intent_id) DO NOTHING"
    } else {
      ""
    };
    let inserted: Option<String> = sqlx::query_scalar(&format!(
      "INSERT INTO orders (id, order_number, status, total_amount, shipping_address, user_id, \
       stripe_payment_intent_id, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9){} RETURNING id",
      conflict_clause
    ))
    .bind(stored.id.as_str())
    .bind(&stored.order_number)
    .bind(stored.status.as_str())
    .bind(stored.total_amount)
    .bind(Json(&stored.shipping_address))
    .bind(stored.user_id.as_ref().map(|u| u.as_str()))
    .bind(stored.stripe_payment_intent_id.as_deref())
    .bind(stored.created_at)
    .bind(stored.updated_at)
    .fetch_optional(&mut *tx)
    .await
    .map_err(store_error)?;

    if inserted.is_none() {
      tx.rollback().await.map_err(store_error)?;
      return Ok(None);
    }
    Self::insert_items(&mut tx, stored.id.as_str(), &stored.items).await?;
    tx.commit().await.map_err(store_error)?;
    Ok(Some(stored))
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  async fn get(&self, id: &OrderId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn get_many(&self, ids: &[OrderId]) -> StoreResult<Vec<Order>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let raw: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
    let rows: Vec<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = ANY($1)", ORDER_COLUMNS))
      .bind(&raw)
      .fetch_all(&self.pool)
      .await
      .map_err(store_error)?;
    let mut by_id: HashMap<String, Order> = self
      .hydrate(rows)
      .await?
      .into_iter()
      .map(|o| (o.id.0.clone(), o))
      .collect();
    Ok(raw.iter().filter_map(|id| by_id.remove(id)).collect())
  }

  async fn find_by_payment_id(&self, payment_id: &str) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE stripe_payment_intent_id = $1",
      ORDER_COLUMNS
    ))
    .bind(payment_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn find_by_order_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE order_number = $1", ORDER_COLUMNS))
      .bind(order_number)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  #[instrument(name = "db::list_orders", skip(self), err(Display))]
  async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));
    if !filter.include_deleted {
      query.push(" AND is_deleted = FALSE");
    }
    if let Some(status) = filter.status {
      query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(range) = filter.created {
      query
        .push(" AND created_at >= ")
        .push_bind(range.start_instant())
        .push(" AND created_at <= ")
        .push_bind(range.end_instant());
    }
    query.push(" ORDER BY created_at DESC, id ASC");

    let rows: Vec<OrderRow> = query
      .build_query_as::<OrderRow>()
      .fetch_all(&self.pool)
      .await
      .map_err(store_error)?;
    debug!("Listed {} orders.", rows.len());
    self.hydrate(rows).await
  }

  async fn insert(&self, order: NewOrder) -> StoreResult<Order> {
    self
      .insert_row(order, false)
      .await?
      .ok_or_else(|| StoreError::Backend("insert returned no row".to_string()))
  }

  async fn insert_for_payment(&self, order: NewOrder) -> StoreResult<(Order, bool)> {
    let payment_id = order
      .stripe_payment_intent_id
      .clone()
      .ok_or_else(|| StoreError::Conflict("payment-keyed insert without a payment id".to_string()))?;
    match self.insert_row(order, true).await? {
      Some(created) => Ok((created, true)),
      None => {
        let existing = self
          .find_by_payment_id(&payment_id)
          .await?
          .ok_or_else(|| StoreError::Backend(format!("payment {} conflicted but no order holds it", payment_id)))?;
        Ok((existing, false))
      }
    }
  }

  async fn update_status(
    &self,
    id: &OrderId,
    status: OrderStatus,
    shipped_at: Option<DateTime<Utc>>,
  ) -> StoreResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $2, shipped_at = COALESCE($3, shipped_at), updated_at = NOW() \
       WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id.as_str())
    .bind(status.as_str())
    .bind(shipped_at)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    self.hydrate_one(row, id).await
  }

  async fn mark_notified(&self, id: &OrderId) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE orders SET notification_sent = TRUE, updated_at = NOW() WHERE id = $1 AND notification_sent = FALSE",
    )
    .bind(id.as_str())
    .execute(&self.pool)
    .await
    .map_err(store_error)?;
    if result.rows_affected() == 1 {
      return Ok(true);
    }
    let exists: Option<bool> = sqlx::query_scalar("SELECT notification_sent FROM orders WHERE id = $1")
      .bind(id.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    match exists {
      Some(_) => Ok(false),
      None => Err(StoreError::NotFound(id.clone())),
    }
  }

  async fn soft_delete(&self, id: &OrderId, at: DateTime<Utc>) -> StoreResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET is_deleted = TRUE, deleted_at = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id.as_str())
    .bind(at)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    self.hydrate_one(row, id).await
  }

  async fn set_admin_notes(&self, id: &OrderId, notes: Option<String>) -> StoreResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET admin_notes = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id.as_str())
    .bind(notes)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    self.hydrate_one(row, id).await
  }
}
