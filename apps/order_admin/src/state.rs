// apps/order_admin/src/state.rs
use crate::config::AppConfig;
use order_lifecycle::{Authorizer, BulkActionCoordinator, OrderExporter, OrderStore, ReconciliationJob};
use std::sync::Arc;

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub authorizer: Arc<dyn Authorizer>,
  pub coordinator: Arc<BulkActionCoordinator>,
  pub reconciliation: Arc<ReconciliationJob>,
  pub exporter: OrderExporter,
  pub config: Arc<AppConfig>,
}
