// src/lib.rs

//! Order lifecycle core for the storefront back-office.
//!
//! Covers the part of the shop that has real state to protect:
//!  - The order status model and its Japanese labels.
//!  - The Status Transition Engine (`transition`), which stamps ship dates.
//!  - The Notification Dispatcher (`notify`), which emails each shipment once.
//!  - The Bulk Action Coordinator (`bulk`), which applies an action to many
//!    orders and reports per-item success and failure.
//!  - The Payment Reconciliation Job (`reconcile`), an idempotent upsert of
//!    local orders from the payment provider's ledger.
//!  - CSV exports (`export`).
//!
//! Storage, users, products, payments and mail are reached through the traits
//! in `store`, `directory`, `gateway` and `mail`; the admin application wires
//! in PostgreSQL and HTTP implementations, the tests wire in `store::memory`
//! and `mock`.

pub mod bulk;
pub mod directory;
pub mod error;
pub mod export;
pub mod gateway;
pub mod mail;
pub mod mock;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod store;
pub mod transition;

// --- Re-exports for the Public API ---

pub use crate::bulk::{
  BulkAction, BulkActionCoordinator, BulkActionPayload, BulkActionReport, BulkActionRequest, FailureCode,
  ItemFailure, ItemSuccess,
};
pub use crate::directory::{Authorizer, Catalog, UserDirectory};
pub use crate::error::{GatewayError, LifecycleError, LifecycleResult, MailError, StoreError, StoreResult};
pub use crate::export::{CsvDocument, CsvExport, OrderExporter};
pub use crate::gateway::PaymentGateway;
pub use crate::mail::{MailSettings, Mailer, OutgoingEmail, SentEmail};
pub use crate::model::{
  Customer, DateRange, NewOrder, Order, OrderId, OrderItem, OrderStatus, PaymentRecord, ProductId, ProductSummary,
  ShippingAddress, UserId,
};
pub use crate::notify::{NotificationDispatcher, NotificationOutcome, NotificationReport, NotificationSettings};
pub use crate::reconcile::{ReconciliationJob, ReconciliationRun, ReconciliationSummary};
pub use crate::store::{InMemoryOrderStore, OrderFilter, OrderStore};
pub use crate::transition::{StatusTransitionEngine, Transition};
