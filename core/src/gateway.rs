// core/src/gateway.rs
use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{DateRange, PaymentRecord};

/// Read access to the payment provider's ledger.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// All succeeded payments created within `range`, every page included.
  ///
  /// Implementations must either return the complete set or an error; a
  /// partially fetched ledger is never returned.
  async fn list_succeeded(&self, range: &DateRange) -> Result<Vec<PaymentRecord>, GatewayError>;
}
