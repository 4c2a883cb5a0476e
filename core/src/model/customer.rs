// core/src/model/customer.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::order::ShippingAddress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self {
    UserId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Current profile of a storefront customer, as held by the user provider.
/// Every profile field is optional; customers fill them in over time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: UserId,
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub postal_code: Option<String>,
  pub prefecture: Option<String>,
  pub city: Option<String>,
  pub address: Option<String>,
  pub stripe_customer_id: Option<String>,
}

fn pick(current: &Option<String>, fallback: &str) -> String {
  match current.as_deref().map(str::trim) {
    Some(v) if !v.is_empty() => v.to_string(),
    _ => fallback.to_string(),
  }
}

impl Customer {
  /// Address built from the current profile, taking each missing field from `fallback`.
  pub fn address_over(&self, fallback: &ShippingAddress) -> ShippingAddress {
    ShippingAddress {
      name: pick(&self.name, &fallback.name),
      postal_code: pick(&self.postal_code, &fallback.postal_code),
      prefecture: pick(&self.prefecture, &fallback.prefecture),
      city: pick(&self.city, &fallback.city),
      address: pick(&self.address, &fallback.address),
      phone: pick(&self.phone, &fallback.phone),
      email: pick(&self.email, &fallback.email),
    }
  }
}
