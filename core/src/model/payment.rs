// core/src/model/payment.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LifecycleError;

/// A succeeded payment as reported by the external payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
  pub id: String,
  /// Provider minor units.
  pub amount_minor: i64,
  pub currency: String,
  pub created: DateTime<Utc>,
  pub customer: Option<String>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
}

impl PaymentRecord {
  pub const USER_ID_METADATA_KEY: &'static str = "userId";

  /// Order amount in whole yen. The provider reports one hundred minor units per yen.
  pub fn amount_major(&self) -> i64 {
    self.amount_minor / 100
  }

  pub fn metadata_user_id(&self) -> Option<&str> {
    self
      .metadata
      .get(Self::USER_ID_METADATA_KEY)
      .map(String::as_str)
      .filter(|v| !v.is_empty())
  }
}

/// Japan Standard Time. Calendar dates supplied by operators are read in this zone.
pub fn jst() -> FixedOffset {
  FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Inclusive calendar-date range; `end` covers the whole day through 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LifecycleError> {
    if end < start {
      return Err(LifecycleError::Validation(format!(
        "Date range end ({}) is before start ({}).",
        end, start
      )));
    }
    Ok(DateRange { start, end })
  }

  /// Parses two `YYYY-MM-DD` strings.
  pub fn parse(start: &str, end: &str) -> Result<Self, LifecycleError> {
    let parse = |label: &str, v: &str| {
      NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
        .map_err(|e| LifecycleError::Validation(format!("Invalid {} date '{}': {}", label, v, e)))
    };
    Self::new(parse("start", start)?, parse("end", end)?)
  }

  pub fn start_instant(&self) -> DateTime<Utc> {
    local_instant(self.start, NaiveTime::MIN)
  }

  pub fn end_instant(&self) -> DateTime<Utc> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_instant(self.end, end_of_day)
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    at >= self.start_instant() && at <= self.end_instant()
  }
}

fn local_instant(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
  let naive = date.and_time(time);
  match jst().from_local_datetime(&naive).single() {
    Some(local) => local.with_timezone(&Utc),
    None => Utc.from_utc_datetime(&naive),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn end_of_range_is_inclusive_through_the_last_second() {
    let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
    // 2024-03-31 23:59:59 JST
    let last = Utc.with_ymd_and_hms(2024, 3, 31, 14, 59, 59).unwrap();
    assert!(range.contains(last));
    assert!(!range.contains(last + chrono::Duration::seconds(1)));
    // 2024-03-01 00:00:00 JST
    let first = Utc.with_ymd_and_hms(2024, 2, 29, 15, 0, 0).unwrap();
    assert!(range.contains(first));
    assert!(!range.contains(first - chrono::Duration::seconds(1)));
  }

  #[test]
  fn rejects_inverted_and_malformed_ranges() {
    assert!(matches!(
      DateRange::parse("2024-03-02", "2024-03-01"),
      Err(LifecycleError::Validation(_))
    ));
    assert!(DateRange::parse("2024/03/01", "2024-03-02").is_err());
  }

  #[test]
  fn converts_minor_units_to_yen() {
    let record = PaymentRecord {
      id: "pay_ABC12345".into(),
      amount_minor: 500000,
      currency: "jpy".into(),
      created: Utc::now(),
      customer: None,
      metadata: HashMap::from([("userId".to_string(), "u1".to_string())]),
    };
    assert_eq!(record.amount_major(), 5000);
    assert_eq!(record.metadata_user_id(), Some("u1"));
  }
}
