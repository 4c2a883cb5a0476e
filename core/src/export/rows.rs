// core/src/export/rows.rs
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::csv::CsvBuilder;
use crate::model::{jst, Order, ProductId, ProductSummary, ShippingAddress};

/// Column set of the per-order export. Kept stable for the spreadsheets fed from it.
pub const ORDER_EXPORT_HEADERS: [&str; 12] = [
  "注文番号",
  "注文日",
  "氏名",
  "メールアドレス",
  "電話番号",
  "郵便番号",
  "都道府県",
  "市区町村",
  "住所",
  "金額",
  "ステータス",
  "購入商品",
];

pub const LINE_ITEM_EXPORT_HEADERS: [&str; 10] = [
  "注文番号",
  "注文日",
  "ステータス",
  "商品ID",
  "商品名",
  "数量",
  "単価",
  "小計",
  "氏名",
  "メールアドレス",
];

pub(crate) fn format_order_date(at: DateTime<Utc>) -> String {
  at.with_timezone(&jst()).format("%Y/%m/%d %H:%M").to_string()
}

fn product_name<'a>(products: &'a HashMap<ProductId, ProductSummary>, id: &'a ProductId) -> &'a str {
  products.get(id).map(|p| p.name.as_str()).unwrap_or(id.0.as_str())
}

/// One row per order; every line item is collapsed into the last cell, one per line.
pub fn write_order_rows(
  csv: &mut CsvBuilder,
  entries: &[(Order, ShippingAddress)],
  products: &HashMap<ProductId, ProductSummary>,
) {
  csv.push_row(ORDER_EXPORT_HEADERS);
  for (order, addr) in entries {
    let items = order
      .items
      .iter()
      .map(|item| format!("{} × {}", product_name(products, &item.product_id), item.quantity))
      .collect::<Vec<_>>()
      .join("\n");
    csv.push_row([
      order.order_number.clone(),
      format_order_date(order.created_at),
      addr.name.clone(),
      addr.email.clone(),
      addr.phone.clone(),
      addr.postal_code.clone(),
      addr.prefecture.clone(),
      addr.city.clone(),
      addr.address.clone(),
      order.total_amount.to_string(),
      order.status.label().to_string(),
      items,
    ]);
  }
}

/// One row per line item, for the analytics export.
pub fn write_line_item_rows(
  csv: &mut CsvBuilder,
  entries: &[(Order, ShippingAddress)],
  products: &HashMap<ProductId, ProductSummary>,
) {
  csv.push_row(LINE_ITEM_EXPORT_HEADERS);
  for (order, addr) in entries {
    let ordered_on = format_order_date(order.created_at);
    for item in &order.items {
      csv.push_row([
        order.order_number.clone(),
        ordered_on.clone(),
        order.status.label().to_string(),
        item.product_id.0.clone(),
        product_name(products, &item.product_id).to_string(),
        item.quantity.to_string(),
        item.unit_price.to_string(),
        item.subtotal().to_string(),
        addr.name.clone(),
        addr.email.clone(),
      ]);
    }
  }
}
