// tests/csv_export_tests.rs
mod common;

use common::*;
use order_lifecycle::export::{AddressSource, LINE_ITEM_EXPORT_HEADERS, ORDER_EXPORT_HEADERS};
use order_lifecycle::{OrderItem, ProductId};

fn parse(content: &str) -> Vec<Vec<String>> {
  let body = content.strip_prefix('\u{feff}').expect("BOM missing");
  csv::ReaderBuilder::new()
    .has_headers(false)
    .from_reader(body.as_bytes())
    .records()
    .map(|r| r.unwrap().iter().map(str::to_string).collect())
    .collect()
}

#[tokio::test]
async fn test_awkward_address_survives_a_spreadsheet_round_trip() {
  let fx = Fixture::new();
  let mut order = pending_order("a", None);
  order.shipping_address.address = "Tokyo, \"Building\" \n2F".to_string();
  order.shipping_address.name = "山田 花子".to_string();

  let doc = fx
    .exporter
    .orders_csv(vec![order], AddressSource::Snapshot, "t.csv".to_string())
    .await
    .unwrap();

  let rows = parse(&doc.content);
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0], ORDER_EXPORT_HEADERS.map(str::to_string).to_vec());
  assert_eq!(rows[1][2], "山田 花子");
  assert_eq!(rows[1][8], "Tokyo, \"Building\" \n2F");
  assert!(doc.content.ends_with("\r\n"));
}

#[tokio::test]
async fn test_order_row_collapses_items_and_formats_in_japan_time() {
  let fx = Fixture::new();
  fx.directory.add_product(product("p-rose", "Rose Eau de Parfum", 8800));
  let mut order = pending_order("a", None);
  order.created_at = at(2024, 4, 1, 15);
  order.items.push(OrderItem {
    product_id: ProductId("p-retired".to_string()),
    quantity: 2,
    unit_price: 3000,
  });

  let doc = fx
    .exporter
    .orders_csv(vec![order], AddressSource::Snapshot, "t.csv".to_string())
    .await
    .unwrap();

  let row = &parse(&doc.content)[1];
  assert_eq!(row[0], "ORD-A");
  assert_eq!(row[1], "2024/04/02 00:00");
  assert_eq!(row[9], "8800");
  assert_eq!(row[10], "未発送");
  assert_eq!(row[11], "Rose Eau de Parfum × 1\np-retired × 2");
}

#[tokio::test]
async fn test_snapshot_export_keeps_the_address_captured_at_order_time() {
  let fx = Fixture::new();
  fx.directory.add_user(customer("u1", "田中", "tanaka@example.com"));
  let order = pending_order("a", Some("u1"));

  let exporter = &fx.exporter;
  let snapshot = exporter
    .orders_csv(vec![order.clone()], AddressSource::Snapshot, "t.csv".to_string())
    .await
    .unwrap();
  let current = exporter
    .orders_csv(vec![order], AddressSource::CurrentProfile, "t.csv".to_string())
    .await
    .unwrap();

  assert_eq!(parse(&snapshot.content)[1][6], "東京都");
  assert_eq!(parse(&current.content)[1][6], "大阪府");
}

#[tokio::test]
async fn test_line_item_export_writes_one_row_per_item() {
  let fx = Fixture::new();
  fx.directory.add_product(product("p-rose", "Rose Eau de Parfum", 8800));
  let mut order = pending_order("a", None);
  order.items.push(OrderItem {
    product_id: ProductId("p-oud".to_string()),
    quantity: 3,
    unit_price: 1200,
  });
  let empty = {
    let mut o = pending_order("b", None);
    o.items.clear();
    o
  };

  let doc = fx
    .exporter
    .line_items_csv(vec![order, empty], "items.csv".to_string())
    .await
    .unwrap();

  let rows = parse(&doc.content);
  assert_eq!(doc.row_count, 2);
  assert_eq!(rows[0], LINE_ITEM_EXPORT_HEADERS.map(str::to_string).to_vec());
  assert_eq!(rows[1][4], "Rose Eau de Parfum");
  assert_eq!(rows[2][3], "p-oud");
  assert_eq!(rows[2][4], "p-oud");
  assert_eq!(rows[2][7], "3600");
}
