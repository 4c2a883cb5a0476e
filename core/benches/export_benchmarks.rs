use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use order_lifecycle::export::{escape_field, AddressSource, CsvBuilder};
use order_lifecycle::mock::{MockDirectory, RecordingMailer, StaticPaymentGateway};
use order_lifecycle::{
  BulkAction, BulkActionCoordinator, BulkActionRequest, InMemoryOrderStore, MailSettings, NotificationDispatcher,
  NotificationSettings, Order, OrderExporter, OrderId, OrderItem, OrderStatus, ProductId, ProductSummary,
  ReconciliationJob, ShippingAddress,
};
use std::sync::Arc;
use tokio::runtime::Runtime; // To run async code within Criterion

// --- Fixture data ---
fn sample_order(i: usize, items: usize) -> Order {
  let created = Utc.with_ymd_and_hms(2024, 4, 1, 3, 0, 0).unwrap();
  Order {
    id: OrderId::new(format!("order-{}", i)),
    order_number: format!("ORD-{:08}", i),
    status: OrderStatus::Pending,
    total_amount: 8800 * items as i64,
    shipping_address: ShippingAddress {
      name: format!("顧客 {}", i),
      postal_code: "150-0001".into(),
      prefecture: "東京都".into(),
      city: "渋谷区".into(),
      address: "神宮前1-2-3, \"Annex\"\n2F".into(),
      phone: "03-1234-5678".into(),
      email: format!("customer{}@example.com", i),
    },
    user_id: None,
    items: (0..items)
      .map(|n| OrderItem {
        product_id: ProductId(format!("p-{}", n)),
        quantity: 1 + n as i32,
        unit_price: 8800,
      })
      .collect(),
    stripe_payment_intent_id: Some(format!("pi_bench_{}", i)),
    notification_sent: false,
    shipped_at: None,
    admin_notes: None,
    is_deleted: false,
    deleted_at: None,
    created_at: created,
    updated_at: created,
  }
}

fn directory_with_products(count: usize) -> MockDirectory {
  let directory = MockDirectory::new();
  for n in 0..count {
    directory.add_product(ProductSummary {
      id: ProductId(format!("p-{}", n)),
      name: format!("Eau de Parfum No.{}", n),
      price: 8800,
    });
  }
  directory
}

// --- Benchmark Functions ---

fn bench_escape_field(c: &mut Criterion) {
  let mut group = c.benchmark_group("EscapeField");
  for (name, value) in [
    ("plain", "神宮前1-2-3"),
    ("quoted", "Tokyo, \"Building\" \n2F"),
  ] {
    group.bench_with_input(BenchmarkId::from_parameter(name), &value, |b, v| {
      b.iter(|| escape_field(v).len())
    });
  }
  group.finish();
}

fn bench_csv_builder(c: &mut Criterion) {
  let mut group = c.benchmark_group("CsvBuilder");
  for rows in [100usize, 1_000].iter() {
    group.throughput(Throughput::Elements(*rows as u64));
    group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, &rows| {
      b.iter(|| {
        let mut csv = CsvBuilder::with_bom();
        for i in 0..rows {
          csv.push_row([format!("ORD-{:08}", i), "Tokyo, \"Building\"".to_string(), "8800".to_string()]);
        }
        csv.finish().len()
      })
    });
  }
  group.finish();
}

fn bench_orders_csv(c: &mut Criterion) {
  let mut group = c.benchmark_group("OrdersCsv");
  let rt = Runtime::new().unwrap();
  let directory = directory_with_products(5);
  let exporter = OrderExporter::new(Arc::new(directory.clone()), Arc::new(directory));

  for num_orders in [10usize, 100, 1_000].iter() {
    let orders: Vec<Order> = (0..*num_orders).map(|i| sample_order(i, 3)).collect();
    group.throughput(Throughput::Elements(*num_orders as u64));
    group.bench_with_input(BenchmarkId::new("per_order", num_orders), &orders, |b, orders| {
      b.to_async(&rt).iter(|| {
        let (exporter, orders) = (exporter.clone(), orders.clone());
        async move {
          exporter
            .orders_csv(orders, AddressSource::Snapshot, "bench.csv".to_string())
            .await
            .unwrap()
        }
      })
    });
    group.bench_with_input(BenchmarkId::new("per_line_item", num_orders), &orders, |b, orders| {
      b.to_async(&rt).iter(|| {
        let (exporter, orders) = (exporter.clone(), orders.clone());
        async move { exporter.line_items_csv(orders, "bench.csv".to_string()).await.unwrap() }
      })
    });
  }
  group.finish();
}

fn bench_bulk_update_status(c: &mut Criterion) {
  let mut group = c.benchmark_group("BulkUpdateStatus");
  let rt = Runtime::new().unwrap();

  for num_orders in [10usize, 100].iter() {
    group.throughput(Throughput::Elements(*num_orders as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_orders), num_orders, |b, &num_orders| {
      b.to_async(&rt).iter_batched(
        || {
          let store = InMemoryOrderStore::new();
          for i in 0..num_orders {
            store.put(sample_order(i, 1));
          }
          let directory = directory_with_products(1);
          let exporter = OrderExporter::new(Arc::new(directory.clone()), Arc::new(directory.clone()));
          let dispatcher = NotificationDispatcher::new(
            Arc::new(store.clone()),
            Arc::new(directory.clone()),
            Arc::new(directory.clone()),
            Arc::new(RecordingMailer::new()),
            &MailSettings {
              api_url: "https://mail.bench/send".into(),
              api_key: "bench".into(),
              sender_email: "shop@example.com".into(),
              sender_name: "Bench".into(),
            },
            NotificationSettings {
              shop_name: "Bench".into(),
              storefront_base_url: "https://shop.example.com".into(),
            },
          )
          .unwrap();
          let reconciliation = Arc::new(ReconciliationJob::new(
            Arc::new(store.clone()),
            Arc::new(directory.clone()),
            Arc::new(StaticPaymentGateway::default()),
            exporter.clone(),
          ));
          let coordinator =
            BulkActionCoordinator::new(Arc::new(store), Some(Arc::new(dispatcher)), exporter, reconciliation);
          let request = BulkActionRequest {
            action: BulkAction::UpdateStatus {
              status: OrderStatus::Shipped,
              send_notification: true,
            },
            order_ids: (0..num_orders).map(|i| OrderId::new(format!("order-{}", i))).collect(),
          };
          (coordinator, request)
        },
        |(coordinator, request)| async move { coordinator.execute(request).await.unwrap() },
        criterion::BatchSize::SmallInput,
      )
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_escape_field,
  bench_csv_builder,
  bench_orders_csv,
  bench_bulk_update_status
);
criterion_main!(benches);
