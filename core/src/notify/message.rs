// core/src/notify/message.rs
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::mail::OutgoingEmail;
use crate::model::{jst, Order, ProductId, ProductSummary};

pub(crate) const GENERIC_RECIPIENT_NAME: &str = "お客様";

/// Everything the shipment email needs, resolved ahead of rendering.
pub(crate) struct ShipmentMessage<'a> {
  pub shop_name: &'a str,
  pub order: &'a Order,
  pub recipient_email: &'a str,
  pub recipient_name: &'a str,
  pub shipped_at: DateTime<Utc>,
  pub products: &'a HashMap<ProductId, ProductSummary>,
  pub order_url: String,
}

impl ShipmentMessage<'_> {
  fn item_lines(&self) -> Vec<String> {
    self
      .order
      .items
      .iter()
      .map(|item| {
        let name = self
          .products
          .get(&item.product_id)
          .map(|p| p.name.as_str())
          .unwrap_or(item.product_id.0.as_str());
        format!("{} × {}", name, item.quantity)
      })
      .collect()
  }

  pub fn render(&self) -> OutgoingEmail {
    let ship_date = self.shipped_at.with_timezone(&jst()).format("%Y年%m月%d日").to_string();
    let items = self.item_lines();

    let subject = format!(
      "【{}】ご注文の商品を発送しました（注文番号: {}）",
      self.shop_name, self.order.order_number
    );

    let text_body = format!(
      "{name} 様\n\nご注文いただいた商品を発送いたしました。\n\n注文番号: {number}\n発送日: {date}\n\n{items}\n\nご注文の詳細: {url}\n\n{shop}",
      name = self.recipient_name,
      number = self.order.order_number,
      date = ship_date,
      items = items.join("\n"),
      url = self.order_url,
      shop = self.shop_name,
    );

    let html_items: String = items
      .iter()
      .map(|line| format!("<li>{}</li>", html_escape(line)))
      .collect();
    let html_body = format!(
      "<p>{name} 様</p><p>ご注文いただいた商品を発送いたしました。</p>\
       <p>注文番号: {number}<br>発送日: {date}</p><ul>{items}</ul>\
       <p><a href=\"{url}\">ご注文の詳細を見る</a></p><p>{shop}</p>",
      name = html_escape(self.recipient_name),
      number = html_escape(&self.order.order_number),
      date = ship_date,
      items = html_items,
      url = html_escape(&self.order_url),
      shop = html_escape(self.shop_name),
    );

    OutgoingEmail {
      to: self.recipient_email.to_string(),
      to_name: self.recipient_name.to_string(),
      subject,
      html_body,
      text_body,
    }
  }
}

fn html_escape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{OrderId, OrderItem, OrderStatus, ShippingAddress};
  use chrono::TimeZone;

  #[test]
  fn renders_number_date_items_and_link() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();
    let order = Order {
      id: OrderId::new("o1"),
      order_number: "ORD-0001".into(),
      status: OrderStatus::Shipped,
      total_amount: 9800,
      shipping_address: ShippingAddress::default(),
      user_id: None,
      items: vec![
        OrderItem { product_id: ProductId("p1".into()), quantity: 2, unit_price: 4900 },
        OrderItem { product_id: ProductId("gone".into()), quantity: 1, unit_price: 0 },
      ],
      stripe_payment_intent_id: None,
      notification_sent: false,
      shipped_at: Some(now),
      admin_notes: None,
      is_deleted: false,
      deleted_at: None,
      created_at: now,
      updated_at: now,
    };
    let products = HashMap::from([(
      ProductId("p1".into()),
      ProductSummary { id: ProductId("p1".into()), name: "Rose & Oud".into(), price: 4900 },
    )]);
    let email = ShipmentMessage {
      shop_name: "Fragrance Store",
      order: &order,
      recipient_email: "a@example.com",
      recipient_name: "佐藤",
      shipped_at: now,
      products: &products,
      order_url: "https://shop.example.com/account/orders/o1".into(),
    }
    .render();

    assert!(email.subject.contains("ORD-0001"));
    // 16:00 UTC is the next day in Japan.
    assert!(email.text_body.contains("発送日: 2024年05月02日"));
    assert!(email.text_body.contains("Rose & Oud × 2"));
    assert!(email.text_body.contains("gone × 1"));
    assert!(email.html_body.contains("Rose &amp; Oud × 2"));
    assert!(email.html_body.contains("https://shop.example.com/account/orders/o1"));
    assert_eq!(email.to, "a@example.com");
  }
}
