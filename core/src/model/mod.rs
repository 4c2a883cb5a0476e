// core/src/model/mod.rs

//! Data structures shared by every part of the order lifecycle.

pub mod customer;
pub mod order;
pub mod payment;
pub mod product;
pub mod status;

pub use customer::{Customer, UserId};
pub use order::{disambiguated_order_number, order_number_for_payment, NewOrder, Order, OrderId, OrderItem, ProductId, ShippingAddress};
pub use payment::{jst, DateRange, PaymentRecord};
pub use product::ProductSummary;
pub use status::OrderStatus;
