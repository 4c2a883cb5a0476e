// apps/order_admin/src/services/mod.rs

//! Outbound integrations: the payment provider ledger and the mail transports.

pub mod brevo;
pub mod mail_mock;
pub mod stripe;

pub use brevo::BrevoMailer;
pub use mail_mock::LoggingMailer;
pub use stripe::StripeGateway;
