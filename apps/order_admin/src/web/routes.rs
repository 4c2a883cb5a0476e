// apps/order_admin/src/web/routes.rs

use actix_web::web;
use serde_json::json;

use crate::state::AppState;
use crate::web::handlers::{bulk_handlers, export_handlers, order_handlers, reconciliation_handlers};

async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(json!({ "status": "ok", "shop": app_state.config.shop_name }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/admin")
          .service(
            web::scope("/orders")
              .route("", web::get().to(order_handlers::list_orders_handler))
              .route("/bulk-action", web::post().to(bulk_handlers::bulk_action_handler))
              // Registered before "/{id}" so "export" is never read as an order id.
              .route("/export", web::get().to(export_handlers::export_orders_handler))
              .route(
                "/export/line-items",
                web::get().to(export_handlers::export_line_items_handler),
              )
              .route("/{id}", web::get().to(order_handlers::get_order_handler))
              .route(
                "/{id}/status",
                web::patch().to(order_handlers::update_order_status_handler),
              )
              .route(
                "/{id}/notes",
                web::patch().to(order_handlers::update_order_notes_handler),
              ),
          )
          .route(
            "/reconciliation/sync",
            web::post().to(reconciliation_handlers::sync_handler),
          ),
      ),
  );
}
