// apps/order_admin/src/web/handlers/auth.rs

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use order_lifecycle::UserId;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// An operator whose `X-User-ID` resolves to an admin account.
///
/// Missing or unreadable header → 401, known caller without the admin role → 403.
#[derive(Debug)]
pub struct AdminUser {
  pub user_id: UserId,
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get("X-User-ID")
      .and_then(|h| h.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .map(UserId::new);
    let authorizer = req.app_data::<web::Data<AppState>>().map(|s| s.authorizer.clone());

    Box::pin(async move {
      let user_id = user_id.ok_or_else(|| {
        warn!("AdminUser extractor: Missing or invalid X-User-ID header.");
        AppError::Unauthorized("Authentication required. Missing or invalid X-User-ID header.".to_string())
      })?;
      let authorizer =
        authorizer.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;

      if authorizer.is_admin(&user_id).await? {
        Ok(AdminUser { user_id })
      } else {
        warn!("User {} attempted an admin operation without the admin role.", user_id.as_str());
        Err(AppError::Forbidden("Administrator access required.".to_string()))
      }
    })
  }
}
