// storefront/src/web/handlers/push_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use lustre::model::NewPushSubscription;
use serde::Deserialize;
use uuid::Uuid;

use super::created;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::USER_HEADER;

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
  pub p256dh: String,
  pub auth: String,
}

/// Mirrors the browser's `PushSubscription.toJSON()`.
#[derive(Debug, Deserialize)]
pub struct SubscribePayload {
  pub endpoint: String,
  pub keys: SubscriptionKeys,
}

/// Anonymous visitors may subscribe too; they only receive broadcasts.
pub async fn subscribe_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<SubscribePayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = req
    .headers()
    .get(USER_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
  let payload = payload.into_inner();
  let subscription = app_state
    .commerce
    .subscribe_push(NewPushSubscription {
      endpoint: payload.endpoint,
      p256dh: payload.keys.p256dh,
      auth: payload.keys.auth,
      user_id,
    })
    .await?;
  Ok(created(subscription))
}
