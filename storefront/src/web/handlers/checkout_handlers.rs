// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use lustre::model::{Paise, PaymentCallback, PaymentMethod};
use lustre::{CheckoutRequest, VerifyOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{created, ok};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
  pub address_id: Uuid,
  pub payment_method: PaymentMethod,
  #[serde(default)]
  pub gift_wrap: bool,
  pub gift_message: Option<String>,
  pub coupon_code: Option<String>,
  /// What the client showed as the discount; compared, never trusted.
  pub discount: Option<Paise>,
  pub delivery_time_slot: Option<String>,
}

#[instrument(name = "handler::create_order", skip(app_state, payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let order = app_state
    .commerce
    .create_order(CheckoutRequest {
      user_id: auth_user.user_id,
      address_id: payload.address_id,
      payment_method: payload.payment_method,
      gift_wrap: payload.gift_wrap,
      gift_message: payload.gift_message,
      coupon_code: payload.coupon_code,
      client_discount: payload.discount,
      delivery_time_slot: payload.delivery_time_slot,
    })
    .await?;
  info!(order_id = %order.id, order_number = %order.order_number, total = order.total, "Order placed.");
  Ok(created(order))
}

/// Returns the hosted-checkout widget parameters, or `null` for cash on delivery.
#[instrument(name = "handler::initiate_payment", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn initiate_payment_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let widget = app_state
    .commerce
    .initiate_payment(auth_user.user_id, path.into_inner())
    .await?;
  Ok(ok(widget))
}

#[instrument(name = "handler::verify_payment", skip(app_state, auth_user, callback), fields(user_id = %auth_user.user_id))]
pub async fn verify_payment_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  callback: web::Json<PaymentCallback>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let outcome = app_state
    .commerce
    .verify_payment(auth_user.user_id, order_id, callback.into_inner())
    .await?;
  let order = app_state.commerce.order_for(auth_user.user_id, order_id).await?;
  Ok(ok(json!({
    "verified": true,
    "already_confirmed": outcome == VerifyOutcome::AlreadyConfirmed,
    "order": order,
  })))
}
