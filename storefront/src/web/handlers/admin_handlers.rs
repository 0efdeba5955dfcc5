// storefront/src/web/handlers/admin_handlers.rs

//! Admin surface. Handlers pass the caller's id through; every role check
//! happens in the workflows behind `Commerce`.

use actix_web::{web, HttpResponse};
use lustre::model::{OrderStatus, ReturnStatus};
use lustre::{AdminRole, ReturnUpdate, StatusUpdate};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::ok;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct OrderStatusPayload {
  pub status: OrderStatus,
  pub tracking_number: Option<String>,
  pub cancellation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnStatusPayload {
  pub status: ReturnStatus,
  pub notes: Option<String>,
  #[serde(default)]
  pub restock: bool,
}

#[derive(Debug, Deserialize)]
pub struct RolePayload {
  pub role: AdminRole,
}

#[derive(Debug, Deserialize)]
pub struct AbandonedCartPayload {
  #[serde(default = "default_idle_hours")]
  pub idle_hours: i64,
}

fn default_idle_hours() -> i64 {
  24
}

#[instrument(name = "handler::update_order_status", skip(app_state, auth_user, payload), fields(admin_id = %auth_user.user_id, status = %payload.status))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<OrderStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let order = app_state
    .commerce
    .update_order_status(
      auth_user.user_id,
      path.into_inner(),
      StatusUpdate {
        status: payload.status,
        tracking_number: payload.tracking_number,
        cancellation_reason: payload.cancellation_reason,
      },
    )
    .await?;
  Ok(ok(order))
}

#[instrument(name = "handler::delete_order", skip(app_state, auth_user), fields(admin_id = %auth_user.user_id))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  app_state.commerce.delete_order(auth_user.user_id, order_id).await?;
  info!(%order_id, "Order deleted.");
  Ok(ok(json!({ "deleted": order_id })))
}

pub async fn shipping_label_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let label_url = app_state
    .commerce
    .shipping_label(auth_user.user_id, path.into_inner())
    .await?;
  Ok(ok(json!({ "label_url": label_url })))
}

#[instrument(name = "handler::update_return_status", skip(app_state, auth_user, payload), fields(admin_id = %auth_user.user_id, status = %payload.status))]
pub async fn update_return_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReturnStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let request = app_state
    .commerce
    .update_return_status(
      auth_user.user_id,
      path.into_inner(),
      ReturnUpdate {
        status: payload.status,
        notes: payload.notes,
        restock: payload.restock,
      },
    )
    .await?;
  Ok(ok(request))
}

pub async fn assign_role_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  let role = payload.into_inner().role;
  app_state.commerce.assign_role(auth_user.user_id, user_id, role).await?;
  Ok(ok(json!({ "user_id": user_id, "role": role })))
}

pub async fn revoke_role_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  app_state.commerce.revoke_role(auth_user.user_id, user_id).await?;
  Ok(ok(json!({ "user_id": user_id, "role": null })))
}

pub async fn announce_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let report = app_state
    .commerce
    .announce_product(auth_user.user_id, path.into_inner())
    .await?;
  Ok(ok(report))
}

pub async fn abandoned_carts_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: Option<web::Json<AbandonedCartPayload>>,
) -> Result<HttpResponse, AppError> {
  let idle_hours = payload.map_or_else(default_idle_hours, |p| p.idle_hours);
  let report = app_state
    .commerce
    .remind_abandoned_carts(auth_user.user_id, chrono::Duration::hours(idle_hours))
    .await?;
  Ok(ok(report))
}
