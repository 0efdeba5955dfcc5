// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use lustre::model::{OrderFilter, OrderStatus};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::ok;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
  pub status: Option<OrderStatus>,
  /// Admins only; customers always see their own orders.
  pub user_id: Option<Uuid>,
  pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CancelPayload {
  pub reason: String,
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  let filter = OrderFilter {
    user_id: query.user_id,
    status: query.status,
    limit: Some(query.limit.unwrap_or(50).clamp(1, 200)),
  };
  let orders = app_state.commerce.list_orders(auth_user.user_id, filter).await?;
  Ok(ok(orders))
}

pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.commerce.order_for(auth_user.user_id, path.into_inner()).await?;
  Ok(ok(order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<CancelPayload>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .commerce
    .cancel_order(auth_user.user_id, path.into_inner(), payload.into_inner().reason)
    .await?;
  Ok(ok(order))
}

pub async fn track_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let scans = app_state.commerce.track_order(auth_user.user_id, path.into_inner()).await?;
  Ok(ok(scans))
}
