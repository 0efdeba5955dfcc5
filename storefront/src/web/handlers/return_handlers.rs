// storefront/src/web/handlers/return_handlers.rs

use actix_web::{web, HttpResponse};
use lustre::model::IssueType;
use lustre::ReturnClaim;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{created, ok};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct ReturnPayload {
  pub reason: String,
  pub issue_type: IssueType,
  #[serde(default)]
  pub evidence_photos: Vec<String>,
  pub video_link: Option<String>,
}

#[instrument(name = "handler::request_return", skip(app_state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn request_return_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReturnPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let request = app_state
    .commerce
    .request_return(ReturnClaim {
      user_id: auth_user.user_id,
      order_id: path.into_inner(),
      reason: payload.reason,
      issue_type: payload.issue_type,
      evidence_photos: payload.evidence_photos,
      video_link: payload.video_link,
    })
    .await?;
  info!(return_id = %request.id, "Return requested.");
  Ok(created(request))
}

#[instrument(name = "handler::list_returns", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_returns_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let requests = app_state
    .commerce
    .returns_for_order(auth_user.user_id, path.into_inner())
    .await?;
  Ok(ok(requests))
}
