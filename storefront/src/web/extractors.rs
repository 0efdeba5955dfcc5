// storefront/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

/// The caller's user id, set by the session layer in front of this service as
/// the `X-User-ID` header. Admin rights are never read from the request; they
/// are resolved from the user id by the admin gate.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

pub const USER_HEADER: &str = "X-User-ID";

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get(USER_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    ready(match user_id {
      Some(user_id) => Ok(AuthenticatedUser { user_id }),
      None => {
        warn!("Missing or invalid {} header.", USER_HEADER);
        Err(AppError::Auth(format!("Missing or invalid {USER_HEADER} header")))
      }
    })
  }
}
