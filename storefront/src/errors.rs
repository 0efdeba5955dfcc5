// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use lustre::{StoreError, WorkflowError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  /// No usable identity on the request.
  #[error("Authentication required: {0}")]
  Auth(String),

  /// Identity known but not allowed. The message is fixed so callers learn nothing about roles.
  #[error("Unauthorized")]
  Forbidden,

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// Payment verification mismatch; the order is flagged for reconciliation.
  #[error("{0}")]
  Integrity(String),

  #[error("{0}")]
  Upstream(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<WorkflowError> for AppError {
  fn from(err: WorkflowError) -> Self {
    match err {
      WorkflowError::Validation(m) => AppError::Validation(m),
      WorkflowError::Unauthorized => AppError::Forbidden,
      e @ WorkflowError::NotFound(_) => AppError::NotFound(e.to_string()),
      e @ (WorkflowError::IllegalOrderTransition { .. } | WorkflowError::IllegalReturnTransition { .. }) => {
        AppError::Conflict(e.to_string())
      }
      e @ WorkflowError::Upstream { .. } => AppError::Upstream(e.to_string()),
      e @ WorkflowError::Integrity(_) => AppError::Integrity(e.to_string()),
      WorkflowError::Store(StoreError::NotFound(m)) => AppError::NotFound(format!("{m} not found")),
      WorkflowError::Store(StoreError::Conflict(m)) => AppError::Conflict(m),
      WorkflowError::Store(e @ StoreError::Backend { .. }) => AppError::Internal(e.to_string()),
      WorkflowError::Pipeline(e) => AppError::Internal(e.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  fn retryable(&self) -> bool {
    matches!(self, AppError::Upstream(_))
  }

  /// Text safe to show a client. Internal failures are logged, not echoed.
  fn public_message(&self) -> String {
    match self {
      AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      other => other.to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::Integrity(_) => StatusCode::CONFLICT,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }

    let mut body = json!({"success": false, "error": self.public_message()});
    if self.retryable() {
      body["retryable"] = json!(true);
    }
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use lustre::model::OrderStatus;
  use lustre::UpstreamError;

  #[test]
  fn workflow_errors_map_to_http_statuses() {
    let cases = [
      (WorkflowError::validation("bad"), StatusCode::BAD_REQUEST),
      (WorkflowError::Unauthorized, StatusCode::FORBIDDEN),
      (WorkflowError::not_found("Order"), StatusCode::NOT_FOUND),
      (
        WorkflowError::IllegalOrderTransition {
          from: OrderStatus::Shipped,
          to: OrderStatus::Cancelled,
        },
        StatusCode::CONFLICT,
      ),
      (
        WorkflowError::upstream("carrier", UpstreamError::new("timeout")),
        StatusCode::BAD_GATEWAY,
      ),
      (WorkflowError::Integrity("amount mismatch".into()), StatusCode::CONFLICT),
    ];
    for (err, expected) in cases {
      assert_eq!(AppError::from(err).status_code(), expected);
    }
  }

  #[test]
  fn forbidden_never_names_the_action() {
    let err = AppError::from(WorkflowError::Unauthorized);
    assert_eq!(err.public_message(), "Unauthorized");
  }

  #[test]
  fn internal_details_stay_out_of_the_body() {
    let err = AppError::Internal("connection reset by peer".into());
    assert_eq!(err.public_message(), "An internal error occurred");
  }
}
