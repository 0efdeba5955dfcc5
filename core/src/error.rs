// lustre/src/error.rs
use thiserror::Error;

use crate::model::{OrderStatus, ReturnStatus};

/// Framework-level failures raised by the step engine itself, independent of
/// what the step handlers do.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

/// Errors surfaced by store ports (database, in-memory store).
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Record not found: {0}")]
  NotFound(String),

  /// A write lost against a store-side guard (stock exhausted, coupon usage
  /// limit reached, unique constraint).
  #[error("Conflicting write: {0}")]
  Conflict(String),

  #[error("Store backend failure: {source}")]
  Backend {
    #[from]
    source: anyhow::Error,
  },
}

/// Failure reported by an external provider (payment gateway, carrier, push relay).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UpstreamError {
  pub message: String,
  pub status: Option<u16>,
}

impl UpstreamError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      status: None,
    }
  }

  pub fn with_status(message: impl Into<String>, status: u16) -> Self {
    Self {
      message: message.into(),
      status: Some(status),
    }
  }
}

/// The error taxonomy every workflow operation returns.
#[derive(Debug, Error)]
pub enum WorkflowError {
  /// Bad input or a business precondition that does not hold. Shown inline to the user.
  #[error("{0}")]
  Validation(String),

  /// Caller lacks the role for the action. The denied action is logged, never echoed.
  #[error("Unauthorized")]
  Unauthorized,

  #[error("{0} not found")]
  NotFound(String),

  #[error("Illegal order transition from '{from}' to '{to}'")]
  IllegalOrderTransition { from: OrderStatus, to: OrderStatus },

  #[error("Illegal return transition from '{from}' to '{to}'")]
  IllegalReturnTransition { from: ReturnStatus, to: ReturnStatus },

  /// Provider call failed; the order is left in a re-attemptable state.
  #[error("{provider} unavailable: {source}")]
  Upstream {
    provider: String,
    #[source]
    source: UpstreamError,
  },

  /// Payment verification could not be trusted; flagged for manual reconciliation.
  #[error("Payment verification failed: {0}")]
  Integrity(String),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Pipeline(#[from] PipelineError),
}

impl WorkflowError {
  pub fn validation(message: impl Into<String>) -> Self {
    WorkflowError::Validation(message.into())
  }

  pub fn not_found(what: impl Into<String>) -> Self {
    WorkflowError::NotFound(what.into())
  }

  pub fn upstream(provider: impl Into<String>, source: UpstreamError) -> Self {
    WorkflowError::Upstream {
      provider: provider.into(),
      source,
    }
  }

  /// Upstream failures are the only ones a client should simply retry.
  pub fn is_retryable(&self) -> bool {
    matches!(self, WorkflowError::Upstream { .. })
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type WorkflowResult<T, E = WorkflowError> = std::result::Result<T, E>;
