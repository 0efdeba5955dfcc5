// lustre/src/model/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trail of irreversible or override admin actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub id: Uuid,
  pub actor: Uuid,
  pub action: String,
  pub subject: String,
  pub detail: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl AuditEntry {
  pub fn new(actor: Uuid, action: &str, subject: impl Into<String>, detail: Option<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      actor,
      action: action.to_string(),
      subject: subject.into(),
      detail,
      created_at: Utc::now(),
    }
  }
}
