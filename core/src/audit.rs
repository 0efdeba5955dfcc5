// lustre/src/audit.rs

use tracing::info;

use crate::error::WorkflowResult;
use crate::model::AuditEntry;
use crate::ports::AuditSink;

/// Logs the entry under the `audit` target and persists it.
pub async fn record(sink: &dyn AuditSink, entry: AuditEntry) -> WorkflowResult<()> {
  info!(
    target: "audit",
    actor = %entry.actor,
    action = %entry.action,
    subject = %entry.subject,
    detail = entry.detail.as_deref().unwrap_or(""),
    "Admin action recorded."
  );
  sink.record(entry).await?;
  Ok(())
}
