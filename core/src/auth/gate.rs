// lustre/src/auth/gate.rs

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::cache::RoleCache;
use super::role::{AdminAction, AdminRole};
use crate::audit;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::AuditEntry;
use crate::ports::{AdminDirectory, AuditSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
  Customer(Uuid),
  Admin { user_id: Uuid, role: AdminRole },
}

impl Principal {
  pub fn user_id(&self) -> Uuid {
    match self {
      Principal::Customer(user_id) => *user_id,
      Principal::Admin { user_id, .. } => *user_id,
    }
  }

  pub fn can(&self, action: AdminAction) -> bool {
    match self {
      Principal::Customer(_) => false,
      Principal::Admin { role, .. } => role.permits(action),
    }
  }
}

/// Resolves roles from the admin directory. Every privileged operation calls
/// `require`; nothing upstream of it is trusted to have checked.
#[derive(Clone)]
pub struct AdminGate {
  directory: Arc<dyn AdminDirectory>,
  audit: Arc<dyn AuditSink>,
  cache: Option<Arc<RoleCache>>,
}

impl AdminGate {
  pub fn new(directory: Arc<dyn AdminDirectory>, audit: Arc<dyn AuditSink>) -> Self {
    Self {
      directory,
      audit,
      cache: None,
    }
  }

  pub fn with_cache(mut self, cache: Arc<RoleCache>) -> Self {
    self.cache = Some(cache);
    self
  }

  pub fn cache(&self) -> Option<&Arc<RoleCache>> {
    self.cache.as_ref()
  }

  pub async fn role_of(&self, user_id: Uuid) -> WorkflowResult<Option<AdminRole>> {
    if let Some(cache) = &self.cache {
      if let Some(role) = cache.get(user_id) {
        return Ok(role);
      }
    }
    let role = self.directory.role_of(user_id).await?;
    if let Some(cache) = &self.cache {
      cache.put(user_id, role);
    }
    Ok(role)
  }

  pub async fn resolve(&self, user_id: Uuid) -> WorkflowResult<Principal> {
    Ok(match self.role_of(user_id).await? {
      Some(role) => Principal::Admin { user_id, role },
      None => Principal::Customer(user_id),
    })
  }

  /// The caller's role if it permits `action`, otherwise `Unauthorized`.
  #[instrument(name = "AdminGate::require", skip(self))]
  pub async fn require(&self, user_id: Uuid, action: AdminAction) -> WorkflowResult<AdminRole> {
    match self.role_of(user_id).await? {
      Some(role) if role.permits(action) => {
        debug!(%user_id, %role, "Admin action permitted.");
        Ok(role)
      }
      Some(role) => {
        warn!(%user_id, %role, "Admin action denied for role.");
        Err(WorkflowError::Unauthorized)
      }
      None => {
        warn!(%user_id, "Admin action denied: not an admin.");
        Err(WorkflowError::Unauthorized)
      }
    }
  }

  #[instrument(name = "AdminGate::assign_role", skip(self))]
  pub async fn assign_role(&self, actor: Uuid, user_id: Uuid, role: AdminRole) -> WorkflowResult<()> {
    self.require(actor, AdminAction::ManageAdmins).await?;
    self.directory.set_role(user_id, role).await?;
    self.forget(user_id);
    audit::record(
      self.audit.as_ref(),
      AuditEntry::new(actor, "assign_role", user_id.to_string(), Some(role.to_string())),
    )
    .await
  }

  #[instrument(name = "AdminGate::revoke_role", skip(self))]
  pub async fn revoke_role(&self, actor: Uuid, user_id: Uuid) -> WorkflowResult<()> {
    self.require(actor, AdminAction::ManageAdmins).await?;
    if actor == user_id {
      return Err(WorkflowError::validation("Admins cannot revoke their own role"));
    }
    if !self.directory.remove_role(user_id).await? {
      return Err(WorkflowError::not_found(format!("Admin {user_id}")));
    }
    self.forget(user_id);
    audit::record(
      self.audit.as_ref(),
      AuditEntry::new(actor, "revoke_role", user_id.to_string(), None),
    )
    .await
  }

  fn forget(&self, user_id: Uuid) {
    if let Some(cache) = &self.cache {
      cache.invalidate(user_id);
    }
  }
}
