// lustre/src/workflows/engagement.rs

use chrono::{Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use super::WorkflowEnv;
use crate::auth::AdminAction;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::NotificationTarget;
use crate::notify::{DispatchReport, Templates};

/// Broadcasts a new-arrival notification for an active product.
#[instrument(name = "engagement::announce_product", skip(env))]
pub async fn announce_product(env: &WorkflowEnv, admin_id: Uuid, product_id: Uuid) -> WorkflowResult<DispatchReport> {
  env.gate.require(admin_id, AdminAction::BroadcastNotification).await?;
  let product = env
    .backends
    .catalog
    .product(product_id)
    .await?
    .ok_or_else(|| WorkflowError::not_found(format!("Product {product_id}")))?;
  if !product.is_active {
    return Err(WorkflowError::validation("Inactive products cannot be announced"));
  }
  let payload = Templates::new(&env.settings).new_product(&product);
  env.dispatcher.dispatch(NotificationTarget::Broadcast, &payload).await
}

/// Nudges every customer whose cart has been idle for longer than `idle_for`.
#[instrument(name = "engagement::remind_abandoned_carts", skip(env))]
pub async fn remind_abandoned_carts(env: &WorkflowEnv, admin_id: Uuid, idle_for: Duration) -> WorkflowResult<DispatchReport> {
  env.gate.require(admin_id, AdminAction::BroadcastNotification).await?;
  if idle_for <= Duration::zero() {
    return Err(WorkflowError::validation("Idle period must be positive"));
  }
  let users = env.backends.catalog.idle_carts(Utc::now() - idle_for).await?;
  let payload = Templates::new(&env.settings).abandoned_cart();

  let mut total = DispatchReport::default();
  for user_id in &users {
    let report = env.dispatcher.notify_quietly(NotificationTarget::User(*user_id), &payload).await;
    total.attempted += report.attempted;
    total.delivered += report.delivered;
    total.failed += report.failed;
    total.removed += report.removed;
  }
  info!(carts = users.len(), delivered = total.delivered, "Abandoned-cart reminders sent.");
  Ok(total)
}
