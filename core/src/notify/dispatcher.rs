// lustre/src/notify/dispatcher.rs

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{NewPushSubscription, NotificationTarget, PushOutcome, PushPayload, PushSubscription};
use crate::ports::{PushRegistry, PushSender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
  pub attempted: usize,
  pub delivered: usize,
  pub failed: usize,
  /// Expired subscriptions deleted after the send loop.
  pub removed: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
  registry: Arc<dyn PushRegistry>,
  sender: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
  pub fn new(registry: Arc<dyn PushRegistry>, sender: Arc<dyn PushSender>) -> Self {
    Self { registry, sender }
  }

  /// Registers (or refreshes) a browser subscription.
  pub async fn subscribe(&self, subscription: NewPushSubscription) -> WorkflowResult<PushSubscription> {
    if !subscription.endpoint.starts_with("https://") {
      return Err(WorkflowError::validation("Push endpoint must be an https URL"));
    }
    if subscription.p256dh.trim().is_empty() || subscription.auth.trim().is_empty() {
      return Err(WorkflowError::validation("Push subscription keys are required"));
    }
    Ok(self.registry.upsert_subscription(subscription).await?)
  }

  /// Sends `payload` to every subscription of `target`. Per-subscription
  /// failures are counted, not raised; only registry errors propagate.
  #[instrument(name = "NotificationDispatcher::dispatch", skip(self, payload), fields(title = %payload.title))]
  pub async fn dispatch(&self, target: NotificationTarget, payload: &PushPayload) -> WorkflowResult<DispatchReport> {
    let subscriptions = self.registry.subscriptions(target).await?;
    let mut report = DispatchReport {
      attempted: subscriptions.len(),
      ..DispatchReport::default()
    };
    let mut gone: Vec<Uuid> = Vec::new();

    for subscription in &subscriptions {
      match self.sender.send(subscription, payload).await {
        PushOutcome::Delivered => report.delivered += 1,
        PushOutcome::Gone => {
          debug!(subscription_id = %subscription.id, "Push endpoint gone; scheduling removal.");
          gone.push(subscription.id);
        }
        PushOutcome::Failed(reason) => {
          warn!(subscription_id = %subscription.id, %reason, "Push delivery failed.");
          report.failed += 1;
        }
      }
    }

    if !gone.is_empty() {
      report.removed = self.registry.delete_subscriptions(&gone).await?;
    }

    info!(
      attempted = report.attempted,
      delivered = report.delivered,
      failed = report.failed,
      removed = report.removed,
      "Push dispatch finished."
    );
    Ok(report)
  }

  /// `dispatch` for side-effect notifications: errors are logged and dropped.
  pub async fn notify_quietly(&self, target: NotificationTarget, payload: &PushPayload) -> DispatchReport {
    match self.dispatch(target, payload).await {
      Ok(report) => report,
      Err(e) => {
        warn!(error = %e, "Notification dispatch failed; continuing.");
        DispatchReport::default()
      }
    }
  }
}
