// lustre/src/model/push.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
  pub id: Uuid,
  pub endpoint: String,
  pub p256dh: String,
  pub auth: String,
  /// Anonymous subscribers only receive broadcasts.
  pub user_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPushSubscription {
  pub endpoint: String,
  pub p256dh: String,
  pub auth: String,
  pub user_id: Option<Uuid>,
}

/// Web Push message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
  pub title: String,
  pub body: String,
  pub url: String,
  pub icon: String,
  pub badge: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTarget {
  Broadcast,
  User(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
  Delivered,
  /// The push service no longer knows the endpoint; the subscription should go.
  Gone,
  Failed(String),
}
