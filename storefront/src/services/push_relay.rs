// storefront/src/services/push_relay.rs

use async_trait::async_trait;
use lustre::model::{PushOutcome, PushPayload, PushSubscription};
use lustre::ports::PushSender;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

/// Hands payloads to a Web Push relay that owns the VAPID keys and encryption.
pub struct PushRelay {
  send_url: String,
  client: reqwest::Client,
}

#[derive(Serialize)]
struct RelaySubscription<'a> {
  endpoint: &'a str,
  keys: RelayKeys<'a>,
}

#[derive(Serialize)]
struct RelayKeys<'a> {
  p256dh: &'a str,
  auth: &'a str,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
  subscription: RelaySubscription<'a>,
  payload: &'a PushPayload,
}

impl PushRelay {
  pub fn new(base_url: &str, client: reqwest::Client) -> Self {
    Self {
      send_url: format!("{}/send", base_url.trim_end_matches('/')),
      client,
    }
  }
}

/// 404 and 410 from the push service mean the subscription no longer exists.
pub(crate) fn classify(status: StatusCode) -> PushOutcome {
  match status {
    s if s.is_success() => PushOutcome::Delivered,
    StatusCode::NOT_FOUND | StatusCode::GONE => PushOutcome::Gone,
    other => PushOutcome::Failed(format!("push relay answered {other}")),
  }
}

#[async_trait]
impl PushSender for PushRelay {
  async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> PushOutcome {
    let request = RelayRequest {
      subscription: RelaySubscription {
        endpoint: &subscription.endpoint,
        keys: RelayKeys {
          p256dh: &subscription.p256dh,
          auth: &subscription.auth,
        },
      },
      payload,
    };
    match self.client.post(&self.send_url).json(&request).send().await {
      Ok(response) => {
        let outcome = classify(response.status());
        debug!(subscription_id = %subscription.id, ?outcome, "Push relayed.");
        outcome
      }
      Err(err) => PushOutcome::Failed(err.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn expired_endpoints_are_reported_gone() {
    assert_eq!(classify(StatusCode::CREATED), PushOutcome::Delivered);
    assert_eq!(classify(StatusCode::GONE), PushOutcome::Gone);
    assert_eq!(classify(StatusCode::NOT_FOUND), PushOutcome::Gone);
    assert!(matches!(classify(StatusCode::TOO_MANY_REQUESTS), PushOutcome::Failed(_)));
  }
}
