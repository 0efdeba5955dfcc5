// storefront/src/services/mod.rs

//! HTTP adapters for the providers the workflows call out to.

pub mod carrier;
pub mod gateway;
pub mod push_relay;

use lustre::UpstreamError;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use carrier::HttpCarrier;
pub use gateway::HostedCheckoutGateway;
pub use push_relay::PushRelay;

pub fn http_client(timeout: Duration) -> reqwest::Client {
  reqwest::Client::builder()
    .timeout(timeout)
    .build()
    .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn transport(err: reqwest::Error) -> UpstreamError {
  match err.status() {
    Some(status) => UpstreamError::with_status(err.to_string(), status.as_u16()),
    None => UpstreamError::new(err.to_string()),
  }
}

/// Fails on any non-2xx status, keeping the provider's body as the message.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
      status.to_string()
    } else {
      body.chars().take(300).collect()
    };
    return Err(UpstreamError::with_status(message, status.as_u16()));
  }
  response.json::<T>().await.map_err(transport)
}
