// storefront/src/services/gateway.rs

use async_trait::async_trait;
use lustre::model::{GatewayOrder, GatewayOrderRequest, GatewayPayment, PaymentCallback};
use lustre::ports::PaymentGateway;
use lustre::{signature, UpstreamError};
use tracing::{info, instrument};

use super::{read_json, transport};
use crate::config::GatewayConfig;

/// A hosted-checkout provider reached over its REST API with basic auth.
/// Primary and fallback gateways are two instances with different credentials.
pub struct HostedCheckoutGateway {
  label: &'static str,
  config: GatewayConfig,
  client: reqwest::Client,
}

impl HostedCheckoutGateway {
  pub fn new(label: &'static str, config: GatewayConfig, client: reqwest::Client) -> Self {
    Self { label, config, client }
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
  }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutGateway {
  fn key_id(&self) -> &str {
    &self.config.key_id
  }

  #[instrument(name = "gateway::create_order", skip(self, request), fields(gateway = self.label, receipt = %request.receipt))]
  async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, UpstreamError> {
    let response = self
      .client
      .post(self.url("v1/orders"))
      .basic_auth(&self.config.key_id, Some(&self.config.secret))
      .json(&request)
      .send()
      .await
      .map_err(transport)?;
    let order: GatewayOrder = read_json(response).await?;
    info!(gateway_order_id = %order.id, "Gateway order created.");
    Ok(order)
  }

  #[instrument(name = "gateway::fetch_payment", skip(self), fields(gateway = self.label))]
  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, UpstreamError> {
    let response = self
      .client
      .get(self.url(&format!("v1/payments/{payment_id}")))
      .basic_auth(&self.config.key_id, Some(&self.config.secret))
      .send()
      .await
      .map_err(transport)?;
    read_json(response).await
  }

  fn verify_signature(&self, callback: &PaymentCallback) -> bool {
    signature::verify_callback(
      self.config.secret.as_bytes(),
      &callback.provider_order_id,
      &callback.payment_id,
      &callback.signature,
    )
  }
}
