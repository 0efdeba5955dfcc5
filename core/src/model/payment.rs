// lustre/src/model/payment.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Paise;
use super::UnknownVariant;

/// Which of the two interchangeable gateways issued an order's provider-side id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
  Primary,
  Fallback,
}

impl PaymentProvider {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentProvider::Primary => "primary",
      PaymentProvider::Fallback => "fallback",
    }
  }
}

impl fmt::Display for PaymentProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentProvider {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "primary" => Ok(PaymentProvider::Primary),
      "fallback" => Ok(PaymentProvider::Fallback),
      other => Err(UnknownVariant::new("payment provider", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOrderRequest {
  /// Our order number, echoed back by the provider as the receipt.
  pub receipt: String,
  pub amount: Paise,
  pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
  pub id: String,
  pub amount: Paise,
  pub currency: String,
}

/// Lifecycle of a payment on the provider side. Anything the provider sends
/// that we do not recognise lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
  Created,
  Authorized,
  Captured,
  Refunded,
  Failed,
  #[serde(other)]
  Unknown,
}

impl GatewayPaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      GatewayPaymentStatus::Created => "created",
      GatewayPaymentStatus::Authorized => "authorized",
      GatewayPaymentStatus::Captured => "captured",
      GatewayPaymentStatus::Refunded => "refunded",
      GatewayPaymentStatus::Failed => "failed",
      GatewayPaymentStatus::Unknown => "unknown",
    }
  }

  /// Money is secured with the provider; only these confirm an order.
  pub fn is_settled(&self) -> bool {
    matches!(self, GatewayPaymentStatus::Authorized | GatewayPaymentStatus::Captured)
  }
}

impl fmt::Display for GatewayPaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A payment as the provider reports it when fetched server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
  pub id: String,
  pub order_id: String,
  pub amount: Paise,
  pub currency: String,
  pub status: GatewayPaymentStatus,
}

/// The signed payload the client-side widget hands back after payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
  pub provider_order_id: String,
  pub payment_id: String,
  pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
  pub name: String,
  pub email: Option<String>,
  pub contact: String,
}

/// Everything the client-side payment widget needs to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWidget {
  pub provider: PaymentProvider,
  pub key_id: String,
  pub amount: Paise,
  pub currency: String,
  pub provider_order_id: String,
  pub order_number: String,
  pub prefill: Prefill,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unrecognised_gateway_status_is_unknown_and_unsettled() {
    let status: GatewayPaymentStatus = serde_json::from_str("\"on_hold\"").unwrap();
    assert_eq!(status, GatewayPaymentStatus::Unknown);
    assert!(!status.is_settled());
  }

  #[test]
  fn only_authorized_and_captured_are_settled() {
    let settled: Vec<_> = [
      GatewayPaymentStatus::Created,
      GatewayPaymentStatus::Authorized,
      GatewayPaymentStatus::Captured,
      GatewayPaymentStatus::Refunded,
      GatewayPaymentStatus::Failed,
    ]
    .into_iter()
    .filter(GatewayPaymentStatus::is_settled)
    .collect();
    assert_eq!(settled, vec![GatewayPaymentStatus::Authorized, GatewayPaymentStatus::Captured]);
  }
}
