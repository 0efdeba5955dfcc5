// lustre/src/sandbox.rs

//! In-process stand-ins for the payment gateway, carrier and push relay.
//! Each can be switched to failing to exercise the fallback paths.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::UpstreamError;
use crate::model::{
  GatewayOrder, GatewayOrderRequest, GatewayPayment, GatewayPaymentStatus, Paise, PaymentCallback, PushOutcome, PushPayload,
  PushSubscription, RateQuery, Shipment, ShipmentRequest, TrackingScan,
};
use crate::ports::{Carrier, PaymentGateway, PushSender};
use crate::signature;

/// A hosted-checkout gateway that signs callbacks with a shared secret.
pub struct SandboxGateway {
  key_id: String,
  secret: String,
  available: AtomicBool,
  orders: Mutex<HashMap<String, GatewayOrder>>,
  payments: Mutex<HashMap<String, GatewayPayment>>,
}

impl SandboxGateway {
  pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
    Self {
      key_id: key_id.into(),
      secret: secret.into(),
      available: AtomicBool::new(true),
      orders: Mutex::new(HashMap::new()),
      payments: Mutex::new(HashMap::new()),
    }
  }

  pub fn set_available(&self, available: bool) {
    self.available.store(available, Ordering::SeqCst);
  }

  pub fn orders_created(&self) -> usize {
    self.orders.lock().len()
  }

  /// Simulates the customer paying the full amount; returns the signed callback.
  pub fn pay(&self, provider_order_id: &str) -> Option<PaymentCallback> {
    let amount = self.orders.lock().get(provider_order_id).map(|o| o.amount)?;
    Some(self.pay_amount(provider_order_id, amount))
  }

  /// Like `pay`, but the gateway records `amount` as captured.
  pub fn pay_amount(&self, provider_order_id: &str, amount: Paise) -> PaymentCallback {
    self.record_payment(provider_order_id, amount, GatewayPaymentStatus::Captured)
  }

  /// A correctly signed callback for a payment the gateway holds in `status`.
  pub fn pay_with_status(&self, provider_order_id: &str, status: GatewayPaymentStatus) -> Option<PaymentCallback> {
    let amount = self.orders.lock().get(provider_order_id).map(|o| o.amount)?;
    Some(self.record_payment(provider_order_id, amount, status))
  }

  fn record_payment(&self, provider_order_id: &str, amount: Paise, status: GatewayPaymentStatus) -> PaymentCallback {
    let payment_id = format!("pay_{}", &Uuid::new_v4().simple().to_string()[..14]);
    let currency = self
      .orders
      .lock()
      .get(provider_order_id)
      .map(|o| o.currency.clone())
      .unwrap_or_else(|| crate::model::CURRENCY.to_string());
    self.payments.lock().insert(
      payment_id.clone(),
      GatewayPayment {
        id: payment_id.clone(),
        order_id: provider_order_id.to_string(),
        amount,
        currency,
        status,
      },
    );
    PaymentCallback {
      provider_order_id: provider_order_id.to_string(),
      signature: signature::sign_callback(self.secret.as_bytes(), provider_order_id, &payment_id),
      payment_id,
    }
  }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
  fn key_id(&self) -> &str {
    &self.key_id
  }

  #[instrument(name = "SandboxGateway::create_order", skip(self, request), fields(key_id = %self.key_id, amount = request.amount))]
  async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, UpstreamError> {
    if !self.available.load(Ordering::SeqCst) {
      return Err(UpstreamError::with_status("sandbox gateway unavailable", 503));
    }
    if request.amount <= 0 {
      return Err(UpstreamError::with_status("amount must be greater than zero", 400));
    }
    let order = GatewayOrder {
      id: format!("order_{}", &Uuid::new_v4().simple().to_string()[..14]),
      amount: request.amount,
      currency: request.currency,
    };
    info!(gateway_order_id = %order.id, receipt = %request.receipt, "Sandbox gateway order created.");
    self.orders.lock().insert(order.id.clone(), order.clone());
    Ok(order)
  }

  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, UpstreamError> {
    if !self.available.load(Ordering::SeqCst) {
      return Err(UpstreamError::with_status("sandbox gateway unavailable", 503));
    }
    self
      .payments
      .lock()
      .get(payment_id)
      .cloned()
      .ok_or_else(|| UpstreamError::with_status(format!("payment {payment_id} not found"), 404))
  }

  fn verify_signature(&self, callback: &PaymentCallback) -> bool {
    signature::verify_callback(
      self.secret.as_bytes(),
      &callback.provider_order_id,
      &callback.payment_id,
      &callback.signature,
    )
  }
}

/// Flat-rate carrier that hands out sequential waybills.
pub struct SandboxCarrier {
  rate: Paise,
  available: AtomicBool,
  next_waybill: AtomicU64,
  shipments: Mutex<Vec<ShipmentRequest>>,
}

impl SandboxCarrier {
  pub fn new(rate: Paise) -> Self {
    Self {
      rate,
      available: AtomicBool::new(true),
      next_waybill: AtomicU64::new(1),
      shipments: Mutex::new(Vec::new()),
    }
  }

  pub fn set_available(&self, available: bool) {
    self.available.store(available, Ordering::SeqCst);
  }

  pub fn shipments(&self) -> Vec<ShipmentRequest> {
    self.shipments.lock().clone()
  }

  fn ensure_available(&self) -> Result<(), UpstreamError> {
    if self.available.load(Ordering::SeqCst) {
      Ok(())
    } else {
      Err(UpstreamError::with_status("sandbox carrier unavailable", 503))
    }
  }
}

#[async_trait]
impl Carrier for SandboxCarrier {
  async fn quote_rate(&self, _query: RateQuery) -> Result<Paise, UpstreamError> {
    self.ensure_available()?;
    Ok(self.rate)
  }

  async fn create_shipment(&self, request: ShipmentRequest) -> Result<Shipment, UpstreamError> {
    self.ensure_available()?;
    let waybill = format!("SBX{:010}", self.next_waybill.fetch_add(1, Ordering::SeqCst));
    info!(%waybill, reference = %request.reference, direction = ?request.direction, "Sandbox shipment booked.");
    self.shipments.lock().push(request);
    Ok(Shipment { waybill })
  }

  async fn track(&self, waybill: &str) -> Result<Vec<TrackingScan>, UpstreamError> {
    self.ensure_available()?;
    Ok(vec![TrackingScan {
      status: "Manifested".to_string(),
      location: "Sandbox hub".to_string(),
      timestamp: Utc::now(),
      instructions: Some(format!("Waybill {waybill} created")),
    }])
  }

  async fn label_url(&self, waybill: &str) -> Result<String, UpstreamError> {
    self.ensure_available()?;
    Ok(format!("https://sandbox.carrier.invalid/labels/{waybill}.pdf"))
  }
}

/// Logs each push instead of sending it. Endpoints can be marked gone or failing.
#[derive(Default)]
pub struct SandboxPush {
  gone: Mutex<HashSet<String>>,
  failing: Mutex<HashSet<String>>,
  sent: Mutex<Vec<(String, PushPayload)>>,
}

impl SandboxPush {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn mark_gone(&self, endpoint: &str) {
    self.gone.lock().insert(endpoint.to_string());
  }

  pub fn mark_failing(&self, endpoint: &str) {
    self.failing.lock().insert(endpoint.to_string());
  }

  /// `(endpoint, payload)` for every delivered push.
  pub fn sent(&self) -> Vec<(String, PushPayload)> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl PushSender for SandboxPush {
  async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> PushOutcome {
    if self.gone.lock().contains(&subscription.endpoint) {
      return PushOutcome::Gone;
    }
    if self.failing.lock().contains(&subscription.endpoint) {
      return PushOutcome::Failed("sandbox push relay returned 500".to_string());
    }
    info!(endpoint = %subscription.endpoint, title = %payload.title, "Sandbox push delivered.");
    self
      .sent
      .lock()
      .push((subscription.endpoint.clone(), payload.clone()));
    PushOutcome::Delivered
  }
}
