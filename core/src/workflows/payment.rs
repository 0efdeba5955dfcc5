// lustre/src/workflows/payment.rs

//! `initiatePayment` and `verifyPayment`.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{fetch_order, WorkflowEnv};
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
  GatewayOrder, GatewayOrderRequest, GatewayPayment, GatewayPaymentStatus, Order, OrderStatus, PaymentCallback, PaymentMethod,
  PaymentProvider, PaymentStatus, PaymentWidget, Prefill, CURRENCY,
};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::ports::PaymentGateway;

/// Primary gateway with an optional fallback used when the primary cannot
/// create an order.
#[derive(Clone)]
pub struct PaymentRouter {
  primary: Arc<dyn PaymentGateway>,
  fallback: Option<Arc<dyn PaymentGateway>>,
}

impl PaymentRouter {
  pub fn new(primary: Arc<dyn PaymentGateway>, fallback: Option<Arc<dyn PaymentGateway>>) -> Self {
    Self { primary, fallback }
  }

  pub fn gateway(&self, provider: PaymentProvider) -> Option<&Arc<dyn PaymentGateway>> {
    match provider {
      PaymentProvider::Primary => Some(&self.primary),
      PaymentProvider::Fallback => self.fallback.as_ref(),
    }
  }

  pub async fn create_order(&self, request: GatewayOrderRequest) -> WorkflowResult<(PaymentProvider, GatewayOrder)> {
    match self.primary.create_order(request.clone()).await {
      Ok(order) => Ok((PaymentProvider::Primary, order)),
      Err(primary_err) => {
        let Some(fallback) = &self.fallback else {
          return Err(WorkflowError::upstream(PaymentProvider::Primary.as_str(), primary_err));
        };
        warn!(error = %primary_err, receipt = %request.receipt, "Primary gateway failed; trying fallback.");
        fallback
          .create_order(request)
          .await
          .map(|order| (PaymentProvider::Fallback, order))
          .map_err(|e| WorkflowError::upstream(PaymentProvider::Fallback.as_str(), e))
      }
    }
  }
}

fn ensure_owner(order: &Order, user_id: Uuid) -> WorkflowResult<()> {
  match order.user_id {
    Some(owner) if owner != user_id => {
      warn!(order_id = %order.id, %user_id, "Payment attempted on another user's order.");
      Err(WorkflowError::Unauthorized)
    }
    _ => Ok(()),
  }
}

/// Opens a hosted-checkout order for an online order. `None` for cash on delivery.
#[instrument(name = "payment::initiate", skip(env))]
pub async fn initiate_payment(env: &WorkflowEnv, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Option<PaymentWidget>> {
  let mut order = fetch_order(env, order_id).await?;
  ensure_owner(&order, user_id)?;

  if order.payment_method == PaymentMethod::Cod {
    return Ok(None);
  }
  if order.status != OrderStatus::Pending {
    return Err(WorkflowError::validation(format!(
      "Order {} is {} and cannot be paid",
      order.order_number, order.status
    )));
  }
  match order.payment_status {
    PaymentStatus::Paid => return Err(WorkflowError::validation("Order is already paid")),
    PaymentStatus::Flagged => {
      return Err(WorkflowError::validation(
        "Payment for this order is under review; please contact support",
      ))
    }
    _ => {}
  }

  let request = GatewayOrderRequest {
    receipt: order.order_number.clone(),
    amount: order.total,
    currency: CURRENCY.to_string(),
  };
  order.payment_attempts += 1;
  order.updated_at = Utc::now();

  let (provider, gateway_order) = match env.payments.create_order(request).await {
    Ok(created) => created,
    Err(e) => {
      order.payment_error_reason = Some(e.to_string());
      env.backends.orders.save_order(&order).await?;
      return Err(e);
    }
  };

  let key_id = env
    .payments
    .gateway(provider)
    .map(|g| g.key_id().to_string())
    .unwrap_or_default();

  order.payment_provider = Some(provider);
  order.payment_gateway_order_id = Some(gateway_order.id.clone());
  order.payment_status = PaymentStatus::Pending;
  order.payment_error_reason = None;
  env.backends.orders.save_order(&order).await?;

  let contact = env.backends.catalog.customer_contact(user_id).await?;
  let prefill = Prefill {
    name: contact
      .as_ref()
      .and_then(|c| c.full_name.clone())
      .unwrap_or_else(|| order.shipping_address.full_name.clone()),
    email: contact.as_ref().and_then(|c| c.email.clone()),
    contact: contact
      .as_ref()
      .and_then(|c| c.phone.clone())
      .unwrap_or_else(|| order.shipping_address.phone.clone()),
  };

  info!(order_id = %order.id, provider = %provider, gateway_order_id = %gateway_order.id, "Payment initiated.");
  Ok(Some(PaymentWidget {
    provider,
    key_id,
    amount: order.total,
    currency: CURRENCY.to_string(),
    provider_order_id: gateway_order.id,
    order_number: order.order_number,
    prefill,
  }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
  Confirmed,
  /// This payment id was verified before; nothing changed.
  AlreadyConfirmed,
}

pub struct VerifyCtx {
  pub env: WorkflowEnv,
  pub user_id: Uuid,
  pub order_id: Uuid,
  pub callback: PaymentCallback,
  pub order: Option<Order>,
  pub gateway: Option<Arc<dyn PaymentGateway>>,
  pub payment: Option<GatewayPayment>,
  pub outcome: Option<VerifyOutcome>,
}

pub type VerifyPipeline = Pipeline<VerifyCtx, WorkflowError>;

pub fn verify_payment_pipeline() -> VerifyPipeline {
  let mut p = Pipeline::new(
    "verify_payment",
    &[
      ("load_order", false, None),
      ("check_idempotency", false, None),
      ("match_gateway_order", false, None),
      ("verify_signature", false, None),
      ("verify_amount", false, None),
      ("confirm_order", false, None),
    ],
  );
  p.on("load_order", load_order);
  p.on("check_idempotency", check_idempotency);
  p.on("match_gateway_order", match_gateway_order);
  p.on("verify_signature", verify_signature);
  p.on("verify_amount", verify_amount);
  p.on("confirm_order", confirm_order);
  p
}

#[instrument(name = "payment::verify", skip(pipeline, env, callback), fields(payment_id = %callback.payment_id))]
pub async fn verify_payment(
  pipeline: &VerifyPipeline,
  env: WorkflowEnv,
  user_id: Uuid,
  order_id: Uuid,
  callback: PaymentCallback,
) -> WorkflowResult<VerifyOutcome> {
  let ctx = ContextData::new(VerifyCtx {
    env,
    user_id,
    order_id,
    callback,
    order: None,
    gateway: None,
    payment: None,
    outcome: None,
  });
  pipeline.run(ctx.clone()).await?;
  let outcome = ctx.read().outcome;
  outcome.ok_or_else(|| WorkflowError::Integrity("verification ended without an outcome".to_string()))
}

/// Marks the order for manual reconciliation and returns the error to raise.
async fn flag(env: &WorkflowEnv, mut order: Order, reason: &str) -> WorkflowError {
  error!(order_id = %order.id, %reason, "Payment verification failed; order flagged.");
  order.payment_status = PaymentStatus::Flagged;
  order.payment_error_reason = Some(reason.to_string());
  order.updated_at = Utc::now();
  if let Err(e) = env.backends.orders.save_order(&order).await {
    return e.into();
  }
  WorkflowError::Integrity(reason.to_string())
}

fn order_in(ctx: &ContextData<VerifyCtx>) -> WorkflowResult<(WorkflowEnv, Order, PaymentCallback)> {
  let guard = ctx.read();
  let order = guard
    .order
    .clone()
    .ok_or_else(|| WorkflowError::not_found(format!("Order {}", guard.order_id)))?;
  Ok((guard.env.clone(), order, guard.callback.clone()))
}

async fn load_order(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (env, user_id, order_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.user_id, guard.order_id)
  };
  let order = fetch_order(&env, order_id).await?;
  ensure_owner(&order, user_id)?;
  if order.payment_method != PaymentMethod::Online {
    return Err(WorkflowError::validation("Cash-on-delivery orders are not paid online"));
  }
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn check_idempotency(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (_, order, callback) = order_in(&ctx)?;
  if order.payment_status == PaymentStatus::Paid {
    if order.payment_id.as_deref() == Some(callback.payment_id.as_str()) {
      info!(order_id = %order.id, "Payment already confirmed; nothing to do.");
      ctx.write().outcome = Some(VerifyOutcome::AlreadyConfirmed);
      return Ok(PipelineControl::Stop);
    }
    return Err(WorkflowError::validation("Order is already paid"));
  }
  if order.payment_status == PaymentStatus::Flagged {
    return Err(WorkflowError::Integrity(
      "payment is awaiting manual reconciliation".to_string(),
    ));
  }
  if order.status != OrderStatus::Pending {
    return Err(WorkflowError::validation(format!(
      "Order {} is {} and cannot be paid",
      order.order_number, order.status
    )));
  }
  Ok(PipelineControl::Continue)
}

async fn match_gateway_order(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, callback) = order_in(&ctx)?;
  if order.payment_gateway_order_id.as_deref() != Some(callback.provider_order_id.as_str()) {
    return Err(flag(&env, order, "gateway order id does not match the order").await);
  }
  Ok(PipelineControl::Continue)
}

async fn verify_signature(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, callback) = order_in(&ctx)?;
  let provider = order.payment_provider.unwrap_or(PaymentProvider::Primary);
  let gateway = env.payments.gateway(provider).cloned();
  let Some(gateway) = gateway else {
    return Err(flag(&env, order, "payment provider is not configured").await);
  };
  if !gateway.verify_signature(&callback) {
    return Err(flag(&env, order, "signature mismatch").await);
  }
  ctx.write().gateway = Some(gateway);
  Ok(PipelineControl::Continue)
}

async fn verify_amount(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, callback) = order_in(&ctx)?;
  let gateway = ctx.read().gateway.clone();
  let Some(gateway) = gateway else {
    return Err(flag(&env, order, "payment provider is not configured").await);
  };
  let provider = order.payment_provider.unwrap_or(PaymentProvider::Primary);
  let payment = gateway
    .fetch_payment(&callback.payment_id)
    .await
    .map_err(|e| WorkflowError::upstream(provider.as_str(), e))?;

  if payment.order_id != callback.provider_order_id {
    return Err(flag(&env, order, "payment belongs to a different gateway order").await);
  }
  match payment.status {
    GatewayPaymentStatus::Authorized | GatewayPaymentStatus::Captured => {}
    GatewayPaymentStatus::Failed => {
      let mut order = order;
      order.payment_status = PaymentStatus::Failed;
      order.payment_error_reason = Some("payment failed at the gateway".to_string());
      order.updated_at = Utc::now();
      env.backends.orders.save_order(&order).await?;
      return Err(WorkflowError::validation("Payment failed; please try again"));
    }
    GatewayPaymentStatus::Created | GatewayPaymentStatus::Refunded | GatewayPaymentStatus::Unknown => {
      // Order stays pending; a later verify with a settled payment can still confirm it.
      let reason = format!("gateway reports payment {} as {}", payment.id, payment.status);
      warn!(order_id = %order.id, %reason, "Payment not settled; order left pending.");
      let mut order = order;
      order.payment_error_reason = Some(reason);
      order.updated_at = Utc::now();
      env.backends.orders.save_order(&order).await?;
      return Err(WorkflowError::validation(format!(
        "Payment is {} at the gateway and cannot confirm the order yet",
        payment.status
      )));
    }
  }
  if payment.amount != order.total || payment.currency != CURRENCY {
    let reason = format!(
      "amount mismatch: gateway reported {} {}, order total is {} {}",
      payment.amount, payment.currency, order.total, CURRENCY
    );
    return Err(flag(&env, order, &reason).await);
  }
  ctx.write().payment = Some(payment);
  Ok(PipelineControl::Continue)
}

async fn confirm_order(ctx: ContextData<VerifyCtx>) -> WorkflowResult<PipelineControl> {
  let (env, mut order, callback) = order_in(&ctx)?;
  if !order.status.can_transition_to(OrderStatus::Confirmed) {
    return Err(WorkflowError::IllegalOrderTransition {
      from: order.status,
      to: OrderStatus::Confirmed,
    });
  }
  order.status = OrderStatus::Confirmed;
  order.payment_status = PaymentStatus::Paid;
  order.payment_id = Some(callback.payment_id);
  order.payment_error_reason = None;
  order.updated_at = Utc::now();
  env.backends.orders.save_order(&order).await?;
  info!(order_id = %order.id, "Payment verified; order confirmed.");

  let mut guard = ctx.write();
  guard.order = Some(order);
  guard.outcome = Some(VerifyOutcome::Confirmed);
  Ok(PipelineControl::Continue)
}
