// lustre/src/workflows/checkout.rs

//! `createOrder`: cart -> priced, persisted order.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{non_empty, WorkflowEnv};
use crate::error::{StoreError, WorkflowError, WorkflowResult};
use crate::model::{
  CartLine, Coupon, NewOrder, NewOrderItem, Order, OrderStatus, OrderTotals, Paise, PaymentMethod, RateQuery,
  ShippingAddress,
};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::pricing;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub payment_method: PaymentMethod,
  pub gift_wrap: bool,
  pub gift_message: Option<String>,
  pub coupon_code: Option<String>,
  /// The discount the client displayed. Only compared against the server's figure.
  pub client_discount: Option<Paise>,
  pub delivery_time_slot: Option<String>,
}

pub struct CheckoutCtx {
  pub env: WorkflowEnv,
  pub request: CheckoutRequest,
  pub lines: Vec<CartLine>,
  pub address: Option<ShippingAddress>,
  pub subtotal: Paise,
  pub shipping_fee: Paise,
  pub coupon_code: Option<String>,
  pub discount: Paise,
  pub gift_message: Option<String>,
  pub totals: Option<OrderTotals>,
  pub order: Option<Order>,
}

impl CheckoutCtx {
  pub fn new(env: WorkflowEnv, request: CheckoutRequest) -> Self {
    Self {
      env,
      request,
      lines: Vec::new(),
      address: None,
      subtotal: 0,
      shipping_fee: 0,
      coupon_code: None,
      discount: 0,
      gift_message: None,
      totals: None,
      order: None,
    }
  }
}

pub type CheckoutPipeline = Pipeline<CheckoutCtx, WorkflowError>;

fn is_online(ctx: &ContextData<CheckoutCtx>) -> bool {
  ctx.read().request.payment_method == PaymentMethod::Online
}

pub fn checkout_pipeline() -> CheckoutPipeline {
  let online_only: SkipCondition<CheckoutCtx> = Arc::new(is_online);
  let mut p = Pipeline::new(
    "checkout",
    &[
      ("load_cart", false, None),
      ("load_address", false, None),
      ("validate_stock", false, None),
      ("quote_shipping", false, None),
      ("apply_coupon", false, None),
      ("compute_totals", false, None),
      ("persist_order", false, None),
      ("confirm_cash_on_delivery", false, Some(online_only)),
      ("clear_cart", true, None),
    ],
  );
  p.on("load_cart", load_cart);
  p.on("load_address", load_address);
  p.on("validate_stock", validate_stock);
  p.on("quote_shipping", quote_shipping);
  p.on("apply_coupon", apply_coupon);
  p.on("compute_totals", compute_totals);
  p.on("persist_order", persist_order);
  p.on("confirm_cash_on_delivery", confirm_cash_on_delivery);
  p.on("clear_cart", clear_cart);
  p
}

#[instrument(name = "checkout::create_order", skip(pipeline, env, request), fields(user_id = %request.user_id, method = %request.payment_method))]
pub async fn create_order(pipeline: &CheckoutPipeline, env: WorkflowEnv, request: CheckoutRequest) -> WorkflowResult<Order> {
  let ctx = ContextData::new(CheckoutCtx::new(env, request));
  pipeline.run(ctx.clone()).await?;
  let order = ctx.write().order.take();
  let order = order.ok_or_else(|| WorkflowError::not_found("Created order"))?;
  info!(order_id = %order.id, order_number = %order.order_number, total = order.total, "Order created.");
  Ok(order)
}

async fn load_cart(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, user_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.request.user_id)
  };
  let lines = env.backends.catalog.cart_lines(user_id).await?;
  if lines.is_empty() {
    return Err(WorkflowError::validation("Your cart is empty"));
  }
  let subtotal = pricing::subtotal(&lines);
  let mut guard = ctx.write();
  guard.lines = lines;
  guard.subtotal = subtotal;
  Ok(PipelineControl::Continue)
}

async fn load_address(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, user_id, address_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.request.user_id, guard.request.address_id)
  };
  let address = env.backends.catalog.address(address_id).await?;
  let address = match address {
    Some(address) if address.user_id == user_id => address,
    _ => return Err(WorkflowError::validation("Delivery address not found")),
  };
  ctx.write().address = Some(address.snapshot());
  Ok(PipelineControl::Continue)
}

async fn validate_stock(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let guard = ctx.read();
  // Sizes of one product share a single stock count.
  let mut wanted: HashMap<Uuid, (i32, &CartLine)> = HashMap::new();
  for line in &guard.lines {
    if line.quantity <= 0 {
      return Err(WorkflowError::validation(format!("Invalid quantity for {}", line.product_name)));
    }
    if !line.is_active {
      return Err(WorkflowError::validation(format!(
        "{} is no longer available; remove it from your cart",
        line.product_name
      )));
    }
    wanted.entry(line.product_id).or_insert((0, line)).0 += line.quantity;
  }
  for (quantity, line) in wanted.values() {
    if line.stock_quantity < *quantity {
      return Err(WorkflowError::validation(format!(
        "Only {} left in stock for {}",
        line.stock_quantity.max(0),
        line.product_name
      )));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn quote_shipping(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, subtotal, weight_grams, pincode, cod) = {
    let guard = ctx.read();
    (
      guard.env.clone(),
      guard.subtotal,
      pricing::cart_weight_grams(&guard.lines),
      guard.address.as_ref().map(|a| a.pincode.clone()).unwrap_or_default(),
      guard.request.payment_method == PaymentMethod::Cod,
    )
  };

  let fee = if pricing::qualifies_for_free_shipping(&env.settings, subtotal) {
    0
  } else {
    let query = RateQuery {
      destination_pincode: pincode,
      weight_grams,
      cod,
    };
    let quote = match env.backends.carrier.quote_rate(query).await {
      Ok(fee) => Some(fee),
      Err(e) => {
        warn!(error = %e, "Carrier rate unavailable; using flat shipping fee.");
        None
      }
    };
    pricing::shipping_fee(&env.settings, subtotal, quote)
  };

  ctx.write().shipping_fee = fee;
  Ok(PipelineControl::Continue)
}

async fn apply_coupon(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, code, subtotal, client_discount) = {
    let guard = ctx.read();
    (
      guard.env.clone(),
      non_empty(guard.request.coupon_code.as_deref()),
      guard.subtotal,
      guard.request.client_discount,
    )
  };
  let Some(code) = code else {
    return Ok(PipelineControl::Continue);
  };

  let code = Coupon::normalize_code(&code);
  let coupon = env
    .backends
    .coupons
    .coupon(&code)
    .await?
    .ok_or_else(|| WorkflowError::validation("Invalid coupon code"))?;
  let discount = coupon.discount_for(subtotal, Utc::now()).map_err(WorkflowError::Validation)?;

  if let Some(claimed) = client_discount {
    if claimed != discount {
      warn!(coupon = %code, claimed, computed = discount, "Client coupon discount differs from server value.");
    }
  }

  let mut guard = ctx.write();
  guard.coupon_code = Some(code);
  guard.discount = discount;
  Ok(PipelineControl::Continue)
}

async fn compute_totals(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let mut guard = ctx.write();
  let settings = guard.env.settings.clone();
  let gift_message =
    pricing::normalize_gift_message(&settings, guard.request.gift_message.as_deref()).map_err(WorkflowError::Validation)?;
  let gift_fee = pricing::gift_wrap_fee(&settings, guard.request.gift_wrap);
  let totals = OrderTotals::compute(guard.subtotal, guard.shipping_fee, gift_fee, guard.discount);
  guard.gift_message = gift_message;
  guard.totals = Some(totals);
  Ok(PipelineControl::Continue)
}

async fn persist_order(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, new_order) = {
    let guard = ctx.read();
    let totals = guard
      .totals
      .ok_or_else(|| WorkflowError::validation("Order totals were not computed"))?;
    let shipping_address = guard
      .address
      .clone()
      .ok_or_else(|| WorkflowError::validation("Delivery address not found"))?;
    let items = guard
      .lines
      .iter()
      .map(|line| NewOrderItem {
        product_id: line.product_id,
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        size: line.size.clone(),
        weight_grams: line.weight_grams,
      })
      .collect();
    let new_order = NewOrder {
      order_number: Order::generate_order_number(Utc::now()),
      user_id: Some(guard.request.user_id),
      items,
      shipping_address,
      totals,
      gift_wrap: guard.request.gift_wrap,
      gift_message: guard.gift_message.clone(),
      coupon_code: guard.coupon_code.clone(),
      payment_method: guard.request.payment_method,
      delivery_time_slot: non_empty(guard.request.delivery_time_slot.as_deref()),
    };
    (guard.env.clone(), new_order)
  };

  let order = match env.backends.orders.insert_order(new_order).await {
    Ok(order) => order,
    // Stock or coupon usage ran out between validation and insert.
    Err(StoreError::Conflict(reason)) => return Err(WorkflowError::Validation(reason)),
    Err(e) => return Err(e.into()),
  };
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn confirm_cash_on_delivery(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.order.clone())
  };
  let Some(mut order) = order else {
    return Ok(PipelineControl::Continue);
  };
  if !order.status.can_transition_to(OrderStatus::Confirmed) {
    return Err(WorkflowError::IllegalOrderTransition {
      from: order.status,
      to: OrderStatus::Confirmed,
    });
  }
  order.status = OrderStatus::Confirmed;
  order.updated_at = Utc::now();
  env.backends.orders.save_order(&order).await?;
  info!(order_id = %order.id, "Cash-on-delivery order confirmed.");
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn clear_cart(ctx: ContextData<CheckoutCtx>) -> WorkflowResult<PipelineControl> {
  let (env, user_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.request.user_id)
  };
  // The order already exists; a stale cart is only an inconvenience.
  if let Err(e) = env.backends.catalog.clear_cart(user_id).await {
    warn!(%user_id, error = %e, "Failed to clear cart after checkout.");
  }
  Ok(PipelineControl::Continue)
}
