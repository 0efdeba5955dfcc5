// lustre/src/workflows/fulfillment.rs

//! Admin status changes, customer cancellation, deletion and order reads.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{fetch_order, non_empty, restock_for, WorkflowEnv};
use crate::audit;
use crate::auth::AdminAction;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
  AuditEntry, NotificationTarget, Order, OrderFilter, OrderStatus, PaymentMethod, PaymentStatus, ShipmentDirection,
  ShipmentRequest, TrackingScan,
};
use crate::notify::Templates;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};

/// Who is driving a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
  Admin(Uuid),
  /// Customers may only cancel their own orders.
  Customer(Uuid),
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
  pub status: OrderStatus,
  /// Used for `shipped`; a shipment is booked with the carrier when absent.
  pub tracking_number: Option<String>,
  /// Required for `cancelled`.
  pub cancellation_reason: Option<String>,
}

pub struct FulfillmentCtx {
  pub env: WorkflowEnv,
  pub actor: Actor,
  pub order_id: Uuid,
  pub update: StatusUpdate,
  pub order: Option<Order>,
  pub previous: Option<OrderStatus>,
}

pub type FulfillmentPipeline = Pipeline<FulfillmentCtx, WorkflowError>;

fn not_shipping(ctx: &ContextData<FulfillmentCtx>) -> bool {
  ctx.read().update.status != OrderStatus::Shipped
}

fn not_cancelling(ctx: &ContextData<FulfillmentCtx>) -> bool {
  ctx.read().update.status != OrderStatus::Cancelled
}

pub fn fulfillment_pipeline() -> FulfillmentPipeline {
  let shipping_only: SkipCondition<FulfillmentCtx> = Arc::new(not_shipping);
  let cancel_only: SkipCondition<FulfillmentCtx> = Arc::new(not_cancelling);
  let mut p = Pipeline::new(
    "fulfillment",
    &[
      ("authorize", false, None),
      ("load_order", false, None),
      ("check_transition", false, None),
      ("book_shipment", false, Some(shipping_only)),
      ("apply_status", false, None),
      ("restock_cancelled", false, Some(cancel_only)),
      ("notify_customer", true, None),
    ],
  );
  p.on("authorize", authorize);
  p.on("load_order", load_order);
  p.on("check_transition", check_transition);
  p.on("book_shipment", book_shipment);
  p.on("apply_status", apply_status);
  p.on("restock_cancelled", restock_cancelled);
  p.on("notify_customer", notify_customer);
  p
}

#[instrument(name = "fulfillment::update_status", skip(pipeline, env, update), fields(to = %update.status))]
pub async fn update_status(
  pipeline: &FulfillmentPipeline,
  env: WorkflowEnv,
  actor: Actor,
  order_id: Uuid,
  update: StatusUpdate,
) -> WorkflowResult<Order> {
  let ctx = ContextData::new(FulfillmentCtx {
    env,
    actor,
    order_id,
    update,
    order: None,
    previous: None,
  });
  pipeline.run(ctx.clone()).await?;
  let order = ctx.write().order.take();
  order.ok_or_else(|| WorkflowError::not_found(format!("Order {order_id}")))
}

fn ctx_order(ctx: &ContextData<FulfillmentCtx>) -> WorkflowResult<(WorkflowEnv, Order, StatusUpdate)> {
  let guard = ctx.read();
  let order = guard
    .order
    .clone()
    .ok_or_else(|| WorkflowError::not_found(format!("Order {}", guard.order_id)))?;
  Ok((guard.env.clone(), order, guard.update.clone()))
}

async fn authorize(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, actor, target) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.actor, guard.update.status)
  };
  match actor {
    Actor::Admin(admin_id) => {
      env.gate.require(admin_id, AdminAction::UpdateOrderStatus).await?;
    }
    Actor::Customer(user_id) if target != OrderStatus::Cancelled => {
      warn!(%user_id, to = %target, "Customer attempted an admin status change.");
      return Err(WorkflowError::Unauthorized);
    }
    Actor::Customer(_) => {}
  }
  Ok(PipelineControl::Continue)
}

async fn load_order(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, actor, order_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.actor, guard.order_id)
  };
  let order = fetch_order(&env, order_id).await?;
  if let Actor::Customer(user_id) = actor {
    if !order.is_owned_by(user_id) {
      warn!(%user_id, %order_id, "Customer attempted to cancel another user's order.");
      return Err(WorkflowError::Unauthorized);
    }
  }
  let mut guard = ctx.write();
  guard.previous = Some(order.status);
  guard.order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn check_transition(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let actor = ctx.read().actor;
  let (_, order, update) = ctx_order(&ctx)?;
  let (from, to) = (order.status, update.status);

  if from.is_return_managed() || to.is_return_managed() || !from.can_transition_to(to) {
    return Err(WorkflowError::IllegalOrderTransition { from, to });
  }
  if matches!(actor, Actor::Customer(_)) && !from.customer_cancellable() {
    return Err(WorkflowError::validation(format!(
      "Order {} is already {} and can no longer be cancelled",
      order.order_number, from
    )));
  }
  if to == OrderStatus::Cancelled && non_empty(update.cancellation_reason.as_deref()).is_none() {
    return Err(WorkflowError::validation("A cancellation reason is required"));
  }
  Ok(PipelineControl::Continue)
}

async fn book_shipment(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, update) = ctx_order(&ctx)?;
  let waybill = match non_empty(update.tracking_number.as_deref()) {
    Some(tracking_number) => tracking_number,
    None => {
      let request = ShipmentRequest {
        reference: order.order_number.clone(),
        direction: ShipmentDirection::Forward,
        address: order.shipping_address.clone(),
        weight_grams: order.total_weight_grams(),
        cod_amount: (order.payment_method == PaymentMethod::Cod).then_some(order.total),
        declared_value: order.total,
      };
      let shipment = env
        .backends
        .carrier
        .create_shipment(request)
        .await
        .map_err(|e| WorkflowError::upstream("carrier", e))?;
      info!(order_id = %order.id, waybill = %shipment.waybill, "Forward shipment booked.");
      shipment.waybill
    }
  };
  if let Some(order) = ctx.write().order.as_mut() {
    order.tracking_number = Some(waybill);
  }
  Ok(PipelineControl::Continue)
}

async fn apply_status(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, mut order, update) = ctx_order(&ctx)?;
  let now = Utc::now();
  order.status = update.status;
  order.updated_at = now;
  match update.status {
    OrderStatus::Delivered => {
      order.delivered_at = Some(now);
      // Cash is collected at the door.
      if order.payment_method == PaymentMethod::Cod && order.payment_status == PaymentStatus::Pending {
        order.payment_status = PaymentStatus::Paid;
      }
    }
    OrderStatus::Cancelled => {
      order.cancellation_reason = non_empty(update.cancellation_reason.as_deref());
      order.cancelled_at = Some(now);
    }
    _ => {}
  }
  env.backends.orders.save_order(&order).await?;
  info!(order_id = %order.id, status = %order.status, "Order status updated.");
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn restock_cancelled(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, _) = ctx_order(&ctx)?;
  let adjustments = restock_for(&order);
  // The cancellation is already saved; a failed restock needs manual correction.
  if let Err(e) = env.backends.catalog.restock(&adjustments).await {
    error!(order_id = %order.id, error = %e, "Failed to restock cancelled order.");
  }
  Ok(PipelineControl::Continue)
}

async fn notify_customer(ctx: ContextData<FulfillmentCtx>) -> WorkflowResult<PipelineControl> {
  let (env, order, _) = ctx_order(&ctx)?;
  let Some(user_id) = order.user_id else {
    return Ok(PipelineControl::Continue);
  };
  let templates = Templates::new(&env.settings);
  let payload = match order.status {
    OrderStatus::Shipped => templates.order_shipped(&order),
    OrderStatus::Delivered => templates.order_delivered(&order),
    OrderStatus::Cancelled => templates.order_cancelled(&order),
    _ => return Ok(PipelineControl::Continue),
  };
  env.dispatcher.notify_quietly(NotificationTarget::User(user_id), &payload).await;
  Ok(PipelineControl::Continue)
}

/// Removes an order with its items and return requests. Top role only.
#[instrument(name = "fulfillment::delete_order", skip(env))]
pub async fn delete_order(env: &WorkflowEnv, admin_id: Uuid, order_id: Uuid) -> WorkflowResult<()> {
  env.gate.require(admin_id, AdminAction::DeleteOrder).await?;
  let order = fetch_order(env, order_id).await?;
  if !env.backends.orders.delete_order(order_id).await? {
    return Err(WorkflowError::not_found(format!("Order {order_id}")));
  }
  audit::record(
    env.backends.audit.as_ref(),
    AuditEntry::new(
      admin_id,
      "delete_order",
      order_id.to_string(),
      Some(format!("{} ({})", order.order_number, order.status)),
    ),
  )
  .await
}

/// The order if `user_id` owns it or may view all orders.
pub async fn order_for(env: &WorkflowEnv, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Order> {
  let order = fetch_order(env, order_id).await?;
  if !order.is_owned_by(user_id) {
    env.gate.require(user_id, AdminAction::ViewOrders).await?;
  }
  Ok(order)
}

/// Admins with `ViewOrders` see every order; everyone else only their own.
pub async fn list_orders(env: &WorkflowEnv, user_id: Uuid, filter: OrderFilter) -> WorkflowResult<Vec<Order>> {
  let principal = env.gate.resolve(user_id).await?;
  let mut filter = filter;
  if !principal.can(AdminAction::ViewOrders) {
    filter.user_id = Some(user_id);
  }
  Ok(env.backends.orders.list_orders(&filter).await?)
}

pub async fn track_order(env: &WorkflowEnv, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Vec<TrackingScan>> {
  let order = order_for(env, user_id, order_id).await?;
  let waybill = order
    .tracking_number
    .ok_or_else(|| WorkflowError::not_found(format!("Shipment for order {}", order.order_number)))?;
  env
    .backends
    .carrier
    .track(&waybill)
    .await
    .map_err(|e| WorkflowError::upstream("carrier", e))
}

pub async fn shipping_label(env: &WorkflowEnv, admin_id: Uuid, order_id: Uuid) -> WorkflowResult<String> {
  env.gate.require(admin_id, AdminAction::UpdateOrderStatus).await?;
  let order = fetch_order(env, order_id).await?;
  let waybill = order
    .tracking_number
    .ok_or_else(|| WorkflowError::not_found(format!("Shipment for order {}", order.order_number)))?;
  env
    .backends
    .carrier
    .label_url(&waybill)
    .await
    .map_err(|e| WorkflowError::upstream("carrier", e))
}
