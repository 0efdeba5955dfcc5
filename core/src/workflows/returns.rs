// lustre/src/workflows/returns.rs

//! `requestReturn` and the admin-driven return transition pipeline.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{fetch_order, is_http_url, non_empty, restock_for, WorkflowEnv};
use crate::audit;
use crate::auth::{AdminAction, AdminRole};
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{
  AuditEntry, IssueType, NewReturnRequest, Order, OrderStatus, PaymentStatus, ReturnRequest, ReturnStatus,
  ShipmentDirection, ShipmentRequest,
};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};

/// A customer's return claim.
#[derive(Debug, Clone)]
pub struct ReturnClaim {
  pub user_id: Uuid,
  pub order_id: Uuid,
  pub reason: String,
  pub issue_type: IssueType,
  pub evidence_photos: Vec<String>,
  pub video_link: Option<String>,
}

#[instrument(name = "returns::request", skip(env, claim), fields(user_id = %claim.user_id, order_id = %claim.order_id))]
pub async fn request_return(env: &WorkflowEnv, claim: ReturnClaim) -> WorkflowResult<ReturnRequest> {
  let reason = non_empty(Some(claim.reason.as_str())).ok_or_else(|| WorkflowError::validation("A return reason is required"))?;
  if claim.evidence_photos.len() > env.settings.max_evidence_photos {
    return Err(WorkflowError::validation(format!(
      "At most {} evidence photos are allowed",
      env.settings.max_evidence_photos
    )));
  }
  if claim.evidence_photos.iter().any(|url| !is_http_url(url)) {
    return Err(WorkflowError::validation("Evidence photos must be http(s) links"));
  }
  let video_link = non_empty(claim.video_link.as_deref());
  if matches!(&video_link, Some(link) if !is_http_url(link)) {
    return Err(WorkflowError::validation("Video link must be an http(s) link"));
  }

  let mut order = fetch_order(env, claim.order_id).await?;
  if !order.is_owned_by(claim.user_id) {
    warn!(order_id = %order.id, "Return requested on another user's order.");
    return Err(WorkflowError::Unauthorized);
  }
  if order.status != OrderStatus::Delivered {
    return Err(WorkflowError::validation(format!(
      "Only delivered orders can be returned; order {} is {}",
      order.order_number, order.status
    )));
  }
  let delivered_at = order.delivered_at.unwrap_or(order.updated_at);
  if Utc::now() > delivered_at + Duration::days(env.settings.return_window_days) {
    return Err(WorkflowError::validation(format!(
      "The {}-day return window for order {} has closed",
      env.settings.return_window_days, order.order_number
    )));
  }

  let existing = env.backends.returns.returns_for_order(order.id).await?;
  if existing.iter().any(|r| r.status.occupies_order()) {
    return Err(WorkflowError::validation("A return is already open for this order"));
  }

  let request = env
    .backends
    .returns
    .insert_return(NewReturnRequest {
      order_id: order.id,
      user_id: claim.user_id,
      reason: reason.clone(),
      issue_type: claim.issue_type,
      evidence_photos: claim.evidence_photos,
      video_link,
    })
    .await?;

  order.status = OrderStatus::ReturnRequested;
  order.return_reason = Some(reason);
  order.return_status = Some(ReturnStatus::Requested);
  order.updated_at = Utc::now();
  env.backends.orders.save_order(&order).await?;

  info!(request_id = %request.id, "Return requested.");
  Ok(request)
}

/// Every return filed against an order, oldest first. Visible to the order's
/// owner and to admins who may view returns.
pub async fn returns_for_order(env: &WorkflowEnv, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Vec<ReturnRequest>> {
  let order = fetch_order(env, order_id).await?;
  if !order.is_owned_by(user_id) {
    env.gate.require(user_id, AdminAction::ViewReturns).await?;
  }
  let mut requests = env.backends.returns.returns_for_order(order.id).await?;
  requests.sort_by_key(|r| r.created_at);
  Ok(requests)
}

#[derive(Debug, Clone)]
pub struct ReturnUpdate {
  pub status: ReturnStatus,
  /// Appended to the admin notes. Doubles as the rejection reason.
  pub notes: Option<String>,
  /// Return the items to inventory; only once the item is back with us.
  pub restock: bool,
}

pub struct ReturnCtx {
  pub env: WorkflowEnv,
  pub admin_id: Uuid,
  pub request_id: Uuid,
  pub update: ReturnUpdate,
  pub role: Option<AdminRole>,
  pub request: Option<ReturnRequest>,
  pub order: Option<Order>,
  pub from: Option<ReturnStatus>,
  /// Set when this run flipped `restocked` and still owes the stock change.
  pub restock_claimed: bool,
}

pub type ReturnPipeline = Pipeline<ReturnCtx, WorkflowError>;

fn not_approving(ctx: &ContextData<ReturnCtx>) -> bool {
  let guard = ctx.read();
  guard.update.status != ReturnStatus::Approved || guard.from == Some(ReturnStatus::Approved)
}

fn not_restocking(ctx: &ContextData<ReturnCtx>) -> bool {
  !ctx.read().update.restock
}

pub fn return_transition_pipeline() -> ReturnPipeline {
  let approval_only: SkipCondition<ReturnCtx> = Arc::new(not_approving);
  let restock_only: SkipCondition<ReturnCtx> = Arc::new(not_restocking);
  let mut p = Pipeline::new(
    "return_transition",
    &[
      ("authorize", false, None),
      ("load_request", false, None),
      ("check_transition", false, None),
      ("schedule_pickup", false, Some(approval_only)),
      ("persist_transition", false, None),
      ("sync_order", false, None),
      ("apply_restock", false, Some(restock_only)),
    ],
  );
  p.on("authorize", authorize);
  p.on("load_request", load_request);
  p.on("check_transition", check_transition);
  p.on("schedule_pickup", schedule_pickup);
  p.on("persist_transition", persist_transition);
  p.on("sync_order", sync_order);
  p.on("apply_restock", apply_restock);
  p
}

#[instrument(name = "returns::update_status", skip(pipeline, env, update), fields(to = %update.status))]
pub async fn update_return_status(
  pipeline: &ReturnPipeline,
  env: WorkflowEnv,
  admin_id: Uuid,
  request_id: Uuid,
  update: ReturnUpdate,
) -> WorkflowResult<ReturnRequest> {
  let ctx = ContextData::new(ReturnCtx {
    env,
    admin_id,
    request_id,
    update,
    role: None,
    request: None,
    order: None,
    from: None,
    restock_claimed: false,
  });
  pipeline.run(ctx.clone()).await?;
  let request = ctx.write().request.take();
  request.ok_or_else(|| WorkflowError::not_found(format!("Return request {request_id}")))
}

/// The order status a return transition drags along, if any.
fn order_target(from: ReturnStatus, to: ReturnStatus) -> Option<OrderStatus> {
  if from == to {
    return None;
  }
  match to {
    ReturnStatus::Rejected => Some(OrderStatus::Delivered),
    ReturnStatus::Approved if from == ReturnStatus::Rejected => Some(OrderStatus::ReturnRequested),
    ReturnStatus::Refunded => Some(OrderStatus::Returned),
    _ => None,
  }
}

type Loaded = (WorkflowEnv, ReturnRequest, Order, ReturnUpdate);

fn loaded(ctx: &ContextData<ReturnCtx>) -> WorkflowResult<Loaded> {
  let guard = ctx.read();
  let request = guard
    .request
    .clone()
    .ok_or_else(|| WorkflowError::not_found(format!("Return request {}", guard.request_id)))?;
  let order = guard
    .order
    .clone()
    .ok_or_else(|| WorkflowError::not_found(format!("Order {}", request.order_id)))?;
  Ok((guard.env.clone(), request, order, guard.update.clone()))
}

async fn authorize(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, admin_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.admin_id)
  };
  let role = env.gate.require(admin_id, AdminAction::UpdateReturnStatus).await?;
  ctx.write().role = Some(role);
  Ok(PipelineControl::Continue)
}

async fn load_request(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, request_id) = {
    let guard = ctx.read();
    (guard.env.clone(), guard.request_id)
  };
  let request = env
    .backends
    .returns
    .return_request(request_id)
    .await?
    .ok_or_else(|| WorkflowError::not_found(format!("Return request {request_id}")))?;
  let order = fetch_order(&env, request.order_id).await?;
  let mut guard = ctx.write();
  guard.from = Some(request.status);
  guard.request = Some(request);
  guard.order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn check_transition(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, request, order, update) = loaded(&ctx)?;
  let (admin_id, role) = {
    let guard = ctx.read();
    (guard.admin_id, guard.role)
  };
  let (from, to) = (request.status, update.status);

  // Same status: a notes or restock-only update.
  if from != to && !from.can_transition_to(to) {
    return Err(WorkflowError::IllegalReturnTransition { from, to });
  }

  if from.is_override(to) {
    if !role.is_some_and(|r| r.permits(AdminAction::OverrideReturnRejection)) {
      warn!(%admin_id, request_id = %request.id, "Return re-approval denied for role.");
      return Err(WorkflowError::Unauthorized);
    }
    let siblings = env.backends.returns.returns_for_order(request.order_id).await?;
    if siblings.iter().any(|r| r.id != request.id && r.status.occupies_order()) {
      return Err(WorkflowError::validation("Another return is already open for this order"));
    }
  }

  if let Some(target) = order_target(from, to) {
    if !order.status.can_transition_to(target) {
      return Err(WorkflowError::IllegalOrderTransition {
        from: order.status,
        to: target,
      });
    }
  }

  if to == ReturnStatus::Rejected && from != to && non_empty(update.notes.as_deref()).is_none() {
    return Err(WorkflowError::validation("A rejection reason is required"));
  }
  if update.restock && !from.allows_restock() {
    return Err(WorkflowError::validation(
      "Stock can only be returned once the item has been received",
    ));
  }
  Ok(PipelineControl::Continue)
}

async fn schedule_pickup(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, request, order, _) = loaded(&ctx)?;
  let shipment = env
    .backends
    .carrier
    .create_shipment(ShipmentRequest {
      reference: format!("RET-{}", order.order_number),
      direction: ShipmentDirection::Reverse,
      address: order.shipping_address.clone(),
      weight_grams: order.total_weight_grams(),
      cod_amount: None,
      declared_value: order.total,
    })
    .await
    .map_err(|e| WorkflowError::upstream("carrier", e))?;
  info!(request_id = %request.id, waybill = %shipment.waybill, "Reverse pickup booked.");
  if let Some(request) = ctx.write().request.as_mut() {
    request.tracking_number = Some(shipment.waybill);
  }
  Ok(PipelineControl::Continue)
}

/// Runs after `restocked` is saved, so a retry can never add the stock twice.
/// A failed stock change clears the flag again.
async fn apply_restock(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, mut request, order, _) = loaded(&ctx)?;
  if !ctx.read().restock_claimed {
    info!(request_id = %request.id, "Items already restocked; skipping.");
    return Ok(PipelineControl::Continue);
  }
  if let Err(e) = env.backends.catalog.restock(&restock_for(&order)).await {
    error!(request_id = %request.id, error = %e, "Restock failed; clearing the restocked flag.");
    request.restocked = false;
    request.updated_at = Utc::now();
    env.backends.returns.save_return(&request).await?;
    ctx.write().request = Some(request);
    return Err(e.into());
  }
  info!(request_id = %request.id, items = order.items.len(), "Returned items restocked.");
  Ok(PipelineControl::Continue)
}

async fn persist_transition(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, mut request, _, update) = loaded(&ctx)?;
  let admin_id = ctx.read().admin_id;
  let from = request.status;
  let to = update.status;
  let now = Utc::now();

  if let Some(notes) = non_empty(update.notes.as_deref()) {
    request.append_note(&notes);
  }
  let restock_claimed = update.restock && !request.restocked;
  if restock_claimed {
    request.restocked = true;
  }
  request.status = to;
  request.updated_at = now;
  if from != to {
    match to {
      ReturnStatus::Rejected => request.rejection_reason = non_empty(update.notes.as_deref()),
      ReturnStatus::Approved => request.rejection_reason = None,
      ReturnStatus::Received => request.returned_at = Some(now),
      ReturnStatus::Refunded => request.refunded_at = Some(now),
      _ => {}
    }
  }
  env.backends.returns.save_return(&request).await?;
  info!(request_id = %request.id, %from, %to, "Return status updated.");

  if from.is_override(to) {
    audit::record(
      env.backends.audit.as_ref(),
      AuditEntry::new(admin_id, "reapprove_return", request.id.to_string(), request.admin_notes.clone()),
    )
    .await?;
  }

  let mut guard = ctx.write();
  guard.request = Some(request);
  guard.restock_claimed = restock_claimed;
  Ok(PipelineControl::Continue)
}

async fn sync_order(ctx: ContextData<ReturnCtx>) -> WorkflowResult<PipelineControl> {
  let (env, request, mut order, _) = loaded(&ctx)?;
  let from = ctx.read().from;
  if from == Some(request.status) {
    return Ok(PipelineControl::Continue);
  }

  let now = Utc::now();
  order.return_status = Some(request.status);
  order.updated_at = now;
  let target = from.and_then(|from| order_target(from, request.status));
  if let Some(target) = target {
    if !order.status.can_transition_to(target) {
      return Err(WorkflowError::IllegalOrderTransition {
        from: order.status,
        to: target,
      });
    }
    order.status = target;
  }
  if request.status == ReturnStatus::Approved && from == Some(ReturnStatus::Rejected) {
    order.return_reason = Some(request.reason.clone());
  }
  if request.status == ReturnStatus::Refunded {
    order.returned_at = Some(now);
    if order.payment_status == PaymentStatus::Paid {
      order.payment_status = PaymentStatus::Refunded;
    }
  }
  env.backends.orders.save_order(&order).await?;
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}
