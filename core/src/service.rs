// lustre/src/service.rs

//! `Commerce`: the entry point the storefront holds. Builds every workflow
//! pipeline once and runs them per request over a fresh context.

use chrono::Duration;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{AdminGate, AdminRole, Principal, RoleCache};
use crate::error::WorkflowResult;
use crate::model::{
  NewPushSubscription, Order, OrderFilter, PaymentCallback, PaymentWidget, PushSubscription, ReturnRequest,
  TrackingScan,
};
use crate::notify::{DispatchReport, NotificationDispatcher};
use crate::ports::Backends;
use crate::settings::StoreSettings;
use crate::workflows::checkout::{self, CheckoutPipeline, CheckoutRequest};
use crate::workflows::fulfillment::{self, Actor, FulfillmentPipeline, StatusUpdate};
use crate::workflows::payment::{self, PaymentRouter, VerifyOutcome, VerifyPipeline};
use crate::workflows::returns::{self, ReturnClaim, ReturnPipeline, ReturnUpdate};
use crate::workflows::{engagement, WorkflowEnv};

pub struct Commerce {
  env: WorkflowEnv,
  checkout: CheckoutPipeline,
  verify: VerifyPipeline,
  fulfillment: FulfillmentPipeline,
  returns: ReturnPipeline,
}

impl Commerce {
  pub fn new(backends: Backends, settings: StoreSettings, payments: PaymentRouter) -> Self {
    let settings = Arc::new(settings);
    let cache = Arc::new(RoleCache::new(settings.role_cache_ttl, settings.role_cache_capacity));
    let gate = AdminGate::new(backends.admins.clone(), backends.audit.clone()).with_cache(cache);
    let dispatcher = NotificationDispatcher::new(backends.push_registry.clone(), backends.push.clone());

    let commerce = Self {
      env: WorkflowEnv {
        backends,
        settings,
        payments,
        gate,
        dispatcher,
      },
      checkout: checkout::checkout_pipeline(),
      verify: payment::verify_payment_pipeline(),
      fulfillment: fulfillment::fulfillment_pipeline(),
      returns: returns::return_transition_pipeline(),
    };
    info!(
      pipelines = ?[
        commerce.checkout.name(),
        commerce.verify.name(),
        commerce.fulfillment.name(),
        commerce.returns.name()
      ],
      "Commerce workflows ready."
    );
    commerce
  }

  pub fn env(&self) -> &WorkflowEnv {
    &self.env
  }

  pub fn settings(&self) -> &StoreSettings {
    &self.env.settings
  }

  pub fn gate(&self) -> &AdminGate {
    &self.env.gate
  }

  pub fn dispatcher(&self) -> &NotificationDispatcher {
    &self.env.dispatcher
  }

  // --- orders ---

  pub async fn create_order(&self, request: CheckoutRequest) -> WorkflowResult<Order> {
    checkout::create_order(&self.checkout, self.env.clone(), request).await
  }

  pub async fn initiate_payment(&self, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Option<PaymentWidget>> {
    payment::initiate_payment(&self.env, user_id, order_id).await
  }

  pub async fn verify_payment(
    &self,
    user_id: Uuid,
    order_id: Uuid,
    callback: PaymentCallback,
  ) -> WorkflowResult<VerifyOutcome> {
    payment::verify_payment(&self.verify, self.env.clone(), user_id, order_id, callback).await
  }

  pub async fn update_order_status(&self, admin_id: Uuid, order_id: Uuid, update: StatusUpdate) -> WorkflowResult<Order> {
    fulfillment::update_status(&self.fulfillment, self.env.clone(), Actor::Admin(admin_id), order_id, update).await
  }

  pub async fn cancel_order(&self, user_id: Uuid, order_id: Uuid, reason: String) -> WorkflowResult<Order> {
    let update = StatusUpdate {
      status: crate::model::OrderStatus::Cancelled,
      tracking_number: None,
      cancellation_reason: Some(reason),
    };
    fulfillment::update_status(&self.fulfillment, self.env.clone(), Actor::Customer(user_id), order_id, update).await
  }

  pub async fn delete_order(&self, admin_id: Uuid, order_id: Uuid) -> WorkflowResult<()> {
    fulfillment::delete_order(&self.env, admin_id, order_id).await
  }

  pub async fn order_for(&self, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Order> {
    fulfillment::order_for(&self.env, user_id, order_id).await
  }

  pub async fn list_orders(&self, user_id: Uuid, filter: OrderFilter) -> WorkflowResult<Vec<Order>> {
    fulfillment::list_orders(&self.env, user_id, filter).await
  }

  pub async fn track_order(&self, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Vec<TrackingScan>> {
    fulfillment::track_order(&self.env, user_id, order_id).await
  }

  pub async fn shipping_label(&self, admin_id: Uuid, order_id: Uuid) -> WorkflowResult<String> {
    fulfillment::shipping_label(&self.env, admin_id, order_id).await
  }

  // --- returns ---

  pub async fn request_return(&self, claim: ReturnClaim) -> WorkflowResult<ReturnRequest> {
    returns::request_return(&self.env, claim).await
  }

  pub async fn returns_for_order(&self, user_id: Uuid, order_id: Uuid) -> WorkflowResult<Vec<ReturnRequest>> {
    returns::returns_for_order(&self.env, user_id, order_id).await
  }

  pub async fn update_return_status(
    &self,
    admin_id: Uuid,
    request_id: Uuid,
    update: ReturnUpdate,
  ) -> WorkflowResult<ReturnRequest> {
    returns::update_return_status(&self.returns, self.env.clone(), admin_id, request_id, update).await
  }

  // --- notifications ---

  pub async fn subscribe_push(&self, subscription: NewPushSubscription) -> WorkflowResult<PushSubscription> {
    self.env.dispatcher.subscribe(subscription).await
  }

  pub async fn announce_product(&self, admin_id: Uuid, product_id: Uuid) -> WorkflowResult<DispatchReport> {
    engagement::announce_product(&self.env, admin_id, product_id).await
  }

  pub async fn remind_abandoned_carts(&self, admin_id: Uuid, idle_for: Duration) -> WorkflowResult<DispatchReport> {
    engagement::remind_abandoned_carts(&self.env, admin_id, idle_for).await
  }

  // --- admin roles ---

  pub async fn principal(&self, user_id: Uuid) -> WorkflowResult<Principal> {
    self.env.gate.resolve(user_id).await
  }

  pub async fn assign_role(&self, actor: Uuid, user_id: Uuid, role: AdminRole) -> WorkflowResult<()> {
    self.env.gate.assign_role(actor, user_id, role).await
  }

  pub async fn revoke_role(&self, actor: Uuid, user_id: Uuid) -> WorkflowResult<()> {
    self.env.gate.revoke_role(actor, user_id).await
  }
}
