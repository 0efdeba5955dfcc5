// lustre/src/ports.rs

//! Seams to the outside world. The storefront implements these over
//! PostgreSQL and HTTP; `crate::memory` and `crate::sandbox` implement them
//! in-process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AdminRole;
use crate::error::{StoreResult, UpstreamError};
use crate::model::{
  Address, AuditEntry, CartLine, Coupon, CustomerContact, GatewayOrder, GatewayOrderRequest, GatewayPayment,
  NewOrder, NewPushSubscription, NewReturnRequest, NotificationTarget, Order, OrderFilter, Paise, PaymentCallback,
  Product, PushOutcome, PushPayload, PushSubscription, RateQuery, ReturnRequest, Shipment, ShipmentRequest,
  StockAdjustment, TrackingScan,
};

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Cart rows joined with live product price and stock.
  async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;
  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()>;
  async fn address(&self, address_id: Uuid) -> StoreResult<Option<Address>>;
  async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;
  async fn restock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()>;
  /// Users whose non-empty cart has not changed since `idle_since`.
  async fn idle_carts(&self, idle_since: DateTime<Utc>) -> StoreResult<Vec<Uuid>>;
  async fn customer_contact(&self, user_id: Uuid) -> StoreResult<Option<CustomerContact>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Writes the order and its items, decrements stock and bumps the coupon
  /// usage counter in one unit. Returns `StoreError::Conflict` and writes
  /// nothing when stock or the coupon's usage limit is exhausted.
  async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order>;
  async fn order(&self, order_id: Uuid) -> StoreResult<Option<Order>>;
  /// Persists the mutable order fields. Items are immutable after insert.
  async fn save_order(&self, order: &Order) -> StoreResult<()>;
  /// Deletes the order with its items and return requests.
  async fn delete_order(&self, order_id: Uuid) -> StoreResult<bool>;
  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait CouponStore: Send + Sync {
  /// Lookup by normalised (upper-case) code.
  async fn coupon(&self, code: &str) -> StoreResult<Option<Coupon>>;
}

#[async_trait]
pub trait ReturnStore: Send + Sync {
  async fn insert_return(&self, request: NewReturnRequest) -> StoreResult<ReturnRequest>;
  async fn return_request(&self, request_id: Uuid) -> StoreResult<Option<ReturnRequest>>;
  async fn returns_for_order(&self, order_id: Uuid) -> StoreResult<Vec<ReturnRequest>>;
  async fn save_return(&self, request: &ReturnRequest) -> StoreResult<()>;
}

#[async_trait]
pub trait AdminDirectory: Send + Sync {
  async fn role_of(&self, user_id: Uuid) -> StoreResult<Option<AdminRole>>;
  async fn set_role(&self, user_id: Uuid, role: AdminRole) -> StoreResult<()>;
  async fn remove_role(&self, user_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait PushRegistry: Send + Sync {
  async fn subscriptions(&self, target: NotificationTarget) -> StoreResult<Vec<PushSubscription>>;
  /// Keyed by endpoint; re-subscribing refreshes keys and owner.
  async fn upsert_subscription(&self, subscription: NewPushSubscription) -> StoreResult<PushSubscription>;
  async fn delete_subscriptions(&self, ids: &[Uuid]) -> StoreResult<usize>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
  async fn record(&self, entry: AuditEntry) -> StoreResult<()>;
}

/// One hosted-checkout payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Public key handed to the client widget.
  fn key_id(&self) -> &str;
  async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder, UpstreamError>;
  async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, UpstreamError>;
  fn verify_signature(&self, callback: &PaymentCallback) -> bool;
}

#[async_trait]
pub trait Carrier: Send + Sync {
  async fn quote_rate(&self, query: RateQuery) -> Result<Paise, UpstreamError>;
  async fn create_shipment(&self, request: ShipmentRequest) -> Result<Shipment, UpstreamError>;
  async fn track(&self, waybill: &str) -> Result<Vec<TrackingScan>, UpstreamError>;
  async fn label_url(&self, waybill: &str) -> Result<String, UpstreamError>;
}

/// Delivers one payload to one subscription. Implementations classify the
/// push service response, they never return errors.
#[async_trait]
pub trait PushSender: Send + Sync {
  async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> PushOutcome;
}

/// Every store and provider a workflow may reach.
#[derive(Clone)]
pub struct Backends {
  pub catalog: Arc<dyn CatalogStore>,
  pub orders: Arc<dyn OrderStore>,
  pub coupons: Arc<dyn CouponStore>,
  pub returns: Arc<dyn ReturnStore>,
  pub admins: Arc<dyn AdminDirectory>,
  pub push_registry: Arc<dyn PushRegistry>,
  pub audit: Arc<dyn AuditSink>,
  pub carrier: Arc<dyn Carrier>,
  pub push: Arc<dyn PushSender>,
}

impl Backends {
  /// Wires a single store that implements every store port.
  pub fn from_store<S>(store: Arc<S>, carrier: Arc<dyn Carrier>, push: Arc<dyn PushSender>) -> Self
  where
    S: CatalogStore + OrderStore + CouponStore + ReturnStore + AdminDirectory + PushRegistry + AuditSink + 'static,
  {
    Self {
      catalog: store.clone(),
      orders: store.clone(),
      coupons: store.clone(),
      returns: store.clone(),
      admins: store.clone(),
      push_registry: store.clone(),
      audit: store,
      carrier,
      push,
    }
  }
}
