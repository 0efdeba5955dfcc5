// lustre/src/model/mod.rs

//! Entities owned by the persistent store. Workflows never keep these in
//! memory across requests; every operation re-reads and re-writes them.

pub mod audit;
pub mod catalog;
pub mod coupon;
pub mod money;
pub mod order;
pub mod payment;
pub mod push;
pub mod returns;
pub mod shipment;

pub use audit::AuditEntry;
pub use catalog::{Address, CartLine, CustomerContact, Product, StockAdjustment};
pub use coupon::{Coupon, DiscountType};
pub use money::{format_inr, Paise, CURRENCY};
pub use order::{
  NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus,
  ShippingAddress,
};
pub use payment::{GatewayOrder, GatewayOrderRequest, GatewayPayment, GatewayPaymentStatus, PaymentCallback, PaymentProvider, PaymentWidget, Prefill};
pub use push::{NewPushSubscription, NotificationTarget, PushOutcome, PushPayload, PushSubscription};
pub use returns::{IssueType, NewReturnRequest, ReturnRequest, ReturnStatus};
pub use shipment::{RateQuery, Shipment, ShipmentDirection, ShipmentRequest, TrackingScan};

/// Raised by the `FromStr` impls of the status enums when a stored or posted
/// value is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
  pub kind: &'static str,
  pub value: String,
}

impl UnknownVariant {
  pub(crate) fn new(kind: &'static str, value: &str) -> Self {
    Self {
      kind,
      value: value.to_string(),
    }
  }
}
