// lustre/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::money::Paise;
use super::payment::PaymentProvider;
use super::returns::ReturnStatus;
use super::UnknownVariant;

/// Order lifecycle. Return sub-states sit on top of `Delivered` and are only
/// reachable through the return workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Packed,
  Shipped,
  Delivered,
  Cancelled,
  ReturnRequested,
  Returned,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 8] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Packed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
    OrderStatus::ReturnRequested,
    OrderStatus::Returned,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Packed => "packed",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::ReturnRequested => "return_requested",
      OrderStatus::Returned => "returned",
    }
  }

  /// The transition table: every status a move *into* `self` may start from.
  pub fn legal_predecessors(self) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match self {
      Pending => &[],
      Confirmed => &[Pending],
      Packed => &[Confirmed],
      Shipped => &[Packed],
      // ReturnRequested -> Delivered happens when the return is rejected.
      Delivered => &[Shipped, ReturnRequested],
      Cancelled => &[Pending, Confirmed, Packed],
      ReturnRequested => &[Delivered],
      Returned => &[ReturnRequested],
    }
  }

  pub fn can_transition_to(self, target: OrderStatus) -> bool {
    target.legal_predecessors().contains(&self)
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
  }

  /// Statuses owned by the return workflow; admins cannot set or leave them directly.
  pub fn is_return_managed(self) -> bool {
    matches!(self, OrderStatus::ReturnRequested | OrderStatus::Returned)
  }

  pub fn customer_cancellable(self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| UnknownVariant::new("order status", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  Online,
  Cod,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Online => "online",
      PaymentMethod::Cod => "cod",
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentMethod {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "online" => Ok(PaymentMethod::Online),
      "cod" => Ok(PaymentMethod::Cod),
      other => Err(UnknownVariant::new("payment method", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  /// Verification was ambiguous (signature, gateway order or amount mismatch).
  /// Needs manual reconciliation; never auto-resolved.
  Flagged,
  Refunded,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Flagged => "flagged",
      PaymentStatus::Refunded => "refunded",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(PaymentStatus::Pending),
      "paid" => Ok(PaymentStatus::Paid),
      "failed" => Ok(PaymentStatus::Failed),
      "flagged" => Ok(PaymentStatus::Flagged),
      "refunded" => Ok(PaymentStatus::Refunded),
      other => Err(UnknownVariant::new("payment status", other)),
    }
  }
}

/// Denormalised copy of the delivery address taken at checkout. Editing the
/// saved address later does not touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
  pub full_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  /// Catalog price at checkout time.
  pub unit_price: Paise,
  pub size: Option<String>,
  pub weight_grams: i32,
}

impl OrderItem {
  pub fn line_total(&self) -> Paise {
    self.unit_price * Paise::from(self.quantity)
  }
}

/// Money breakdown fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
  pub subtotal: Paise,
  pub shipping_fee: Paise,
  pub gift_wrap_fee: Paise,
  pub discount: Paise,
  pub total: Paise,
}

impl OrderTotals {
  /// `total = subtotal + shipping + gift wrap - discount`, with the discount
  /// clamped to `[0, subtotal]`.
  pub fn compute(subtotal: Paise, shipping_fee: Paise, gift_wrap_fee: Paise, discount: Paise) -> Self {
    let discount = discount.clamp(0, subtotal.max(0));
    Self {
      subtotal,
      shipping_fee,
      gift_wrap_fee,
      discount,
      total: subtotal + shipping_fee + gift_wrap_fee - discount,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  /// `None` for guest orders.
  pub user_id: Option<Uuid>,
  pub items: Vec<OrderItem>,
  pub shipping_address: ShippingAddress,
  pub subtotal: Paise,
  pub shipping_fee: Paise,
  pub gift_wrap: bool,
  pub gift_message: Option<String>,
  pub gift_wrap_fee: Paise,
  pub coupon_code: Option<String>,
  pub discount: Paise,
  pub total: Paise,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub payment_provider: Option<PaymentProvider>,
  pub payment_gateway_order_id: Option<String>,
  pub payment_id: Option<String>,
  pub payment_attempts: i32,
  pub payment_error_reason: Option<String>,
  pub status: OrderStatus,
  pub tracking_number: Option<String>,
  pub delivery_time_slot: Option<String>,
  pub cancellation_reason: Option<String>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub return_reason: Option<String>,
  pub return_status: Option<ReturnStatus>,
  pub returned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn totals(&self) -> OrderTotals {
    OrderTotals {
      subtotal: self.subtotal,
      shipping_fee: self.shipping_fee,
      gift_wrap_fee: self.gift_wrap_fee,
      discount: self.discount,
      total: self.total,
    }
  }

  pub fn is_owned_by(&self, user_id: Uuid) -> bool {
    self.user_id == Some(user_id)
  }

  pub fn total_weight_grams(&self) -> i32 {
    self.items.iter().map(|i| i.weight_grams * i.quantity).sum()
  }

  /// Human-readable number, e.g. `LS-20261016-3F9A1C`.
  pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("LS-{}-{}", now.format("%Y%m%d"), suffix)
  }
}

/// Insert payload. The store assigns ids, timestamps and the initial
/// `pending` statuses, and applies stock/coupon bookkeeping atomically.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order_number: String,
  pub user_id: Option<Uuid>,
  pub items: Vec<NewOrderItem>,
  pub shipping_address: ShippingAddress,
  pub totals: OrderTotals,
  pub gift_wrap: bool,
  pub gift_message: Option<String>,
  pub coupon_code: Option<String>,
  pub payment_method: PaymentMethod,
  pub delivery_time_slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Paise,
  pub size: Option<String>,
  pub weight_grams: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
  pub user_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
  pub limit: Option<i64>,
}
