// storefront/src/db/rows.rs

//! Row shapes as stored, and their conversion into `lustre::model` types.
//! Enum columns are text; an unknown value is a backend error.

use chrono::{DateTime, Utc};
use lustre::model::{
  Address, CartLine, Coupon, CustomerContact, Order, OrderItem, Paise, PushSubscription, ReturnRequest, ShippingAddress,
};
use lustre::{StoreError, StoreResult};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
  StoreError::from(anyhow::Error::from(err))
}

pub(crate) fn parse<T>(raw: &str) -> StoreResult<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  raw.parse::<T>().map_err(|e| StoreError::from(anyhow::Error::from(e)))
}

fn parse_opt<T>(raw: Option<&str>) -> StoreResult<Option<T>>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  raw.map(parse).transpose()
}

#[derive(Debug, FromRow)]
pub(crate) struct CartLineRow {
  pub product_id: Uuid,
  pub product_name: String,
  pub unit_price: Paise,
  pub quantity: i32,
  pub size: String,
  pub stock_quantity: i32,
  pub weight_grams: i32,
  pub is_active: bool,
  pub updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
  fn from(row: CartLineRow) -> Self {
    CartLine {
      product_id: row.product_id,
      product_name: row.product_name,
      unit_price: row.unit_price,
      quantity: row.quantity,
      size: (!row.size.is_empty()).then_some(row.size),
      stock_quantity: row.stock_quantity,
      weight_grams: row.weight_grams,
      is_active: row.is_active,
      updated_at: row.updated_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct AddressRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub full_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub country: String,
}

impl From<AddressRow> for Address {
  fn from(row: AddressRow) -> Self {
    Address {
      id: row.id,
      user_id: row.user_id,
      full_name: row.full_name,
      phone: row.phone,
      line1: row.line1,
      line2: row.line2,
      city: row.city,
      state: row.state,
      pincode: row.pincode,
      country: row.country,
    }
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct ContactRow {
  pub id: Uuid,
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

impl From<ContactRow> for CustomerContact {
  fn from(row: ContactRow) -> Self {
    CustomerContact {
      user_id: row.id,
      full_name: row.full_name,
      email: row.email,
      phone: row.phone,
    }
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct CouponRow {
  pub code: String,
  pub discount_type: String,
  pub discount_value: i64,
  pub min_order_value: Paise,
  pub max_discount: Option<Paise>,
  pub usage_limit: Option<i32>,
  pub used_count: i32,
  pub is_active: bool,
  pub expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
  type Error = StoreError;

  fn try_from(row: CouponRow) -> StoreResult<Self> {
    Ok(Coupon {
      code: row.code,
      discount_type: parse(&row.discount_type)?,
      discount_value: row.discount_value,
      min_order_value: row.min_order_value,
      max_discount: row.max_discount,
      usage_limit: row.usage_limit,
      used_count: row.used_count,
      is_active: row.is_active,
      expires_at: row.expires_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Paise,
  pub size: Option<String>,
  pub weight_grams: i32,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      product_name: row.product_name,
      quantity: row.quantity,
      unit_price: row.unit_price,
      size: row.size,
      weight_grams: row.weight_grams,
    }
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Option<Uuid>,
  pub shipping_address: Json<ShippingAddress>,
  pub subtotal: Paise,
  pub shipping_fee: Paise,
  pub gift_wrap: bool,
  pub gift_message: Option<String>,
  pub gift_wrap_fee: Paise,
  pub coupon_code: Option<String>,
  pub discount: Paise,
  pub total: Paise,
  pub payment_method: String,
  pub payment_status: String,
  pub payment_provider: Option<String>,
  pub payment_gateway_order_id: Option<String>,
  pub payment_id: Option<String>,
  pub payment_attempts: i32,
  pub payment_error_reason: Option<String>,
  pub status: String,
  pub tracking_number: Option<String>,
  pub delivery_time_slot: Option<String>,
  pub cancellation_reason: Option<String>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub return_reason: Option<String>,
  pub return_status: Option<String>,
  pub returned_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderRow {
  pub(crate) fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
    Ok(Order {
      id: self.id,
      order_number: self.order_number,
      user_id: self.user_id,
      items,
      shipping_address: self.shipping_address.0,
      subtotal: self.subtotal,
      shipping_fee: self.shipping_fee,
      gift_wrap: self.gift_wrap,
      gift_message: self.gift_message,
      gift_wrap_fee: self.gift_wrap_fee,
      coupon_code: self.coupon_code,
      discount: self.discount,
      total: self.total,
      payment_method: parse(&self.payment_method)?,
      payment_status: parse(&self.payment_status)?,
      payment_provider: parse_opt(self.payment_provider.as_deref())?,
      payment_gateway_order_id: self.payment_gateway_order_id,
      payment_id: self.payment_id,
      payment_attempts: self.payment_attempts,
      payment_error_reason: self.payment_error_reason,
      status: parse(&self.status)?,
      tracking_number: self.tracking_number,
      delivery_time_slot: self.delivery_time_slot,
      cancellation_reason: self.cancellation_reason,
      cancelled_at: self.cancelled_at,
      return_reason: self.return_reason,
      return_status: parse_opt(self.return_status.as_deref())?,
      returned_at: self.returned_at,
      delivered_at: self.delivered_at,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReturnRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub reason: String,
  pub issue_type: String,
  pub evidence_photos: Vec<String>,
  pub video_link: Option<String>,
  pub status: String,
  pub admin_notes: Option<String>,
  pub rejection_reason: Option<String>,
  pub tracking_number: Option<String>,
  pub restocked: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub returned_at: Option<DateTime<Utc>>,
  pub refunded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
  type Error = StoreError;

  fn try_from(row: ReturnRow) -> StoreResult<Self> {
    Ok(ReturnRequest {
      id: row.id,
      order_id: row.order_id,
      user_id: row.user_id,
      reason: row.reason,
      issue_type: parse(&row.issue_type)?,
      evidence_photos: row.evidence_photos,
      video_link: row.video_link,
      status: parse(&row.status)?,
      admin_notes: row.admin_notes,
      rejection_reason: row.rejection_reason,
      tracking_number: row.tracking_number,
      restocked: row.restocked,
      created_at: row.created_at,
      updated_at: row.updated_at,
      returned_at: row.returned_at,
      refunded_at: row.refunded_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct PushSubscriptionRow {
  pub id: Uuid,
  pub endpoint: String,
  pub p256dh: String,
  pub auth: String,
  pub user_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

impl From<PushSubscriptionRow> for PushSubscription {
  fn from(row: PushSubscriptionRow) -> Self {
    PushSubscription {
      id: row.id,
      endpoint: row.endpoint,
      p256dh: row.p256dh,
      auth: row.auth,
      user_id: row.user_id,
      created_at: row.created_at,
    }
  }
}
