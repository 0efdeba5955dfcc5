// storefront/src/db/pg_store.rs

//! PostgreSQL implementation of every `lustre::ports` store trait, using
//! runtime-checked queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lustre::model::{
  Address, AuditEntry, CartLine, Coupon, CustomerContact, NewOrder, NewPushSubscription, NewReturnRequest,
  NotificationTarget, Order, OrderFilter, OrderItem, OrderStatus, PaymentStatus, Product, PushSubscription,
  ReturnRequest, ReturnStatus, StockAdjustment,
};
use lustre::ports::{AdminDirectory, AuditSink, CatalogStore, CouponStore, OrderStore, PushRegistry, ReturnStore};
use lustre::{AdminRole, StoreError, StoreResult};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::rows::{
  backend, parse, AddressRow, CartLineRow, ContactRow, CouponRow, OrderItemRow, OrderRow, PushSubscriptionRow,
  ReturnRow,
};

const ORDER_COLUMNS: &str = "id, order_number, user_id, shipping_address, subtotal, shipping_fee, gift_wrap, \
  gift_message, gift_wrap_fee, coupon_code, discount, total, payment_method, payment_status, payment_provider, \
  payment_gateway_order_id, payment_id, payment_attempts, payment_error_reason, status, tracking_number, \
  delivery_time_slot, cancellation_reason, cancelled_at, return_reason, return_status, returned_at, delivered_at, \
  created_at, updated_at";

const RETURN_COLUMNS: &str = "id, order_id, user_id, reason, issue_type, evidence_photos, video_link, status, \
  admin_notes, rejection_reason, tracking_number, restocked, created_at, updated_at, returned_at, refunded_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn items_for(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT id, order_id, product_id, product_name, quantity, unit_price, size, weight_grams \
       FROM order_items WHERE order_id = ANY($1) ORDER BY product_name ASC",
    )
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
  }

  /// Takes `quantity` units when at least that many remain. `false` means the guard lost.
  async fn take_stock(tx: &mut Transaction<'_, Postgres>, product_id: Uuid, quantity: i32) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1 AND stock_quantity >= $2",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(result.rows_affected() == 1)
  }

  async fn redeem_coupon(tx: &mut Transaction<'_, Postgres>, code: &str) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE coupons SET used_count = used_count + 1 \
       WHERE code = $1 AND (usage_limit IS NULL OR used_count < usage_limit)",
    )
    .bind(code)
    .execute(&mut **tx)
    .await
    .map_err(backend)?;
    Ok(result.rows_affected() == 1)
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
      "SELECT p.id AS product_id, p.name AS product_name, p.price AS unit_price, c.quantity, c.size, \
       p.stock_quantity, p.weight_grams, p.is_active, c.updated_at \
       FROM cart_items c JOIN products p ON p.id = c.product_id \
       WHERE c.user_id = $1 ORDER BY c.updated_at ASC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    Ok(rows.into_iter().map(CartLine::from).collect())
  }

  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(())
  }

  async fn address(&self, address_id: Uuid) -> StoreResult<Option<Address>> {
    let row: Option<AddressRow> = sqlx::query_as(
      "SELECT id, user_id, full_name, phone, line1, line2, city, state, pincode, country \
       FROM addresses WHERE id = $1",
    )
    .bind(address_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;
    Ok(row.map(Address::from))
  }

  async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    let row: Option<(Uuid, String, i64, i32, i32, Option<String>, Option<String>, bool)> = sqlx::query_as(
      "SELECT id, name, price, stock_quantity, weight_grams, image_url, huid, is_active FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;
    Ok(row.map(
      |(id, name, price, stock_quantity, weight_grams, image_url, huid, is_active)| Product {
        id,
        name,
        price,
        stock_quantity,
        weight_grams,
        image_url,
        huid,
        is_active,
      },
    ))
  }

  #[instrument(name = "pg::restock", skip(self, adjustments), fields(lines = adjustments.len()))]
  async fn restock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()> {
    let mut tx = self.pool.begin().await.map_err(backend)?;
    for adjustment in adjustments {
      sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $2 WHERE id = $1")
        .bind(adjustment.product_id)
        .bind(adjustment.delta)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;
    }
    tx.commit().await.map_err(backend)
  }

  async fn idle_carts(&self, idle_since: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
    sqlx::query_scalar("SELECT user_id FROM cart_items GROUP BY user_id HAVING max(updated_at) < $1")
      .bind(idle_since)
      .fetch_all(&self.pool)
      .await
      .map_err(backend)
  }

  async fn customer_contact(&self, user_id: Uuid) -> StoreResult<Option<CustomerContact>> {
    let row: Option<ContactRow> = sqlx::query_as("SELECT id, full_name, email, phone FROM users WHERE id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.map(CustomerContact::from))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "pg::insert_order", skip(self, new_order), fields(order_number = %new_order.order_number))]
  async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
    let mut tx = self.pool.begin().await.map_err(backend)?;

    for item in &new_order.items {
      if !Self::take_stock(&mut tx, item.product_id, item.quantity).await? {
        warn!(product_id = %item.product_id, "Stock guard lost, rolling back order insert.");
        return Err(StoreError::Conflict(format!("{} is out of stock", item.product_name)));
      }
    }
    if let Some(code) = &new_order.coupon_code {
      if !Self::redeem_coupon(&mut tx, code).await? {
        return Err(StoreError::Conflict(format!("Coupon {code} has reached its usage limit")));
      }
    }

    let order_id = Uuid::new_v4();
    let totals = new_order.totals;
    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, order_number, user_id, shipping_address, subtotal, shipping_fee, gift_wrap, \
       gift_message, gift_wrap_fee, coupon_code, discount, total, payment_method, payment_status, status, \
       delivery_time_slot) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(&new_order.order_number)
    .bind(new_order.user_id)
    .bind(Json(&new_order.shipping_address))
    .bind(totals.subtotal)
    .bind(totals.shipping_fee)
    .bind(new_order.gift_wrap)
    .bind(&new_order.gift_message)
    .bind(totals.gift_wrap_fee)
    .bind(&new_order.coupon_code)
    .bind(totals.discount)
    .bind(totals.total)
    .bind(new_order.payment_method.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(OrderStatus::Pending.as_str())
    .bind(&new_order.delivery_time_slot)
    .fetch_one(&mut *tx)
    .await
    .map_err(backend)?;

    let mut items = Vec::with_capacity(new_order.items.len());
    for item in new_order.items {
      let stored = OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: item.product_id,
        product_name: item.product_name,
        quantity: item.quantity,
        unit_price: item.unit_price,
        size: item.size,
        weight_grams: item.weight_grams,
      };
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price, size, weight_grams) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
      )
      .bind(stored.id)
      .bind(stored.order_id)
      .bind(stored.product_id)
      .bind(&stored.product_name)
      .bind(stored.quantity)
      .bind(stored.unit_price)
      .bind(&stored.size)
      .bind(stored.weight_grams)
      .execute(&mut *tx)
      .await
      .map_err(backend)?;
      items.push(stored);
    }

    tx.commit().await.map_err(backend)?;
    debug!(%order_id, "Order inserted.");
    row.into_order(items)
  }

  async fn order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    let Some(row) = row else {
      return Ok(None);
    };
    let items = self.items_for(&[order_id]).await?.remove(&order_id).unwrap_or_default();
    row.into_order(items).map(Some)
  }

  async fn save_order(&self, order: &Order) -> StoreResult<()> {
    let result = sqlx::query(
      "UPDATE orders SET payment_status = $2, payment_provider = $3, payment_gateway_order_id = $4, \
       payment_id = $5, payment_attempts = $6, payment_error_reason = $7, status = $8, tracking_number = $9, \
       cancellation_reason = $10, cancelled_at = $11, return_reason = $12, return_status = $13, \
       returned_at = $14, delivered_at = $15, updated_at = $16 \
       WHERE id = $1",
    )
    .bind(order.id)
    .bind(order.payment_status.as_str())
    .bind(order.payment_provider.map(|p| p.as_str()))
    .bind(&order.payment_gateway_order_id)
    .bind(&order.payment_id)
    .bind(order.payment_attempts)
    .bind(&order.payment_error_reason)
    .bind(order.status.as_str())
    .bind(&order.tracking_number)
    .bind(&order.cancellation_reason)
    .bind(order.cancelled_at)
    .bind(&order.return_reason)
    .bind(order.return_status.map(|s| s.as_str()))
    .bind(order.returned_at)
    .bind(order.delivered_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("order {}", order.id)));
    }
    Ok(())
  }

  async fn delete_order(&self, order_id: Uuid) -> StoreResult<bool> {
    // Items and return requests go with the order through ON DELETE CASCADE.
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders \
       WHERE ($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2) \
       ORDER BY created_at DESC LIMIT $3"
    ))
    .bind(filter.user_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.limit)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut items = self.items_for(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let order_items = items.remove(&row.id).unwrap_or_default();
        row.into_order(order_items)
      })
      .collect()
  }
}

#[async_trait]
impl CouponStore for PgStore {
  async fn coupon(&self, code: &str) -> StoreResult<Option<Coupon>> {
    let row: Option<CouponRow> = sqlx::query_as(
      "SELECT code, discount_type, discount_value, min_order_value, max_discount, usage_limit, used_count, \
       is_active, expires_at FROM coupons WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;
    row.map(Coupon::try_from).transpose()
  }
}

#[async_trait]
impl ReturnStore for PgStore {
  async fn insert_return(&self, request: NewReturnRequest) -> StoreResult<ReturnRequest> {
    let row: ReturnRow = sqlx::query_as(&format!(
      "INSERT INTO return_requests (id, order_id, user_id, reason, issue_type, evidence_photos, video_link, status) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {RETURN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(request.order_id)
    .bind(request.user_id)
    .bind(&request.reason)
    .bind(request.issue_type.as_str())
    .bind(&request.evidence_photos)
    .bind(&request.video_link)
    .bind(ReturnStatus::Requested.as_str())
    .fetch_one(&self.pool)
    .await
    .map_err(backend)?;
    row.try_into()
  }

  async fn return_request(&self, request_id: Uuid) -> StoreResult<Option<ReturnRequest>> {
    let row: Option<ReturnRow> =
      sqlx::query_as(&format!("SELECT {RETURN_COLUMNS} FROM return_requests WHERE id = $1"))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
    row.map(ReturnRequest::try_from).transpose()
  }

  async fn returns_for_order(&self, order_id: Uuid) -> StoreResult<Vec<ReturnRequest>> {
    let rows: Vec<ReturnRow> = sqlx::query_as(&format!(
      "SELECT {RETURN_COLUMNS} FROM return_requests WHERE order_id = $1 ORDER BY created_at ASC"
    ))
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    rows.into_iter().map(ReturnRequest::try_from).collect()
  }

  async fn save_return(&self, request: &ReturnRequest) -> StoreResult<()> {
    let result = sqlx::query(
      "UPDATE return_requests SET status = $2, admin_notes = $3, rejection_reason = $4, tracking_number = $5, \
       restocked = $6, updated_at = $7, returned_at = $8, refunded_at = $9 WHERE id = $1",
    )
    .bind(request.id)
    .bind(request.status.as_str())
    .bind(&request.admin_notes)
    .bind(&request.rejection_reason)
    .bind(&request.tracking_number)
    .bind(request.restocked)
    .bind(request.updated_at)
    .bind(request.returned_at)
    .bind(request.refunded_at)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("return request {}", request.id)));
    }
    Ok(())
  }
}

#[async_trait]
impl AdminDirectory for PgStore {
  async fn role_of(&self, user_id: Uuid) -> StoreResult<Option<AdminRole>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT role FROM admin_roles WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    raw.as_deref().map(parse).transpose()
  }

  async fn set_role(&self, user_id: Uuid, role: AdminRole) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO admin_roles (user_id, role) VALUES ($1, $2) \
       ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role, updated_at = now()",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(())
  }

  async fn remove_role(&self, user_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM admin_roles WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl PushRegistry for PgStore {
  async fn subscriptions(&self, target: NotificationTarget) -> StoreResult<Vec<PushSubscription>> {
    let base = "SELECT id, endpoint, p256dh, auth, user_id, created_at FROM push_subscriptions";
    let rows: Vec<PushSubscriptionRow> = match target {
      NotificationTarget::Broadcast => sqlx::query_as::<_, PushSubscriptionRow>(base).fetch_all(&self.pool).await,
      NotificationTarget::User(user_id) => {
        sqlx::query_as::<_, PushSubscriptionRow>(&format!("{base} WHERE user_id = $1"))
          .bind(user_id)
          .fetch_all(&self.pool)
          .await
      }
    }
    .map_err(backend)?;
    Ok(rows.into_iter().map(PushSubscription::from).collect())
  }

  async fn upsert_subscription(&self, subscription: NewPushSubscription) -> StoreResult<PushSubscription> {
    let row: PushSubscriptionRow = sqlx::query_as(
      "INSERT INTO push_subscriptions (id, endpoint, p256dh, auth, user_id) VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (endpoint) DO UPDATE SET p256dh = EXCLUDED.p256dh, auth = EXCLUDED.auth, \
       user_id = EXCLUDED.user_id \
       RETURNING id, endpoint, p256dh, auth, user_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&subscription.endpoint)
    .bind(&subscription.p256dh)
    .bind(&subscription.auth)
    .bind(subscription.user_id)
    .fetch_one(&self.pool)
    .await
    .map_err(backend)?;
    Ok(row.into())
  }

  async fn delete_subscriptions(&self, ids: &[Uuid]) -> StoreResult<usize> {
    if ids.is_empty() {
      return Ok(0);
    }
    let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = ANY($1)")
      .bind(ids)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
  }
}

#[async_trait]
impl AuditSink for PgStore {
  async fn record(&self, entry: AuditEntry) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO audit_log (id, actor, action, subject, detail, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.id)
    .bind(entry.actor)
    .bind(&entry.action)
    .bind(&entry.subject)
    .bind(&entry.detail)
    .bind(entry.created_at)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(())
  }
}
