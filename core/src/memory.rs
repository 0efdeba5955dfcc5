// lustre/src/memory.rs

//! `MemoryStore`: every store port over one mutex-guarded state. Used by the
//! test-suite, the benchmark and the storefront's sandbox mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::auth::AdminRole;
use crate::error::{StoreError, StoreResult};
use crate::model::{
  Address, AuditEntry, CartLine, Coupon, CustomerContact, NewOrder, NewPushSubscription, NewReturnRequest,
  NotificationTarget, Order, OrderFilter, OrderItem, OrderStatus, PaymentStatus, Product, PushSubscription,
  ReturnRequest, ReturnStatus, StockAdjustment,
};
use crate::ports::{AdminDirectory, AuditSink, CatalogStore, CouponStore, OrderStore, PushRegistry, ReturnStore};

#[derive(Debug, Clone)]
struct CartEntry {
  product_id: Uuid,
  quantity: i32,
  size: Option<String>,
  updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
  products: HashMap<Uuid, Product>,
  carts: HashMap<Uuid, Vec<CartEntry>>,
  addresses: HashMap<Uuid, Address>,
  contacts: HashMap<Uuid, CustomerContact>,
  orders: HashMap<Uuid, Order>,
  coupons: HashMap<String, Coupon>,
  returns: HashMap<Uuid, ReturnRequest>,
  admins: HashMap<Uuid, AdminRole>,
  subscriptions: HashMap<Uuid, PushSubscription>,
  audit: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<State>,
  role_lookups: AtomicUsize,
  restock_offline: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  // --- seeding ---

  pub fn add_product(&self, product: Product) {
    self.state.lock().products.insert(product.id, product);
  }

  pub fn set_price(&self, product_id: Uuid, price: i64) {
    if let Some(product) = self.state.lock().products.get_mut(&product_id) {
      product.price = price;
    }
  }

  pub fn set_active(&self, product_id: Uuid, is_active: bool) {
    if let Some(product) = self.state.lock().products.get_mut(&product_id) {
      product.is_active = is_active;
    }
  }

  pub fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32, size: Option<&str>) {
    let mut state = self.state.lock();
    let cart = state.carts.entry(user_id).or_default();
    let now = Utc::now();
    match cart.iter_mut().find(|e| e.product_id == product_id && e.size.as_deref() == size) {
      Some(entry) => {
        entry.quantity += quantity;
        entry.updated_at = now;
      }
      None => cart.push(CartEntry {
        product_id,
        quantity,
        size: size.map(str::to_string),
        updated_at: now,
      }),
    }
  }

  /// Backdates every line of a user's cart.
  pub fn touch_cart(&self, user_id: Uuid, at: DateTime<Utc>) {
    if let Some(cart) = self.state.lock().carts.get_mut(&user_id) {
      for entry in cart {
        entry.updated_at = at;
      }
    }
  }

  pub fn cart_len(&self, user_id: Uuid) -> usize {
    self.state.lock().carts.get(&user_id).map_or(0, Vec::len)
  }

  pub fn add_address(&self, address: Address) {
    self.state.lock().addresses.insert(address.id, address);
  }

  pub fn set_contact(&self, contact: CustomerContact) {
    self.state.lock().contacts.insert(contact.user_id, contact);
  }

  pub fn add_coupon(&self, coupon: Coupon) {
    let code = Coupon::normalize_code(&coupon.code);
    self.state.lock().coupons.insert(code, coupon);
  }

  pub fn grant_role(&self, user_id: Uuid, role: AdminRole) {
    self.state.lock().admins.insert(user_id, role);
  }

  /// Replaces an order wholesale, e.g. to backdate `delivered_at`.
  pub fn put_order(&self, order: Order) {
    self.state.lock().orders.insert(order.id, order);
  }

  // --- inspection ---

  pub fn stock_of(&self, product_id: Uuid) -> Option<i32> {
    self.state.lock().products.get(&product_id).map(|p| p.stock_quantity)
  }

  pub fn coupon_usage(&self, code: &str) -> Option<i32> {
    let code = Coupon::normalize_code(code);
    self.state.lock().coupons.get(&code).map(|c| c.used_count)
  }

  pub fn order_count(&self) -> usize {
    self.state.lock().orders.len()
  }

  pub fn subscription_count(&self) -> usize {
    self.state.lock().subscriptions.len()
  }

  pub fn audit_entries(&self) -> Vec<AuditEntry> {
    self.state.lock().audit.clone()
  }

  /// While set, `restock` fails with a backend error.
  pub fn set_restock_offline(&self, offline: bool) {
    self.restock_offline.store(offline, Ordering::SeqCst);
  }

  /// How many times the admin directory was consulted.
  pub fn role_lookups(&self) -> usize {
    self.role_lookups.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let state = self.state.lock();
    let Some(cart) = state.carts.get(&user_id) else {
      return Ok(Vec::new());
    };
    cart
      .iter()
      .map(|entry| {
        let product = state
          .products
          .get(&entry.product_id)
          .ok_or_else(|| StoreError::NotFound(format!("product {}", entry.product_id)))?;
        Ok(CartLine {
          product_id: product.id,
          product_name: product.name.clone(),
          unit_price: product.price,
          quantity: entry.quantity,
          size: entry.size.clone(),
          stock_quantity: product.stock_quantity,
          weight_grams: product.weight_grams,
          is_active: product.is_active,
          updated_at: entry.updated_at,
        })
      })
      .collect()
  }

  async fn clear_cart(&self, user_id: Uuid) -> StoreResult<()> {
    self.state.lock().carts.remove(&user_id);
    Ok(())
  }

  async fn address(&self, address_id: Uuid) -> StoreResult<Option<Address>> {
    Ok(self.state.lock().addresses.get(&address_id).cloned())
  }

  async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    Ok(self.state.lock().products.get(&product_id).cloned())
  }

  async fn restock(&self, adjustments: &[StockAdjustment]) -> StoreResult<()> {
    if self.restock_offline.load(Ordering::SeqCst) {
      return Err(StoreError::from(anyhow::anyhow!("inventory store offline")));
    }
    let mut state = self.state.lock();
    for adjustment in adjustments {
      if let Some(product) = state.products.get_mut(&adjustment.product_id) {
        product.stock_quantity += adjustment.delta;
      }
    }
    Ok(())
  }

  async fn idle_carts(&self, idle_since: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
    let state = self.state.lock();
    Ok(
      state
        .carts
        .iter()
        .filter(|(_, cart)| !cart.is_empty() && cart.iter().all(|e| e.updated_at < idle_since))
        .map(|(user_id, _)| *user_id)
        .collect(),
    )
  }

  async fn customer_contact(&self, user_id: Uuid) -> StoreResult<Option<CustomerContact>> {
    Ok(self.state.lock().contacts.get(&user_id).cloned())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn insert_order(&self, new_order: NewOrder) -> StoreResult<Order> {
    let mut state = self.state.lock();

    let mut wanted: HashMap<Uuid, i32> = HashMap::new();
    for item in &new_order.items {
      *wanted.entry(item.product_id).or_default() += item.quantity;
    }
    for (product_id, quantity) in &wanted {
      let product = state
        .products
        .get(product_id)
        .ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))?;
      if product.stock_quantity < *quantity {
        return Err(StoreError::Conflict(format!("{} is out of stock", product.name)));
      }
    }
    if let Some(code) = &new_order.coupon_code {
      let coupon = state
        .coupons
        .get(code)
        .ok_or_else(|| StoreError::NotFound(format!("coupon {code}")))?;
      if coupon.is_exhausted() {
        return Err(StoreError::Conflict(format!("Coupon {code} has reached its usage limit")));
      }
    }

    for item in &new_order.items {
      if let Some(product) = state.products.get_mut(&item.product_id) {
        product.stock_quantity -= item.quantity;
      }
    }
    if let Some(code) = &new_order.coupon_code {
      if let Some(coupon) = state.coupons.get_mut(code) {
        coupon.used_count += 1;
      }
    }

    let order_id = Uuid::new_v4();
    let now = Utc::now();
    let items = new_order
      .items
      .into_iter()
      .map(|item| OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: item.product_id,
        product_name: item.product_name,
        quantity: item.quantity,
        unit_price: item.unit_price,
        size: item.size,
        weight_grams: item.weight_grams,
      })
      .collect();
    let totals = new_order.totals;
    let order = Order {
      id: order_id,
      order_number: new_order.order_number,
      user_id: new_order.user_id,
      items,
      shipping_address: new_order.shipping_address,
      subtotal: totals.subtotal,
      shipping_fee: totals.shipping_fee,
      gift_wrap: new_order.gift_wrap,
      gift_message: new_order.gift_message,
      gift_wrap_fee: totals.gift_wrap_fee,
      coupon_code: new_order.coupon_code,
      discount: totals.discount,
      total: totals.total,
      payment_method: new_order.payment_method,
      payment_status: PaymentStatus::Pending,
      payment_provider: None,
      payment_gateway_order_id: None,
      payment_id: None,
      payment_attempts: 0,
      payment_error_reason: None,
      status: OrderStatus::Pending,
      tracking_number: None,
      delivery_time_slot: new_order.delivery_time_slot,
      cancellation_reason: None,
      cancelled_at: None,
      return_reason: None,
      return_status: None,
      returned_at: None,
      delivered_at: None,
      created_at: now,
      updated_at: now,
    };
    state.orders.insert(order_id, order.clone());
    Ok(order)
  }

  async fn order(&self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.state.lock().orders.get(&order_id).cloned())
  }

  async fn save_order(&self, order: &Order) -> StoreResult<()> {
    let mut state = self.state.lock();
    let stored = state
      .orders
      .get_mut(&order.id)
      .ok_or_else(|| StoreError::NotFound(format!("order {}", order.id)))?;
    let items = std::mem::take(&mut stored.items);
    *stored = order.clone();
    stored.items = items;
    Ok(())
  }

  async fn delete_order(&self, order_id: Uuid) -> StoreResult<bool> {
    let mut state = self.state.lock();
    let removed = state.orders.remove(&order_id).is_some();
    state.returns.retain(|_, r| r.order_id != order_id);
    Ok(removed)
  }

  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
    let state = self.state.lock();
    let mut orders: Vec<Order> = state
      .orders
      .values()
      .filter(|o| filter.user_id.map_or(true, |u| o.user_id == Some(u)))
      .filter(|o| filter.status.map_or(true, |s| o.status == s))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if let Some(limit) = filter.limit {
      orders.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    }
    Ok(orders)
  }
}

#[async_trait]
impl CouponStore for MemoryStore {
  async fn coupon(&self, code: &str) -> StoreResult<Option<Coupon>> {
    Ok(self.state.lock().coupons.get(code).cloned())
  }
}

#[async_trait]
impl ReturnStore for MemoryStore {
  async fn insert_return(&self, request: NewReturnRequest) -> StoreResult<ReturnRequest> {
    let now = Utc::now();
    let stored = ReturnRequest {
      id: Uuid::new_v4(),
      order_id: request.order_id,
      user_id: request.user_id,
      reason: request.reason,
      issue_type: request.issue_type,
      evidence_photos: request.evidence_photos,
      video_link: request.video_link,
      status: ReturnStatus::Requested,
      admin_notes: None,
      rejection_reason: None,
      tracking_number: None,
      restocked: false,
      created_at: now,
      updated_at: now,
      returned_at: None,
      refunded_at: None,
    };
    self.state.lock().returns.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn return_request(&self, request_id: Uuid) -> StoreResult<Option<ReturnRequest>> {
    Ok(self.state.lock().returns.get(&request_id).cloned())
  }

  async fn returns_for_order(&self, order_id: Uuid) -> StoreResult<Vec<ReturnRequest>> {
    let state = self.state.lock();
    let mut requests: Vec<ReturnRequest> = state.returns.values().filter(|r| r.order_id == order_id).cloned().collect();
    requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(requests)
  }

  async fn save_return(&self, request: &ReturnRequest) -> StoreResult<()> {
    let mut state = self.state.lock();
    match state.returns.get_mut(&request.id) {
      Some(stored) => {
        *stored = request.clone();
        Ok(())
      }
      None => Err(StoreError::NotFound(format!("return request {}", request.id))),
    }
  }
}

#[async_trait]
impl AdminDirectory for MemoryStore {
  async fn role_of(&self, user_id: Uuid) -> StoreResult<Option<AdminRole>> {
    self.role_lookups.fetch_add(1, Ordering::SeqCst);
    Ok(self.state.lock().admins.get(&user_id).copied())
  }

  async fn set_role(&self, user_id: Uuid, role: AdminRole) -> StoreResult<()> {
    self.state.lock().admins.insert(user_id, role);
    Ok(())
  }

  async fn remove_role(&self, user_id: Uuid) -> StoreResult<bool> {
    Ok(self.state.lock().admins.remove(&user_id).is_some())
  }
}

#[async_trait]
impl PushRegistry for MemoryStore {
  async fn subscriptions(&self, target: NotificationTarget) -> StoreResult<Vec<PushSubscription>> {
    let state = self.state.lock();
    Ok(
      state
        .subscriptions
        .values()
        .filter(|s| match target {
          NotificationTarget::Broadcast => true,
          NotificationTarget::User(user_id) => s.user_id == Some(user_id),
        })
        .cloned()
        .collect(),
    )
  }

  async fn upsert_subscription(&self, subscription: NewPushSubscription) -> StoreResult<PushSubscription> {
    let mut state = self.state.lock();
    if let Some(existing) = state.subscriptions.values_mut().find(|s| s.endpoint == subscription.endpoint) {
      existing.p256dh = subscription.p256dh;
      existing.auth = subscription.auth;
      existing.user_id = subscription.user_id;
      return Ok(existing.clone());
    }
    let stored = PushSubscription {
      id: Uuid::new_v4(),
      endpoint: subscription.endpoint,
      p256dh: subscription.p256dh,
      auth: subscription.auth,
      user_id: subscription.user_id,
      created_at: Utc::now(),
    };
    state.subscriptions.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn delete_subscriptions(&self, ids: &[Uuid]) -> StoreResult<usize> {
    let mut state = self.state.lock();
    Ok(ids.iter().filter(|id| state.subscriptions.remove(*id).is_some()).count())
  }
}

#[async_trait]
impl AuditSink for MemoryStore {
  async fn record(&self, entry: AuditEntry) -> StoreResult<()> {
    self.state.lock().audit.push(entry);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{NewOrderItem, OrderTotals, PaymentMethod, ShippingAddress};

  fn line(product_id: Uuid, quantity: i32, size: &str) -> NewOrderItem {
    NewOrderItem {
      product_id,
      product_name: "Jhumka".to_string(),
      quantity,
      unit_price: 80_000,
      size: Some(size.to_string()),
      weight_grams: 18,
    }
  }

  #[tokio::test]
  async fn stock_guard_sums_every_size_of_a_product() {
    let store = MemoryStore::new();
    let product_id = Uuid::new_v4();
    store.add_product(Product {
      id: product_id,
      name: "Jhumka".to_string(),
      price: 80_000,
      stock_quantity: 5,
      weight_grams: 18,
      image_url: None,
      huid: None,
      is_active: true,
    });

    let new_order = NewOrder {
      order_number: "LUS-TEST-0001".to_string(),
      user_id: Some(Uuid::new_v4()),
      items: vec![line(product_id, 3, "12"), line(product_id, 3, "14")],
      shipping_address: ShippingAddress {
        full_name: "Kavya Iyer".to_string(),
        phone: "+919800000002".to_string(),
        line1: "2 Residency Road".to_string(),
        line2: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560025".to_string(),
        country: "IN".to_string(),
      },
      totals: OrderTotals::compute(480_000, 0, 0, 0),
      gift_wrap: false,
      gift_message: None,
      coupon_code: None,
      payment_method: PaymentMethod::Cod,
      delivery_time_slot: None,
    };

    let err = store.insert_order(new_order).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
    assert_eq!(store.stock_of(product_id), Some(5));
    assert_eq!(store.order_count(), 0);
  }
}
