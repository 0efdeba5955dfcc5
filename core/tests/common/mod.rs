// tests/common/mod.rs
#![allow(dead_code)]

use lustre::memory::MemoryStore;
use lustre::model::{Address, Order, OrderStatus, PaymentMethod, Product};
use lustre::ports::PaymentGateway;
use lustre::sandbox::{SandboxCarrier, SandboxGateway, SandboxPush};
use lustre::{AdminRole, Backends, CheckoutRequest, Commerce, PaymentRouter, StatusUpdate, StoreSettings};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const PRIMARY_SECRET: &str = "primary-test-secret";
pub const FALLBACK_SECRET: &str = "fallback-test-secret";
pub const CARRIER_RATE: i64 = 12_000;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// A wired `Commerce` over the in-memory store and sandbox providers, with one
/// customer, one saved address and one admin per role.
pub struct Harness {
  pub store: Arc<MemoryStore>,
  pub primary: Arc<SandboxGateway>,
  pub fallback: Arc<SandboxGateway>,
  pub carrier: Arc<SandboxCarrier>,
  pub push: Arc<SandboxPush>,
  pub commerce: Commerce,
  pub customer: Uuid,
  pub address_id: Uuid,
  pub main_admin: Uuid,
  pub support_admin: Uuid,
  pub staff: Uuid,
  pub product_manager: Uuid,
}

impl Harness {
  pub fn new() -> Self {
    Self::with_settings(StoreSettings::default())
  }

  pub fn with_settings(settings: StoreSettings) -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let primary = Arc::new(SandboxGateway::new("key_primary", PRIMARY_SECRET));
    let fallback = Arc::new(SandboxGateway::new("key_fallback", FALLBACK_SECRET));
    let carrier = Arc::new(SandboxCarrier::new(CARRIER_RATE));
    let push = Arc::new(SandboxPush::new());

    let backends = Backends::from_store(store.clone(), carrier.clone(), push.clone());
    let fallback_gateway: Arc<dyn PaymentGateway> = fallback.clone();
    let payments = PaymentRouter::new(primary.clone(), Some(fallback_gateway));
    let commerce = Commerce::new(backends, settings, payments);

    let customer = Uuid::new_v4();
    let address_id = Uuid::new_v4();
    store.add_address(Address {
      id: address_id,
      user_id: customer,
      full_name: "Ananya Rao".to_string(),
      phone: "+919800000001".to_string(),
      line1: "14 MG Road".to_string(),
      line2: None,
      city: "Bengaluru".to_string(),
      state: "Karnataka".to_string(),
      pincode: "560001".to_string(),
      country: "IN".to_string(),
    });

    let (main_admin, support_admin, staff, product_manager) =
      (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    store.grant_role(main_admin, AdminRole::MainAdmin);
    store.grant_role(support_admin, AdminRole::SupportAdmin);
    store.grant_role(staff, AdminRole::Staff);
    store.grant_role(product_manager, AdminRole::ProductManager);

    Self {
      store,
      primary,
      fallback,
      carrier,
      push,
      commerce,
      customer,
      address_id,
      main_admin,
      support_admin,
      staff,
      product_manager,
    }
  }

  pub fn product(&self, name: &str, price: i64, stock: i32) -> Uuid {
    let id = Uuid::new_v4();
    self.store.add_product(Product {
      id,
      name: name.to_string(),
      price,
      stock_quantity: stock,
      weight_grams: 25,
      image_url: None,
      huid: Some("HUID01".to_string()),
      is_active: true,
    });
    id
  }

  pub fn checkout_request(&self, payment_method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
      user_id: self.customer,
      address_id: self.address_id,
      payment_method,
      gift_wrap: false,
      gift_message: None,
      coupon_code: None,
      client_discount: None,
      delivery_time_slot: None,
    }
  }

  /// Puts one unit of a fresh product priced `price` in the cart and checks out.
  pub async fn place_order(&self, payment_method: PaymentMethod, price: i64) -> Order {
    let product = self.product("Solitaire Ring", price, 5);
    self.store.add_to_cart(self.customer, product, 1, Some("12"));
    self
      .commerce
      .create_order(self.checkout_request(payment_method))
      .await
      .expect("checkout should succeed")
  }

  pub async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Order {
    self
      .commerce
      .update_order_status(
        self.main_admin,
        order_id,
        StatusUpdate {
          status,
          tracking_number: None,
          cancellation_reason: None,
        },
      )
      .await
      .expect("status update should succeed")
  }

  /// A cash-on-delivery order walked all the way to `delivered`.
  pub async fn delivered_order(&self, price: i64) -> Order {
    let order = self.place_order(PaymentMethod::Cod, price).await;
    self.set_status(order.id, OrderStatus::Packed).await;
    self.set_status(order.id, OrderStatus::Shipped).await;
    self.set_status(order.id, OrderStatus::Delivered).await
  }

  pub async fn stored_order(&self, order_id: Uuid) -> Order {
    self
      .commerce
      .order_for(self.main_admin, order_id)
      .await
      .expect("order should exist")
  }
}
