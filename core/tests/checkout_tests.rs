// tests/checkout_tests.rs
mod common;

use common::*;
use lustre::model::{Coupon, DiscountType, OrderStatus, PaymentMethod, PaymentStatus};
use lustre::{StoreSettings, WorkflowError};
use uuid::Uuid;

fn coupon(code: &str, discount_type: DiscountType, value: i64, usage_limit: Option<i32>) -> Coupon {
  Coupon {
    code: code.to_string(),
    discount_type,
    discount_value: value,
    min_order_value: 0,
    max_discount: None,
    usage_limit,
    used_count: 0,
    is_active: true,
    expires_at: None,
  }
}

#[tokio::test]
async fn total_is_fixed_at_creation_and_survives_price_changes() {
  let h = Harness::new();
  let ring = h.product("Emerald Ring", 1_250_000, 4);
  let studs = h.product("Pearl Studs", 310_000, 4);
  h.store.add_to_cart(h.customer, ring, 1, Some("14"));
  h.store.add_to_cart(h.customer, studs, 2, None);
  h.store.add_coupon(coupon("FESTIVE5", DiscountType::Percentage, 5, None));

  let mut request = h.checkout_request(PaymentMethod::Online);
  request.gift_wrap = true;
  request.gift_message = Some("For Meera".to_string());
  request.coupon_code = Some("festive5".to_string());
  let order = h.commerce.create_order(request).await.unwrap();

  let subtotal = 1_250_000 + 2 * 310_000;
  let settings = StoreSettings::default();
  assert_eq!(order.subtotal, subtotal);
  assert_eq!(order.shipping_fee, CARRIER_RATE);
  assert_eq!(order.gift_wrap_fee, settings.gift_wrap_fee);
  assert_eq!(order.discount, subtotal * 5 / 100);
  assert_eq!(
    order.total,
    order.subtotal + order.shipping_fee + order.gift_wrap_fee - order.discount
  );
  assert_eq!(order.coupon_code.as_deref(), Some("FESTIVE5"));
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.payment_status, PaymentStatus::Pending);

  h.store.set_price(ring, 2_000_000);
  let reread = h.stored_order(order.id).await;
  assert_eq!(reread.total, order.total);
  let ring_line = reread.items.iter().find(|i| i.product_id == ring).unwrap();
  assert_eq!(ring_line.unit_price, 1_250_000);
}

#[tokio::test]
async fn checkout_decrements_stock_and_clears_cart() {
  let h = Harness::new();
  let bangle = h.product("Gold Bangle", 800_000, 3);
  h.store.add_to_cart(h.customer, bangle, 2, None);

  h.commerce.create_order(h.checkout_request(PaymentMethod::Online)).await.unwrap();

  assert_eq!(h.store.stock_of(bangle), Some(1));
  assert_eq!(h.store.cart_len(h.customer), 0);
}

#[tokio::test]
async fn free_shipping_threshold_is_inclusive() {
  let h = Harness::new();
  let necklace = h.product("Temple Necklace", 5_000_000, 1);
  h.store.add_to_cart(h.customer, necklace, 1, None);

  let order = h.commerce.create_order(h.checkout_request(PaymentMethod::Online)).await.unwrap();
  assert_eq!(order.shipping_fee, 0);
  assert_eq!(order.total, 5_000_000);
}

#[tokio::test]
async fn carrier_outage_falls_back_to_flat_fee() {
  let h = Harness::new();
  h.carrier.set_available(false);
  let order = h.place_order(PaymentMethod::Online, 120_000).await;
  assert_eq!(order.shipping_fee, StoreSettings::default().flat_shipping_fee);
}

#[tokio::test]
async fn cash_on_delivery_is_confirmed_immediately() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 90_000).await;
  assert_eq!(order.status, OrderStatus::Confirmed);
  assert_eq!(order.payment_status, PaymentStatus::Pending);
  assert_eq!(h.stored_order(order.id).await.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
  let h = Harness::new();
  let err = h.commerce.create_order(h.checkout_request(PaymentMethod::Online)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("empty")), "{err:?}");
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn another_customers_address_is_rejected() {
  let h = Harness::new();
  let pendant = h.product("Pendant", 150_000, 2);
  let stranger = Uuid::new_v4();
  h.store.add_to_cart(stranger, pendant, 1, None);

  let mut request = h.checkout_request(PaymentMethod::Online);
  request.user_id = stranger;
  let err = h.commerce.create_order(request).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn insufficient_stock_is_rejected_without_side_effects() {
  let h = Harness::new();
  let anklet = h.product("Silver Anklet", 45_000, 1);
  h.store.add_to_cart(h.customer, anklet, 2, None);

  let err = h.commerce.create_order(h.checkout_request(PaymentMethod::Online)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("Silver Anklet")), "{err:?}");
  assert_eq!(h.store.stock_of(anklet), Some(1));
  assert_eq!(h.store.cart_len(h.customer), 1);
}

#[tokio::test]
async fn sizes_of_one_product_share_its_stock() {
  let h = Harness::new();
  let bangle = h.product("Gold Bangle", 180_000, 5);
  h.store.add_to_cart(h.customer, bangle, 3, Some("2.4"));
  h.store.add_to_cart(h.customer, bangle, 3, Some("2.6"));

  let err = h.commerce.create_order(h.checkout_request(PaymentMethod::Cod)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("Only 5 left")), "{err:?}");
  assert_eq!(h.store.stock_of(bangle), Some(5));
  assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn sizes_within_stock_check_out_together() {
  let h = Harness::new();
  let bangle = h.product("Gold Bangle", 180_000, 5);
  h.store.add_to_cart(h.customer, bangle, 2, Some("2.4"));
  h.store.add_to_cart(h.customer, bangle, 3, Some("2.6"));

  let order = h.commerce.create_order(h.checkout_request(PaymentMethod::Cod)).await.unwrap();
  assert_eq!(order.items.len(), 2);
  assert_eq!(h.store.stock_of(bangle), Some(0));
}

#[tokio::test]
async fn delisted_product_blocks_checkout() {
  let h = Harness::new();
  let pendant = h.product("Ruby Pendant", 520_000, 3);
  h.store.add_to_cart(h.customer, pendant, 1, None);
  h.store.set_active(pendant, false);

  let err = h.commerce.create_order(h.checkout_request(PaymentMethod::Online)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("Ruby Pendant")), "{err:?}");
  assert_eq!(h.store.stock_of(pendant), Some(3));
  assert_eq!(h.store.cart_len(h.customer), 1);
}

#[tokio::test]
async fn coupon_usage_never_exceeds_limit() {
  let h = Harness::new();
  h.store.add_coupon(coupon("ONCE", DiscountType::Fixed, 10_000, Some(1)));

  let first_product = h.product("Nose Pin", 60_000, 5);
  h.store.add_to_cart(h.customer, first_product, 1, None);
  let mut request = h.checkout_request(PaymentMethod::Online);
  request.coupon_code = Some("ONCE".to_string());
  let first = h.commerce.create_order(request.clone()).await.unwrap();
  assert_eq!(first.discount, 10_000);
  assert_eq!(h.store.coupon_usage("ONCE"), Some(1));

  h.store.add_to_cart(h.customer, first_product, 1, None);
  let err = h.commerce.create_order(request).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("usage limit")), "{err:?}");
  assert_eq!(h.store.coupon_usage("ONCE"), Some(1));
  assert_eq!(h.store.order_count(), 1);
}

#[tokio::test]
async fn client_discount_is_never_trusted() {
  let h = Harness::new();
  h.store.add_coupon(coupon("FLAT500", DiscountType::Fixed, 50_000, None));
  let chain = h.product("Rope Chain", 400_000, 2);
  h.store.add_to_cart(h.customer, chain, 1, None);

  let mut request = h.checkout_request(PaymentMethod::Online);
  request.coupon_code = Some("FLAT500".to_string());
  request.client_discount = Some(400_000);
  let order = h.commerce.create_order(request).await.unwrap();
  assert_eq!(order.discount, 50_000);
}

#[tokio::test]
async fn unknown_coupon_and_long_gift_message_are_validation_errors() {
  let h = Harness::new();
  let cuff = h.product("Cuff", 70_000, 3);
  h.store.add_to_cart(h.customer, cuff, 1, None);

  let mut request = h.checkout_request(PaymentMethod::Online);
  request.coupon_code = Some("NOPE".to_string());
  let err = h.commerce.create_order(request).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)), "{err:?}");

  let mut request = h.checkout_request(PaymentMethod::Online);
  request.gift_wrap = true;
  request.gift_message = Some("x".repeat(201));
  let err = h.commerce.create_order(request).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("Gift message")), "{err:?}");
  assert_eq!(h.store.order_count(), 0);
}
