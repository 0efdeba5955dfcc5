// tests/fulfillment_tests.rs
mod common;

use common::*;
use lustre::model::{NewPushSubscription, OrderFilter, OrderStatus, PaymentMethod, PaymentStatus, ShipmentDirection};
use lustre::{StatusUpdate, WorkflowError};
use uuid::Uuid;

fn to(status: OrderStatus) -> StatusUpdate {
  StatusUpdate {
    status,
    tracking_number: None,
    cancellation_reason: None,
  }
}

#[tokio::test]
async fn staff_cannot_delete_and_order_is_untouched() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;

  let err = h.commerce.delete_order(h.staff, order.id).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized), "{err:?}");
  assert_eq!(err.to_string(), "Unauthorized");
  assert_eq!(h.stored_order(order.id).await, order);
  assert!(h.store.audit_entries().is_empty());
}

#[tokio::test]
async fn main_admin_delete_is_audited() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;

  h.commerce.delete_order(h.main_admin, order.id).await.unwrap();
  assert_eq!(h.store.order_count(), 0);
  let audit = h.store.audit_entries();
  assert_eq!(audit.len(), 1);
  assert_eq!(audit[0].action, "delete_order");
  assert_eq!(audit[0].actor, h.main_admin);
  assert_eq!(audit[0].subject, order.id.to_string());
}

#[tokio::test]
async fn illegal_transitions_are_rejected_centrally() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Online, 150_000).await;

  let err = h
    .commerce
    .update_order_status(h.staff, order.id, to(OrderStatus::Delivered))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    WorkflowError::IllegalOrderTransition {
      from: OrderStatus::Pending,
      to: OrderStatus::Delivered
    }
  ));

  let err = h
    .commerce
    .update_order_status(h.main_admin, order.id, to(OrderStatus::ReturnRequested))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::IllegalOrderTransition { .. }));
  assert_eq!(h.stored_order(order.id).await.status, OrderStatus::Pending);
}

#[tokio::test]
async fn product_manager_cannot_move_orders() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;
  let err = h
    .commerce
    .update_order_status(h.product_manager, order.id, to(OrderStatus::Packed))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized));
}

#[tokio::test]
async fn shipping_books_a_forward_shipment_and_notifies_the_owner() {
  let h = Harness::new();
  h.commerce
    .subscribe_push(NewPushSubscription {
      endpoint: "https://push.example/customer-phone".to_string(),
      p256dh: "key".to_string(),
      auth: "auth".to_string(),
      user_id: Some(h.customer),
    })
    .await
    .unwrap();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;
  h.set_status(order.id, OrderStatus::Packed).await;

  let shipped = h.set_status(order.id, OrderStatus::Shipped).await;
  let waybill = shipped.tracking_number.clone().unwrap();
  assert!(waybill.starts_with("SBX"));

  let shipments = h.carrier.shipments();
  assert_eq!(shipments.len(), 1);
  assert_eq!(shipments[0].direction, ShipmentDirection::Forward);
  assert_eq!(shipments[0].cod_amount, Some(order.total));

  let sent = h.push.sent();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].1.body.contains(&waybill));
}

#[tokio::test]
async fn supplied_tracking_number_skips_the_carrier() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;
  h.set_status(order.id, OrderStatus::Packed).await;

  let shipped = h
    .commerce
    .update_order_status(
      h.staff,
      order.id,
      StatusUpdate {
        status: OrderStatus::Shipped,
        tracking_number: Some("  BD1234567  ".to_string()),
        cancellation_reason: None,
      },
    )
    .await
    .unwrap();
  assert_eq!(shipped.tracking_number.as_deref(), Some("BD1234567"));
  assert!(h.carrier.shipments().is_empty());
}

#[tokio::test]
async fn carrier_failure_leaves_status_unchanged() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;
  h.set_status(order.id, OrderStatus::Packed).await;
  h.carrier.set_available(false);

  let err = h
    .commerce
    .update_order_status(h.main_admin, order.id, to(OrderStatus::Shipped))
    .await
    .unwrap_err();
  assert!(err.is_retryable());
  let stored = h.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::Packed);
  assert_eq!(stored.tracking_number, None);
}

#[tokio::test]
async fn push_failure_never_fails_a_transition() {
  let h = Harness::new();
  h.commerce
    .subscribe_push(NewPushSubscription {
      endpoint: "https://push.example/broken".to_string(),
      p256dh: "key".to_string(),
      auth: "auth".to_string(),
      user_id: Some(h.customer),
    })
    .await
    .unwrap();
  h.push.mark_failing("https://push.example/broken");

  let order = h.delivered_order(150_000).await;
  assert_eq!(order.status, OrderStatus::Delivered);
  assert!(order.delivered_at.is_some());
}

#[tokio::test]
async fn admin_cancellation_needs_a_reason_and_restocks() {
  let h = Harness::new();
  let product = h.product("Jhumka", 95_000, 3);
  h.store.add_to_cart(h.customer, product, 2, None);
  let order = h
    .commerce
    .create_order(h.checkout_request(PaymentMethod::Cod))
    .await
    .unwrap();
  assert_eq!(h.store.stock_of(product), Some(1));

  let err = h
    .commerce
    .update_order_status(h.support_admin, order.id, to(OrderStatus::Cancelled))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)));

  let cancelled = h
    .commerce
    .update_order_status(
      h.support_admin,
      order.id,
      StatusUpdate {
        status: OrderStatus::Cancelled,
        tracking_number: None,
        cancellation_reason: Some("Customer called to cancel".to_string()),
      },
    )
    .await
    .unwrap();
  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert!(cancelled.cancelled_at.is_some());
  assert_eq!(h.store.stock_of(product), Some(3));
}

#[tokio::test]
async fn customers_cancel_only_their_own_early_orders() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;

  let err = h
    .commerce
    .cancel_order(Uuid::new_v4(), order.id, "changed my mind".to_string())
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized));

  let cancelled = h
    .commerce
    .cancel_order(h.customer, order.id, "changed my mind".to_string())
    .await
    .unwrap();
  assert_eq!(cancelled.status, OrderStatus::Cancelled);

  let packed = h.place_order(PaymentMethod::Cod, 150_000).await;
  h.set_status(packed.id, OrderStatus::Packed).await;
  let err = h
    .commerce
    .cancel_order(h.customer, packed.id, "too late".to_string())
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn tracking_and_labels_follow_the_waybill() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;

  let err = h.commerce.track_order(h.customer, order.id).await.unwrap_err();
  assert!(matches!(err, WorkflowError::NotFound(_)));

  h.set_status(order.id, OrderStatus::Packed).await;
  let shipped = h.set_status(order.id, OrderStatus::Shipped).await;
  let waybill = shipped.tracking_number.unwrap();

  let scans = h.commerce.track_order(h.customer, order.id).await.unwrap();
  assert!(!scans.is_empty());
  let label = h.commerce.shipping_label(h.staff, order.id).await.unwrap();
  assert!(label.contains(&waybill));

  let err = h.commerce.track_order(Uuid::new_v4(), order.id).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized));
}

#[tokio::test]
async fn order_listing_is_scoped_to_the_caller() {
  let h = Harness::new();
  h.place_order(PaymentMethod::Cod, 150_000).await;
  h.place_order(PaymentMethod::Online, 150_000).await;

  let mine = h.commerce.list_orders(h.customer, OrderFilter::default()).await.unwrap();
  assert_eq!(mine.len(), 2);
  let nobody = h.commerce.list_orders(Uuid::new_v4(), OrderFilter::default()).await.unwrap();
  assert!(nobody.is_empty());
  let confirmed = h
    .commerce
    .list_orders(
      h.staff,
      OrderFilter {
        status: Some(OrderStatus::Confirmed),
        ..OrderFilter::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(confirmed.len(), 1);
}

#[tokio::test]
async fn cash_on_delivery_is_settled_at_the_door() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 150_000).await;
  h.set_status(order.id, OrderStatus::Packed).await;
  let shipped = h.set_status(order.id, OrderStatus::Shipped).await;
  assert_eq!(shipped.payment_status, PaymentStatus::Pending);

  let delivered = h.set_status(order.id, OrderStatus::Delivered).await;
  assert_eq!(delivered.payment_status, PaymentStatus::Paid);
  assert!(delivered.delivered_at.is_some());
}
