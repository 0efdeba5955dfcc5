// tests/return_tests.rs
mod common;

use chrono::{Duration, Utc};
use common::*;
use lustre::model::{
  IssueType, OrderStatus, PaymentMethod, PaymentStatus, ReturnRequest, ReturnStatus, ShipmentDirection,
};
use lustre::{ReturnClaim, ReturnUpdate, WorkflowError};
use uuid::Uuid;

fn claim(h: &Harness, order_id: Uuid) -> ReturnClaim {
  ReturnClaim {
    user_id: h.customer,
    order_id,
    reason: "Stone came loose from the setting".to_string(),
    issue_type: IssueType::Damaged,
    evidence_photos: vec!["https://cdn.example/returns/1.jpg".to_string()],
    video_link: None,
  }
}

fn update(status: ReturnStatus, notes: Option<&str>, restock: bool) -> ReturnUpdate {
  ReturnUpdate {
    status,
    notes: notes.map(str::to_string),
    restock,
  }
}

async fn advance(h: &Harness, request_id: Uuid, status: ReturnStatus, restock: bool) -> Result<ReturnRequest, WorkflowError> {
  h.commerce
    .update_return_status(h.support_admin, request_id, update(status, None, restock))
    .await
}

#[tokio::test]
async fn return_on_shipped_order_is_rejected() {
  let h = Harness::new();
  let order = h.place_order(PaymentMethod::Cod, 200_000).await;
  h.set_status(order.id, OrderStatus::Packed).await;
  h.set_status(order.id, OrderStatus::Shipped).await;

  let err = h.commerce.request_return(claim(&h, order.id)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("delivered")), "{err:?}");
  assert_eq!(h.stored_order(order.id).await.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn return_window_is_enforced() {
  let h = Harness::new();
  let mut order = h.delivered_order(200_000).await;
  order.delivered_at = Some(Utc::now() - Duration::days(8));
  h.store.put_order(order.clone());

  let err = h.commerce.request_return(claim(&h, order.id)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("window")), "{err:?}");
}

#[tokio::test]
async fn claim_validation() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;

  let mut blank = claim(&h, order.id);
  blank.reason = "   ".to_string();
  assert!(matches!(
    h.commerce.request_return(blank).await.unwrap_err(),
    WorkflowError::Validation(_)
  ));

  let mut too_many = claim(&h, order.id);
  too_many.evidence_photos = (0..6).map(|i| format!("https://cdn.example/{i}.jpg")).collect();
  assert!(matches!(
    h.commerce.request_return(too_many).await.unwrap_err(),
    WorkflowError::Validation(_)
  ));

  let mut stranger = claim(&h, order.id);
  stranger.user_id = Uuid::new_v4();
  assert!(matches!(
    h.commerce.request_return(stranger).await.unwrap_err(),
    WorkflowError::Unauthorized
  ));
}

#[tokio::test]
async fn request_moves_order_and_blocks_a_second_request() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;

  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  assert_eq!(request.status, ReturnStatus::Requested);
  let stored = h.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::ReturnRequested);
  assert_eq!(stored.return_status, Some(ReturnStatus::Requested));
  assert_eq!(stored.return_reason.as_deref(), Some("Stone came loose from the setting"));

  let err = h.commerce.request_return(claim(&h, order.id)).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)));
}

#[tokio::test]
async fn rejection_needs_a_reason_and_restores_delivered() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();

  let err = h
    .commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Rejected, Some("  "), false))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(ref m) if m.contains("rejection reason")), "{err:?}");

  let rejected = h
    .commerce
    .update_return_status(
      h.support_admin,
      request.id,
      update(ReturnStatus::Rejected, Some("Wear marks inconsistent with claim"), false),
    )
    .await
    .unwrap();
  assert_eq!(rejected.status, ReturnStatus::Rejected);
  assert_eq!(rejected.rejection_reason.as_deref(), Some("Wear marks inconsistent with claim"));
  let stored = h.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::Delivered);
  assert_eq!(stored.return_status, Some(ReturnStatus::Rejected));
}

#[tokio::test]
async fn customer_can_read_back_the_rejection_reason() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  h.commerce
    .update_return_status(
      h.support_admin,
      request.id,
      update(ReturnStatus::Rejected, Some("Item shows resizing by a third party"), false),
    )
    .await
    .unwrap();

  let mine = h.commerce.returns_for_order(h.customer, order.id).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].status, ReturnStatus::Rejected);
  assert_eq!(mine[0].rejection_reason.as_deref(), Some("Item shows resizing by a third party"));

  let seen_by_staff = h.commerce.returns_for_order(h.staff, order.id).await.unwrap();
  assert_eq!(seen_by_staff, mine);

  for outsider in [Uuid::new_v4(), h.product_manager] {
    let err = h.commerce.returns_for_order(outsider, order.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized), "{err:?}");
  }
}

#[tokio::test]
async fn only_main_admin_can_reapprove_a_rejection() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  h.commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Rejected, Some("No photos"), false))
    .await
    .unwrap();

  let err = h
    .commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Approved, None, false))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized), "{err:?}");
  assert!(h.store.audit_entries().is_empty());

  let approved = h
    .commerce
    .update_return_status(
      h.main_admin,
      request.id,
      update(ReturnStatus::Approved, Some("Photos received by email"), false),
    )
    .await
    .unwrap();
  assert_eq!(approved.status, ReturnStatus::Approved);
  assert!(approved.tracking_number.is_some());

  let audit = h.store.audit_entries();
  assert_eq!(audit.len(), 1);
  assert_eq!(audit[0].action, "reapprove_return");
  assert_eq!(audit[0].actor, h.main_admin);
  assert_eq!(h.stored_order(order.id).await.status, OrderStatus::ReturnRequested);
}

#[tokio::test]
async fn staff_cannot_touch_returns() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  let err = h
    .commerce
    .update_return_status(h.staff, request.id, update(ReturnStatus::Approved, None, false))
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Unauthorized));
}

#[tokio::test]
async fn approval_books_a_reverse_pickup_and_carrier_failure_changes_nothing() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();

  h.carrier.set_available(false);
  let err = h
    .commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Approved, None, false))
    .await
    .unwrap_err();
  assert!(err.is_retryable());

  h.carrier.set_available(true);
  let approved = h
    .commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Approved, None, false))
    .await
    .unwrap();
  let reverse: Vec<_> = h
    .carrier
    .shipments()
    .into_iter()
    .filter(|s| s.direction == ShipmentDirection::Reverse)
    .collect();
  assert_eq!(reverse.len(), 1);
  assert_eq!(reverse[0].cod_amount, None);
  assert!(approved.tracking_number.is_some());
}

#[tokio::test]
async fn skipping_ahead_is_illegal() {
  let h = Harness::new();
  let order = h.delivered_order(200_000).await;
  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  let err = h
    .commerce
    .update_return_status(h.support_admin, request.id, update(ReturnStatus::Refunded, None, false))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    WorkflowError::IllegalReturnTransition {
      from: ReturnStatus::Requested,
      to: ReturnStatus::Refunded
    }
  ));
}

#[tokio::test]
async fn full_return_restocks_once_and_refunds() {
  let h = Harness::new();
  let product = h.product("Diamond Tennis Bracelet", 900_000, 2);
  h.store.add_to_cart(h.customer, product, 1, None);
  let order = h
    .commerce
    .create_order(h.checkout_request(PaymentMethod::Cod))
    .await
    .unwrap();
  h.set_status(order.id, OrderStatus::Packed).await;
  h.set_status(order.id, OrderStatus::Shipped).await;
  h.set_status(order.id, OrderStatus::Delivered).await;
  assert_eq!(h.store.stock_of(product), Some(1));

  let request = h.commerce.request_return(claim(&h, order.id)).await.unwrap();
  let id = request.id;

  advance(&h, id, ReturnStatus::Approved, false).await.unwrap();
  advance(&h, id, ReturnStatus::PickupScheduled, false).await.unwrap();

  let err = advance(&h, id, ReturnStatus::PickedUp, true).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Validation(_)), "{err:?}");
  advance(&h, id, ReturnStatus::PickedUp, false).await.unwrap();

  let received = advance(&h, id, ReturnStatus::Received, false).await.unwrap();
  assert!(received.returned_at.is_some());
  let inspected = advance(&h, id, ReturnStatus::Inspected, true).await.unwrap();
  assert!(inspected.restocked);
  assert_eq!(h.store.stock_of(product), Some(2));

  // A second restock request on the same status is accepted but does nothing.
  advance(&h, id, ReturnStatus::Inspected, true).await.unwrap();
  assert_eq!(h.store.stock_of(product), Some(2));

  let refunded = advance(&h, id, ReturnStatus::Refunded, false).await.unwrap();
  assert!(refunded.refunded_at.is_some());
  let stored = h.stored_order(order.id).await;
  assert_eq!(stored.status, OrderStatus::Returned);
  assert_eq!(stored.return_status, Some(ReturnStatus::Refunded));
  assert!(stored.returned_at.is_some());
  assert_eq!(stored.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn failed_restock_can_be_retried_without_double_counting() {
  let h = Harness::new();
  let product = h.product("Polki Choker", 1_400_000, 1);
  h.store.add_to_cart(h.customer, product, 1, None);
  let order = h
    .commerce
    .create_order(h.checkout_request(PaymentMethod::Cod))
    .await
    .unwrap();
  h.set_status(order.id, OrderStatus::Packed).await;
  h.set_status(order.id, OrderStatus::Shipped).await;
  h.set_status(order.id, OrderStatus::Delivered).await;
  assert_eq!(h.store.stock_of(product), Some(0));

  let id = h.commerce.request_return(claim(&h, order.id)).await.unwrap().id;
  for status in [ReturnStatus::Approved, ReturnStatus::PickupScheduled, ReturnStatus::PickedUp, ReturnStatus::Received] {
    advance(&h, id, status, false).await.unwrap();
  }

  h.store.set_restock_offline(true);
  let err = advance(&h, id, ReturnStatus::Inspected, true).await.unwrap_err();
  assert!(matches!(err, WorkflowError::Store(_)), "{err:?}");
  assert_eq!(h.store.stock_of(product), Some(0));
  let after_failure = h.commerce.returns_for_order(h.customer, order.id).await.unwrap();
  assert!(!after_failure[0].restocked);
  assert_eq!(after_failure[0].status, ReturnStatus::Inspected);

  h.store.set_restock_offline(false);
  let retried = advance(&h, id, ReturnStatus::Inspected, true).await.unwrap();
  assert!(retried.restocked);
  assert_eq!(h.store.stock_of(product), Some(1));

  advance(&h, id, ReturnStatus::Inspected, true).await.unwrap();
  assert_eq!(h.store.stock_of(product), Some(1));
}
