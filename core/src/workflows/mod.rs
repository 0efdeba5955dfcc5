// lustre/src/workflows/mod.rs

//! Order and return workflows. Each multi-step operation is a named
//! `Pipeline` over its own context struct; the context carries a clone of
//! `WorkflowEnv` the same way every handler needs the stores and providers.

pub mod checkout;
pub mod engagement;
pub mod fulfillment;
pub mod payment;
pub mod returns;

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AdminGate;
use crate::error::{WorkflowError, WorkflowResult};
use crate::model::{Order, StockAdjustment};
use crate::notify::NotificationDispatcher;
use crate::ports::Backends;
use crate::settings::StoreSettings;
use payment::PaymentRouter;

#[derive(Clone)]
pub struct WorkflowEnv {
  pub backends: Backends,
  pub settings: Arc<StoreSettings>,
  pub payments: PaymentRouter,
  pub gate: AdminGate,
  pub dispatcher: NotificationDispatcher,
}

pub(crate) async fn fetch_order(env: &WorkflowEnv, order_id: Uuid) -> WorkflowResult<Order> {
  env
    .backends
    .orders
    .order(order_id)
    .await?
    .ok_or_else(|| WorkflowError::not_found(format!("Order {order_id}")))
}

/// Puts every line item of `order` back into inventory.
pub(crate) fn restock_for(order: &Order) -> Vec<StockAdjustment> {
  order
    .items
    .iter()
    .map(|item| StockAdjustment {
      product_id: item.product_id,
      delta: item.quantity,
    })
    .collect()
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub(crate) fn is_http_url(value: &str) -> bool {
  value.starts_with("https://") || value.starts_with("http://")
}
