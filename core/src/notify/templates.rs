// lustre/src/notify/templates.rs

use crate::model::{format_inr, Order, Product, PushPayload};
use crate::settings::StoreSettings;

/// Builds the push payloads the store sends.
pub struct Templates<'a> {
  settings: &'a StoreSettings,
}

impl<'a> Templates<'a> {
  pub fn new(settings: &'a StoreSettings) -> Self {
    Self { settings }
  }

  fn payload(&self, title: String, body: String, path: &str) -> PushPayload {
    PushPayload {
      title,
      body,
      url: self.settings.link(path),
      icon: self.settings.notification_icon.clone(),
      badge: self.settings.notification_badge.clone(),
    }
  }

  pub fn new_product(&self, product: &Product) -> PushPayload {
    self.payload(
      "New arrival ✨".to_string(),
      format!("{} is now available for {}", product.name, format_inr(product.price)),
      &format!("/products/{}", product.id),
    )
  }

  pub fn order_shipped(&self, order: &Order) -> PushPayload {
    let body = match &order.tracking_number {
      Some(waybill) => format!("Order {} is on its way. Tracking number {}.", order.order_number, waybill),
      None => format!("Order {} is on its way.", order.order_number),
    };
    self.payload("Your order has shipped".to_string(), body, &format!("/orders/{}", order.id))
  }

  pub fn order_delivered(&self, order: &Order) -> PushPayload {
    self.payload(
      "Delivered".to_string(),
      format!("Order {} has been delivered. We hope you love it!", order.order_number),
      &format!("/orders/{}", order.id),
    )
  }

  pub fn order_cancelled(&self, order: &Order) -> PushPayload {
    let body = match &order.cancellation_reason {
      Some(reason) => format!("Order {} was cancelled: {}", order.order_number, reason),
      None => format!("Order {} was cancelled.", order.order_number),
    };
    self.payload("Order cancelled".to_string(), body, &format!("/orders/{}", order.id))
  }

  pub fn abandoned_cart(&self) -> PushPayload {
    self.payload(
      "Still thinking it over?".to_string(),
      "The pieces in your cart are waiting for you.".to_string(),
      "/cart",
    )
  }
}
