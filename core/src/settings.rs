// lustre/src/settings.rs

use std::time::Duration;

use crate::model::Paise;

/// Workflow tunables. The storefront builds this from its environment; tests
/// use `Default`.
#[derive(Debug, Clone)]
pub struct StoreSettings {
  /// Orders whose subtotal reaches this value (inclusive) ship free.
  pub free_shipping_threshold: Paise,
  /// Used when the carrier cannot quote a rate.
  pub flat_shipping_fee: Paise,
  pub gift_wrap_fee: Paise,
  pub max_gift_message_len: usize,
  pub return_window_days: i64,
  pub max_evidence_photos: usize,
  pub role_cache_ttl: Duration,
  pub role_cache_capacity: usize,
  /// Base URL used in notification deep links.
  pub site_url: String,
  pub notification_icon: String,
  pub notification_badge: String,
}

impl Default for StoreSettings {
  fn default() -> Self {
    Self {
      free_shipping_threshold: 5_000_000,
      flat_shipping_fee: 9_900,
      gift_wrap_fee: 14_900,
      max_gift_message_len: 200,
      return_window_days: 7,
      max_evidence_photos: 5,
      role_cache_ttl: Duration::from_secs(30),
      role_cache_capacity: 1024,
      site_url: "http://localhost:3000".to_string(),
      notification_icon: "/icons/icon-192.png".to_string(),
      notification_badge: "/icons/badge-72.png".to_string(),
    }
  }
}

impl StoreSettings {
  pub fn link(&self, path: &str) -> String {
    format!("{}/{}", self.site_url.trim_end_matches('/'), path.trim_start_matches('/'))
  }
}
