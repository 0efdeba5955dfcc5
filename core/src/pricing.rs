// lustre/src/pricing.rs

//! Checkout arithmetic. Everything here is pure; the carrier quote and coupon
//! lookup happen in the checkout steps and are passed in.

use crate::model::{CartLine, Paise};
use crate::settings::StoreSettings;

pub fn subtotal(lines: &[CartLine]) -> Paise {
  lines.iter().map(CartLine::line_total).sum()
}

pub fn cart_weight_grams(lines: &[CartLine]) -> i32 {
  lines.iter().map(|l| l.weight_grams * l.quantity).sum()
}

pub fn qualifies_for_free_shipping(settings: &StoreSettings, subtotal: Paise) -> bool {
  subtotal >= settings.free_shipping_threshold
}

/// Free above the threshold, otherwise the carrier quote, otherwise the flat fee.
pub fn shipping_fee(settings: &StoreSettings, subtotal: Paise, carrier_quote: Option<Paise>) -> Paise {
  if qualifies_for_free_shipping(settings, subtotal) {
    return 0;
  }
  carrier_quote.filter(|fee| *fee >= 0).unwrap_or(settings.flat_shipping_fee)
}

pub fn gift_wrap_fee(settings: &StoreSettings, gift_wrap: bool) -> Paise {
  if gift_wrap {
    settings.gift_wrap_fee
  } else {
    0
  }
}

/// Trims the message, drops it when empty, and rejects it when too long.
pub fn normalize_gift_message(settings: &StoreSettings, message: Option<&str>) -> Result<Option<String>, String> {
  let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) else {
    return Ok(None);
  };
  if message.chars().count() > settings.max_gift_message_len {
    return Err(format!(
      "Gift message must be at most {} characters",
      settings.max_gift_message_len
    ));
  }
  Ok(Some(message.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threshold_is_inclusive() {
    let settings = StoreSettings::default();
    assert_eq!(shipping_fee(&settings, 5_000_000, Some(25_000)), 0);
    assert_eq!(shipping_fee(&settings, 4_999_999, Some(25_000)), 25_000);
  }

  #[test]
  fn missing_quote_uses_flat_fee() {
    let settings = StoreSettings::default();
    assert_eq!(shipping_fee(&settings, 100_000, None), settings.flat_shipping_fee);
  }

  #[test]
  fn gift_message_is_bounded() {
    let settings = StoreSettings::default();
    assert_eq!(normalize_gift_message(&settings, Some("   ")), Ok(None));
    assert_eq!(
      normalize_gift_message(&settings, Some(" Happy anniversary ")),
      Ok(Some("Happy anniversary".to_string()))
    );
    let long = "x".repeat(settings.max_gift_message_len + 1);
    assert!(normalize_gift_message(&settings, Some(&long)).is_err());
  }
}
