// lustre/src/model/coupon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::{format_inr, Paise};
use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
  Percentage,
  Fixed,
}

impl DiscountType {
  pub fn as_str(&self) -> &'static str {
    match self {
      DiscountType::Percentage => "percentage",
      DiscountType::Fixed => "fixed",
    }
  }
}

impl fmt::Display for DiscountType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DiscountType {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "percentage" => Ok(DiscountType::Percentage),
      "fixed" => Ok(DiscountType::Fixed),
      other => Err(UnknownVariant::new("discount type", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
  /// Always stored upper-case.
  pub code: String,
  pub discount_type: DiscountType,
  /// Whole percent for `Percentage`, paise for `Fixed`.
  pub discount_value: i64,
  pub min_order_value: Paise,
  /// Cap for percentage coupons.
  pub max_discount: Option<Paise>,
  pub usage_limit: Option<i32>,
  pub used_count: i32,
  pub is_active: bool,
  pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
  pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
  }

  pub fn is_exhausted(&self) -> bool {
    matches!(self.usage_limit, Some(limit) if self.used_count >= limit)
  }

  /// Discount this coupon grants on `subtotal` right now, or the reason it
  /// cannot be applied. The result never exceeds the subtotal or the cap.
  pub fn discount_for(&self, subtotal: Paise, now: DateTime<Utc>) -> Result<Paise, String> {
    if !self.is_active {
      return Err(format!("Coupon {} is not active", self.code));
    }
    if matches!(self.expires_at, Some(expiry) if expiry <= now) {
      return Err(format!("Coupon {} has expired", self.code));
    }
    if self.is_exhausted() {
      return Err(format!("Coupon {} has reached its usage limit", self.code));
    }
    if subtotal < self.min_order_value {
      return Err(format!(
        "Coupon {} needs a minimum order value of {}",
        self.code,
        format_inr(self.min_order_value)
      ));
    }

    let raw = match self.discount_type {
      DiscountType::Percentage => {
        if !(1..=100).contains(&self.discount_value) {
          return Err(format!("Coupon {} is misconfigured", self.code));
        }
        let percent = subtotal * self.discount_value / 100;
        match self.max_discount {
          Some(cap) => percent.min(cap),
          None => percent,
        }
      }
      DiscountType::Fixed => self.discount_value,
    };

    Ok(raw.clamp(0, subtotal))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
    Coupon {
      code: "SPARKLE10".into(),
      discount_type,
      discount_value: value,
      min_order_value: 100_000,
      max_discount: None,
      usage_limit: None,
      used_count: 0,
      is_active: true,
      expires_at: None,
    }
  }

  #[test]
  fn percentage_respects_cap() {
    let mut c = coupon(DiscountType::Percentage, 10);
    assert_eq!(c.discount_for(1_000_000, Utc::now()), Ok(100_000));
    c.max_discount = Some(50_000);
    assert_eq!(c.discount_for(1_000_000, Utc::now()), Ok(50_000));
  }

  #[test]
  fn fixed_never_exceeds_subtotal() {
    let mut c = coupon(DiscountType::Fixed, 500_000);
    c.min_order_value = 0;
    assert_eq!(c.discount_for(200_000, Utc::now()), Ok(200_000));
  }

  #[test]
  fn rejects_below_minimum_and_when_exhausted() {
    let mut c = coupon(DiscountType::Fixed, 10_000);
    assert!(c.discount_for(50_000, Utc::now()).is_err());
    c.usage_limit = Some(3);
    c.used_count = 3;
    let err = c.discount_for(500_000, Utc::now()).unwrap_err();
    assert!(err.contains("usage limit"));
  }

  #[test]
  fn codes_are_upper_cased() {
    assert_eq!(Coupon::normalize_code("  sparkle10 "), "SPARKLE10");
  }
}
