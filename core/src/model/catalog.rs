// lustre/src/model/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Paise;
use super::order::ShippingAddress;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub price: Paise,
  pub stock_quantity: i32,
  pub weight_grams: i32,
  pub image_url: Option<String>,
  /// Hallmark Unique Identification code, when certified.
  pub huid: Option<String>,
  pub is_active: bool,
}

/// A cart row joined with the live catalog price at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub unit_price: Paise,
  pub quantity: i32,
  pub size: Option<String>,
  pub stock_quantity: i32,
  pub weight_grams: i32,
  /// Whether the product is still listed. Delisted lines block checkout.
  pub is_active: bool,
  pub updated_at: DateTime<Utc>,
}

impl CartLine {
  pub fn line_total(&self) -> Paise {
    self.unit_price * Paise::from(self.quantity)
  }
}

/// A saved address in the customer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub full_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub country: String,
}

impl Address {
  pub fn snapshot(&self) -> ShippingAddress {
    ShippingAddress {
      full_name: self.full_name.clone(),
      phone: self.phone.clone(),
      line1: self.line1.clone(),
      line2: self.line2.clone(),
      city: self.city.clone(),
      state: self.state.clone(),
      pincode: self.pincode.clone(),
      country: self.country.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
  pub user_id: Uuid,
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

/// Stock delta for one product, positive when returning units to inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
  pub product_id: Uuid,
  pub delta: i32,
}
