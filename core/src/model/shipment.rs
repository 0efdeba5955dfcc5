// lustre/src/model/shipment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Paise;
use super::order::ShippingAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentDirection {
  Forward,
  /// Reverse pickup: the carrier collects a returned item from the customer.
  Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateQuery {
  pub destination_pincode: String,
  pub weight_grams: i32,
  pub cod: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentRequest {
  pub reference: String,
  pub direction: ShipmentDirection,
  pub address: ShippingAddress,
  pub weight_grams: i32,
  /// Amount the courier collects on delivery; `None` for prepaid and reverse shipments.
  pub cod_amount: Option<Paise>,
  pub declared_value: Paise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
  pub waybill: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingScan {
  pub status: String,
  pub location: String,
  pub timestamp: DateTime<Utc>,
  pub instructions: Option<String>,
}
