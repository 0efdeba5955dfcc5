// storefront/src/services/carrier.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lustre::model::{Paise, RateQuery, Shipment, ShipmentRequest, TrackingScan};
use lustre::ports::Carrier;
use lustre::UpstreamError;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{read_json, transport};

/// Courier API client. Every call carries the account token header.
pub struct HttpCarrier {
  base_url: String,
  token: String,
  client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
  /// Quoted charge in paise.
  total_amount: Paise,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponse {
  waybill: String,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
  status: String,
  location: String,
  timestamp: DateTime<Utc>,
  #[serde(default)]
  instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
  scans: Vec<ScanResponse>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
  label_url: String,
}

impl HttpCarrier {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>, client: reqwest::Client) -> Self {
    Self {
      base_url: base_url.into(),
      token: token.into(),
      client,
    }
  }

  fn get(&self, path: &str) -> reqwest::RequestBuilder {
    self
      .client
      .get(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
      .header("Authorization", format!("Token {}", self.token))
  }
}

#[async_trait]
impl Carrier for HttpCarrier {
  #[instrument(name = "carrier::quote_rate", skip(self), fields(pincode = %query.destination_pincode))]
  async fn quote_rate(&self, query: RateQuery) -> Result<Paise, UpstreamError> {
    let weight = query.weight_grams.to_string();
    let cod = query.cod.to_string();
    let response = self
      .get("api/rates")
      .query(&[
        ("pincode", query.destination_pincode.as_str()),
        ("weight_grams", weight.as_str()),
        ("cod", cod.as_str()),
      ])
      .send()
      .await
      .map_err(transport)?;
    let rate: RateResponse = read_json(response).await?;
    Ok(rate.total_amount)
  }

  #[instrument(name = "carrier::create_shipment", skip(self, request), fields(reference = %request.reference, direction = ?request.direction))]
  async fn create_shipment(&self, request: ShipmentRequest) -> Result<Shipment, UpstreamError> {
    let response = self
      .client
      .post(format!("{}/api/shipments", self.base_url.trim_end_matches('/')))
      .header("Authorization", format!("Token {}", self.token))
      .json(&request)
      .send()
      .await
      .map_err(transport)?;
    let created: ShipmentResponse = read_json(response).await?;
    info!(waybill = %created.waybill, "Carrier shipment booked.");
    Ok(Shipment {
      waybill: created.waybill,
    })
  }

  async fn track(&self, waybill: &str) -> Result<Vec<TrackingScan>, UpstreamError> {
    let response = self
      .get("api/track")
      .query(&[("waybill", waybill)])
      .send()
      .await
      .map_err(transport)?;
    let tracked: TrackResponse = read_json(response).await?;
    Ok(
      tracked
        .scans
        .into_iter()
        .map(|scan| TrackingScan {
          status: scan.status,
          location: scan.location,
          timestamp: scan.timestamp,
          instructions: scan.instructions,
        })
        .collect(),
    )
  }

  async fn label_url(&self, waybill: &str) -> Result<String, UpstreamError> {
    let response = self
      .get("api/label")
      .query(&[("waybill", waybill)])
      .send()
      .await
      .map_err(transport)?;
    let label: LabelResponse = read_json(response).await?;
    Ok(label.label_url)
  }
}
