// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use lustre::StoreSettings;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Credentials for one hosted-checkout gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub base_url: String,
  pub key_id: String,
  pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Required unless `sandbox_providers` is set.
  pub database_url: Option<String>,
  pub run_migrations: bool,

  /// Use the in-process gateway, carrier and push relay instead of HTTP ones.
  pub sandbox_providers: bool,
  pub primary_gateway: Option<GatewayConfig>,
  pub fallback_gateway: Option<GatewayConfig>,
  pub carrier_base_url: String,
  pub carrier_token: String,
  pub push_relay_url: String,
  pub http_timeout: Duration,

  pub settings: StoreSettings,
}

fn var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match var(name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
    None => Ok(default),
  }
}

fn gateway(prefix: &str) -> Result<Option<GatewayConfig>> {
  let base_url = var(&format!("{prefix}_URL"));
  let key_id = var(&format!("{prefix}_KEY_ID"));
  let secret = var(&format!("{prefix}_SECRET"));
  match (base_url, key_id, secret) {
    (Some(base_url), Some(key_id), Some(secret)) => Ok(Some(GatewayConfig { base_url, key_id, secret })),
    (None, None, None) => Ok(None),
    _ => Err(AppError::Config(format!(
      "{prefix}_URL, {prefix}_KEY_ID and {prefix}_SECRET must be set together"
    ))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let server_host = var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed("SERVER_PORT", 8080u16)?;
    let sandbox_providers = parsed("SANDBOX_PROVIDERS", false)?;
    let database_url = var("DATABASE_URL");
    if database_url.is_none() && !sandbox_providers {
      return Err(AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()));
    }

    let primary_gateway = gateway("PRIMARY_GATEWAY")?;
    if primary_gateway.is_none() && !sandbox_providers {
      return Err(AppError::Config("The primary payment gateway is not configured".to_string()));
    }

    let defaults = StoreSettings::default();
    let settings = StoreSettings {
      free_shipping_threshold: parsed("FREE_SHIPPING_THRESHOLD_PAISE", defaults.free_shipping_threshold)?,
      flat_shipping_fee: parsed("FLAT_SHIPPING_FEE_PAISE", defaults.flat_shipping_fee)?,
      gift_wrap_fee: parsed("GIFT_WRAP_FEE_PAISE", defaults.gift_wrap_fee)?,
      max_gift_message_len: parsed("MAX_GIFT_MESSAGE_LEN", defaults.max_gift_message_len)?,
      return_window_days: parsed("RETURN_WINDOW_DAYS", defaults.return_window_days)?,
      max_evidence_photos: parsed("MAX_EVIDENCE_PHOTOS", defaults.max_evidence_photos)?,
      role_cache_ttl: Duration::from_secs(parsed("ROLE_CACHE_TTL_SECS", defaults.role_cache_ttl.as_secs())?),
      role_cache_capacity: parsed("ROLE_CACHE_CAPACITY", defaults.role_cache_capacity)?,
      site_url: var("SITE_URL").unwrap_or(defaults.site_url),
      notification_icon: var("NOTIFICATION_ICON").unwrap_or(defaults.notification_icon),
      notification_badge: var("NOTIFICATION_BADGE").unwrap_or(defaults.notification_badge),
    };

    let config = Self {
      server_host,
      server_port,
      database_url,
      run_migrations: parsed("RUN_MIGRATIONS", true)?,
      sandbox_providers,
      primary_gateway,
      fallback_gateway: gateway("FALLBACK_GATEWAY")?,
      carrier_base_url: var("CARRIER_BASE_URL").unwrap_or_else(|| "https://track.delhivery.com".to_string()),
      carrier_token: var("CARRIER_TOKEN").unwrap_or_default(),
      push_relay_url: var("PUSH_RELAY_URL").unwrap_or_else(|| "http://127.0.0.1:9100".to_string()),
      http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 10u64)?),
      settings,
    };

    tracing::info!(
      sandbox = config.sandbox_providers,
      fallback_gateway = config.fallback_gateway.is_some(),
      "Application configuration loaded."
    );
    Ok(config)
  }
}
