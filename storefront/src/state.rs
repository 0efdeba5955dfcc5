// storefront/src/state.rs

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::errors::{AppError, Result};
use crate::services::{http_client, HostedCheckoutGateway, HttpCarrier, PushRelay};
use lustre::memory::MemoryStore;
use lustre::ports::{Carrier, PaymentGateway, PushSender};
use lustre::sandbox::{SandboxCarrier, SandboxGateway, SandboxPush};
use lustre::{Backends, Commerce, PaymentRouter};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub commerce: Arc<Commerce>,
  pub config: Arc<AppConfig>,
  /// `None` when running against the in-memory store.
  pub db_pool: Option<PgPool>,
}

impl AppState {
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let client = http_client(config.http_timeout);

    let (carrier, push, payments): (Arc<dyn Carrier>, Arc<dyn PushSender>, PaymentRouter) = if config.sandbox_providers {
      tracing::warn!("Using sandbox payment gateway, carrier and push relay.");
      let primary: Arc<dyn PaymentGateway> = Arc::new(SandboxGateway::new("sandbox_primary", "sandbox-primary-secret"));
      let fallback: Arc<dyn PaymentGateway> =
        Arc::new(SandboxGateway::new("sandbox_fallback", "sandbox-fallback-secret"));
      let carrier: Arc<dyn Carrier> = Arc::new(SandboxCarrier::new(config.settings.flat_shipping_fee));
      let push: Arc<dyn PushSender> = Arc::new(SandboxPush::new());
      (carrier, push, PaymentRouter::new(primary, Some(fallback)))
    } else {
      let primary_config = config
        .primary_gateway
        .clone()
        .ok_or_else(|| AppError::Config("The primary payment gateway is not configured".to_string()))?;
      let primary: Arc<dyn PaymentGateway> =
        Arc::new(HostedCheckoutGateway::new("primary", primary_config, client.clone()));
      let fallback = config.fallback_gateway.clone().map(|fallback_config| {
        Arc::new(HostedCheckoutGateway::new("fallback", fallback_config, client.clone())) as Arc<dyn PaymentGateway>
      });
      let carrier: Arc<dyn Carrier> =
        Arc::new(HttpCarrier::new(&config.carrier_base_url, &config.carrier_token, client.clone()));
      let push: Arc<dyn PushSender> = Arc::new(PushRelay::new(&config.push_relay_url, client));
      (carrier, push, PaymentRouter::new(primary, fallback))
    };

    let (backends, db_pool) = match &config.database_url {
      Some(url) => {
        let pool = PgPool::connect(url).await?;
        tracing::info!("Connected to the database.");
        if config.run_migrations {
          sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {e}")))?;
        }
        let store = Arc::new(PgStore::new(pool.clone()));
        (Backends::from_store(store, carrier, push), Some(pool))
      }
      None => {
        tracing::warn!("No DATABASE_URL; orders live in memory for this process only.");
        (Backends::from_store(Arc::new(MemoryStore::new()), carrier, push), None)
      }
    };

    Ok(Self {
      commerce: Arc::new(Commerce::new(backends, config.settings.clone(), payments)),
      config: Arc::new(config),
      db_pool,
    })
  }
}
