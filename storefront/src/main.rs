// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;


use crate::config::AppConfig;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Lustre storefront server...");

  let app_config = AppConfig::from_env().map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
  })?;
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);

  let app_state = AppState::from_config(app_config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise application state.");
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
  })?;

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
