// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod checkout_handlers;
pub mod order_handlers;
pub mod push_handlers;
pub mod return_handlers;

use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

/// `{"success": true, "data": ...}` with the given status.
pub(crate) fn success<T: Serialize>(mut builder: actix_web::HttpResponseBuilder, data: T) -> HttpResponse {
  builder.json(json!({ "success": true, "data": data }))
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
  success(HttpResponse::Ok(), data)
}

pub(crate) fn created<T: Serialize>(data: T) -> HttpResponse {
  success(HttpResponse::Created(), data)
}
