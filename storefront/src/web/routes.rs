// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;
use crate::web::handlers::{admin_handlers, checkout_handlers, order_handlers, push_handlers, return_handlers};

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let database = match &app_state.db_pool {
    Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
      Ok(_) => "ok",
      Err(e) => {
        tracing::error!(error = %e, "Health check could not reach the database.");
        return HttpResponse::ServiceUnavailable().json(json!({ "status": "degraded", "database": "unreachable" }));
      }
    },
    None => "memory",
  };
  HttpResponse::Ok().json(json!({ "status": "ok", "database": database }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route(
        "/checkout/orders",
        web::post().to(checkout_handlers::create_order_handler),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route(
            "/{order_id}/payment",
            web::post().to(checkout_handlers::initiate_payment_handler),
          )
          .route(
            "/{order_id}/payment/verify",
            web::post().to(checkout_handlers::verify_payment_handler),
          )
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}/tracking", web::get().to(order_handlers::track_order_handler))
          .route(
            "/{order_id}/returns",
            web::post().to(return_handlers::request_return_handler),
          )
          .route(
            "/{order_id}/returns",
            web::get().to(return_handlers::list_returns_handler),
          ),
      )
      .route(
        "/push/subscriptions",
        web::post().to(push_handlers::subscribe_handler),
      )
      .service(
        web::scope("/admin")
          .route(
            "/orders/{order_id}/status",
            web::post().to(admin_handlers::update_order_status_handler),
          )
          .route("/orders/{order_id}", web::delete().to(admin_handlers::delete_order_handler))
          .route(
            "/orders/{order_id}/label",
            web::get().to(admin_handlers::shipping_label_handler),
          )
          .route(
            "/returns/{request_id}/status",
            web::post().to(admin_handlers::update_return_status_handler),
          )
          .route("/roles/{user_id}", web::put().to(admin_handlers::assign_role_handler))
          .route("/roles/{user_id}", web::delete().to(admin_handlers::revoke_role_handler))
          .route(
            "/notifications/products/{product_id}",
            web::post().to(admin_handlers::announce_product_handler),
          )
          .route(
            "/notifications/abandoned-carts",
            web::post().to(admin_handlers::abandoned_carts_handler),
          ),
      ),
  );
}
