//! HTTP handlers and route configuration.

mod counter;
mod health;

use actix_web::web;
use counter_core::ports::HEALTH_PATH;

/// Configure all application routes.
///
/// Preflights never get here; the CORS middleware answers them.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(HEALTH_PATH, web::route().to(health::health_check))
        .default_service(web::route().to(counter::dispatch));
}
