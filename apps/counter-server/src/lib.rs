//! # Counter Server
//!
//! Actix-web front for the 1mb presence counter: `GET /` reads the count,
//! `POST /` votes once per client per day, `/health` probes the store.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod telemetry;

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};

use middleware::{Cors, CorsPolicy, RequestLog};
use state::AppState;

/// The application with its middleware stack, minus the outer tracing logger.
pub fn build_app(
    state: AppState,
    cors: CorsPolicy,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let events = state.service.events().clone();

    App::new()
        .app_data(web::Data::new(state))
        .configure(handlers::configure_routes)
        .wrap(RequestLog::new(events))
        .wrap(Cors::new(cors))
}
