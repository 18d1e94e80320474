//! Counter endpoints - read and vote.

use actix_web::{HttpRequest, HttpResponse, http::Method, web};

use counter_shared::dto::{CountResponse, VoteResponse};

use crate::middleware::{AppError, AppResult};
use crate::state::AppState;

/// Everything that is not /health: GET reads, POST votes, the rest is 405.
pub async fn dispatch(req: HttpRequest, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    match *req.method() {
        Method::GET => read(&state).await,
        Method::POST => vote(&req, &state).await,
        ref other => Err(AppError::MethodNotAllowed(other.to_string())),
    }
}

async fn read(state: &AppState) -> AppResult<HttpResponse> {
    let count = state.service.read().await?;
    Ok(HttpResponse::Ok().json(CountResponse::new(count)))
}

async fn vote(req: &HttpRequest, state: &AppState) -> AppResult<HttpResponse> {
    let client = req
        .headers()
        .get(state.client_ip_header.as_str())
        .and_then(|v| v.to_str().ok());

    let outcome = state.service.vote(client).await?;

    Ok(HttpResponse::Ok().json(VoteResponse {
        count: outcome.count,
        voted: true,
        message: outcome.status.message().to_string(),
    }))
}
