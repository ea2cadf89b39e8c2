use crate::{data::entity::EntityKind, state::RosterState};
use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::{Value, json};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

pub mod entities;
pub mod search;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: RosterState) -> Router {
    let request_timeout = state.config().server_config().request_timeout;

    let mut app = Router::new().route("/health", get(get_health));
    for kind in EntityKind::ALL {
        app = app.nest(&format!("/{}", kind.table()), entities::router(kind));
    }

    app.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        request_timeout,
    ))
    .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

pub async fn get_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
