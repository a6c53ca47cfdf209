use std::time::Duration;

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
};

use crate::config::Config;
use crate::middleware::{
    rate_limit::{self, RateLimiter},
    security_headers,
};
use crate::models::AppState;

pub mod appointment_routes;
pub mod auth_routes;
pub mod health_routes;
pub mod user_routes;

pub fn router(state: AppState, cfg: &Config) -> Router {
    let window = Duration::from_secs(cfg.rate_limit_window_secs);
    let global_limiter = RateLimiter::new(cfg.rate_limit_global_max, window);
    // Appointment traffic gets its own, looser budget.
    let appointment_limiter = RateLimiter::new(cfg.rate_limit_appointments_max, window);

    let appointments = appointment_routes::router()
        .layer(from_fn_with_state(appointment_limiter, rate_limit::enforce));

    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1", user_routes::router())
        .nest("/api/v1/appointments", appointments)
        .merge(health_routes::router())
        .fallback(not_found)
        .layer(from_fn_with_state(global_limiter, rate_limit::enforce))
        .layer(from_fn(security_headers::apply))
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "message": "Not Found",
            "statusCode": 404,
            "success": false,
            "errorMessages": [
                { "message": "Not Found", "path": uri.path() }
            ]
        })),
    )
}
