use axum::{Router, extract::State, routing::get};
use chrono::Utc;
use serde::Serialize;

use crate::models::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthServices {
    pub database: String,
    pub server: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub timestamp: String,
    pub uptime: f64,
    pub environment: String,
    pub version: String,
    pub services: HealthServices,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    let data = HealthData {
        status: if db_ok { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: HealthServices {
            database: if db_ok { "healthy" } else { "unhealthy" }.to_string(),
            server: "healthy".to_string(),
        },
    };

    if db_ok {
        ApiResponse::ok("Health check successful", data)
    } else {
        ApiResponse {
            success: false,
            status_code: 500,
            message: "Health check failed".to_string(),
            data,
            meta: None,
        }
    }
}
