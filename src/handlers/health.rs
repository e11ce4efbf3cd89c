use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = db::try_lock(&state.db)
        .map(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok())
        .unwrap_or(false);

    let (status, code) = if database_ok {
        ("ok", StatusCode::OK)
    } else {
        tracing::warn!("Health check failed: database unavailable");
        ("unavailable", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status,
            database: if database_ok { "ok" } else { "unavailable" },
            timestamp: Utc::now(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::testing::TestEnv;
    use serde_json::Value;

    #[tokio::test]
    async fn test_health_needs_no_user() {
        let env = TestEnv::new().unwrap();
        let server = env.server();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }
}
