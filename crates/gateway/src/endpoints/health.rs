//! # GET /health

use axum::Json;
use photostore_types::HealthResponse;

/// GET /health — ヘルスチェック。
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
