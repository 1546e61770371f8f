//! # Gateway エラー型
//!
//! レスポンスボディは `{"error": "<code>"}` 形式のJSON。

use axum::http::StatusCode;
use axum::Json;
use photostore_types::{ErrorResponse, ERROR_INVALID_PARAMS, ERROR_SIGN_FAILED};

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（JSONパース失敗、オブジェクト以外のボディ）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 署名処理に失敗
    #[error("署名処理に失敗: {0}")]
    SignFailed(#[from] photostore_crypto::CryptoError),
}

impl GatewayError {
    /// クライアントに返すエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => ERROR_INVALID_PARAMS,
            GatewayError::SignFailed(_) => ERROR_SIGN_FAILED,
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::SignFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::new(self.code()))).into_response()
    }
}
