//! # POST /mypos/sign
//!
//! Embedded Checkout用パラメータへの署名。

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use photostore_crypto::build_canonical;
use photostore_types::{PaymentParams, SignResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /mypos/sign — パラメータ（`signature` なし）に署名する。
///
/// フロントエンドはレスポンスの `signature` をパラメータに加えてSDKに渡す。
/// ボディが空の場合は空のパラメータとして扱う。
pub async fn handle_sign(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Json<SignResponse>, GatewayError> {
    let params = parse_params(&body)?;
    let canonical = build_canonical(&params);

    let signature = state.signer.sign_canonical(&canonical).map_err(|e| {
        tracing::error!(error = %e, "署名に失敗しました");
        GatewayError::SignFailed(e)
    })?;

    tracing::debug!(fields = params.len(), "パラメータに署名しました");
    Ok(Json(SignResponse { signature }))
}

/// リクエストボディをJSONオブジェクトとしてパースする。
fn parse_params(body: &[u8]) -> Result<PaymentParams, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PaymentParams::new());
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(GatewayError::BadRequest(
            "ボディはJSONオブジェクトである必要があります".to_string(),
        )),
        Err(e) => Err(GatewayError::BadRequest(format!("JSONのパースに失敗: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_empty_body() {
        assert!(parse_params(b"").unwrap().is_empty());
        assert!(parse_params(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_params_object() {
        let params = parse_params(br#"{"amount": 10, "currency": "EUR"}"#).unwrap();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_parse_params_rejects_non_object() {
        assert!(matches!(parse_params(b"[1,2]"), Err(GatewayError::BadRequest(_))));
        assert!(matches!(parse_params(b"\"x\""), Err(GatewayError::BadRequest(_))));
        assert!(matches!(parse_params(b"{broken"), Err(GatewayError::BadRequest(_))));
    }
}
