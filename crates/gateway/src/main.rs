//! # Photostore Payment Gateway
//!
//! 写真販売ストアフロントのバックエンド。決済ゲートウェイ（myPOS Embedded Checkout）の
//! パラメータ署名とnotifyコールバックの署名検証を行う。
//!
//! ## API エンドポイント
//! - `POST /mypos/sign` — チェックアウト用パラメータへのRSA-SHA256署名
//! - `POST /mypos/notify` — 決済結果コールバック（常に `200 OK`）
//! - `GET /health` — ヘルスチェック

mod config;
mod endpoints;
mod error;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::{GatewayConfig, GatewayState};
use endpoints::{handle_health, handle_notify, handle_sign};

/// ルーターを構築する。
fn build_router(state: Arc<GatewayState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/mypos/sign", post(handle_sign))
        .route("/mypos/notify", post(handle_notify))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    let state = GatewayState::from_config(&config)?;
    tracing::info!(
        key_bits = state.signer.key_bits(),
        notify_verification = state.verifier.is_some(),
        allowed_origin = %config.allowed_origin,
        "鍵を読み込みました"
    );
    if state.verifier.is_none() {
        tracing::warn!("MYPOS_PUBLIC_CERT_PEMが未設定です。notifyの署名検証をスキップします");
    }

    let app = build_router(Arc::new(state), config.cors_layer()?);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gatewayを停止しました");
    Ok(())
}

/// Ctrl+C または SIGTERM を待つ。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+Cハンドラの登録に失敗しました");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl+Cを受信しました");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("SIGTERMを受信しました");
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERMハンドラの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use photostore_crypto::PaymentVerifier;
    use photostore_types::{ErrorResponse, HealthResponse, SignResponse};
    use tower::ServiceExt;

    const PKCS8: &str = include_str!("../../crypto/tests/fixtures/merchant_pkcs8.pem");
    const CERT: &str = include_str!("../../crypto/tests/fixtures/merchant_cert.pem");
    const OPENSSL_SIGNATURE: &str = include_str!("../../crypto/tests/fixtures/canonical.sig.b64");
    const ORIGIN: &str = "http://localhost:5173";

    /// テスト用ルーターを構築するヘルパー
    fn test_app(with_cert: bool) -> Router {
        let config = GatewayConfig {
            port: 0,
            allowed_origin: ORIGIN.to_string(),
            private_key_pem: PKCS8.to_string(),
            public_cert_pem: with_cert.then(|| CERT.to_string()),
        };
        let state = GatewayState::from_config(&config).unwrap();
        build_router(Arc::new(state), config.cors_layer().unwrap())
    }

    async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_form(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = test_app(false)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert!(health.ok);
    }

    /// キー順序が異なってもOpenSSLで生成した署名と一致する
    #[tokio::test]
    async fn test_sign_matches_openssl() {
        let body = r#"{
            "walletNumber": "61938166610",
            "orderID": "1700000000000_ab12cd",
            "amount": 23.45,
            "currency": "EUR",
            "sid": "000000000000010"
        }"#;
        let resp = test_app(false).oneshot(post_json("/mypos/sign", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let signed: SignResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(signed.signature, OPENSSL_SIGNATURE.trim());
    }

    #[tokio::test]
    async fn test_sign_verifies_against_cert() {
        let body = r#"{"amount": 12, "currency": "EUR", "cartItems": [{"article": "a.jpg", "price": 12, "quantity": 1}]}"#;
        let resp = test_app(false).oneshot(post_json("/mypos/sign", body)).await.unwrap();
        let signed: SignResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();

        let mut params: photostore_types::PaymentParams = serde_json::from_str(body).unwrap();
        params.insert("signature".to_string(), serde_json::json!(signed.signature));
        let verifier = PaymentVerifier::from_pem(CERT).unwrap();
        assert!(verifier.verify_params(&params).is_ok());
    }

    #[tokio::test]
    async fn test_sign_empty_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/mypos/sign")
            .body(Body::empty())
            .unwrap();
        let resp = test_app(false).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let signed: SignResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        let verifier = PaymentVerifier::from_pem(CERT).unwrap();
        assert!(verifier.verify_canonical("", &signed.signature).is_ok());
    }

    #[tokio::test]
    async fn test_sign_rejects_non_object() {
        for body in ["[1, 2, 3]", "{not json"] {
            let resp = test_app(false).oneshot(post_json("/mypos/sign", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: ErrorResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
            assert_eq!(err.error, "invalid_params");
        }
    }

    #[tokio::test]
    async fn test_notify_valid_signature() {
        let signer = photostore_crypto::PaymentSigner::from_pem(PKCS8).unwrap();
        let signature = signer
            .sign_canonical("Amount=23.45&OrderID=1700000000000_ab12cd")
            .unwrap();
        let encoded = signature
            .replace('+', "%2B")
            .replace('/', "%2F")
            .replace('=', "%3D");
        let body = format!("OrderID=1700000000000_ab12cd&Amount=23.45&signature={encoded}");

        let resp = test_app(true).oneshot(post_form("/mypos/notify", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"OK");
    }

    /// 署名が不正でも再送を防ぐため `OK` を返す
    #[tokio::test]
    async fn test_notify_invalid_signature_still_ok() {
        let body = "OrderID=1&Amount=1.00&signature=AAAA".to_string();
        let resp = test_app(true).oneshot(post_form("/mypos/notify", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"OK");
    }

    #[tokio::test]
    async fn test_notify_malformed_body_still_ok() {
        let resp = test_app(true)
            .oneshot(post_json("/mypos/notify", r#"{"OrderID": 1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"OK");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/mypos/sign")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let resp = test_app(false).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ORIGIN
        );
    }

    /// 許可オリジンは固定で返され、他オリジンの拒否はブラウザ側で行われる
    #[tokio::test]
    async fn test_cors_never_echoes_other_origin() {
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let resp = test_app(false).oneshot(req).await.unwrap();
        let allow_origin = resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap();
        assert_ne!(allow_origin, "https://evil.example");
        assert_eq!(allow_origin, ORIGIN);
    }
}
