//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//!
//! | 環境変数 | デフォルト | 内容 |
//! |----------|-----------|------|
//! | `PORT` | `3000` | 待ち受けポート |
//! | `ALLOWED_ORIGIN` | `http://localhost:5173` | CORSで許可するオリジン |
//! | `MYPOS_PRIVATE_KEY_PEM` | （必須） | 署名用秘密鍵PEM |
//! | `MYPOS_PRIVATE_KEY_FILE` | なし | 秘密鍵PEMファイルのパス |
//! | `MYPOS_PUBLIC_CERT_PEM` | なし | notify検証用の公開証明書PEM |
//! | `MYPOS_PUBLIC_CERT_FILE` | なし | 公開証明書PEMファイルのパス |
//!
//! `*_PEM` と `*_FILE` の両方が設定されている場合は `*_PEM` を優先する。

use std::time::Duration;

use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use photostore_crypto::{CryptoError, PaymentSigner, PaymentVerifier};
use tower_http::cors::CorsLayer;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// 環境変数から読み込んだGateway設定。
pub struct GatewayConfig {
    /// 待ち受けポート
    pub port: u16,
    /// CORSで許可するオリジン（フロントエンド）
    pub allowed_origin: String,
    /// 署名用秘密鍵PEM（PKCS#1 / PKCS#8）
    pub private_key_pem: String,
    /// notify検証用の公開証明書PEM。Noneの場合は検証をスキップする
    pub public_cert_pem: Option<String>,
}

impl GatewayConfig {
    /// プロセスの環境変数から設定を読み込む。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む。空文字列は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORTが不正です: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let allowed_origin = get("ALLOWED_ORIGIN")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());

        let private_key_pem =
            inline_or_file(get("MYPOS_PRIVATE_KEY_PEM"), get("MYPOS_PRIVATE_KEY_FILE"))?
                .context("MYPOS_PRIVATE_KEY_PEM（またはMYPOS_PRIVATE_KEY_FILE）が未設定です")?;

        let public_cert_pem =
            inline_or_file(get("MYPOS_PUBLIC_CERT_PEM"), get("MYPOS_PUBLIC_CERT_FILE"))?;

        Ok(Self {
            port,
            allowed_origin,
            private_key_pem,
            public_cert_pem,
        })
    }

    /// 許可オリジンのみを受け付けるCORSレイヤーを構築する。
    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        let origin: HeaderValue = self
            .allowed_origin
            .parse()
            .with_context(|| format!("ALLOWED_ORIGINが不正です: {}", self.allowed_origin))?;

        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(false)
            .max_age(Duration::from_secs(60 * 60)))
    }
}

fn inline_or_file(inline: Option<String>, path: Option<String>) -> anyhow::Result<Option<String>> {
    if inline.is_some() {
        return Ok(inline);
    }
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("PEMファイルの読み込みに失敗: {path}")),
        None => Ok(None),
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 加盟店秘密鍵による署名器
    pub signer: PaymentSigner,
    /// 決済ゲートウェイ公開証明書による検証器。
    /// Noneの場合、notifyの署名検証をスキップする
    pub verifier: Option<PaymentVerifier>,
}

impl GatewayState {
    /// 設定から鍵を読み込んで共有状態を構築する。
    /// 鍵が不正な場合は起動時に失敗させる。
    pub fn from_config(config: &GatewayConfig) -> Result<Self, CryptoError> {
        let signer = PaymentSigner::from_pem(&config.private_key_pem)?;
        let verifier = config
            .public_cert_pem
            .as_deref()
            .map(PaymentVerifier::from_pem)
            .transpose()?;

        Ok(Self { signer, verifier })
    }
}
