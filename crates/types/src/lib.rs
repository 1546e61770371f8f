//! # Photostore 共有型定義
//!
//! Gateway（HTTPサービス）とCLIの間で共有するワイヤ型。
//!
//! ## エンコーディング規則
//! - 署名: Base64（Standard、パディングあり）
//! - パラメータ: JSONオブジェクト（`/mypos/sign`）または
//!   `application/x-www-form-urlencoded`（`/mypos/notify`）

use serde::{Deserialize, Serialize};

/// 署名対象のパラメータ集合。キー順序は署名結果に影響しない。
pub type PaymentParams = serde_json::Map<String, serde_json::Value>;

/// 署名フィールド名。正規化時は大文字小文字を区別せずに除外される。
pub const SIGNATURE_FIELD: &str = "signature";

/// notifyコールバックへの応答本文。決済ゲートウェイはこの文字列のみを成功とみなす。
pub const NOTIFY_ACK: &str = "OK";

/// エラーコード: 署名処理の失敗
pub const ERROR_SIGN_FAILED: &str = "sign_failed";

/// エラーコード: リクエストボディがJSONオブジェクトではない
pub const ERROR_INVALID_PARAMS: &str = "invalid_params";

// ---------------------------------------------------------------------------
// POST /mypos/sign
// ---------------------------------------------------------------------------

/// `POST /mypos/sign` のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    /// Base64エンコードされたRSA-SHA256署名
    pub signature: String,
}

/// エラーレスポンス。`{"error": "<code>"}` の形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 機械可読なエラーコード
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: &str) -> Self {
        Self {
            error: code.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// POST /mypos/notify
// ---------------------------------------------------------------------------

/// notifyコールバックの署名検証結果。
///
/// 検証結果にかかわらず応答は常に `200 OK` であり、この値はログ出力にのみ使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// 署名が公開証明書で検証できた
    Verified,
    /// 署名が存在するが検証に失敗した
    Invalid,
    /// 証明書が未設定、または署名フィールドが存在しない
    Unverified,
}

impl NotifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyOutcome::Verified => "verified",
            NotifyOutcome::Invalid => "invalid",
            NotifyOutcome::Unverified => "unverified",
        }
    }
}

impl std::fmt::Display for NotifyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// `GET /health` のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
