//! # Photostore 暗号処理
//!
//! 決済ゲートウェイ（myPOS Embedded Checkout）とやり取りするパラメータの
//! 正規化文字列の構築と、RSA-SHA256による署名・検証を提供する。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名 | RSASSA-PKCS1-v1_5 |
//! | ハッシュ | SHA-256 |
//! | 署名エンコーディング | Base64 (Standard) |
//!
//! ## 鍵形式
//! | PEMラベル | 用途 |
//! |-----------|------|
//! | `RSA PRIVATE KEY` | PKCS#1 秘密鍵 |
//! | `PRIVATE KEY` | PKCS#8 秘密鍵 |
//! | `CERTIFICATE` | X.509 証明書（公開鍵のみ使用） |
//! | `PUBLIC KEY` | SPKI 公開鍵 |
//! | `RSA PUBLIC KEY` | PKCS#1 公開鍵 |

pub mod canonical;
pub mod keys;
pub mod signing;

pub use canonical::{build_canonical, build_canonical_from_pairs, stringify_value};
pub use keys::{load_private_key, load_public_key, normalize_pem};
pub use signing::{PaymentSigner, PaymentVerifier};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// PEMブロックが見つからない
    #[error("PEMブロックが見つかりません")]
    MissingPem,
    /// 対応していないPEMラベル
    #[error("対応していないPEMラベル: {0}")]
    UnsupportedPem(String),
    /// 鍵・証明書のパースに失敗
    #[error("鍵のパースに失敗しました: {0}")]
    KeyParse(String),
    /// RSA署名の生成に失敗
    #[error("RSA署名の生成に失敗しました: {0}")]
    SignError(String),
    /// 署名のBase64デコードに失敗
    #[error("署名のBase64デコードに失敗しました: {0}")]
    InvalidBase64(String),
    /// 署名フィールドが存在しない
    #[error("signatureフィールドがありません")]
    MissingSignature,
    /// RSA署名検証エラー
    #[error("RSA署名検証に失敗しました")]
    SignatureVerifyError,
}

/// Base64エンジン（Standard）
pub(crate) fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
