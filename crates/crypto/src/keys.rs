//! # PEM鍵の読み込み
//!
//! 秘密鍵はPKCS#1 / PKCS#8をPEMラベルから自動判別する。
//! 公開鍵はX.509証明書、SPKI、PKCS#1のいずれかを受け付ける。

use der::{DecodePem, Encode};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::CryptoError;

const LABEL_PKCS1_PRIVATE: &str = "RSA PRIVATE KEY";
const LABEL_PKCS8_PRIVATE: &str = "PRIVATE KEY";
const LABEL_CERTIFICATE: &str = "CERTIFICATE";
const LABEL_SPKI_PUBLIC: &str = "PUBLIC KEY";
const LABEL_PKCS1_PUBLIC: &str = "RSA PUBLIC KEY";

/// 環境変数経由のPEM文字列を正規化する。
///
/// - 前後の空白と引用符（`"` / `'`）を除去
/// - リテラルの `\n` を改行に変換
/// - CRLFをLFに変換
pub fn normalize_pem(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);

    let mut pem = unquoted.replace("\\n", "\n").replace("\r\n", "\n");
    if !pem.ends_with('\n') {
        pem.push('\n');
    }
    pem
}

/// 最初のPEMブロックを取り出す。戻り値は `(ラベル, BEGIN〜ENDのブロック全体)`。
///
/// 証明書チェーンのように複数ブロックが連結されている場合は先頭のみを使う。
pub(crate) fn first_pem_block(pem: &str) -> Result<(&str, String), CryptoError> {
    let begin = pem.find("-----BEGIN ").ok_or(CryptoError::MissingPem)?;
    let rest = &pem[begin + "-----BEGIN ".len()..];
    let label_end = rest.find("-----").ok_or(CryptoError::MissingPem)?;
    let label = &rest[..label_end];

    let end_marker = format!("-----END {label}-----");
    let end = pem[begin..]
        .find(&end_marker)
        .ok_or(CryptoError::MissingPem)?;
    let block = format!("{}\n", &pem[begin..begin + end + end_marker.len()]);

    Ok((label, block))
}

/// PEMエンコードされたRSA秘密鍵を読み込む（PKCS#1 / PKCS#8 自動判別）。
pub fn load_private_key(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    let pem = normalize_pem(pem);
    let (label, block) = first_pem_block(&pem)?;

    match label {
        LABEL_PKCS1_PRIVATE => RsaPrivateKey::from_pkcs1_pem(&block)
            .map_err(|e| CryptoError::KeyParse(format!("PKCS#1: {e}"))),
        LABEL_PKCS8_PRIVATE => RsaPrivateKey::from_pkcs8_pem(&block)
            .map_err(|e| CryptoError::KeyParse(format!("PKCS#8: {e}"))),
        other => Err(CryptoError::UnsupportedPem(other.to_string())),
    }
}

/// PEMエンコードされたRSA公開鍵を読み込む。
///
/// 証明書の場合はSubjectPublicKeyInfoから公開鍵を取り出す。有効期限や発行者は検証しない。
pub fn load_public_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    let pem = normalize_pem(pem);
    let (label, block) = first_pem_block(&pem)?;

    match label {
        LABEL_CERTIFICATE => {
            let cert = x509_cert::Certificate::from_pem(block.as_bytes())
                .map_err(|e| CryptoError::KeyParse(format!("証明書: {e}")))?;
            let spki_der = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| CryptoError::KeyParse(format!("SPKIのDERエンコード: {e}")))?;
            RsaPublicKey::from_public_key_der(&spki_der)
                .map_err(|e| CryptoError::KeyParse(format!("証明書の公開鍵: {e}")))
        }
        LABEL_SPKI_PUBLIC => RsaPublicKey::from_public_key_pem(&block)
            .map_err(|e| CryptoError::KeyParse(format!("SPKI: {e}"))),
        LABEL_PKCS1_PUBLIC => RsaPublicKey::from_pkcs1_pem(&block)
            .map_err(|e| CryptoError::KeyParse(format!("PKCS#1: {e}"))),
        other => Err(CryptoError::UnsupportedPem(other.to_string())),
    }
}
