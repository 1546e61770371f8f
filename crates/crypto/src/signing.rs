//! # RSA-SHA256 署名・検証
//!
//! 正規化文字列のUTF-8バイト列に対してRSASSA-PKCS1-v1_5 (SHA-256) で署名する。
//! 同じ鍵・同じ入力からは常に同じ署名が得られ、OpenSSLの
//! `dgst -sha256 -sign` と一致する。

use base64::Engine;
use photostore_types::PaymentParams;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::canonical::{build_canonical, build_canonical_from_pairs, is_signature_key};
use crate::keys::{load_private_key, load_public_key};
use crate::{b64, CryptoError};

/// 加盟店秘密鍵による署名器。
#[derive(Clone)]
pub struct PaymentSigner {
    signing_key: SigningKey<Sha256>,
    public_key: RsaPublicKey,
}

impl PaymentSigner {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            public_key,
        }
    }

    /// PEM（PKCS#1 / PKCS#8）から署名器を構築する。
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(load_private_key(pem)?))
    }

    /// 正規化文字列に署名し、Base64エンコードした署名を返す。
    pub fn sign_canonical(&self, canonical: &str) -> Result<String, CryptoError> {
        let signature = self
            .signing_key
            .try_sign(canonical.as_bytes())
            .map_err(|e| CryptoError::SignError(e.to_string()))?;
        Ok(b64().encode(signature.to_bytes()))
    }

    /// パラメータを正規化してから署名する。`signature` フィールドは無視される。
    pub fn sign_params(&self, params: &PaymentParams) -> Result<String, CryptoError> {
        self.sign_canonical(&build_canonical(params))
    }

    /// 対応する公開鍵の検証器。
    pub fn verifier(&self) -> PaymentVerifier {
        PaymentVerifier::new(self.public_key.clone())
    }

    /// 鍵長（ビット）
    pub fn key_bits(&self) -> usize {
        self.public_key.size() * 8
    }
}

impl std::fmt::Debug for PaymentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSigner")
            .field("key_bits", &self.key_bits())
            .finish_non_exhaustive()
    }
}

/// 決済ゲートウェイの公開鍵による検証器。
#[derive(Debug, Clone)]
pub struct PaymentVerifier {
    verifying_key: VerifyingKey<Sha256>,
}

impl PaymentVerifier {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self {
            verifying_key: VerifyingKey::<Sha256>::new(public_key),
        }
    }

    /// PEM（証明書 / SPKI / PKCS#1公開鍵）から検証器を構築する。
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(load_public_key(pem)?))
    }

    /// 正規化文字列とBase64署名を検証する。
    pub fn verify_canonical(&self, canonical: &str, signature_b64: &str) -> Result<(), CryptoError> {
        let sig_bytes = b64()
            .decode(signature_b64.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        let signature = Signature::try_from(sig_bytes.as_slice())
            .map_err(|_| CryptoError::SignatureVerifyError)?;

        self.verifying_key
            .verify(canonical.as_bytes(), &signature)
            .map_err(|_| CryptoError::SignatureVerifyError)
    }

    /// パラメータ内の `signature` フィールドを、残りのフィールドの正規化文字列に対して検証する。
    /// 空の `signature` は存在しないものとして扱う。
    pub fn verify_params(&self, params: &PaymentParams) -> Result<(), CryptoError> {
        let signature = params
            .iter()
            .find(|(key, _)| is_signature_key(key))
            .and_then(|(_, value)| value.as_str())
            .filter(|signature| !signature.is_empty())
            .ok_or(CryptoError::MissingSignature)?;

        self.verify_canonical(&build_canonical(params), signature)
    }

    /// form-url-encodedの文字列ペアを検証する。署名フィールドは最後に現れた値を使う。
    /// 空の `signature` は存在しないものとして扱う。
    pub fn verify_pairs(&self, pairs: &[(String, String)]) -> Result<(), CryptoError> {
        let signature = pairs
            .iter()
            .rev()
            .find(|(key, _)| is_signature_key(key))
            .map(|(_, value)| value.as_str())
            .filter(|signature| !signature.is_empty())
            .ok_or(CryptoError::MissingSignature)?;

        let canonical =
            build_canonical_from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.verify_canonical(&canonical, signature)
    }
}
