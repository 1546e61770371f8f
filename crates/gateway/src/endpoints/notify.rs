//! # POST /mypos/notify
//!
//! 決済ゲートウェイからのnotifyコールバック。
//!
//! ゲートウェイは `200` かつ本文 `OK` 以外を失敗とみなして再送を繰り返すため、
//! ボディが不正な場合や署名検証に失敗した場合でも常に `OK` を返し、結果はログにのみ残す。

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use photostore_crypto::{CryptoError, PaymentVerifier};
use photostore_types::{NotifyOutcome, NOTIFY_ACK};

use crate::config::GatewayState;

/// POST /mypos/notify — form-url-encodedの決済結果を受信する。
pub async fn handle_notify(
    State(state): State<Arc<GatewayState>>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> (StatusCode, &'static str) {
    let pairs = match form {
        Ok(Form(pairs)) => pairs,
        Err(e) => {
            tracing::warn!(error = %e, "notifyペイロードを解析できません");
            return (StatusCode::OK, NOTIFY_ACK);
        }
    };

    tracing::info!(payload = ?pairs, "notifyを受信しました");

    let outcome = verify_notify(state.verifier.as_ref(), &pairs);
    match outcome {
        NotifyOutcome::Verified => tracing::info!(%outcome, "notify署名OK"),
        NotifyOutcome::Invalid => tracing::warn!(%outcome, "notify署名が不正です"),
        NotifyOutcome::Unverified => tracing::debug!(%outcome, "notify署名を検証しませんでした"),
    }

    (StatusCode::OK, NOTIFY_ACK)
}

/// notifyペイロードの署名を検証する。
///
/// 検証器がない場合、または署名フィールドがない（空を含む）場合は [`NotifyOutcome::Unverified`]。
pub(crate) fn verify_notify(
    verifier: Option<&PaymentVerifier>,
    pairs: &[(String, String)],
) -> NotifyOutcome {
    let Some(verifier) = verifier else {
        return NotifyOutcome::Unverified;
    };

    match verifier.verify_pairs(pairs) {
        Ok(()) => NotifyOutcome::Verified,
        Err(CryptoError::MissingSignature) => NotifyOutcome::Unverified,
        Err(e) => {
            tracing::debug!(error = %e, "notify署名検証エラー");
            NotifyOutcome::Invalid
        }
    }
}
