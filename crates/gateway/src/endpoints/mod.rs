//! # Gatewayエンドポイント
//!
//! - `POST /mypos/sign` — Embedded Checkout用パラメータへの署名
//! - `POST /mypos/notify` — 決済結果のnotifyコールバック受信
//! - `GET /health` — ヘルスチェック

pub mod health;
pub mod notify;
pub mod sign;

pub use health::handle_health;
pub use notify::handle_notify;
pub use sign::handle_sign;
