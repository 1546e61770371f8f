//! # Photostore CLI
//!
//! Gatewayと同じ正規化・署名処理をオフラインで実行する運用ツール。
//!
//! ```sh
//! photostore-cli canonical --params params.json
//! photostore-cli sign --key merchant.pem --params params.json
//! photostore-cli verify --cert mypos_cert.pem --params notify.json
//! ```
//!
//! `--params -` で標準入力から読み込む。

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use photostore_crypto::{build_canonical, PaymentSigner, PaymentVerifier};
use photostore_types::{PaymentParams, SignResponse, SIGNATURE_FIELD};

#[derive(Parser)]
#[command(name = "photostore-cli", version, about = "決済パラメータの正規化・署名・検証")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 正規化文字列を出力する
    Canonical {
        /// パラメータJSONファイル（`-` で標準入力）
        #[arg(long)]
        params: PathBuf,
    },
    /// パラメータに署名してBase64署名を出力する
    Sign {
        /// 秘密鍵PEMファイル（PKCS#1 / PKCS#8）
        #[arg(long)]
        key: PathBuf,
        /// パラメータJSONファイル（`-` で標準入力）
        #[arg(long)]
        params: PathBuf,
        /// `{"signature": ...}` 形式のJSONで出力する
        #[arg(long)]
        json: bool,
        /// 署名を付加したパラメータJSON全体を出力する
        #[arg(long, conflicts_with = "json")]
        attach: bool,
    },
    /// パラメータ内の `signature` を検証する
    Verify {
        /// 公開証明書または公開鍵のPEMファイル
        #[arg(long)]
        cert: PathBuf,
        /// パラメータJSONファイル（`-` で標準入力）
        #[arg(long)]
        params: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli.command, &mut stdout.lock())
}

fn run(command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Canonical { params } => {
            let params = read_params(&params)?;
            writeln!(out, "{}", build_canonical(&params))?;
        }
        Command::Sign {
            key,
            params,
            json,
            attach,
        } => {
            let signer = PaymentSigner::from_pem(&read_text(&key)?)
                .with_context(|| format!("秘密鍵を読み込めません: {}", key.display()))?;
            tracing::debug!(key_bits = signer.key_bits(), "秘密鍵を読み込みました");

            let mut params = read_params(&params)?;
            let signature = signer.sign_params(&params)?;

            if attach {
                params.insert(SIGNATURE_FIELD.to_string(), signature.into());
                writeln!(out, "{}", serde_json::to_string_pretty(&params)?)?;
            } else if json {
                writeln!(out, "{}", serde_json::to_string(&SignResponse { signature })?)?;
            } else {
                writeln!(out, "{signature}")?;
            }
        }
        Command::Verify { cert, params } => {
            let verifier = PaymentVerifier::from_pem(&read_text(&cert)?)
                .with_context(|| format!("公開鍵を読み込めません: {}", cert.display()))?;
            let params = read_params(&params)?;

            verifier
                .verify_params(&params)
                .context("署名検証に失敗しました")?;
            writeln!(out, "OK")?;
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("標準入力の読み込みに失敗しました")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("ファイルの読み込みに失敗しました: {}", path.display()))
}

fn read_params(path: &Path) -> anyhow::Result<PaymentParams> {
    let text = read_text(path)?;
    parse_params(&text).with_context(|| format!("パラメータを解釈できません: {}", path.display()))
}

fn parse_params(text: &str) -> anyhow::Result<PaymentParams> {
    match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("JSONオブジェクトが必要です（{} が渡されました）", type_name(&other)),
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
