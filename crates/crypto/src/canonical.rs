//! # 正規化文字列
//!
//! 署名入力となる決定的な文字列を構築する。
//!
//! 1. `signature` キーを除外（大文字小文字を区別しない）
//! 2. 残りのキーをバイト順で昇順ソート
//! 3. `key=value` を `&` で連結（値はエスケープしない）
//!
//! 値の文字列化規則は [`stringify_value`] を参照。

use std::collections::BTreeMap;

use photostore_types::{PaymentParams, SIGNATURE_FIELD};
use serde_json::{Number, Value};

/// JSONパラメータから正規化文字列を構築する。
///
/// 入力のキー順序は結果に影響しない。空のパラメータは空文字列になる。
pub fn build_canonical(params: &PaymentParams) -> String {
    let mut entries: Vec<(&str, &Value)> = params
        .iter()
        .filter(|(key, _)| !is_signature_key(key))
        .map(|(key, value)| (key.as_str(), value))
        .collect();

    // serde_jsonのpreserve_order有効時は挿入順になるため、明示的にソートする
    entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    entries
        .iter()
        .map(|(key, value)| format!("{key}={}", stringify_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// 文字列ペア（form-url-encoded由来）から正規化文字列を構築する。
///
/// 同じキーが複数回現れた場合は最後の値を採用する。
pub fn build_canonical_from_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let entries: BTreeMap<&str, &str> = pairs
        .into_iter()
        .filter(|(key, _)| !is_signature_key(key))
        .collect();

    entries
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// キーが署名フィールドかどうか（ASCII大文字小文字を区別しない）。
pub fn is_signature_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(SIGNATURE_FIELD)
}

/// 値を決定的に文字列化する。
///
/// | 型 | 規則 |
/// |----|------|
/// | 文字列 | そのまま（引用符なし） |
/// | 数値 | JavaScriptの文字列変換と同じ形式（`10.0` → `10`） |
/// | 真偽値 | `true` / `false` |
/// | null | `null`（配列要素の場合は空文字列） |
/// | 配列 | 各要素を同じ規則で文字列化し `,` で連結 |
/// | オブジェクト | キーを再帰的にソートしたコンパクトJSON |
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => stringify_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify_array_element)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => {
            let mut out = String::new();
            write_sorted_json(value, &mut out);
            out
        }
    }
}

/// 配列要素の文字列化。JavaScriptの `Array.prototype.join` と同様にnullは空文字列になる。
fn stringify_array_element(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => stringify_value(other),
    }
}

fn stringify_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // -0.0 も "0"
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// キーをバイト順にソートしたコンパクトJSONを書き出す。
fn write_sorted_json(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            out.push('{');
            for (i, (key, inner)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_sorted_json(inner, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, inner) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted_json(inner, out);
            }
            out.push(']');
        }
        Value::Number(n) => out.push_str(&stringify_number(n)),
        other => out.push_str(&other.to_string()),
    }
}
