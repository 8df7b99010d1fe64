/// 配列フィールドの正規化と更新セットの準備
///
/// HTTPリクエストボディ由来の生の変更セットを、許可リストで
/// フィルタリングした検証済みの更新セットへ変換する。
use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::field_value::{FieldValue, UpdateSet};

/// 宣言された配列フィールドをネイティブな文字列配列へ正規化する
///
/// 各配列フィールドについて:
/// - 値が文字列ならJSONとしてパースを試みる（ワイヤ上の`"[\"a\",\"b\"]"`形式）
/// - パース失敗・欠落・null・配列以外は空配列に縮退する
/// - すでに配列ならそのまま通す（文字列以外の要素は捨てる）
///
/// 出力は宣言された配列フィールド全件を含み、値はすべてネイティブ配列。
/// この操作は失敗しない。
pub fn normalize_arrays(
    raw_fields: &Map<String, Value>,
    array_field_names: &[&str],
) -> HashMap<String, Vec<String>> {
    let mut normalized = HashMap::with_capacity(array_field_names.len());

    for &name in array_field_names {
        let items = match raw_fields.get(name) {
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(parsed)) => collect_strings(name, &parsed),
                Ok(_) => {
                    warn!(field = name, "array field string did not parse to an array");
                    Vec::new()
                }
                Err(err) => {
                    warn!(field = name, error = %err, "malformed array field string, using empty array");
                    Vec::new()
                }
            },
            Some(Value::Array(values)) => collect_strings(name, values),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!(field = name, value_type = value_type_name(other), "array field has non-array value, using empty array");
                Vec::new()
            }
        };
        normalized.insert(name.to_string(), items);
    }

    normalized
}

/// 生の変更セットを許可リストでフィルタリングし、更新セットを構築する
///
/// 出力には、入力に実際に存在した許可済みフィールドのみが含まれる。
/// 配列フィールドは`normalize_arrays`で正規化される。空の出力は
/// 「更新対象なし」を意味し、呼び出し側はクライアントエラーとして扱う。
pub fn prepare_update(
    raw_body: &Map<String, Value>,
    allowed_fields: &[&str],
    array_field_names: &[&str],
) -> UpdateSet {
    let arrays = normalize_arrays(raw_body, array_field_names);
    let mut update_set = UpdateSet::new();

    for (key, value) in raw_body {
        if !allowed_fields.contains(&key.as_str()) {
            continue;
        }

        if array_field_names.contains(&key.as_str()) {
            if let Some(items) = arrays.get(key) {
                update_set.insert(key.clone(), FieldValue::List(items.clone()));
            }
            continue;
        }

        match FieldValue::from_json(value) {
            Some(field_value) => {
                update_set.insert(key.clone(), field_value);
            }
            None => {
                // FieldValueで表現できない値（オブジェクト等）は縮退して捨てる
                warn!(field = %key, "unrepresentable field value dropped from update");
            }
        }
    }

    update_set
}

/// 配列から文字列要素のみを集める
fn collect_strings(field: &str, values: &[Value]) -> Vec<String> {
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        match value.as_str() {
            Some(s) => items.push(s.to_string()),
            None => {
                warn!(field = field, "non-string element dropped from array field");
            }
        }
    }
    items
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
