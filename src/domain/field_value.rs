/// スキーマレスなレコードモデル
///
/// DynamoDBアイテムをフィールド名→値のマップとして扱うための型を提供する。
/// 値は文字列・数値・真偽値・null・参照ID文字列の配列のみを許容する。
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// レコードの1フィールドが取り得る値
///
/// `#[serde(untagged)]`によりJSON上は素の値（"abc"、42、true、null、["a","b"]）
/// として表現される。ネストしたオブジェクトは表現できない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// null（値が設定されていない任意フィールド）
    Null,
    /// 真偽値
    Bool(bool),
    /// 数値（DynamoDBのNumber型に対応）
    Number(f64),
    /// 文字列
    Text(String),
    /// 参照ID文字列の順序付き配列
    List(Vec<String>),
}

impl FieldValue {
    /// JSON値からFieldValueへ変換
    ///
    /// 表現できない値（オブジェクト、文字列以外を含む配列）は`None`を返す。
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => list.push(s.to_string()),
                        None => return None,
                    }
                }
                Some(FieldValue::List(list))
            }
            Value::Object(_) => None,
        }
    }

    /// 文字列値への参照を取得（文字列でなければ`None`）
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 配列値への参照を取得（配列でなければ`None`）
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// 値が「空」かどうか
    ///
    /// nullおよび空文字列を空とみなす（必須フィールド判定に使用）。
    pub fn is_empty_value(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// 部分更新で適用するフィールド→新しい値のマップ
pub type UpdateSet = HashMap<String, FieldValue>;

/// 一意IDをキーとする単一のキー・バリューアイテム
///
/// すべてのレコードは`id`（作成時に採番、以後不変）と
/// `created_at` / `updated_at`（ISO-8601文字列）を持つ。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, FieldValue>,
}

impl Record {
    /// 空のレコードを作成
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// フィールドマップからレコードを構築
    pub fn from_fields(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// レコードの一意ID
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(FieldValue::as_text)
    }

    /// フィールド値への参照を取得
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// 文字列フィールドの値を取得
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// フィールドを設定（既存値は上書き）
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// フィールドを削除し、削除した値を返す
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// フィールドが存在するか
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// フィールドマップへの参照
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// フィールドマップを取り出す
    pub fn into_fields(self) -> HashMap<String, FieldValue> {
        self.fields
    }

    /// JSONオブジェクトとしてのレコード表現
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
