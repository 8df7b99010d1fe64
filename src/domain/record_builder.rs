/// 新規レコードの構築と更新セットのリソース別調整
///
/// リクエストボディからリソース種別ごとの既定値・配列正規化・
/// タイムスタンプ採番を適用した完全なレコードを組み立てる。
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::field_policy::ResourceKind;
use crate::domain::field_value::{FieldValue, Record, UpdateSet};
use crate::domain::normalizer::{normalize_arrays, prepare_update};
use crate::domain::validator::{
    validate_email_format, validate_password_strength, validate_required_fields,
    validate_user_role, ValidationError,
};

/// 現在時刻のISO-8601文字列（マイクロ秒精度、UTC）
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// パスワードのSHA-256ハッシュ（16進数文字列）
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

/// リクエストボディから新規レコードを構築する
///
/// 必須フィールドの検証後、ID採番・タイムスタンプ設定・既定値の適用・
/// 配列フィールドの正規化を行う。ユーザーはメールアドレスを小文字化し、
/// パスワードをハッシュ化して保持する。
pub fn build_record(
    kind: ResourceKind,
    body: &Map<String, Value>,
) -> Result<Record, ValidationError> {
    let policy = kind.policy();
    validate_required_fields(policy, body)?;

    let now = now_timestamp();
    let mut record = Record::new();
    record.insert("id", FieldValue::Text(Uuid::new_v4().to_string()));
    record.insert("created_at", FieldValue::Text(now.clone()));
    record.insert("updated_at", FieldValue::Text(now.clone()));

    match kind {
        ResourceKind::Organization => {
            record.insert("name", raw_value(body, "name"));
            record.insert("license", raw_value(body, "license"));
            record.insert("created_by", text_or_default(body, "created_by", ""));
            record.insert("updated_by", text_or_default(body, "updated_by", ""));
        }
        ResourceKind::User => {
            let email = body
                .get("email")
                .and_then(Value::as_str)
                .ok_or(ValidationError::InvalidEmailFormat)?;
            validate_email_format(email)?;

            let password = body
                .get("password")
                .and_then(Value::as_str)
                .unwrap_or_default();
            validate_password_strength(password)?;

            let role = body.get("role").and_then(Value::as_str).unwrap_or_default();
            validate_user_role(role)?;

            record.insert("first_name", raw_value(body, "first_name"));
            record.insert("last_name", raw_value(body, "last_name"));
            // メールアドレスは小文字で保存する
            record.insert("email", FieldValue::Text(email.to_lowercase()));
            record.insert("role", FieldValue::Text(role.to_string()));
            record.insert("password", FieldValue::Text(hash_password(password)));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("created_by", text_or_default(body, "created_by", ""));
            record.insert("updated_by", text_or_default(body, "updated_by", ""));
        }
        ResourceKind::Device => {
            record.insert("name", raw_value(body, "name"));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("description", raw_value(body, "description"));
            record.insert("model", raw_value(body, "model"));
            record.insert("version", raw_value(body, "version"));
            record.insert("ip_address", raw_value(body, "ip_address"));
            record.insert("status", text_or_default(body, "status", "active"));
            record.insert("last_seen", FieldValue::Text(now));
            record.insert("storage_left", raw_value(body, "storage_left"));
            record.insert("storage_consumed", raw_value(body, "storage_consumed"));
            insert_arrays(&mut record, kind, body);
        }
        ResourceKind::Content => {
            record.insert("url", raw_value(body, "url"));
            record.insert("title", raw_value(body, "title"));
            record.insert("thumbnail", text_or_default(body, "thumbnail", ""));
            record.insert("description", text_or_default(body, "description", ""));
            record.insert("is_active", bool_or_default(body, "is_active", true));
            record.insert("is_deleted", bool_or_default(body, "is_deleted", false));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("created_by", text_or_default(body, "created_by", ""));
            record.insert("updated_by", text_or_default(body, "updated_by", ""));
            insert_arrays(&mut record, kind, body);
        }
        ResourceKind::Playlist => {
            record.insert("name", raw_value(body, "name"));
            record.insert("description", text_or_default(body, "description", ""));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("created_by", text_or_default(body, "created_by", ""));
            record.insert("updated_by", text_or_default(body, "updated_by", ""));
            insert_arrays(&mut record, kind, body);
        }
        ResourceKind::Schedule => {
            record.insert("start_at", raw_value(body, "start_at"));
            record.insert("end_at", raw_value(body, "end_at"));
            record.insert("loop", bool_or_default(body, "loop", false));
            record.insert("is_active", bool_or_default(body, "is_active", true));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("created_by", text_or_default(body, "created_by", ""));
            record.insert("updated_by", text_or_default(body, "updated_by", ""));
            insert_arrays(&mut record, kind, body);
        }
        ResourceKind::Application => {
            record.insert("name", raw_value(body, "name"));
            record.insert("organization_id", raw_value(body, "organization_id"));
            record.insert("client_id", raw_value(body, "client_id"));
            record.insert("platform", raw_value(body, "platform"));
            record.insert("author", raw_value(body, "author"));
            record.insert("status", text_or_default(body, "status", "active"));
        }
    }

    Ok(record)
}

/// リクエストボディからリソース別の更新セットを準備する
///
/// 汎用の`prepare_update`に加えて、ユーザーはメールアドレス形式・
/// パスワード強度・ロールを検証し、小文字化とハッシュ化を適用する。
/// 空の更新セットの扱い（クライアントエラー化）は呼び出し側の責務。
pub fn prepare_resource_update(
    kind: ResourceKind,
    body: &Map<String, Value>,
) -> Result<UpdateSet, ValidationError> {
    if kind == ResourceKind::User {
        if let Some(email) = body.get("email") {
            let email = email.as_str().ok_or(ValidationError::InvalidEmailFormat)?;
            validate_email_format(email)?;
        }
        if let Some(password) = body.get("password") {
            validate_password_strength(password.as_str().unwrap_or_default())?;
        }
        if let Some(role) = body.get("role") {
            validate_user_role(role.as_str().unwrap_or_default())?;
        }
    }

    let policy = kind.policy();
    let mut update_set = prepare_update(body, policy.mutable, policy.array_fields);

    if kind == ResourceKind::User {
        if let Some(FieldValue::Text(email)) = update_set.get("email") {
            let lowered = email.to_lowercase();
            update_set.insert("email".to_string(), FieldValue::Text(lowered));
        }
        if let Some(FieldValue::Text(password)) = update_set.get("password") {
            let hashed = hash_password(password);
            update_set.insert("password".to_string(), FieldValue::Text(hashed));
        }
    }

    Ok(update_set)
}

/// ボディの値をそのままFieldValueへ（欠落・表現不能はnull）
fn raw_value(body: &Map<String, Value>, key: &str) -> FieldValue {
    body.get(key)
        .and_then(FieldValue::from_json)
        .unwrap_or(FieldValue::Null)
}

/// 文字列フィールド（欠落時は既定値）
fn text_or_default(body: &Map<String, Value>, key: &str, default: &str) -> FieldValue {
    match body.get(key).and_then(Value::as_str) {
        Some(s) => FieldValue::Text(s.to_string()),
        None => FieldValue::Text(default.to_string()),
    }
}

/// 真偽値フィールド（欠落時は既定値）
fn bool_or_default(body: &Map<String, Value>, key: &str, default: bool) -> FieldValue {
    match body.get(key).and_then(Value::as_bool) {
        Some(b) => FieldValue::Bool(b),
        None => FieldValue::Bool(default),
    }
}

/// 宣言された配列フィールドを正規化してすべて挿入する
fn insert_arrays(record: &mut Record, kind: ResourceKind, body: &Map<String, Value>) {
    let policy = kind.policy();
    let arrays = normalize_arrays(body, policy.array_fields);
    for (name, items) in arrays {
        record.insert(name, FieldValue::List(items));
    }
}
