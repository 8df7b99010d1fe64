/// API Gatewayプロキシレスポンスの構築
///
/// `{"statusCode": N, "body": "<JSON文字列>"}`形式のレスポンスと、
/// エラー種別→HTTPステータスの対応付けを提供する。
use serde_json::{json, Value};

use crate::domain::{Record, ResourceKind};

/// プロキシレスポンスを構築する（bodyはJSON文字列化される）
pub fn api_response(status_code: u16, body: Value) -> Value {
    json!({
        "statusCode": status_code,
        "body": body.to_string(),
    })
}

/// エラーレスポンスを構築する
pub fn error_response(status_code: u16, message: &str) -> Value {
    api_response(status_code, json!({ "error": message }))
}

/// 作成成功レスポンス（201）
pub fn created_response(kind: ResourceKind, record: &Record) -> Value {
    api_response(
        201,
        json!({
            "message": format!("{} created successfully", kind.display_name()),
            "data": sanitize_record(kind, record.clone()).to_json(),
        }),
    )
}

/// 単一レコードの取得レスポンス（200）
pub fn record_response(kind: ResourceKind, record: &Record) -> Value {
    api_response(
        200,
        json!({ "data": sanitize_record(kind, record.clone()).to_json() }),
    )
}

/// 更新成功レスポンス（200）
pub fn updated_response(kind: ResourceKind, record: &Record) -> Value {
    api_response(
        200,
        json!({
            "message": format!("{} updated successfully", kind.display_name()),
            "data": sanitize_record(kind, record.clone()).to_json(),
        }),
    )
}

/// 一覧取得レスポンス（200、件数付き）
pub fn list_response(kind: ResourceKind, records: &[Record]) -> Value {
    let data: Vec<Value> = records
        .iter()
        .map(|record| sanitize_record(kind, record.clone()).to_json())
        .collect();
    api_response(
        200,
        json!({
            "message": format!("{}s retrieved successfully", kind.display_name()),
            "data": data,
            "count": records.len(),
        }),
    )
}

/// ハンドラーエラーをレスポンスへ変換する
///
/// 500系はエラー詳細をログに残し、クライアントには汎用メッセージのみ返す。
pub fn handler_error_response(status_code: u16, error: &dyn std::fmt::Display) -> Value {
    if status_code >= 500 {
        tracing::error!(error = %error, "internal error");
        return error_response(status_code, "Internal server error");
    }
    error_response(status_code, &error.to_string())
}

/// レスポンスに含めないフィールドを落とす
///
/// ユーザーのパスワード（ハッシュ）はレスポンスに含めない。
pub fn sanitize_record(kind: ResourceKind, mut record: Record) -> Record {
    if kind == ResourceKind::User {
        record.remove("password");
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn user_record() -> Record {
        let mut record = Record::new();
        record.insert("id", FieldValue::Text("user-1".to_string()));
        record.insert("email", FieldValue::Text("a@b.co".to_string()));
        record.insert("password", FieldValue::Text("hashed".to_string()));
        record
    }

    // bodyはJSON文字列であること（API Gatewayプロキシ形式）
    #[test]
    fn test_api_response_shape() {
        let response = api_response(200, json!({"ok": true}));
        assert_eq!(response["statusCode"], 200);
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["ok"], json!(true));
    }

    #[test]
    fn test_error_response() {
        let response = error_response(404, "Device not found");
        assert_eq!(response["statusCode"], 404);
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], json!("Device not found"));
    }

    #[test]
    fn test_created_response_message() {
        let mut record = Record::new();
        record.insert("id", FieldValue::Text("dev-1".to_string()));
        let response = created_response(ResourceKind::Device, &record);

        assert_eq!(response["statusCode"], 201);
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["message"], json!("Device created successfully"));
        assert_eq!(body["data"]["id"], json!("dev-1"));
    }

    #[test]
    fn test_list_response_count() {
        let records = vec![user_record()];
        let response = list_response(ResourceKind::User, &records);

        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["data"][0]["id"], json!("user-1"));
    }

    // ユーザーのパスワードはどのレスポンスにも現れない
    #[test]
    fn test_user_password_stripped() {
        let record = user_record();

        for response in [
            created_response(ResourceKind::User, &record),
            record_response(ResourceKind::User, &record),
            updated_response(ResourceKind::User, &record),
            list_response(ResourceKind::User, std::slice::from_ref(&record)),
        ] {
            let raw = response["body"].as_str().unwrap();
            assert!(!raw.contains("password"), "{}", raw);
            assert!(!raw.contains("hashed"), "{}", raw);
        }
    }

    // 他リソースのフィールドはそのまま
    #[test]
    fn test_sanitize_keeps_non_user_fields() {
        let mut record = Record::new();
        record.insert("id", FieldValue::Text("dev-1".to_string()));
        record.insert("password", FieldValue::Text("not-a-user".to_string()));
        let sanitized = sanitize_record(ResourceKind::Device, record);
        assert!(sanitized.contains("password"));
    }

    // 500はクライアントに詳細を返さない
    #[test]
    fn test_internal_error_hides_details() {
        let response = handler_error_response(500, &"connection pool exhausted");
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], json!("Internal server error"));
    }

    #[test]
    fn test_client_error_keeps_message() {
        let response = handler_error_response(400, &"License is required");
        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"], json!("License is required"));
    }
}
