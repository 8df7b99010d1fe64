/// API Gatewayプロキシイベントの解析
///
/// リクエストボディ（JSON文字列またはオブジェクト）とパスパラメータを
/// イベントから取り出すヘルパーを提供する。
use serde_json::{Map, Value};

/// リクエスト解析のエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// ボディのJSONパースに失敗
    InvalidJsonBody,
    /// ボディが文字列でもオブジェクトでもない
    InvalidBodyFormat,
    /// ボディがJSONオブジェクトでない（または欠落）
    BodyNotObject,
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::InvalidJsonBody => write!(f, "Invalid JSON in request body"),
            RequestError::InvalidBodyFormat => write!(f, "Invalid request body format"),
            RequestError::BodyNotObject => write!(f, "Request body must be a JSON object"),
        }
    }
}

impl std::error::Error for RequestError {}

/// イベントからリクエストボディを取り出す
///
/// API Gatewayはボディを文字列として渡すが、直接呼び出しでは
/// オブジェクトのこともあるため両方を受け付ける。
pub fn parse_request_body(event: &Value) -> Result<Map<String, Value>, RequestError> {
    match event.get("body") {
        Some(Value::String(raw)) => {
            let parsed: Value =
                serde_json::from_str(raw).map_err(|_| RequestError::InvalidJsonBody)?;
            match parsed {
                Value::Object(map) => Ok(map),
                _ => Err(RequestError::BodyNotObject),
            }
        }
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::Null) | None => Err(RequestError::BodyNotObject),
        Some(_) => Err(RequestError::InvalidBodyFormat),
    }
}

/// パスパラメータを取り出す（`pathParameters.<name>`）
pub fn extract_path_param(event: &Value, name: &str) -> Option<String> {
    event
        .get("pathParameters")
        .and_then(|params| params.get(name))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// HTTPメソッドを取り出す（`httpMethod`）
pub fn http_method(event: &Value) -> Option<&str> {
    event.get("httpMethod").and_then(Value::as_str)
}
