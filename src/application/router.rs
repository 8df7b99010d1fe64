/// リソース別Lambda内のルート振り分け
///
/// API GatewayプロキシイベントのHTTPメソッドとパスIDの有無から
/// 作成・取得・一覧・更新の各ハンドラーへ振り分け、レスポンスへ
/// 変換して返す。
use serde_json::Value;

use crate::application::request::{extract_path_param, http_method};
use crate::application::response::{
    created_response, error_response, handler_error_response, list_response, record_response,
    updated_response,
};
use crate::application::{CreateHandler, GetHandler, ListHandler, UpdateHandler};
use crate::domain::ResourceKind;
use crate::infrastructure::RecordStore;

/// リクエストを処理し、API Gatewayプロキシレスポンスを返す
///
/// # ルーティング
/// * `POST` - 作成
/// * `GET`（パスID付き） - ID指定取得
/// * `GET`（パスIDなし） - 一覧取得
/// * `PUT` / `PATCH` - 部分更新（更新可能フィールドを持つリソースのみ）
pub async fn route_resource_request<S>(kind: ResourceKind, store: S, event: &Value) -> Value
where
    S: RecordStore + Clone,
{
    match http_method(event) {
        Some("POST") => match CreateHandler::new(kind, store).handle(event).await {
            Ok(record) => created_response(kind, &record),
            Err(err) => handler_error_response(err.status_code(), &err),
        },
        Some("GET") => {
            if extract_path_param(event, "id").is_some() {
                match GetHandler::new(kind, store).handle(event).await {
                    Ok(record) => record_response(kind, &record),
                    Err(err) => handler_error_response(err.status_code(), &err),
                }
            } else {
                match ListHandler::new(kind, store).handle(event).await {
                    Ok(records) => list_response(kind, &records),
                    Err(err) => handler_error_response(err.status_code(), &err),
                }
            }
        }
        Some("PUT") | Some("PATCH") if !kind.policy().mutable.is_empty() => {
            match UpdateHandler::new(kind, store).handle(event).await {
                Ok(record) => updated_response(kind, &record),
                Err(err) => handler_error_response(err.status_code(), &err),
            }
        }
        _ => error_response(400, "Unsupported method"),
    }
}
