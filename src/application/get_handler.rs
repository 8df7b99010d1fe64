/// レコード取得ハンドラー
use serde_json::Value;

use crate::application::request::extract_path_param;
use crate::domain::{Record, ResourceKind};
use crate::infrastructure::{RecordStore, StoreError};

/// 取得ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum GetHandlerError {
    /// パスパラメータのレコードIDが欠落
    MissingRecordId { resource: &'static str },
    /// 対象レコードが存在しない
    NotFound { resource: &'static str },
    /// ストア操作エラー
    StoreError(String),
}

impl GetHandlerError {
    /// 対応するHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            GetHandlerError::MissingRecordId { .. } => 400,
            GetHandlerError::NotFound { .. } => 404,
            GetHandlerError::StoreError(_) => 500,
        }
    }
}

impl From<StoreError> for GetHandlerError {
    fn from(err: StoreError) -> Self {
        GetHandlerError::StoreError(err.to_string())
    }
}

impl std::fmt::Display for GetHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetHandlerError::MissingRecordId { resource } => {
                write!(f, "{} ID is required", resource)
            }
            GetHandlerError::NotFound { resource } => write!(f, "{} not found", resource),
            GetHandlerError::StoreError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for GetHandlerError {}

/// ID指定の取得リクエストを処理するハンドラー
pub struct GetHandler<S>
where
    S: RecordStore,
{
    /// 対象リソース種別
    kind: ResourceKind,
    /// レコードストア
    store: S,
}

impl<S> GetHandler<S>
where
    S: RecordStore,
{
    /// 新しいGetHandlerを作成
    pub fn new(kind: ResourceKind, store: S) -> Self {
        Self { kind, store }
    }

    /// 取得リクエストを処理
    pub async fn handle(&self, event: &Value) -> Result<Record, GetHandlerError> {
        let record_id =
            extract_path_param(event, "id").ok_or(GetHandlerError::MissingRecordId {
                resource: self.kind.display_name(),
            })?;

        match self.store.get(&record_id).await? {
            Some(record) => Ok(record),
            None => Err(GetHandlerError::NotFound {
                resource: self.kind.display_name(),
            }),
        }
    }
}
