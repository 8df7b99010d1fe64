/// レコード一覧取得ハンドラー
///
/// 組織・アプリケーションは全件、その他のリソースは`orgId`パス
/// パラメータで指定した組織に属するレコードを返す。
use serde_json::Value;

use crate::application::request::extract_path_param;
use crate::domain::{Record, ResourceKind};
use crate::infrastructure::{RecordStore, StoreError};

/// 一覧取得ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum ListHandlerError {
    /// 組織スコープのリソースで`orgId`が欠落
    MissingOrganizationId,
    /// ストア操作エラー
    StoreError(String),
}

impl ListHandlerError {
    /// 対応するHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            ListHandlerError::MissingOrganizationId => 400,
            ListHandlerError::StoreError(_) => 500,
        }
    }
}

impl From<StoreError> for ListHandlerError {
    fn from(err: StoreError) -> Self {
        ListHandlerError::StoreError(err.to_string())
    }
}

impl std::fmt::Display for ListHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListHandlerError::MissingOrganizationId => {
                write!(f, "Organization ID is required")
            }
            ListHandlerError::StoreError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for ListHandlerError {}

/// 一覧取得リクエストを処理するハンドラー
pub struct ListHandler<S>
where
    S: RecordStore,
{
    /// 対象リソース種別
    kind: ResourceKind,
    /// レコードストア
    store: S,
}

impl<S> ListHandler<S>
where
    S: RecordStore,
{
    /// 新しいListHandlerを作成
    pub fn new(kind: ResourceKind, store: S) -> Self {
        Self { kind, store }
    }

    /// 一覧取得リクエストを処理
    ///
    /// インデックスを仮定しないフルテーブルスキャンで取得する。
    pub async fn handle(&self, event: &Value) -> Result<Vec<Record>, ListHandlerError> {
        let records = match self.kind {
            // 組織とアプリケーションは全件取得
            ResourceKind::Organization | ResourceKind::Application => {
                self.store.scan_all().await?
            }
            // その他は組織スコープで絞り込む
            _ => {
                let org_id = extract_path_param(event, "orgId")
                    .ok_or(ListHandlerError::MissingOrganizationId)?;
                self.store.scan_by_field("organization_id", &org_id).await?
            }
        };

        Ok(records)
    }
}
