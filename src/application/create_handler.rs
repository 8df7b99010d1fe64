/// レコード作成ハンドラー
///
/// リクエストボディの検証、新規レコードの構築、一意制約チェック、
/// 存在ガード付き挿入までの作成フローを実行する。
use serde_json::Value;

use crate::application::request::parse_request_body;
use crate::domain::{build_record, Record, ResourceKind};
use crate::infrastructure::{PutResult, RecordStore, StoreError};

/// 作成ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum CreateHandlerError {
    /// リクエストボディの解析・検証エラー
    Validation(String),
    /// 一意制約フィールドの値が既存レコードと重複
    DuplicateValue {
        resource: &'static str,
        field: &'static str,
    },
    /// 採番されたIDが既存レコードと衝突（存在ガードが失敗）
    IdCollision { resource: &'static str },
    /// ストア操作エラー
    StoreError(String),
}

impl CreateHandlerError {
    /// 対応するHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            CreateHandlerError::Validation(_) => 400,
            CreateHandlerError::DuplicateValue { .. } => 409,
            CreateHandlerError::IdCollision { .. } => 409,
            CreateHandlerError::StoreError(_) => 500,
        }
    }
}

impl From<StoreError> for CreateHandlerError {
    fn from(err: StoreError) -> Self {
        CreateHandlerError::StoreError(err.to_string())
    }
}

impl std::fmt::Display for CreateHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateHandlerError::Validation(msg) => write!(f, "{}", msg),
            CreateHandlerError::DuplicateValue { resource, field } => {
                write!(f, "{} with this {} already exists", resource, field)
            }
            CreateHandlerError::IdCollision { resource } => {
                write!(f, "{} with this ID already exists", resource)
            }
            CreateHandlerError::StoreError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for CreateHandlerError {}

/// レコード作成リクエストを処理するハンドラー
pub struct CreateHandler<S>
where
    S: RecordStore,
{
    /// 対象リソース種別
    kind: ResourceKind,
    /// レコードストア
    store: S,
}

impl<S> CreateHandler<S>
where
    S: RecordStore,
{
    /// 新しいCreateHandlerを作成
    pub fn new(kind: ResourceKind, store: S) -> Self {
        Self { kind, store }
    }

    /// 作成リクエストを処理
    ///
    /// # 処理フロー
    /// 1. イベントからリクエストボディを取り出す
    /// 2. 必須フィールドを検証し、既定値・配列正規化込みでレコードを構築
    /// 3. 一意制約チェックと存在ガード付き挿入を実行
    ///
    /// # 戻り値
    /// * 成功時は挿入されたレコード
    pub async fn handle(&self, event: &Value) -> Result<Record, CreateHandlerError> {
        let body = parse_request_body(event)
            .map_err(|err| CreateHandlerError::Validation(err.to_string()))?;

        let record = build_record(self.kind, &body)
            .map_err(|err| CreateHandlerError::Validation(err.to_string()))?;

        self.create_record(record).await
    }

    /// 一意制約を確認したうえでレコードを挿入する
    ///
    /// 制約フィールドごとにテーブルをスキャンし、一致するレコードが
    /// あれば挿入せずに重複エラーを返す。スキャンと挿入は別々のストア
    /// 操作であり、同時実行下では両方のチェックをすり抜ける余地がある
    /// （既知の挙動。ストア側の一意インデックスでのみ閉じられる）。
    pub async fn create_record(&self, record: Record) -> Result<Record, CreateHandlerError> {
        let policy = self.kind.policy();

        for &field in policy.unique_fields {
            if let Some(value) = record.get_text(field) {
                let matches = self.store.scan_by_field(field, value).await?;
                if !matches.is_empty() {
                    tracing::info!(
                        resource = policy.resource,
                        field = field,
                        "duplicate value rejected"
                    );
                    return Err(CreateHandlerError::DuplicateValue {
                        resource: self.kind.display_name(),
                        field,
                    });
                }
            }
        }

        match self.store.put_if_absent(&record).await? {
            PutResult::Created => {
                tracing::info!(
                    resource = policy.resource,
                    record_id = record.id().unwrap_or_default(),
                    "record created"
                );
                Ok(record)
            }
            PutResult::AlreadyExists => Err(CreateHandlerError::IdCollision {
                resource: self.kind.display_name(),
            }),
        }
    }
}
