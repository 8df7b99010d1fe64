/// レコード部分更新ハンドラー
///
/// 生の変更セットを許可リストで絞り込み、存在ガード付きの
/// 単一条件付き書き込みとして適用する。更新のたびに`updated_at`を
/// 現在時刻へ進める。
use serde_json::Value;

use crate::application::request::{extract_path_param, parse_request_body};
use crate::domain::{now_timestamp, prepare_resource_update, FieldValue, Record, ResourceKind, UpdateSet};
use crate::infrastructure::{RecordStore, StoreError, UpdateResult};

/// 更新ハンドラーのエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateHandlerError {
    /// パスパラメータのレコードIDが欠落
    MissingRecordId { resource: &'static str },
    /// リクエストボディの解析・検証エラー
    Validation(String),
    /// リクエストボディが空
    EmptyBody,
    /// 許可リストを通過したフィールドが1つもない（no-op更新は拒否する）
    EmptyUpdate,
    /// 対象レコードが存在しない
    NotFound { resource: &'static str },
    /// 一意制約フィールドの値が他レコードと重複
    DuplicateValue {
        resource: &'static str,
        field: &'static str,
    },
    /// ストア操作エラー
    StoreError(String),
}

impl UpdateHandlerError {
    /// 対応するHTTPステータスコード
    pub fn status_code(&self) -> u16 {
        match self {
            UpdateHandlerError::MissingRecordId { .. } => 400,
            UpdateHandlerError::Validation(_) => 400,
            UpdateHandlerError::EmptyBody => 400,
            UpdateHandlerError::EmptyUpdate => 400,
            UpdateHandlerError::NotFound { .. } => 404,
            UpdateHandlerError::DuplicateValue { .. } => 409,
            UpdateHandlerError::StoreError(_) => 500,
        }
    }
}

impl From<StoreError> for UpdateHandlerError {
    fn from(err: StoreError) -> Self {
        UpdateHandlerError::StoreError(err.to_string())
    }
}

impl std::fmt::Display for UpdateHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateHandlerError::MissingRecordId { resource } => {
                write!(f, "{} ID is required", resource)
            }
            UpdateHandlerError::Validation(msg) => write!(f, "{}", msg),
            UpdateHandlerError::EmptyBody => write!(f, "Request body cannot be empty"),
            UpdateHandlerError::EmptyUpdate => write!(f, "No valid fields to update"),
            UpdateHandlerError::NotFound { resource } => write!(f, "{} not found", resource),
            UpdateHandlerError::DuplicateValue { resource, field } => {
                write!(f, "{} with this {} already exists", resource, field)
            }
            UpdateHandlerError::StoreError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for UpdateHandlerError {}

/// 部分更新リクエストを処理するハンドラー
pub struct UpdateHandler<S>
where
    S: RecordStore,
{
    /// 対象リソース種別
    kind: ResourceKind,
    /// レコードストア
    store: S,
}

impl<S> UpdateHandler<S>
where
    S: RecordStore,
{
    /// 新しいUpdateHandlerを作成
    pub fn new(kind: ResourceKind, store: S) -> Self {
        Self { kind, store }
    }

    /// 部分更新リクエストを処理
    ///
    /// # 処理フロー
    /// 1. パスパラメータからレコードIDを取り出す
    /// 2. ボディを解析し、許可リスト・配列正規化済みの更新セットを準備
    /// 3. 一意制約フィールドが含まれる場合は他レコードとの重複を確認
    /// 4. 存在ガード付きの条件付き書き込みで適用
    /// 5. 更新後のレコードを読み直して返す
    pub async fn handle(&self, event: &Value) -> Result<Record, UpdateHandlerError> {
        let record_id =
            extract_path_param(event, "id").ok_or(UpdateHandlerError::MissingRecordId {
                resource: self.kind.display_name(),
            })?;

        let body = parse_request_body(event)
            .map_err(|err| UpdateHandlerError::Validation(err.to_string()))?;
        if body.is_empty() {
            return Err(UpdateHandlerError::EmptyBody);
        }

        let update_set = prepare_resource_update(self.kind, &body)
            .map_err(|err| UpdateHandlerError::Validation(err.to_string()))?;
        if update_set.is_empty() {
            return Err(UpdateHandlerError::EmptyUpdate);
        }

        self.check_unique_on_update(&record_id, &update_set).await?;
        self.apply_update(&record_id, update_set).await?;

        // 更新後のレコードをレスポンス用に読み直す
        match self.store.get(&record_id).await? {
            Some(record) => Ok(record),
            None => Err(UpdateHandlerError::NotFound {
                resource: self.kind.display_name(),
            }),
        }
    }

    /// 検証済み更新セットを単一の条件付き書き込みとして適用する
    ///
    /// 更新セットの全フィールドに加えて`updated_at`を現在時刻に設定し、
    /// レコードの存在を条件に書き込む（アップサートではない）。
    /// 対象が存在しなければストアは変更されない。
    ///
    /// 読み取り・比較・書き込みのサイクルは持たないため、同一レコードへの
    /// 同時更新は後勝ちになる。
    pub async fn apply_update(
        &self,
        record_id: &str,
        mut update_set: UpdateSet,
    ) -> Result<(), UpdateHandlerError> {
        if record_id.is_empty() {
            return Err(UpdateHandlerError::MissingRecordId {
                resource: self.kind.display_name(),
            });
        }
        if update_set.is_empty() {
            return Err(UpdateHandlerError::EmptyUpdate);
        }

        update_set.insert("updated_at".to_string(), FieldValue::Text(now_timestamp()));

        match self.store.update_if_exists(record_id, &update_set).await? {
            UpdateResult::Updated => {
                tracing::info!(
                    resource = self.kind.name(),
                    record_id = record_id,
                    fields = update_set.len(),
                    "record updated"
                );
                Ok(())
            }
            UpdateResult::NotFound => Err(UpdateHandlerError::NotFound {
                resource: self.kind.display_name(),
            }),
        }
    }

    /// 更新セットに含まれる一意制約フィールドについて、
    /// 更新対象以外のレコードとの重複を確認する
    async fn check_unique_on_update(
        &self,
        record_id: &str,
        update_set: &UpdateSet,
    ) -> Result<(), UpdateHandlerError> {
        let policy = self.kind.policy();

        for &field in policy.unique_fields {
            let Some(FieldValue::Text(value)) = update_set.get(field) else {
                continue;
            };

            let matches = self.store.scan_by_field(field, value).await?;
            for existing in matches {
                if existing.id() != Some(record_id) {
                    return Err(UpdateHandlerError::DuplicateValue {
                        resource: self.kind.display_name(),
                        field,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::create_handler::CreateHandler;
    use crate::infrastructure::record_store::tests::MockRecordStore;
    use serde_json::json;

    // ==================== テストヘルパー ====================

    fn create_test_handler(kind: ResourceKind) -> (UpdateHandler<MockRecordStore>, MockRecordStore)
    {
        let store = MockRecordStore::new();
        let handler = UpdateHandler::new(kind, store.clone());
        (handler, store)
    }

    /// 固定タイムスタンプ付きのデバイスレコードをストアへ直接投入する
    fn seed_device(store: &MockRecordStore, id: &str) {
        let mut record = Record::new();
        record.insert("id", FieldValue::Text(id.to_string()));
        record.insert("name", FieldValue::Text("Cam1".to_string()));
        record.insert("status", FieldValue::Text("active".to_string()));
        record.insert("organization_id", FieldValue::Text("org-1".to_string()));
        record.insert(
            "created_at",
            FieldValue::Text("2020-01-01T00:00:00.000000Z".to_string()),
        );
        record.insert(
            "updated_at",
            FieldValue::Text("2020-01-01T00:00:00.000000Z".to_string()),
        );
        store.insert_record_sync(record);
    }

    fn update_event(id: &str, body: Value) -> Value {
        json!({
            "httpMethod": "PUT",
            "pathParameters": { "id": id },
            "body": body
        })
    }

    // ==================== 更新フローテスト ====================

    // 既存レコードの更新: 対象フィールドだけ変わり、updated_atが進む
    #[tokio::test]
    async fn test_update_changes_field_and_advances_updated_at() {
        let (handler, store) = create_test_handler(ResourceKind::Device);
        seed_device(&store, "dev-1");

        let updated = handler
            .handle(&update_event("dev-1", json!({"name": "X"})))
            .await
            .unwrap();

        assert_eq!(updated.get_text("name"), Some("X"));
        // updated_atは厳密に進む
        assert!(updated.get_text("updated_at").unwrap() > "2020-01-01T00:00:00.000000Z");
        // 他のフィールドは変更されない
        assert_eq!(updated.get_text("status"), Some("active"));
        assert_eq!(updated.get_text("organization_id"), Some("org-1"));
        assert_eq!(
            updated.get_text("created_at"),
            Some("2020-01-01T00:00:00.000000Z")
        );
    }

    // 存在しないIDの更新はNotFoundで、ストアは変更されない
    #[tokio::test]
    async fn test_update_nonexistent_record() {
        let (handler, store) = create_test_handler(ResourceKind::Device);

        let err = handler
            .handle(&update_event("ghost", json!({"name": "X"})))
            .await
            .unwrap_err();

        assert_eq!(err, UpdateHandlerError::NotFound { resource: "Device" });
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.record_count(), 0);
        assert!(store.get_record_sync("ghost").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record_id() {
        let (handler, _) = create_test_handler(ResourceKind::Device);
        let event = json!({"body": {"name": "X"}});

        let err = handler.handle(&event).await.unwrap_err();
        assert_eq!(
            err,
            UpdateHandlerError::MissingRecordId { resource: "Device" }
        );
        assert_eq!(err.to_string(), "Device ID is required");
    }

    #[tokio::test]
    async fn test_update_empty_body() {
        let (handler, store) = create_test_handler(ResourceKind::Device);
        seed_device(&store, "dev-1");

        let err = handler
            .handle(&update_event("dev-1", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, UpdateHandlerError::EmptyBody);
        assert_eq!(err.status_code(), 400);
    }

    // 許可リスト外のフィールドだけのボディはno-opとして拒否される
    #[tokio::test]
    async fn test_update_no_valid_fields() {
        let (handler, store) = create_test_handler(ResourceKind::Device);
        seed_device(&store, "dev-1");

        let err = handler
            .handle(&update_event(
                "dev-1",
                json!({"id": "evil", "created_at": "1970-01-01"}),
            ))
            .await
            .unwrap_err();

        assert_eq!(err, UpdateHandlerError::EmptyUpdate);
        assert_eq!(err.to_string(), "No valid fields to update");

        // idもcreated_atも書き換わっていない
        let stored = store.get_record_sync("dev-1").unwrap();
        assert_eq!(
            stored.get_text("created_at"),
            Some("2020-01-01T00:00:00.000000Z")
        );
    }

    // 配列フィールドの文字列表現は正規化されて保存される
    #[tokio::test]
    async fn test_update_normalizes_array_fields() {
        let (handler, store) = create_test_handler(ResourceKind::Device);
        seed_device(&store, "dev-1");

        handler
            .handle(&update_event("dev-1", json!({"playlists": "[\"p1\", \"p2\"]"})))
            .await
            .unwrap();

        let stored = store.get_record_sync("dev-1").unwrap();
        assert_eq!(
            stored.get("playlists"),
            Some(&FieldValue::List(vec![
                "p1".to_string(),
                "p2".to_string()
            ]))
        );
    }

    // ==================== 作成→更新→取得シナリオ ====================

    // デバイスを作成し、ステータスを部分更新で切り替える一連の流れ
    #[tokio::test]
    async fn test_create_then_update_device_status() {
        let store = MockRecordStore::new();
        let create_handler = CreateHandler::new(ResourceKind::Device, store.clone());
        let update_handler = UpdateHandler::new(ResourceKind::Device, store.clone());

        let created = create_handler
            .handle(&json!({"body": {"name": "Cam1", "organization_id": "org-1"}}))
            .await
            .unwrap();
        let id = created.id().unwrap().to_string();
        assert_eq!(created.get_text("status"), Some("active"));

        let updated = update_handler
            .handle(&update_event(&id, json!({"status": "inactive"})))
            .await
            .unwrap();

        assert_eq!(updated.get_text("status"), Some("inactive"));
        let stored = store.get_record_sync(&id).unwrap();
        assert_eq!(stored.get_text("status"), Some("inactive"));
        assert_ne!(
            stored.get_text("updated_at"),
            stored.get_text("created_at")
        );
    }

    // ==================== 更新時の一意制約テスト ====================

    fn seed_organization(store: &MockRecordStore, id: &str, license: &str) {
        let mut record = Record::new();
        record.insert("id", FieldValue::Text(id.to_string()));
        record.insert("name", FieldValue::Text("Org".to_string()));
        record.insert("license", FieldValue::Text(license.to_string()));
        store.insert_record_sync(record);
    }

    // 他組織が使用中のlicenseへは変更できない
    #[tokio::test]
    async fn test_update_license_conflicts_with_other_record() {
        let (handler, store) = create_test_handler(ResourceKind::Organization);
        seed_organization(&store, "org-1", "LIC-1");
        seed_organization(&store, "org-2", "LIC-2");

        let err = handler
            .handle(&update_event("org-2", json!({"license": "LIC-1"})))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            UpdateHandlerError::DuplicateValue {
                resource: "Organization",
                field: "license",
            }
        );
        assert_eq!(err.status_code(), 409);

        // 変更されていない
        let stored = store.get_record_sync("org-2").unwrap();
        assert_eq!(stored.get_text("license"), Some("LIC-2"));
    }

    // 自分自身の現在値への「変更」は重複とみなさない
    #[tokio::test]
    async fn test_update_license_to_own_value_allowed() {
        let (handler, store) = create_test_handler(ResourceKind::Organization);
        seed_organization(&store, "org-1", "LIC-1");

        let updated = handler
            .handle(&update_event("org-1", json!({"license": "LIC-1"})))
            .await
            .unwrap();
        assert_eq!(updated.get_text("license"), Some("LIC-1"));
    }

    // ユーザーのパスワード更新はハッシュ化される
    #[tokio::test]
    async fn test_update_user_password_rehashed() {
        let (handler, store) = create_test_handler(ResourceKind::User);
        let mut user = Record::new();
        user.insert("id", FieldValue::Text("user-1".to_string()));
        user.insert("email", FieldValue::Text("a@b.co".to_string()));
        store.insert_record_sync(user);

        handler
            .handle(&update_event("user-1", json!({"password": "NewSecure456"})))
            .await
            .unwrap();

        let stored = store.get_record_sync("user-1").unwrap();
        assert_eq!(
            stored.get_text("password"),
            Some(crate::domain::hash_password("NewSecure456").as_str())
        );
    }

    #[tokio::test]
    async fn test_update_user_invalid_email_rejected() {
        let (handler, _) = create_test_handler(ResourceKind::User);

        let err = handler
            .handle(&update_event("user-1", json!({"email": "broken"})))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            UpdateHandlerError::Validation("Invalid email format".to_string())
        );
    }

    // ==================== apply_update前提条件テスト ====================

    #[tokio::test]
    async fn test_apply_update_rejects_empty_update_set() {
        let (handler, _) = create_test_handler(ResourceKind::Device);
        let err = handler
            .apply_update("dev-1", UpdateSet::new())
            .await
            .unwrap_err();
        assert_eq!(err, UpdateHandlerError::EmptyUpdate);
    }

    #[tokio::test]
    async fn test_apply_update_rejects_empty_record_id() {
        let (handler, _) = create_test_handler(ResourceKind::Device);
        let mut update_set = UpdateSet::new();
        update_set.insert("name".to_string(), FieldValue::Text("X".to_string()));

        let err = handler.apply_update("", update_set).await.unwrap_err();
        assert_eq!(
            err,
            UpdateHandlerError::MissingRecordId { resource: "Device" }
        );
    }

    // ==================== ストアエラーテスト ====================

    #[tokio::test]
    async fn test_update_store_error_propagates_reason() {
        let (handler, store) = create_test_handler(ResourceKind::Device);
        seed_device(&store, "dev-1");
        store.set_next_error(StoreError::WriteError("DynamoDB unavailable".to_string()));

        let err = handler
            .handle(&update_event("dev-1", json!({"name": "X"})))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        match err {
            UpdateHandlerError::StoreError(msg) => {
                assert!(msg.contains("DynamoDB unavailable"));
            }
            other => panic!("Expected StoreError, got {:?}", other),
        }
    }

    // ==================== エラー型テスト ====================

    #[test]
    fn test_update_handler_error_display() {
        assert_eq!(
            UpdateHandlerError::MissingRecordId { resource: "Device" }.to_string(),
            "Device ID is required"
        );
        assert_eq!(
            UpdateHandlerError::EmptyBody.to_string(),
            "Request body cannot be empty"
        );
        assert_eq!(
            UpdateHandlerError::EmptyUpdate.to_string(),
            "No valid fields to update"
        );
        assert_eq!(
            UpdateHandlerError::NotFound { resource: "Device" }.to_string(),
            "Device not found"
        );
        assert_eq!(
            UpdateHandlerError::StoreError("timeout".to_string()).to_string(),
            "Store error: timeout"
        );
    }

    #[test]
    fn test_update_handler_error_status_codes() {
        assert_eq!(
            UpdateHandlerError::Validation("x".to_string()).status_code(),
            400
        );
        assert_eq!(UpdateHandlerError::EmptyUpdate.status_code(), 400);
        assert_eq!(
            UpdateHandlerError::NotFound { resource: "Device" }.status_code(),
            404
        );
        assert_eq!(
            UpdateHandlerError::DuplicateValue {
                resource: "User",
                field: "email",
            }
            .status_code(),
            409
        );
        assert_eq!(
            UpdateHandlerError::StoreError("x".to_string()).status_code(),
            500
        );
    }
}
