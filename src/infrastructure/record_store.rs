/// DynamoDBでレコードを管理するためのレコードストア
///
/// 単一アイテムのキー・バリューストアに対する最小の契約を
/// トレイトとして切り出し、DynamoDB実装とテスト用モックの
/// 差し替えを可能にする。
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{FieldValue, Record, UpdateSet};

/// レコードストア操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// ストアへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// ストアからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// アイテムとレコード間の変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 存在ガード付き挿入の結果
#[derive(Debug, Clone, PartialEq)]
pub enum PutResult {
    /// 新しいレコードとして挿入された
    Created,
    /// 同一IDのレコードが既に存在する
    AlreadyExists,
}

/// 存在ガード付き更新の結果
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResult {
    /// 既存レコードが更新された
    Updated,
    /// 対象IDのレコードが存在しない（ストアは変更されない）
    NotFound,
}

/// レコード永続化用トレイト
///
/// 1レコード1アイテムのストアに対する読み取り・条件付き書き込み・
/// スキャンを抽象化する。単一レコード書き込みの原子性はストアの
/// 条件付き書き込みプリミティブに委譲する。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// IDでレコードを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Record))`
    /// * 見つからなかった場合は`Ok(None)`
    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// 同一IDが存在しない場合のみレコードを挿入（アップサートではない）
    async fn put_if_absent(&self, record: &Record) -> Result<PutResult, StoreError>;

    /// レコードが存在する場合のみ、指定フィールドを一括設定する
    ///
    /// 更新セットのフィールドのみを書き換え、他のフィールドには
    /// 触れない。対象が存在しなければ何も変更しない。
    async fn update_if_exists(
        &self,
        id: &str,
        updates: &UpdateSet,
    ) -> Result<UpdateResult, StoreError>;

    /// 指定フィールドが指定値に一致するレコードを全件取得
    ///
    /// インデックスを仮定しないフルテーブルスキャン。
    async fn scan_by_field(&self, field: &str, value: &str) -> Result<Vec<Record>, StoreError>;

    /// テーブルの全レコードを取得
    async fn scan_all(&self) -> Result<Vec<Record>, StoreError>;
}

/// RecordStoreのDynamoDB実装
///
/// 1リソース種別=1テーブル、パーティションキーは`id`。
#[derive(Debug, Clone)]
pub struct DynamoRecordStore {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// テーブル名
    table_name: String,
}

impl DynamoRecordStore {
    /// 新しいDynamoRecordStoreを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// FieldValueをDynamoDB属性値へ変換
    fn to_attribute_value(value: &FieldValue) -> AttributeValue {
        match value {
            FieldValue::Null => AttributeValue::Null(true),
            FieldValue::Bool(b) => AttributeValue::Bool(*b),
            FieldValue::Number(n) => AttributeValue::N(format_number(*n)),
            FieldValue::Text(s) => AttributeValue::S(s.clone()),
            FieldValue::List(items) => AttributeValue::L(
                items
                    .iter()
                    .map(|item| AttributeValue::S(item.clone()))
                    .collect(),
            ),
        }
    }

    /// DynamoDB属性値をFieldValueへ変換
    fn from_attribute_value(value: &AttributeValue) -> Result<FieldValue, StoreError> {
        match value {
            AttributeValue::Null(_) => Ok(FieldValue::Null),
            AttributeValue::Bool(b) => Ok(FieldValue::Bool(*b)),
            AttributeValue::N(n) => n.parse::<f64>().map(FieldValue::Number).map_err(|_| {
                StoreError::SerializationError(format!("invalid number attribute: {}", n))
            }),
            AttributeValue::S(s) => Ok(FieldValue::Text(s.clone())),
            AttributeValue::L(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_s() {
                        Ok(s) => list.push(s.clone()),
                        Err(_) => {
                            return Err(StoreError::SerializationError(
                                "list attribute contains non-string element".to_string(),
                            ));
                        }
                    }
                }
                Ok(FieldValue::List(list))
            }
            AttributeValue::Ss(items) => Ok(FieldValue::List(items.clone())),
            _ => Err(StoreError::SerializationError(
                "unsupported attribute type".to_string(),
            )),
        }
    }

    /// レコードをDynamoDBアイテムへ変換
    fn record_to_item(record: &Record) -> HashMap<String, AttributeValue> {
        record
            .fields()
            .iter()
            .map(|(name, value)| (name.clone(), Self::to_attribute_value(value)))
            .collect()
    }

    /// DynamoDBアイテムをレコードへ変換
    fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<Record, StoreError> {
        let mut record = Record::new();
        for (name, value) in item {
            record.insert(name.clone(), Self::from_attribute_value(value)?);
        }
        Ok(record)
    }

    /// 更新セットからUpdateExpressionと属性名・属性値マップを構築する
    ///
    /// 予約語と衝突しないよう、すべてのフィールドを`#fN` / `:vN`の
    /// プレースホルダー経由で参照する。
    fn build_update_expression(
        updates: &UpdateSet,
    ) -> (
        String,
        HashMap<String, String>,
        HashMap<String, AttributeValue>,
    ) {
        let mut parts = Vec::with_capacity(updates.len());
        let mut names = HashMap::with_capacity(updates.len());
        let mut values = HashMap::with_capacity(updates.len());

        for (index, (field, value)) in updates.iter().enumerate() {
            let name_key = format!("#f{}", index);
            let value_key = format!(":v{}", index);
            parts.push(format!("{} = {}", name_key, value_key));
            names.insert(name_key, field.clone());
            values.insert(value_key, Self::to_attribute_value(value));
        }

        (format!("SET {}", parts.join(", ")), names, values)
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::ReadError(e.into_service_error().to_string()))?;

        match result.item {
            Some(item) => Ok(Some(Self::item_to_record(&item)?)),
            None => Ok(None),
        }
    }

    async fn put_if_absent(&self, record: &Record) -> Result<PutResult, StoreError> {
        let item = Self::record_to_item(record);

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(PutResult::Created),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    return Ok(PutResult::AlreadyExists);
                }
                Err(StoreError::WriteError(service_error.to_string()))
            }
        }
    }

    async fn update_if_exists(
        &self,
        id: &str,
        updates: &UpdateSet,
    ) -> Result<UpdateResult, StoreError> {
        let (expression, names, values) = Self::build_update_expression(updates);

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(UpdateResult::Updated),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    return Ok(UpdateResult::NotFound);
                }
                Err(StoreError::WriteError(service_error.to_string()))
            }
        }
    }

    async fn scan_by_field(&self, field: &str, value: &str) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut last_evaluated_key = None;

        // ページネーション: LastEvaluatedKeyがある限りスキャンを続ける
        loop {
            let mut scan_builder = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#f = :v")
                .expression_attribute_names("#f", field)
                .expression_attribute_values(":v", AttributeValue::S(value.to_string()));

            if let Some(key) = last_evaluated_key.take() {
                scan_builder = scan_builder.set_exclusive_start_key(Some(key));
            }

            let result = scan_builder
                .send()
                .await
                .map_err(|e| StoreError::ReadError(e.into_service_error().to_string()))?;

            if let Some(items) = result.items {
                for item in &items {
                    records.push(Self::item_to_record(item)?);
                }
            }

            match result.last_evaluated_key {
                Some(key) => last_evaluated_key = Some(key),
                None => break,
            }
        }

        Ok(records)
    }

    async fn scan_all(&self) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let mut scan_builder = self.client.scan().table_name(&self.table_name);

            if let Some(key) = last_evaluated_key.take() {
                scan_builder = scan_builder.set_exclusive_start_key(Some(key));
            }

            let result = scan_builder
                .send()
                .await
                .map_err(|e| StoreError::ReadError(e.into_service_error().to_string()))?;

            if let Some(items) = result.items {
                for item in &items {
                    records.push(Self::item_to_record(item)?);
                }
            }

            match result.last_evaluated_key {
                Some(key) => last_evaluated_key = Some(key),
                None => break,
            }
        }

        Ok(records)
    }
}

/// f64をDynamoDBのNumber文字列へ整形（整数値は小数点なし）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
