/// コンテンツリソースのLambdaハンドラー
///
/// API GatewayからのコンテンツCRUDリクエストを処理し、
/// DynamoDBのコンテンツテーブルを読み書きする。
use cms_backend::application::route_resource_request;
use cms_backend::domain::ResourceKind;
use cms_backend::infrastructure::{init_logging, DynamoDbConfig, DynamoRecordStore};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. DynamoDB設定を環境から読み込み
/// 2. コンテンツテーブル用のレコードストアを作成
/// 3. HTTPメソッドに応じて作成・取得・一覧・更新へ振り分け
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    // DynamoDB設定を環境から読み込み
    let config = match DynamoDbConfig::from_env().await {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Failed to load DynamoDB config");
            return Ok(serde_json::json!({
                "statusCode": 500,
                "body": "Internal server error"
            }));
        }
    };

    let kind = ResourceKind::Content;
    let store = DynamoRecordStore::new(
        config.client().clone(),
        config.table_for(kind).to_string(),
    );

    Ok(route_resource_request(kind, store, &event.payload).await)
}
