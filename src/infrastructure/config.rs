/// DynamoDB接続設定
///
/// リソース種別ごとのテーブル名と共有クライアントを保持する。
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

use crate::domain::ResourceKind;

/// DynamoDB設定のエラー型
#[derive(Debug, Error)]
pub enum DynamoDbConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// リソース種別ごとのテーブル名
///
/// 環境変数で設定:
/// - ORGANIZATIONS_TABLE_NAME
/// - USERS_TABLE_NAME
/// - DEVICES_TABLE_NAME
/// - CONTENTS_TABLE_NAME
/// - PLAYLISTS_TABLE_NAME
/// - SCHEDULES_TABLE_NAME
/// - APPLICATIONS_TABLE_NAME
#[derive(Debug, Clone)]
pub struct TableNames {
    pub organizations: String,
    pub users: String,
    pub devices: String,
    pub contents: String,
    pub playlists: String,
    pub schedules: String,
    pub applications: String,
}

impl TableNames {
    /// 環境変数からテーブル名を読み込む
    pub fn from_env() -> Result<Self, DynamoDbConfigError> {
        Ok(Self {
            organizations: require_env("ORGANIZATIONS_TABLE_NAME")?,
            users: require_env("USERS_TABLE_NAME")?,
            devices: require_env("DEVICES_TABLE_NAME")?,
            contents: require_env("CONTENTS_TABLE_NAME")?,
            playlists: require_env("PLAYLISTS_TABLE_NAME")?,
            schedules: require_env("SCHEDULES_TABLE_NAME")?,
            applications: require_env("APPLICATIONS_TABLE_NAME")?,
        })
    }
}

/// テーブル名とクライアントを持つDynamoDB設定
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// リソース種別ごとのテーブル名
    tables: TableNames,
}

impl DynamoDbConfig {
    /// 環境からAWS設定を読み込み、環境変数からテーブル名を読み取って
    /// 新しいDynamoDbConfigを作成
    ///
    /// AWS認証情報・リージョンはaws-configにより自動読み込みされる。
    pub async fn from_env() -> Result<Self, DynamoDbConfigError> {
        // 環境からAWS設定を読み込み（認証情報、リージョンなど）
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = DynamoDbClient::new(&aws_config);

        let tables = TableNames::from_env()?;

        Ok(Self { client, tables })
    }

    /// 明示的な値で新しいDynamoDbConfigを作成（テスト用）
    pub fn new(client: DynamoDbClient, tables: TableNames) -> Self {
        Self { client, tables }
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// リソース種別に対応するテーブル名を取得
    pub fn table_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Organization => &self.tables.organizations,
            ResourceKind::User => &self.tables.users,
            ResourceKind::Device => &self.tables.devices,
            ResourceKind::Content => &self.tables.contents,
            ResourceKind::Playlist => &self.tables.playlists,
            ResourceKind::Schedule => &self.tables.schedules,
            ResourceKind::Application => &self.tables.applications,
        }
    }
}

fn require_env(name: &str) -> Result<String, DynamoDbConfigError> {
    std::env::var(name).map_err(|_| DynamoDbConfigError::MissingEnvVar(name.to_string()))
}
