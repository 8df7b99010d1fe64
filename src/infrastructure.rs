// インフラストラクチャ層モジュール
pub mod config;
pub mod logging;
pub mod record_store;

// 再エクスポート
pub use config::{DynamoDbConfig, DynamoDbConfigError, TableNames};
pub use logging::init_logging;
pub use record_store::{DynamoRecordStore, PutResult, RecordStore, StoreError, UpdateResult};
