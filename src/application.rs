// アプリケーション層モジュール
pub mod create_handler;
pub mod get_handler;
pub mod list_handler;
pub mod request;
pub mod response;
pub mod router;
pub mod update_handler;

// 再エクスポート
pub use create_handler::{CreateHandler, CreateHandlerError};
pub use get_handler::{GetHandler, GetHandlerError};
pub use list_handler::{ListHandler, ListHandlerError};
pub use request::{extract_path_param, http_method, parse_request_body, RequestError};
pub use router::route_resource_request;
pub use update_handler::{UpdateHandler, UpdateHandlerError};
