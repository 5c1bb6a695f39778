//! Document server: file-backed collections, API key auth and live
//! snapshot streaming.

pub mod auth;
pub mod hub;
pub mod routes;
pub mod storage;

pub use auth::{ApiKeyEntry, ApiKeyStore, AuthUser};
pub use hub::CollectionHub;
pub use routes::{router, ApiError, AppState};
pub use storage::{DocumentStorage, StorageError};
