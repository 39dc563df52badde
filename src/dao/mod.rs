/// Key-value storage backends.
pub mod kv_store;
/// Persisted models and lenient decoding.
pub mod models;
/// Session persistence adapter.
pub mod session_repository;
/// Storage error types shared by every backend.
pub mod storage;
