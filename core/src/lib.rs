pub mod achievements;
pub mod aggregate;
pub mod dates;
pub mod error;
pub mod export;
pub mod goals;
pub mod models;
pub mod service;
pub mod store;
mod streak;

pub use error::{Error, Result, StorageError};
pub use service::Tracker;
pub use store::{Backend, KvStore, SqliteStore, Store, open_in_memory, open_store};
