//! SQLite backend for the Aquila identity and activity stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. One [`SqliteStore`] implements
//! both core traits, but identity tables (accounts, sessions) and activity
//! tables are never joined against each other — the server treats them as
//! two systems.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
