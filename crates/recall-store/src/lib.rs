//! Persistence for the recall engine: SQLite snapshots, TOML config and
//! directory-backed note vaults.

pub mod config;
pub mod error;
pub mod home;
pub mod schema;
pub mod store;
pub mod vault;

pub use config::{CONFIG_FILE, RecallConfig};
pub use error::{Result, StoreError};
pub use home::{DATABASE_FILE, RecallHome, default_base_dir};
pub use store::{DEFAULT_SNAPSHOT, SnapshotInfo, Store};
pub use vault::Vault;
