//! TECRDB core: records, master table, configuration and CSV storage.

pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, MergeConfig};
pub use error::{CoreError, Result};
pub use models::*;
