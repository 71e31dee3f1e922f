//! Data layer module
//!
//! Handles on-device persistence:
//! - Entity models and the backup bundle shape
//! - Canonical timestamps and their boundary codecs
//! - SQLite database operations (the Local Store)

mod database;
mod models;
pub mod timestamp;

pub use database::{CLOUD_CONFIG_KEY, Database, PROFILE_KEY};
pub use models::*;
