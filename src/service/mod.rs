//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! The Storage Facade routes between local and cloud stores; backup and
//! restore are built on top of it.

mod backup;
mod journal;

pub use backup::{BackupService, ImportReport};
pub use journal::{JournalService, StorageContext};
