//! Storage strategies
//!
//! Two interchangeable implementations of [`JournalStore`]:
//! - the Local Store ([`crate::data::Database`], SQLite on this machine)
//! - the Cloud Store ([`CloudStore`], Firestore documents + Firebase Storage blobs)
//!
//! The Storage Facade (`service::JournalService`) picks one per call.

mod cloud;
mod connector;
mod firestore;
mod local;
mod media;

pub use cloud::CloudStore;
pub use connector::{CloudConnector, FirebaseConnector};
pub use media::BlobStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{DiaryEntry, Post};
use crate::error::Result;

/// Where durable copies currently live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Local,
    Cloud,
}

impl StoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

/// An image file handed in by the caller, before it becomes part of a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Read/write contract shared by the local and cloud stores
///
/// Writes are id-keyed upserts. Reads return the whole collection,
/// newest `date` first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Which mode this store serves
    fn mode(&self) -> StoreMode;

    /// Insert or replace a post by id
    async fn save_post(&self, post: &Post) -> Result<()>;

    /// All posts, newest first
    async fn get_posts(&self) -> Result<Vec<Post>>;

    /// Insert or replace a diary entry by id
    async fn save_diary_entry(&self, entry: &DiaryEntry) -> Result<()>;

    /// All diary entries, newest first
    async fn get_diary_entries(&self) -> Result<Vec<DiaryEntry>>;

    /// Delete a diary entry
    ///
    /// # Errors
    /// `NotFound` if no entry has this id
    async fn delete_diary_entry(&self, id: &str) -> Result<()>;

    /// Store image bytes durably
    ///
    /// # Returns
    /// A public URL, or `None` when this store keeps images inline
    async fn upload_image(&self, image: &ImageFile) -> Result<Option<String>>;
}

/// Stable sort, newest first; equal dates keep their input order
pub(crate) fn sort_newest_first<T, F>(items: &mut [T], date: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| date(b).cmp(&date(a)));
}
