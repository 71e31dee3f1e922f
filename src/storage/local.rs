//! Local Store strategy
//!
//! Adapts [`Database`] to [`JournalStore`]. The database returns rows in
//! insertion order; dates are sorted here, newest first, with ties left in
//! insertion order.

use async_trait::async_trait;

use super::{ImageFile, JournalStore, StoreMode, sort_newest_first};
use crate::data::{Database, DiaryEntry, Post};
use crate::error::{AppError, Result};

#[async_trait]
impl JournalStore for Database {
    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        self.upsert_post(post).await
    }

    async fn get_posts(&self) -> Result<Vec<Post>> {
        let mut posts = self.get_all_posts().await?;
        sort_newest_first(&mut posts, |post| post.date);
        Ok(posts)
    }

    async fn save_diary_entry(&self, entry: &DiaryEntry) -> Result<()> {
        self.upsert_diary_entry(entry).await
    }

    async fn get_diary_entries(&self) -> Result<Vec<DiaryEntry>> {
        let mut entries = self.get_all_diary_entries().await?;
        sort_newest_first(&mut entries, |entry| entry.date);
        Ok(entries)
    }

    async fn delete_diary_entry(&self, id: &str) -> Result<()> {
        if self.remove_diary_entry(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    async fn upload_image(&self, _image: &ImageFile) -> Result<Option<String>> {
        // Local mode keeps the bytes inside the post itself
        Ok(None)
    }
}
