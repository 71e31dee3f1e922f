//! Backup/Restore
//!
//! Export composes a bundle from facade reads; import replays a bundle as
//! individual facade upserts. Import merges by id and is not atomic: records
//! applied before a failure stay applied.

use std::sync::Arc;

use serde::Serialize;

use super::JournalService;
use crate::data::{BACKUP_VERSION, BackupData, timestamp};
use crate::error::{AppError, Result};

/// What an import wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub posts: usize,
    pub diary_entries: usize,
    pub profile: bool,
}

impl ImportReport {
    fn applied(&self) -> usize {
        self.posts + self.diary_entries + usize::from(self.profile)
    }
}

/// Backup service
pub struct BackupService {
    journal: Arc<JournalService>,
}

impl BackupService {
    pub fn new(journal: Arc<JournalService>) -> Self {
        Self { journal }
    }

    /// Snapshot profile, posts and diary from the active store
    pub async fn export_all(&self) -> Result<BackupData> {
        let profile = self.journal.get_profile().await?;
        let posts = self.journal.get_posts().await?;
        let diary = self.journal.get_diary_entries().await?;

        let mode = self.journal.mode().await;
        tracing::info!(
            posts = posts.len(),
            diary = diary.len(),
            mode = mode.as_str(),
            "Backup exported"
        );

        Ok(BackupData {
            profile,
            posts,
            diary,
            timestamp: timestamp::now().timestamp_millis(),
            version: BACKUP_VERSION,
        })
    }

    /// Merge a bundle into the active store
    ///
    /// Existing records sharing an id are overwritten by the bundle's copy;
    /// nothing is deleted.
    ///
    /// # Errors
    /// - `Validation` if the bundle is newer than this version understands
    ///   (checked before anything is written)
    /// - `PartialImport` if a write fails; the count of records already
    ///   applied is carried in the error
    pub async fn import_all(&self, bundle: BackupData) -> Result<ImportReport> {
        if bundle.version > BACKUP_VERSION {
            crate::metrics::BACKUP_IMPORTS_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            return Err(AppError::Validation(format!(
                "unsupported backup version {} (newest supported is {})",
                bundle.version, BACKUP_VERSION
            )));
        }

        let total =
            bundle.posts.len() + bundle.diary.len() + usize::from(bundle.profile.is_some());
        let mut report = ImportReport::default();

        match self.apply(&bundle, &mut report).await {
            Ok(()) => {
                crate::metrics::BACKUP_IMPORTS_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                tracing::info!(
                    posts = report.posts,
                    diary = report.diary_entries,
                    profile = report.profile,
                    "Backup imported"
                );
                Ok(report)
            }
            Err(error) => {
                crate::metrics::BACKUP_IMPORTS_TOTAL
                    .with_label_values(&["partial"])
                    .inc();
                let applied = report.applied();
                tracing::error!(applied, total, %error, "Backup import stopped partway");
                Err(AppError::PartialImport {
                    applied,
                    total,
                    source: Box::new(error),
                })
            }
        }
    }

    async fn apply(&self, bundle: &BackupData, report: &mut ImportReport) -> Result<()> {
        if let Some(profile) = &bundle.profile {
            self.journal.save_profile(profile).await?;
            report.profile = true;
        }

        for post in &bundle.posts {
            self.journal.save_post(post).await?;
            report.posts += 1;
        }

        for entry in &bundle.diary {
            self.journal.save_diary_entry(entry).await?;
            report.diary_entries += 1;
        }

        Ok(())
    }
}
