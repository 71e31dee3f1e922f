//! Storage Facade
//!
//! One read/write contract for posts, diary entries and the profile. Each
//! call looks at the [`StorageContext`] and routes to the local or the cloud
//! store; the choice is never cached between calls. Errors surface as-is:
//! no retries, no fallback from cloud to local.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::data::{CloudConfig, Database, DiaryEntry, Post, UserProfile, normalize_title};
use crate::error::Result;
use crate::storage::{CloudConnector, ImageFile, JournalStore, StoreMode};

/// The configuration the facade routes on
///
/// Mirrors the durable `cloud-config` slot. [`JournalService::reload_config`]
/// re-reads the slot when it changed behind the facade's back.
#[derive(Debug, Default)]
pub struct StorageContext {
    cloud: RwLock<Option<CloudConfig>>,
}

impl StorageContext {
    pub fn new(cloud: Option<CloudConfig>) -> Self {
        Self {
            cloud: RwLock::new(cloud),
        }
    }

    pub async fn cloud_config(&self) -> Option<CloudConfig> {
        self.cloud.read().await.clone()
    }

    async fn replace(&self, cloud: Option<CloudConfig>) {
        *self.cloud.write().await = cloud;
    }
}

/// Storage Facade
pub struct JournalService {
    local: Arc<Database>,
    connector: Arc<dyn CloudConnector>,
    context: StorageContext,
}

impl JournalService {
    /// Create a facade over an explicit context
    pub fn new(
        local: Arc<Database>,
        connector: Arc<dyn CloudConnector>,
        context: StorageContext,
    ) -> Self {
        Self {
            local,
            connector,
            context,
        }
    }

    /// Create a facade whose context is read from the local key-value area
    pub async fn load(local: Arc<Database>, connector: Arc<dyn CloudConnector>) -> Result<Self> {
        let cloud = local.get_cloud_config().await?;
        tracing::info!(cloud = cloud.is_some(), "Storage context loaded");
        Ok(Self::new(local, connector, StorageContext::new(cloud)))
    }

    /// Pick the store for one call
    async fn route(&self) -> Result<Arc<dyn JournalStore>> {
        match self.context.cloud_config().await {
            Some(config) => self.connector.connect(&config),
            None => {
                let store: Arc<dyn JournalStore> = self.local.clone();
                Ok(store)
            }
        }
    }

    /// Current mode, evaluated from the context
    pub async fn mode(&self) -> StoreMode {
        if self.context.cloud_config().await.is_some() {
            StoreMode::Cloud
        } else {
            StoreMode::Local
        }
    }

    pub async fn save_post(&self, post: &Post) -> Result<()> {
        let store = self.route().await?;
        observed("save_post", store.mode(), store.save_post(post)).await?;
        tracing::info!(id = %post.id, mode = store.mode().as_str(), "Post saved");
        Ok(())
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        let store = self.route().await?;
        observed("get_posts", store.mode(), store.get_posts()).await
    }

    /// Upsert a diary entry; a blank title becomes the placeholder
    ///
    /// `updated_at` is stored as given. Use [`DiaryEntry::revise`] to refresh it.
    pub async fn save_diary_entry(&self, entry: &DiaryEntry) -> Result<()> {
        let mut entry = entry.clone();
        entry.title = normalize_title(entry.title);

        let store = self.route().await?;
        observed("save_diary_entry", store.mode(), store.save_diary_entry(&entry)).await?;
        tracing::info!(id = %entry.id, mode = store.mode().as_str(), "Diary entry saved");
        Ok(())
    }

    pub async fn get_diary_entries(&self) -> Result<Vec<DiaryEntry>> {
        let store = self.route().await?;
        observed("get_diary_entries", store.mode(), store.get_diary_entries()).await
    }

    /// # Errors
    /// `NotFound` if no entry has this id in the active store
    pub async fn delete_diary_entry(&self, id: &str) -> Result<()> {
        let store = self.route().await?;
        observed("delete_diary_entry", store.mode(), store.delete_diary_entry(id)).await?;
        tracing::info!(id, mode = store.mode().as_str(), "Diary entry deleted");
        Ok(())
    }

    /// Upload an image in cloud mode
    ///
    /// # Returns
    /// The public URL, or `None` in local mode, where the caller embeds the
    /// image in the post instead
    pub async fn upload_post_image(&self, image: &ImageFile) -> Result<Option<String>> {
        let store = self.route().await?;
        observed("upload_image", store.mode(), store.upload_image(image)).await
    }

    // =========================================================================
    // Profile (always local)
    // =========================================================================

    pub async fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.local.get_profile().await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.local.save_profile(profile).await?;
        tracing::info!("Profile saved");
        Ok(())
    }

    // =========================================================================
    // Cloud configuration
    // =========================================================================

    pub async fn cloud_config(&self) -> Option<CloudConfig> {
        self.context.cloud_config().await
    }

    /// Persist the configuration and switch to cloud mode
    ///
    /// Incomplete configurations are stored too; cloud-routed calls then
    /// fail with `CloudNotConfigured` until the missing fields are filled in.
    pub async fn save_cloud_config(&self, config: CloudConfig) -> Result<()> {
        self.local.save_cloud_config(&config).await?;

        let missing = config.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(?missing, "Cloud configuration saved incomplete");
        }
        tracing::info!(project_id = %config.project_id, "Switched to cloud mode");

        self.context.replace(Some(config)).await;
        Ok(())
    }

    /// Remove the configuration and switch back to local mode
    pub async fn clear_cloud_config(&self) -> Result<()> {
        self.local.delete_cloud_config().await?;
        self.context.replace(None).await;
        tracing::info!("Switched to local mode");
        Ok(())
    }

    /// Re-read the durable configuration slot into the context
    pub async fn reload_config(&self) -> Result<StoreMode> {
        let cloud = self.local.get_cloud_config().await?;
        self.context.replace(cloud).await;

        let mode = self.mode().await;
        tracing::info!(mode = mode.as_str(), "Storage context reloaded");
        Ok(mode)
    }
}

/// Time one store call and record its outcome
async fn observed<T, F>(operation: &'static str, mode: StoreMode, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = call.await;
    crate::metrics::observe_storage_operation(
        operation,
        mode.as_str(),
        result.is_ok(),
        started.elapsed(),
    );

    if let Err(error) = &result {
        tracing::warn!(operation, mode = mode.as_str(), %error, "Storage operation failed");
    }
    result
}
