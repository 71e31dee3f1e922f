//! Cloud store construction
//!
//! The facade asks a [`CloudConnector`] for a store every time a call routes
//! to the cloud. The Firebase connector keeps one client per distinct
//! configuration, so an unchanged config reuses the existing client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CloudStore, JournalStore};
use crate::config::CloudEndpointsConfig;
use crate::data::CloudConfig;
use crate::error::{AppError, Result};

/// Builds the cloud strategy for a given configuration
pub trait CloudConnector: Send + Sync {
    /// # Errors
    /// `CloudNotConfigured` if a required connection parameter is blank
    fn connect(&self, config: &CloudConfig) -> Result<Arc<dyn JournalStore>>;
}

/// Connector for Firestore + Firebase Storage
pub struct FirebaseConnector {
    http: reqwest::Client,
    endpoints: CloudEndpointsConfig,
    current: Mutex<Option<(CloudConfig, Arc<CloudStore>)>>,
}

impl FirebaseConnector {
    /// Create a connector with a shared HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(endpoints: CloudEndpointsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_seconds))
            .user_agent(concat!("yuyu/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoints,
            current: Mutex::new(None),
        })
    }
}

impl CloudConnector for FirebaseConnector {
    fn connect(&self, config: &CloudConfig) -> Result<Arc<dyn JournalStore>> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("cloud connector lock poisoned")))?;

        if let Some((cached_config, store)) = current.as_ref() {
            if cached_config == config {
                return Ok(store.clone());
            }
        }

        let store = Arc::new(CloudStore::new(
            self.http.clone(),
            &self.endpoints.firestore_url,
            &self.endpoints.storage_url,
            config,
        )?);
        tracing::info!(project_id = %config.project_id, "Cloud store initialized");

        *current = Some((config.clone(), store.clone()));
        Ok(store)
    }
}
