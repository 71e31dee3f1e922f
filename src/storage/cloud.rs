//! Cloud Store strategy
//!
//! Firestore documents (one collection per entity type, keyed by entity id)
//! plus the Firebase Storage blob store for images. Every call is a single
//! REST request; nothing is retried.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::firestore::{
    self, DIARY_COLLECTION, DIARY_REVISABLE_FIELDS, Document, POSTS_COLLECTION, QueryResult,
};
use super::{BlobStore, ImageFile, JournalStore, StoreMode};
use crate::data::{CloudConfig, DiaryEntry, Post};
use crate::error::{AppError, Result};

/// Firestore + Firebase Storage client for one project
pub struct CloudStore {
    http: reqwest::Client,
    /// `{firestore}/v1/projects/{project}/databases/(default)/documents`
    documents_url: String,
    api_key: String,
    blobs: BlobStore,
}

impl CloudStore {
    /// Build a client for the project named in `config`
    ///
    /// # Errors
    /// `CloudNotConfigured` if a required connection parameter is blank
    pub fn new(
        http: reqwest::Client,
        firestore_url: &str,
        storage_url: &str,
        config: &CloudConfig,
    ) -> Result<Self> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::CloudNotConfigured(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            firestore_url.trim_end_matches('/'),
            urlencoding::encode(config.project_id.trim())
        );
        let blobs = BlobStore::new(http.clone(), storage_url, config.storage_bucket.trim());

        Ok(Self {
            http,
            documents_url,
            api_key: config.api_key.trim().to_string(),
            blobs,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            collection,
            urlencoding::encode(id)
        )
    }

    /// Create or replace a document under a caller-chosen id
    async fn put_document(&self, collection: &str, id: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .http
            .patch(self.document_url(collection, id))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        ensure_success(response, "write", collection).await?;
        Ok(())
    }

    /// Overwrite `field_paths` of a document that already exists, leaving its
    /// other fields alone. Returns `false` when there is no such document.
    async fn update_existing_document(
        &self,
        collection: &str,
        id: &str,
        body: &serde_json::Value,
        field_paths: &[&str],
    ) -> Result<bool> {
        let mut query = vec![
            ("currentDocument.exists", "true"),
            ("key", self.api_key.as_str()),
        ];
        query.extend(field_paths.iter().map(|path| ("updateMask.fieldPaths", *path)));

        let response = self
            .http
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(body)
            .send()
            .await?;

        Ok(unless_missing(response, "update", collection).await?.is_some())
    }

    /// Every document of a collection, newest `date` first (server-ordered)
    async fn query_newest_first(&self, collection: &str) -> Result<Vec<Document>> {
        let response = self
            .http
            .post(format!("{}:runQuery", self.documents_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&firestore::newest_first_query(collection))
            .send()
            .await?;

        let response = ensure_success(response, "query", collection).await?;
        let results: Vec<QueryResult> = response.json().await?;

        Ok(results
            .into_iter()
            .filter_map(|result| result.document)
            .collect())
    }

    /// Delete a document that must exist
    async fn delete_existing_document(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.document_url(collection, id))
            .query(&[
                ("currentDocument.exists", "true"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        match unless_missing(response, "delete", collection).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound),
        }
    }
}

/// Like [`ensure_success`], but a failed `currentDocument.exists` precondition
/// yields `None` instead of an error
async fn unless_missing(
    response: reqwest::Response,
    operation: &str,
    collection: &str,
) -> Result<Option<reqwest::Response>> {
    match response.status() {
        StatusCode::NOT_FOUND => Ok(None),
        StatusCode::BAD_REQUEST => {
            let body = response.text().await.unwrap_or_default();
            if body.contains("FAILED_PRECONDITION") || body.contains("NOT_FOUND") {
                Ok(None)
            } else {
                Err(AppError::Transport(format!(
                    "Firestore {} in {} failed (400 Bad Request): {}",
                    operation, collection, body
                )))
            }
        }
        _ => ensure_success(response, operation, collection).await.map(Some),
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &str,
    collection: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, operation, collection, "Firestore request failed");
    Err(AppError::Transport(format!(
        "Firestore {} in {} failed ({}): {}",
        operation, collection, status, body
    )))
}

#[async_trait]
impl JournalStore for CloudStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Cloud
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        self.put_document(POSTS_COLLECTION, &post.id, firestore::encode_post(post))
            .await
    }

    async fn get_posts(&self) -> Result<Vec<Post>> {
        self.query_newest_first(POSTS_COLLECTION)
            .await?
            .iter()
            .map(firestore::decode_post)
            .collect()
    }

    async fn save_diary_entry(&self, entry: &DiaryEntry) -> Result<()> {
        let body = firestore::encode_diary_entry(entry);
        let revised = self
            .update_existing_document(DIARY_COLLECTION, &entry.id, &body, DIARY_REVISABLE_FIELDS)
            .await?;
        if revised {
            return Ok(());
        }

        self.put_document(DIARY_COLLECTION, &entry.id, body).await
    }

    async fn get_diary_entries(&self) -> Result<Vec<DiaryEntry>> {
        self.query_newest_first(DIARY_COLLECTION)
            .await?
            .iter()
            .map(firestore::decode_diary_entry)
            .collect()
    }

    async fn delete_diary_entry(&self, id: &str) -> Result<()> {
        self.delete_existing_document(DIARY_COLLECTION, id).await
    }

    async fn upload_image(&self, image: &ImageFile) -> Result<Option<String>> {
        let (key, url) = self
            .blobs
            .upload_image(&image.file_name, image.data.clone(), &image.content_type)
            .await?;

        crate::metrics::IMAGE_UPLOADS_TOTAL.inc();
        tracing::info!(key = %key, size = image.data.len(), "Image uploaded");
        Ok(Some(url))
    }
}
