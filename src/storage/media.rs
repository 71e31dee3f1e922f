//! Image storage using Firebase Storage
//!
//! Handles upload and URL generation for post images.
//! Objects are served through token-protected download URLs.

use serde::Deserialize;

use crate::error::AppError;

/// Upload response from the Firebase Storage REST API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedObject {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Blob store client
///
/// Uploads image bytes and returns publicly fetchable URLs.
pub struct BlobStore {
    http: reqwest::Client,
    /// Storage REST base URL, e.g. "https://firebasestorage.googleapis.com"
    base_url: String,
    /// Bucket name, e.g. "journal.appspot.com"
    bucket: String,
}

impl BlobStore {
    /// Create new blob store client
    pub fn new(http: reqwest::Client, base_url: &str, bucket: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    /// Upload a file
    ///
    /// # Arguments
    /// * `key` - Object path inside the bucket
    /// * `data` - File contents
    /// * `content_type` - MIME type
    ///
    /// # Returns
    /// Public URL for the uploaded file
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let url = format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(key)
        );

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "image upload failed ({}): {}",
                status, body
            )));
        }

        let object: UploadedObject = response.json().await?;
        let token = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Transport(format!("upload of {} returned no download token", object.name))
            })?;

        Ok(self.get_public_url(&object.name, token))
    }

    /// Upload a post image under `images/{millis}_{file name}`
    ///
    /// # Returns
    /// (object key, public URL)
    pub async fn upload_image(
        &self,
        file_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let key = image_key(
            chrono::Utc::now().timestamp_millis(),
            file_name,
            content_type,
        );
        let url = self.upload(&key, data, content_type).await?;
        Ok((key, url))
    }

    /// Get public URL for an object
    pub fn get_public_url(&self, key: &str, token: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}?alt=media&token={}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(key),
            urlencoding::encode(token)
        )
    }
}

fn extension_from_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        _ => "bin",
    }
}

/// Time-prefixed object key with a filesystem-safe file name
fn image_key(millis: i64, file_name: &str, content_type: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_matches('.');

    if safe.is_empty() {
        format!(
            "images/{}_image.{}",
            millis,
            extension_from_content_type(content_type)
        )
    } else {
        format!("images/{}_{}", millis, safe)
    }
}
