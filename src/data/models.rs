//! Data models
//!
//! Rust structs for the journal entities. JSON field names follow the
//! bundle format (camelCase); dates go through [`super::timestamp::json`].

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Placeholder used when a diary entry is saved with a blank title
pub const UNTITLED_DIARY_TITLE: &str = "Untitled";

/// Bundle schema version written by export and accepted by import
pub const BACKUP_VERSION: u32 = 1;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// ULIDs start with the creation time, so ids generated now sort after
/// ids generated earlier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Post
// =============================================================================

/// Image carried by a post
///
/// `preview_url` is what a viewer renders: a `data:` URL in local mode, the
/// public blob URL once uploaded. Raw bytes are only kept locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImage {
    pub preview_url: String,
    #[serde(
        rename = "base64",
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes"
    )]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl PostImage {
    /// Image kept inline, previewed through a `data:` URL
    pub fn embedded(data: Vec<u8>, mime_type: &str) -> Self {
        Self {
            preview_url: format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(&data)),
            data: Some(data),
            mime_type: Some(mime_type.to_string()),
        }
    }

    /// Image that only exists behind a URL
    pub fn remote(url: String) -> Self {
        Self {
            preview_url: url,
            data: None,
            mime_type: None,
        }
    }
}

/// A photo with an optional note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub image: PostImage,
    #[serde(default)]
    pub description: String,
    #[serde(with = "timestamp::json")]
    pub date: DateTime<Utc>,
    /// Public URL, present only when the image went to the blob store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Post {
    /// Create a post dated now
    pub fn new(image: PostImage, description: String, image_url: Option<String>) -> Self {
        Self {
            id: EntityId::new().0,
            image,
            description,
            date: timestamp::now(),
            image_url,
        }
    }
}

// =============================================================================
// Diary
// =============================================================================

/// A diary entry, editable in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Creation time, never changes
    #[serde(with = "timestamp::json")]
    pub date: DateTime<Utc>,
    #[serde(with = "timestamp::json")]
    pub updated_at: DateTime<Utc>,
}

impl DiaryEntry {
    /// Create an entry dated now
    pub fn new(title: String, content: String) -> Self {
        let now = timestamp::now();
        Self {
            id: EntityId::new().0,
            title: normalize_title(title),
            content,
            date: now,
            updated_at: now,
        }
    }

    /// Replace title and content, refreshing `updated_at`
    pub fn revise(&mut self, title: String, content: String) {
        self.title = normalize_title(title);
        self.content = content;
        self.updated_at = timestamp::now().max(self.date);
    }
}

/// Blank titles become [`UNTITLED_DIARY_TITLE`]
pub fn normalize_title(title: String) -> String {
    if title.trim().is_empty() {
        UNTITLED_DIARY_TITLE.to_string()
    } else {
        title
    }
}

// =============================================================================
// Singletons
// =============================================================================

/// The journal owner's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

/// Firebase connection parameters
///
/// Its presence in the local key-value area switches storage to cloud mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

impl CloudConfig {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("apiKey", &self.api_key),
            ("projectId", &self.project_id),
            ("storageBucket", &self.storage_bucket),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

// =============================================================================
// Backup bundle
// =============================================================================

/// Snapshot of everything, as written to a backup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub diary: Vec<DiaryEntry>,
    /// Export time, epoch milliseconds
    pub timestamp: i64,
    pub version: u32,
}

mod base64_bytes {
    use super::BASE64_STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&BASE64_STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .filter(|encoded| !encoded.is_empty())
            .map(|encoded| {
                BASE64_STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
