//! Firestore document encoding
//!
//! Firestore's REST API wraps every field in a typed value object
//! (`{"stringValue": "..."}`, `{"timestampValue": "..."}`). Posts and diary
//! entries are mapped to and from that shape here; dates go through
//! [`timestamp::remote`].

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::data::{DiaryEntry, Post, PostImage, timestamp};
use crate::error::AppError;

pub const POSTS_COLLECTION: &str = "posts";
pub const DIARY_COLLECTION: &str = "diary";

/// Diary fields a re-save may touch; `date` keeps its creation value
pub const DIARY_REVISABLE_FIELDS: &[&str] = &["id", "title", "content", "updatedAt", "type"];

/// A document as returned by the REST API
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    /// Last path segment of the document name
    fn id_from_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn string(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|value| value.get("stringValue"))
            .and_then(Value::as_str)
    }

    fn required_string(&self, field: &str) -> Result<String, AppError> {
        self.string(field).map(str::to_string).ok_or_else(|| {
            AppError::Transport(format!("document {} has no {} field", self.name, field))
        })
    }

    fn timestamp(&self, field: &str) -> Result<chrono::DateTime<chrono::Utc>, AppError> {
        let raw = self
            .fields
            .get(field)
            .and_then(|value| value.get("timestampValue"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Transport(format!("document {} has no {} timestamp", self.name, field))
            })?;
        timestamp::remote::decode(raw)
    }

    fn id(&self) -> String {
        self.string("id")
            .map(str::to_string)
            .unwrap_or_else(|| self.id_from_name().to_string())
    }
}

/// One element of a `runQuery` response stream
#[derive(Debug, Deserialize)]
pub struct QueryResult {
    pub document: Option<Document>,
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn timestamp_value(value: &chrono::DateTime<chrono::Utc>) -> Value {
    json!({ "timestampValue": timestamp::remote::encode(value) })
}

fn fields(entries: Vec<(&str, Value)>) -> Value {
    let map: Map<String, Value> = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    json!({ "fields": map })
}

/// Encode a post. Image bytes are never part of the document; `imageUrl`
/// falls back to the preview reference when nothing was uploaded.
pub fn encode_post(post: &Post) -> Value {
    let image_url = post
        .image_url
        .as_deref()
        .unwrap_or(&post.image.preview_url);

    fields(vec![
        ("id", string_value(&post.id)),
        ("description", string_value(&post.description)),
        ("date", timestamp_value(&post.date)),
        ("imageUrl", string_value(image_url)),
        ("type", string_value("post")),
    ])
}

pub fn decode_post(document: &Document) -> Result<Post, AppError> {
    let image_url = document.required_string("imageUrl")?;

    Ok(Post {
        id: document.id(),
        image: PostImage::remote(image_url.clone()),
        description: document.string("description").unwrap_or_default().to_string(),
        date: document.timestamp("date")?,
        image_url: Some(image_url),
    })
}

pub fn encode_diary_entry(entry: &DiaryEntry) -> Value {
    fields(vec![
        ("id", string_value(&entry.id)),
        ("title", string_value(&entry.title)),
        ("content", string_value(&entry.content)),
        ("date", timestamp_value(&entry.date)),
        ("updatedAt", timestamp_value(&entry.updated_at)),
        ("type", string_value("diary")),
    ])
}

pub fn decode_diary_entry(document: &Document) -> Result<DiaryEntry, AppError> {
    let date = document.timestamp("date")?;
    let updated_at = match document.timestamp("updatedAt") {
        Ok(updated_at) => updated_at,
        Err(_) => date,
    };

    Ok(DiaryEntry {
        id: document.id(),
        title: document.required_string("title")?,
        content: document.string("content").unwrap_or_default().to_string(),
        date,
        updated_at,
    })
}

/// `runQuery` body: whole collection, newest `date` first
pub fn newest_first_query(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "date" },
                "direction": "DESCENDING"
            }]
        }
    })
}
