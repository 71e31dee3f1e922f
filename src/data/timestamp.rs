//! Canonical timestamp handling
//!
//! Every date inside the application is a `DateTime<Utc>` truncated to
//! millisecond precision. Each serialization boundary gets its own pair of
//! encode/decode functions:
//!
//! - [`local`]: SQLite column (epoch milliseconds)
//! - [`remote`]: Firestore `timestampValue` (RFC 3339)
//! - [`json`]: backup bundles and API bodies (RFC 3339, serde `with` module)

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::AppError;

/// Current time at canonical precision
pub fn now() -> DateTime<Utc> {
    canonical(Utc::now())
}

/// Truncate to millisecond precision
pub fn canonical(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(3)
}

/// Build a timestamp from epoch milliseconds
pub fn from_millis(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Validation(format!("timestamp out of range: {millis}")))
}

fn parse_text(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        if let Ok(millis) = trimmed.parse::<i64>() {
            return from_millis(millis);
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|parsed| canonical(parsed.with_timezone(&Utc)))
        .map_err(|_| AppError::Validation(format!("invalid timestamp: {raw}")))
}

/// SQLite boundary
pub mod local {
    use super::*;

    /// Encode for storage in an INTEGER column
    pub fn encode(value: &DateTime<Utc>) -> i64 {
        value.timestamp_millis()
    }

    /// Decode a column read back as text (`CAST(col AS TEXT)`)
    ///
    /// Accepts epoch milliseconds and, for rows written as strings,
    /// RFC 3339 text.
    pub fn decode(raw: &str) -> Result<DateTime<Utc>, AppError> {
        parse_text(raw)
    }
}

/// Firestore boundary
pub mod remote {
    use super::*;

    /// Encode as a Firestore `timestampValue`
    pub fn encode(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Decode a Firestore `timestampValue`
    pub fn decode(raw: &str) -> Result<DateTime<Utc>, AppError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|parsed| canonical(parsed.with_timezone(&Utc)))
            .map_err(|_| AppError::Transport(format!("invalid Firestore timestamp: {raw}")))
    }
}

/// JSON boundary, for `#[serde(with = "timestamp::json")]`
pub mod json {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decoded = match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => from_millis(millis),
            Raw::Text(text) => parse_text(&text),
        };
        decoded.map_err(serde::de::Error::custom)
    }
}
