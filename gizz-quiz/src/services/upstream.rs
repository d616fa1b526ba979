//! Upstream document validation
//!
//! Catalog responses are `{"error": bool, "error_message": str, "data": [...]}`.
//! The envelope must match or the whole document is a [`FetchError::Schema`];
//! each record in `data` is then checked on its own, so one malformed row
//! is reported and skipped instead of emptying the result.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::json_source::FetchError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "lenient_bool")]
    error: bool,
    #[serde(default)]
    error_message: Option<String>,
    data: Vec<Value>,
}

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordCheck<R> {
    Valid(R),
    Malformed { index: usize, reason: String },
}

/// Validated records of one document
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedRecords<R> {
    pub checks: Vec<RecordCheck<R>>,
}

impl<R> CheckedRecords<R> {
    pub fn malformed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| matches!(c, RecordCheck::Malformed { .. }))
            .count()
    }

    /// Drop malformed records, logging a summary of what was skipped
    pub fn into_valid(self, source: &str) -> Vec<R> {
        let total = self.checks.len();
        let mut valid = Vec::with_capacity(total);
        let mut first_reason: Option<String> = None;
        for check in self.checks {
            match check {
                RecordCheck::Valid(record) => valid.push(record),
                RecordCheck::Malformed { index, reason } => {
                    if first_reason.is_none() {
                        first_reason = Some(format!("record {}: {}", index, reason));
                    }
                }
            }
        }
        if let Some(reason) = first_reason {
            tracing::warn!(
                source = source,
                malformed = total - valid.len(),
                total = total,
                first = %reason,
                "Skipped malformed upstream records"
            );
        }
        valid
    }
}

/// Validate the catalog envelope and each record in `data`
pub fn check_envelope<R: DeserializeOwned>(doc: Value) -> Result<CheckedRecords<R>, FetchError> {
    let envelope: Envelope = serde_json::from_value(doc)
        .map_err(|e| FetchError::Schema(format!("unexpected envelope: {}", e)))?;

    if envelope.error {
        return Err(FetchError::Schema(format!(
            "upstream reported error: {}",
            envelope.error_message.unwrap_or_default()
        )));
    }

    let checks = envelope
        .data
        .into_iter()
        .enumerate()
        .map(|(index, value)| match serde_json::from_value::<R>(value) {
            Ok(record) => RecordCheck::Valid(record),
            Err(e) => RecordCheck::Malformed {
                index,
                reason: e.to_string(),
            },
        })
        .collect();

    Ok(CheckedRecords { checks })
}

/// Row of `albums.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlbumTrackRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub album_title: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub artist_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub releasedate: String,
    #[serde(deserialize_with = "lenient_string")]
    pub song_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub original_artist: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub islive: bool,
}

/// Row of `uploads.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub show_id: String,
    #[serde(rename = "URL", default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub upload_type: String,
}

/// Row of `links.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LinkRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub show_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

/// String, number or null → String (null becomes empty)
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Integer or numeric string → i64
pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("not an integer: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("not an integer: {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, found {}",
            other
        ))),
    }
}

/// Bool, 0/1 or "0"/"1"/"true"/"false" → bool (null is false)
pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(serde::de::Error::custom(format!("not a flag: {:?}", other))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected flag, found {}",
            other
        ))),
    }
}
