//! Cache entry types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Modification time of a cached item.
///
/// The raw string is kept exactly as received so manifests round-trip
/// unchanged. Comparisons use the parsed instant, so
/// `Wed, 21 Oct 2015 07:28:00 GMT` equals `2015-10-21T07:28:00Z`.
/// A value that cannot be parsed is only equal to the identical string
/// and is never ordered against anything else.
#[derive(Debug, Clone)]
pub struct LastModified {
    raw: String,
    instant: Option<DateTime<Utc>>,
}

impl LastModified {
    /// Parses an HTTP date (RFC 2822) or an RFC 3339 timestamp.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let instant = parse_instant(&raw);
        Self { raw, instant }
    }

    /// Creates a timestamp formatted as an HTTP date.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            instant: Some(instant),
        }
    }

    /// Returns the timestamp as it was received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed instant, if the raw value could be parsed.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.instant
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl PartialEq for LastModified {
    fn eq(&self, other: &Self) -> bool {
        match (self.instant, other.instant) {
            (Some(a), Some(b)) => a == b,
            _ => self.raw == other.raw,
        }
    }
}

impl PartialOrd for LastModified {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.instant, other.instant) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ if self.raw == other.raw => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for LastModified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for LastModified {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for LastModified {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::parse)
    }
}

/// Version tag assigned by the producer of the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    /// Numeric version.
    Number(serde_json::Number),
    /// Free-form tag.
    Tag(String),
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::Tag(value.to_string())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Metadata of a single cached item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Size of the content in bytes. Entries without a length carry no content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    /// Modification time reported by the origin.
    #[serde(
        rename = "lastmodified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<LastModified>,

    /// Version tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Any other fields written by the proxy, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CacheEntry {
    /// Creates an entry describing a content file.
    pub fn new(length: u64, last_modified: LastModified, version: impl Into<Version>) -> Self {
        Self {
            length: Some(length),
            last_modified: Some(last_modified),
            version: Some(version.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// Returns true if this entry describes on-disk content.
    pub fn has_content(&self) -> bool {
        self.length.is_some()
    }

    /// Returns true if this entry's timestamp is strictly later than `other`'s.
    ///
    /// Missing or unparsable timestamps are never newer.
    pub fn is_newer_than(&self, other: &CacheEntry) -> bool {
        match (&self.last_modified, &other.last_modified) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        }
    }
}
