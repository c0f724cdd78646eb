//! Media record types mirrored from the `property_images` table.

use crate::{PropertyId, SortOrder, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection a media record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Floorplan,
}

impl MediaKind {
    /// Column value used by the remote table.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Floorplan => "floorplan",
        }
    }

    /// Parse the column value used by the remote table.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(MediaKind::Image),
            "floorplan" => Some(MediaKind::Floorplan),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a media record.
///
/// A record starts with a `Temporary` id when its property has not been
/// saved yet, and carries the server-assigned `Persisted` id once the
/// remote insert has gone through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum MediaId {
    Persisted(String),
    Temporary(String),
}

impl MediaId {
    /// Generate a placeholder id from a timestamp and a random suffix.
    pub fn temporary(now: Timestamp) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        MediaId::Temporary(format!("temp-{}-{}", now, &suffix[..8]))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        match self {
            MediaId::Persisted(id) | MediaId::Temporary(id) => id,
        }
    }

    /// The server id, if this record has been persisted.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            MediaId::Persisted(id) => Some(id),
            MediaId::Temporary(_) => None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, MediaId::Temporary(_))
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored file attached to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    /// Publicly resolvable URL of the stored file
    pub url: String,
    /// Owning property, `None` while the property is unsaved
    pub property_id: Option<PropertyId>,
    pub kind: MediaKind,
    pub sort_order: SortOrder,
    pub is_main: bool,
    pub is_featured: bool,
}

impl MediaRecord {
    /// A record held only in local memory until its property is saved.
    pub fn local(
        url: impl Into<String>,
        kind: MediaKind,
        sort_order: SortOrder,
        now: Timestamp,
    ) -> Self {
        Self {
            id: MediaId::temporary(now),
            url: url.into(),
            property_id: None,
            kind,
            sort_order,
            is_main: false,
            is_featured: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_temporary()
    }
}

/// Insert payload sent to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub property_id: PropertyId,
    pub url: String,
    pub kind: MediaKind,
    pub sort_order: SortOrder,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewMedia {
    /// Build the insert payload for a record that is about to be persisted.
    pub fn from_record(record: &MediaRecord, property_id: &str) -> Self {
        Self {
            property_id: property_id.to_string(),
            url: record.url.clone(),
            kind: record.kind,
            sort_order: record.sort_order,
            is_main: record.is_main,
            is_featured: record.is_featured,
        }
    }
}

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}
