//! Snapshot types for persisting and restoring a gallery.
//!
//! A snapshot is what a session hands out when its state is inspected, and
//! what it can be restored from. The change counter is not part of it.

use crate::{
    error::Result, Error, Gallery, MediaKind, MediaRecord, PendingChange, PropertyId,
};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time copy of a gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GallerySnapshot {
    pub format_version: u32,
    pub property_id: Option<PropertyId>,
    pub images: Vec<MediaRecord>,
    pub floorplans: Vec<MediaRecord>,
    /// URL of the main image, derived from the record flags
    pub main_image: Option<String>,
    /// URLs of the featured images, derived from the record flags
    pub featured_images: Vec<String>,
    pub pending: Vec<PendingChange>,
}

impl GallerySnapshot {
    pub fn record_count(&self) -> usize {
        self.images.len() + self.floorplans.len()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}

impl Gallery {
    /// Export the gallery state.
    pub fn export_state(&self) -> GallerySnapshot {
        GallerySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            property_id: self.property_id().map(str::to_owned),
            images: self.records(MediaKind::Image).to_vec(),
            floorplans: self.records(MediaKind::Floorplan).to_vec(),
            main_image: self.main_image_url().map(str::to_owned),
            featured_images: self
                .featured_urls()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            pending: self.pending().to_vec(),
        }
    }

    /// Rebuild a gallery from a snapshot, checking its invariants.
    pub fn import_state(snapshot: GallerySnapshot) -> Result<Self> {
        if snapshot
            .images
            .iter()
            .any(|r| r.kind != MediaKind::Image)
            || snapshot
                .floorplans
                .iter()
                .any(|r| r.kind != MediaKind::Floorplan)
        {
            return Err(Error::InvalidSnapshot(
                "record filed under the wrong collection".to_string(),
            ));
        }

        let gallery = Gallery::from_parts(
            snapshot.property_id,
            snapshot.images,
            snapshot.floorplans,
            snapshot.pending,
        );
        gallery.check_invariants()?;
        Ok(gallery)
    }
}
