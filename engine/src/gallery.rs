//! Gallery - the local mirror of a property's media.
//!
//! The Gallery holds the ordered image and floorplan records of the property
//! being edited, and a log of changes that have been issued to the remote
//! store but not yet confirmed. The main-image pointer and the featured set
//! are derived from the record flags, never stored separately.

use crate::{
    error::Result, ChangeId, Error, MediaId, MediaKind, MediaRecord, PropertyId, SortOrder,
    Timestamp,
};
use serde::{Deserialize, Serialize};

/// Maximum number of featured images per property.
pub const MAX_FEATURED: usize = 4;

/// What kind of remote call a pending change is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Delete,
    SetMain,
    ToggleFeatured,
    Reorder,
    Attach,
}

/// A change issued to the remote store and not yet settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub change_id: ChangeId,
    pub kind: ChangeKind,
    /// The record the change targets, if it already has an id
    pub target: Option<MediaId>,
    /// When the change was issued
    pub started_at: Timestamp,
}

/// The local mirror of one property's media collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    property_id: Option<PropertyId>,
    images: Vec<MediaRecord>,
    floorplans: Vec<MediaRecord>,
    pending: Vec<PendingChange>,
    next_change_id: ChangeId,
}

impl Gallery {
    /// Create an empty gallery. `None` means the property is not saved yet.
    pub fn new(property_id: Option<PropertyId>) -> Self {
        Self {
            property_id,
            ..Self::default()
        }
    }

    /// Create a gallery from remote rows, ordered by sort order.
    pub fn from_records(property_id: Option<PropertyId>, records: Vec<MediaRecord>) -> Self {
        let mut gallery = Self::new(property_id);
        for record in records {
            gallery.collection_mut(record.kind).push(record);
        }
        gallery.images.sort_by_key(|r| r.sort_order);
        gallery.floorplans.sort_by_key(|r| r.sort_order);
        gallery
    }

    pub(crate) fn from_parts(
        property_id: Option<PropertyId>,
        images: Vec<MediaRecord>,
        floorplans: Vec<MediaRecord>,
        pending: Vec<PendingChange>,
    ) -> Self {
        let next_change_id = pending.iter().map(|p| p.change_id + 1).max().unwrap_or(0);
        Self {
            property_id,
            images,
            floorplans,
            pending,
            next_change_id,
        }
    }

    /// The owning property, if it has been saved.
    pub fn property_id(&self) -> Option<&str> {
        self.property_id.as_deref()
    }

    /// Bind the gallery to a newly saved property.
    pub fn set_property_id(&mut self, property_id: impl Into<PropertyId>) {
        self.property_id = Some(property_id.into());
    }

    /// Records of one kind, in display order.
    pub fn records(&self, kind: MediaKind) -> &[MediaRecord] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Floorplan => &self.floorplans,
        }
    }

    pub(crate) fn collection_mut(&mut self, kind: MediaKind) -> &mut Vec<MediaRecord> {
        match kind {
            MediaKind::Image => &mut self.images,
            MediaKind::Floorplan => &mut self.floorplans,
        }
    }

    /// All records, images first.
    pub fn all_records(&self) -> impl Iterator<Item = &MediaRecord> {
        self.images.iter().chain(self.floorplans.iter())
    }

    /// Count of records of one kind.
    pub fn len(&self, kind: MediaKind) -> usize {
        self.records(kind).len()
    }

    /// Check if the gallery holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.floorplans.is_empty()
    }

    /// Get a record by its position in the display order.
    pub fn get(&self, kind: MediaKind, index: usize) -> Result<&MediaRecord> {
        let records = self.records(kind);
        records.get(index).ok_or(Error::IndexOutOfRange {
            kind,
            index,
            len: records.len(),
        })
    }

    /// Locate a record by id.
    pub fn position(&self, id: &MediaId) -> Option<(MediaKind, usize)> {
        [MediaKind::Image, MediaKind::Floorplan]
            .into_iter()
            .find_map(|kind| {
                self.records(kind)
                    .iter()
                    .position(|r| &r.id == id)
                    .map(|index| (kind, index))
            })
    }

    /// Get a record by id.
    pub fn find(&self, id: &MediaId) -> Option<&MediaRecord> {
        self.all_records().find(|r| &r.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: &MediaId) -> Option<&mut MediaRecord> {
        self.images
            .iter_mut()
            .chain(self.floorplans.iter_mut())
            .find(|r| &r.id == id)
    }

    /// Highest sort order held locally for a kind.
    pub fn max_sort_order(&self, kind: MediaKind) -> Option<SortOrder> {
        self.records(kind).iter().map(|r| r.sort_order).max()
    }

    /// Sort order for the next appended record.
    ///
    /// The local mirror may lag behind the remote table, so the remote
    /// maximum (when known) takes part in the computation.
    pub fn next_sort_order(&self, kind: MediaKind, remote_max: Option<SortOrder>) -> SortOrder {
        match (self.max_sort_order(kind), remote_max) {
            (Some(local), Some(remote)) => local.max(remote) + 1,
            (Some(max), None) | (None, Some(max)) => max + 1,
            (None, None) => 1,
        }
    }

    /// Append a record to its collection.
    pub fn push(&mut self, record: MediaRecord) {
        self.collection_mut(record.kind).push(record);
    }

    /// Remove a record by position.
    pub fn remove(&mut self, kind: MediaKind, index: usize) -> Result<MediaRecord> {
        self.get(kind, index)?;
        Ok(self.collection_mut(kind).remove(index))
    }

    /// Remove a record by id.
    pub fn remove_by_id(&mut self, id: &MediaId) -> Option<MediaRecord> {
        let (kind, index) = self.position(id)?;
        Some(self.collection_mut(kind).remove(index))
    }

    /// The current main image.
    pub fn main_image(&self) -> Option<&MediaRecord> {
        self.images.iter().find(|r| r.is_main)
    }

    /// URL of the current main image.
    pub fn main_image_url(&self) -> Option<&str> {
        self.main_image().map(|r| r.url.as_str())
    }

    /// Featured images in display order.
    pub fn featured_images(&self) -> Vec<&MediaRecord> {
        self.images.iter().filter(|r| r.is_featured).collect()
    }

    /// URLs of the featured images in display order.
    pub fn featured_urls(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|r| r.is_featured)
            .map(|r| r.url.as_str())
            .collect()
    }

    pub fn featured_count(&self) -> usize {
        self.images.iter().filter(|r| r.is_featured).count()
    }

    /// Make `id` the only main image.
    pub fn apply_main(&mut self, id: &MediaId) -> Result<()> {
        if !self.images.iter().any(|r| &r.id == id) {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        for record in &mut self.images {
            record.is_main = &record.id == id;
        }
        Ok(())
    }

    /// Set the featured flag of one image.
    pub fn apply_featured(&mut self, id: &MediaId, featured: bool) -> Result<()> {
        let record = self
            .images
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        record.is_featured = featured;
        Ok(())
    }

    /// Move a record and renumber its collection from 1.
    ///
    /// Returns the records whose sort order changed.
    pub fn move_record(
        &mut self,
        kind: MediaKind,
        from: usize,
        to: usize,
    ) -> Result<Vec<(MediaId, SortOrder)>> {
        let len = self.len(kind);
        if to >= len {
            return Err(Error::IndexOutOfRange {
                kind,
                index: to,
                len,
            });
        }
        let record = self.remove(kind, from)?;
        let records = self.collection_mut(kind);
        records.insert(to, record);

        let mut changed = Vec::new();
        for (position, record) in records.iter_mut().enumerate() {
            let order = position as SortOrder + 1;
            if record.sort_order != order {
                record.sort_order = order;
                changed.push((record.id.clone(), order));
            }
        }
        Ok(changed)
    }

    /// Overwrite sort orders reported by the remote store.
    pub fn apply_sort_orders(&mut self, orders: &[(MediaId, SortOrder)]) {
        for (id, order) in orders {
            if let Some(record) = self.find_mut(id) {
                record.sort_order = *order;
            }
        }
        self.images.sort_by_key(|r| r.sort_order);
        self.floorplans.sort_by_key(|r| r.sort_order);
    }

    /// Record that a remote call has been issued.
    pub fn begin(
        &mut self,
        kind: ChangeKind,
        target: Option<MediaId>,
        now: Timestamp,
    ) -> ChangeId {
        let change_id = self.next_change_id;
        self.next_change_id += 1;
        self.pending.push(PendingChange {
            change_id,
            kind,
            target,
            started_at: now,
        });
        change_id
    }

    /// Drop a pending change once its remote call has settled.
    pub fn acknowledge(&mut self, change_id: ChangeId) -> Option<PendingChange> {
        let index = self.pending.iter().position(|p| p.change_id == change_id)?;
        Some(self.pending.remove(index))
    }

    /// Changes still waiting on the remote store.
    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Verify the collection invariants.
    pub fn check_invariants(&self) -> Result<()> {
        for kind in [MediaKind::Image, MediaKind::Floorplan] {
            let mut orders: Vec<SortOrder> =
                self.records(kind).iter().map(|r| r.sort_order).collect();
            orders.sort_unstable();
            if let Some(pair) = orders.windows(2).find(|w| w[0] == w[1]) {
                return Err(Error::DuplicateSortOrder {
                    kind,
                    sort_order: pair[0],
                });
            }
        }

        let main = self.all_records().filter(|r| r.is_main).count();
        if main > 1 {
            return Err(Error::MultipleMain(main));
        }

        let featured = self.all_records().filter(|r| r.is_featured).count();
        if featured > MAX_FEATURED {
            return Err(Error::TooManyFeatured {
                count: featured,
                limit: MAX_FEATURED,
            });
        }

        // A temporary id bound to a property means an insert round-trip
        // succeeded without the server id being threaded back.
        if let Some(stale) = self
            .all_records()
            .find(|r| r.id.is_temporary() && r.property_id.is_some())
        {
            return Err(Error::StaleTemporaryId(stale.id.to_string()));
        }

        Ok(())
    }
}
