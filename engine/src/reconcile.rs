//! Reconciliation of remote results into the local gallery.
//!
//! Every handler marks a pending change, issues its remote call, and then
//! either settles the change with the authoritative outcome or abandons it.
//! Settling applies the outcome to the gallery and clears the pending entry
//! in one step, so derived state (main image, featured set) is only ever
//! computed from confirmed flags.
//!
//! [`Reconciler::merge_remote`] handles the other direction: a full listing
//! of the remote table replaces every persisted record while local-only
//! records (temporary ids) are kept.

use crate::{ChangeId, Gallery, MediaId, MediaKind, MediaRecord, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Authoritative result of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// A new row was inserted
    Inserted { record: MediaRecord },
    /// A local record was inserted and now carries a server id
    Replaced {
        temporary: MediaId,
        record: MediaRecord,
    },
    /// A row was deleted
    Deleted { id: MediaId },
    /// The main flag now sits on this record only
    MainSet { id: MediaId },
    /// The featured flag of a record changed
    FeaturedSet { id: MediaId, featured: bool },
    /// Sort orders were persisted
    SortOrders { orders: Vec<(MediaId, SortOrder)> },
}

/// Result of merging a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// Remote rows that were missing locally
    pub added: Vec<MediaId>,
    /// Local records whose fields differed from the remote row
    pub updated: Vec<MediaId>,
    /// Local persisted records no longer present remotely
    pub dropped: Vec<MediaId>,
    /// Local-only records kept as they are
    pub kept_local: Vec<MediaId>,
}

impl ReconcileResult {
    /// Whether the merge changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.dropped.is_empty()
    }
}

/// Applies remote outcomes to a gallery.
pub struct Reconciler<'a> {
    gallery: &'a mut Gallery,
}

impl<'a> Reconciler<'a> {
    pub fn new(gallery: &'a mut Gallery) -> Self {
        Self { gallery }
    }

    /// Apply a confirmed outcome and clear its pending change.
    pub fn settle(&mut self, change_id: ChangeId, outcome: RemoteOutcome) {
        self.apply(outcome);
        if self.gallery.acknowledge(change_id).is_none() {
            tracing::debug!(change_id, "settled change was not pending");
        }
    }

    /// Clear a pending change whose remote call failed.
    pub fn abandon(&mut self, change_id: ChangeId) {
        if let Some(change) = self.gallery.acknowledge(change_id) {
            tracing::debug!(change_id, kind = ?change.kind, "abandoned pending change");
        }
    }

    fn apply(&mut self, outcome: RemoteOutcome) {
        match outcome {
            RemoteOutcome::Inserted { record } => {
                if let Some(existing) = self.gallery.find_mut(&record.id) {
                    *existing = record;
                } else {
                    self.gallery.push(record);
                }
            }
            RemoteOutcome::Replaced { temporary, record } => {
                match self.gallery.position(&temporary) {
                    Some((kind, index)) if kind == record.kind => {
                        self.gallery.collection_mut(kind)[index] = record;
                    }
                    Some((kind, index)) => {
                        self.gallery.collection_mut(kind).remove(index);
                        self.gallery.push(record);
                    }
                    None => {
                        tracing::warn!(temporary = %temporary, "replaced record is gone locally");
                        self.gallery.push(record);
                    }
                }
            }
            RemoteOutcome::Deleted { id } => {
                if self.gallery.remove_by_id(&id).is_none() {
                    tracing::debug!(id = %id, "deleted record already gone locally");
                }
            }
            RemoteOutcome::MainSet { id } => {
                if let Err(e) = self.gallery.apply_main(&id) {
                    tracing::warn!(id = %id, "cannot apply main image: {}", e);
                }
            }
            RemoteOutcome::FeaturedSet { id, featured } => {
                if let Err(e) = self.gallery.apply_featured(&id, featured) {
                    tracing::warn!(id = %id, "cannot apply featured flag: {}", e);
                }
            }
            RemoteOutcome::SortOrders { orders } => {
                self.gallery.apply_sort_orders(&orders);
            }
        }
    }

    /// Replace persisted records with an authoritative remote listing.
    ///
    /// Local-only records survive the merge; if their sort order collides
    /// with a remote row they are moved after the remote maximum.
    pub fn merge_remote(&mut self, remote: Vec<MediaRecord>) -> ReconcileResult {
        let mut result = ReconcileResult::default();

        let local: HashMap<MediaId, MediaRecord> = self
            .gallery
            .all_records()
            .filter(|r| r.is_persisted())
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        let remote_ids: HashSet<MediaId> = remote.iter().map(|r| r.id.clone()).collect();

        for record in &remote {
            match local.get(&record.id) {
                None => result.added.push(record.id.clone()),
                Some(existing) if existing != record => result.updated.push(record.id.clone()),
                Some(_) => {}
            }
        }
        // Sorted so the result does not depend on hash order.
        let mut dropped: Vec<MediaId> = local
            .keys()
            .filter(|id| !remote_ids.contains(*id))
            .cloned()
            .collect();
        dropped.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        result.dropped = dropped;

        for kind in [MediaKind::Image, MediaKind::Floorplan] {
            let mut merged: Vec<MediaRecord> =
                remote.iter().filter(|r| r.kind == kind).cloned().collect();
            merged.sort_by_key(|r| r.sort_order);

            let mut taken: HashSet<SortOrder> = merged.iter().map(|r| r.sort_order).collect();

            let locals: Vec<MediaRecord> = self
                .gallery
                .records(kind)
                .iter()
                .filter(|r| !r.is_persisted())
                .cloned()
                .collect();
            // Past every remote and local order, so a moved record cannot
            // land on a local one that has not been visited yet.
            let mut next = merged
                .iter()
                .chain(locals.iter())
                .map(|r| r.sort_order)
                .max()
                .unwrap_or(0)
                + 1;
            for mut record in locals {
                if !taken.insert(record.sort_order) {
                    record.sort_order = next;
                    taken.insert(next);
                    next += 1;
                }
                result.kept_local.push(record.id.clone());
                merged.push(record);
            }
            merged.sort_by_key(|r| r.sort_order);

            *self.gallery.collection_mut(kind) = merged;
        }

        tracing::debug!(
            added = result.added.len(),
            updated = result.updated.len(),
            dropped = result.dropped.len(),
            kept_local = result.kept_local.len(),
            "merged remote media listing"
        );

        result
    }
}
