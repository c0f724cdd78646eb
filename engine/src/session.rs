//! Media editing session.
//!
//! A [`MediaSession`] owns the gallery of one property draft and drives
//! every user action against the remote store:
//!
//! 1. mark a pending change in the gallery
//! 2. issue the remote call(s)
//! 3. settle the change with the authoritative result, or abandon it
//! 4. queue a [`Notice`] describing what happened
//!
//! Multi-step remote sequences (blob upload then row insert, clear main then
//! mark main) carry a compensating action for the case where a later step
//! fails after an earlier one succeeded.

use crate::{
    error::Result,
    reconcile::{ReconcileResult, Reconciler, RemoteOutcome},
    remote::{BlobStore, MediaRepository},
    storage, ChangeKind, Error, Gallery, MediaId, MediaKind, MediaRecord, NewMedia, Notice,
    PropertyId, RemoteError, Timestamp, UploadFile, MAX_FEATURED,
};
use serde::{Deserialize, Serialize};

fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

/// A file that could not be added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub filename: String,
    pub reason: String,
}

/// Outcome of an upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    /// Records added to the gallery, in upload order
    pub added: Vec<MediaRecord>,
    pub failed: Vec<FailedUpload>,
}

/// Outcome of binding local records to a newly saved property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachSummary {
    /// Temporary id and the persisted record that replaced it
    pub attached: Vec<(MediaId, MediaRecord)>,
    pub failed: Vec<FailedUpload>,
}

/// An editing session over one property's media.
pub struct MediaSession<R, B> {
    gallery: Gallery,
    repo: R,
    blobs: B,
    notices: Vec<Notice>,
}

impl<R, B> MediaSession<R, B>
where
    R: MediaRepository,
    B: BlobStore,
{
    /// Start a session on an existing gallery.
    pub fn new(gallery: Gallery, repo: R, blobs: B) -> Self {
        Self {
            gallery,
            repo,
            blobs,
            notices: Vec::new(),
        }
    }

    /// Start a session, loading the media of a saved property.
    pub async fn open(property_id: Option<PropertyId>, repo: R, blobs: B) -> Result<Self> {
        let gallery = match property_id {
            Some(id) => {
                let records = repo.list(&id).await?;
                Gallery::from_records(Some(id), records)
            }
            None => Gallery::new(None),
        };
        Ok(Self::new(gallery, repo, blobs))
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn blob_store(&self) -> &B {
        &self.blobs
    }

    /// Notices queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Upload a batch of files.
    ///
    /// Files are processed one at a time so each one sees the sort order
    /// assigned to the previous one. A failing file is logged and skipped;
    /// the batch itself never fails.
    pub async fn upload(
        &mut self,
        kind: MediaKind,
        files: Vec<UploadFile>,
    ) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for file in files {
            let filename = file.filename.clone();
            match self.upload_one(kind, file).await {
                Ok(record) => summary.added.push(record),
                Err(e) => {
                    tracing::warn!(file = %filename, kind = %kind, "upload skipped: {}", e);
                    self.notices
                        .push(Notice::error(format!("Could not upload {}: {}", filename, e)));
                    summary.failed.push(FailedUpload {
                        filename,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let added = summary.added.len();
        if added > 0 {
            self.notices.push(Notice::success(format!(
                "{} {}{} added",
                added,
                kind,
                if added == 1 { "" } else { "s" }
            )));
        } else if summary.failed.is_empty() {
            self.notices.push(Notice::warning("No files added"));
        }

        tracing::info!(
            kind = %kind,
            added,
            failed = summary.failed.len(),
            property_id = ?self.gallery.property_id(),
            "upload batch finished"
        );

        summary
    }

    async fn upload_one(
        &mut self,
        kind: MediaKind,
        file: UploadFile,
    ) -> Result<MediaRecord> {
        let now = now_millis();
        let property_id = self.gallery.property_id().map(str::to_owned);

        let remote_max = match &property_id {
            Some(id) => self.repo.max_sort_order(id, kind).await?,
            None => None,
        };
        let sort_order = self.gallery.next_sort_order(kind, remote_max);

        let path = storage::object_path(property_id.as_deref(), &file.filename);
        self.blobs
            .upload(&path, file.bytes, file.content_type.as_deref())
            .await?;
        let url = self.blobs.public_url(&path);

        let Some(property_id) = property_id else {
            let record = MediaRecord::local(url, kind, sort_order, now);
            self.gallery.push(record.clone());
            return Ok(record);
        };

        let change = self.gallery.begin(ChangeKind::Insert, None, now);
        let insert = NewMedia {
            property_id,
            url,
            kind,
            sort_order,
            is_main: false,
            is_featured: false,
        };

        match self.repo.insert(insert).await {
            Ok(record) => {
                Reconciler::new(&mut self.gallery).settle(
                    change,
                    RemoteOutcome::Inserted {
                        record: record.clone(),
                    },
                );
                Ok(record)
            }
            Err(e) => {
                Reconciler::new(&mut self.gallery).abandon(change);
                // The blob has no row pointing at it any more.
                if let Err(cleanup) = self.blobs.delete(&path).await {
                    tracing::warn!(path = %path, "orphaned upload not removed: {}", cleanup);
                }
                Err(e.into())
            }
        }
    }

    /// Remove the record at `index`.
    ///
    /// The local record is only dropped once the remote row is gone; a
    /// failed remote delete leaves the gallery exactly as it was.
    pub async fn remove(&mut self, kind: MediaKind, index: usize) -> Result<MediaRecord> {
        let record = match self.gallery.get(kind, index) {
            Ok(record) => record.clone(),
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        if let Some(property_id) = self.gallery.property_id().map(str::to_owned) {
            let change = self
                .gallery
                .begin(ChangeKind::Delete, Some(record.id.clone()), now_millis());

            if let Err(e) = self.delete_row(&property_id, &record).await {
                Reconciler::new(&mut self.gallery).abandon(change);
                tracing::error!(id = %record.id, kind = %kind, "media delete failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Could not remove {}: {}", kind, e)));
                return Err(e);
            }

            Reconciler::new(&mut self.gallery).settle(
                change,
                RemoteOutcome::Deleted {
                    id: record.id.clone(),
                },
            );
        } else {
            self.gallery.remove(kind, index)?;
        }

        self.delete_blob(&record.url).await;
        self.notices.push(Notice::success(format!("{} removed", kind)));
        Ok(record)
    }

    async fn delete_row(&self, property_id: &str, record: &MediaRecord) -> Result<()> {
        if let Some(id) = record.id.server_id() {
            return self.delete_by_id(id).await;
        }

        let matches = self.repo.find_by_url(property_id, &record.url).await?;
        match matches.as_slice() {
            [] => Ok(()),
            [only] => {
                let id = only
                    .id
                    .server_id()
                    .ok_or_else(|| Error::NotPersisted(only.id.to_string()))?;
                self.delete_by_id(id).await
            }
            rows => Err(Error::DuplicateUrl {
                property_id: property_id.to_string(),
                url: record.url.clone(),
                count: rows.len() as u64,
            }),
        }
    }

    /// Delete a row by id. A row that is already gone counts as deleted.
    async fn delete_by_id(&self, id: &str) -> Result<()> {
        match self.repo.delete_by_id(id).await {
            Err(RemoteError::NotFound(_)) => {
                tracing::debug!(id = %id, "media row already deleted");
                Ok(())
            }
            result => Ok(result?),
        }
    }

    /// Best-effort removal of the stored file behind `url`.
    async fn delete_blob(&self, url: &str) {
        let Some(path) = storage::path_from_public_url(url, self.blobs.bucket()) else {
            tracing::warn!(url = %url, "cannot derive storage path from url");
            return;
        };
        if let Err(e) = self.blobs.delete(&path).await {
            tracing::warn!(path = %path, "stored file not removed: {}", e);
        }
    }

    /// Make the image at `index` the main image.
    ///
    /// Clears the flag on every row of the property, then sets it on the
    /// target. If setting fails, the previous main image is restored.
    pub async fn set_main(&mut self, index: usize) -> Result<()> {
        let record = match self.gallery.get(MediaKind::Image, index) {
            Ok(record) => record.clone(),
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                return Err(e);
            }
        };
        if record.is_main {
            return Ok(());
        }

        let Some(property_id) = self.gallery.property_id().map(str::to_owned) else {
            self.gallery.apply_main(&record.id)?;
            self.notices.push(Notice::success("Main image updated"));
            return Ok(());
        };

        let Some(target) = record.id.server_id().map(str::to_owned) else {
            let e = Error::NotPersisted(record.id.to_string());
            self.notices.push(Notice::error(e.to_string()));
            return Err(e);
        };
        let previous = self
            .gallery
            .main_image()
            .and_then(|r| r.id.server_id())
            .map(str::to_owned);

        let change = self
            .gallery
            .begin(ChangeKind::SetMain, Some(record.id.clone()), now_millis());

        if let Err(e) = self.repo.clear_main(&property_id).await {
            Reconciler::new(&mut self.gallery).abandon(change);
            tracing::error!(property_id = %property_id, "clearing main image failed: {}", e);
            self.notices
                .push(Notice::error(format!("Could not update main image: {}", e)));
            return Err(e.into());
        }

        if let Err(e) = self.repo.mark_main(&target).await {
            if let Some(previous) = &previous {
                if let Err(restore) = self.repo.mark_main(previous).await {
                    tracing::error!(
                        property_id = %property_id,
                        previous = %previous,
                        "property left without main image: {}",
                        restore
                    );
                }
            }
            Reconciler::new(&mut self.gallery).abandon(change);
            tracing::error!(id = %target, "marking main image failed: {}", e);
            self.notices
                .push(Notice::error(format!("Could not update main image: {}", e)));
            return Err(e.into());
        }

        Reconciler::new(&mut self.gallery).settle(change, RemoteOutcome::MainSet { id: record.id });
        self.notices.push(Notice::success("Main image updated"));
        Ok(())
    }

    /// Flip the featured flag of the image at `index`.
    ///
    /// Returns the new flag. Featuring a fifth image is rejected before any
    /// remote call.
    pub async fn toggle_featured(&mut self, index: usize) -> Result<bool> {
        let record = match self.gallery.get(MediaKind::Image, index) {
            Ok(record) => record.clone(),
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                return Err(e);
            }
        };
        let featured = !record.is_featured;

        if featured && self.gallery.featured_count() >= MAX_FEATURED {
            self.notices.push(Notice::warning(format!(
                "You can feature at most {} images",
                MAX_FEATURED
            )));
            return Err(Error::FeaturedLimit {
                limit: MAX_FEATURED,
            });
        }

        if self.gallery.property_id().is_none() {
            self.gallery.apply_featured(&record.id, featured)?;
            return Ok(featured);
        }

        let Some(target) = record.id.server_id().map(str::to_owned) else {
            let e = Error::NotPersisted(record.id.to_string());
            self.notices.push(Notice::error(e.to_string()));
            return Err(e);
        };

        let change = self
            .gallery
            .begin(ChangeKind::ToggleFeatured, Some(record.id.clone()), now_millis());
        if let Err(e) = self.repo.set_featured(&target, featured).await {
            Reconciler::new(&mut self.gallery).abandon(change);
            tracing::error!(id = %target, featured, "featured toggle failed: {}", e);
            self.notices
                .push(Notice::error(format!("Could not update featured images: {}", e)));
            return Err(e.into());
        }

        Reconciler::new(&mut self.gallery).settle(
            change,
            RemoteOutcome::FeaturedSet {
                id: record.id,
                featured,
            },
        );
        Ok(featured)
    }

    /// Move a record within its collection and persist the new order.
    ///
    /// The move is applied locally first. If persisting fails the gallery is
    /// reloaded from the remote store.
    pub async fn reorder(&mut self, kind: MediaKind, from: usize, to: usize) -> Result<()> {
        if from == to {
            self.gallery.get(kind, from)?;
            return Ok(());
        }

        let orders = match self.gallery.move_record(kind, from, to) {
            Ok(orders) => orders,
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                return Err(e);
            }
        };
        if self.gallery.property_id().is_none() {
            return Ok(());
        }

        let change = self.gallery.begin(ChangeKind::Reorder, None, now_millis());
        for (id, order) in &orders {
            let Some(server_id) = id.server_id() else {
                continue;
            };
            if let Err(e) = self.repo.set_sort_order(server_id, *order).await {
                Reconciler::new(&mut self.gallery).abandon(change);
                tracing::error!(id = %server_id, order, "persisting order failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Could not save the new order: {}", e)));
                if let Err(reload) = self.refresh().await {
                    tracing::warn!("reload after failed reorder failed: {}", reload);
                }
                return Err(e.into());
            }
        }

        Reconciler::new(&mut self.gallery).settle(change, RemoteOutcome::SortOrders { orders });
        Ok(())
    }

    /// Whether any record is still held only locally.
    pub fn has_unattached(&self) -> bool {
        self.gallery.all_records().any(|r| !r.is_persisted())
    }

    /// Persist every local-only record once the property has been saved.
    ///
    /// Records are inserted one at a time; failures are skipped and keep
    /// their temporary id so a later attach can retry them.
    pub async fn attach_to_property(
        &mut self,
        property_id: impl Into<PropertyId>,
    ) -> AttachSummary {
        let property_id = property_id.into();
        self.gallery.set_property_id(property_id.clone());

        let mut summary = AttachSummary::default();
        for kind in [MediaKind::Image, MediaKind::Floorplan] {
            let locals: Vec<MediaRecord> = self
                .gallery
                .records(kind)
                .iter()
                .filter(|r| !r.is_persisted())
                .cloned()
                .collect();

            for record in locals {
                match self.attach_one(&property_id, &record).await {
                    Ok(persisted) => summary.attached.push((record.id.clone(), persisted)),
                    Err(e) => {
                        tracing::warn!(id = %record.id, "attach skipped: {}", e);
                        summary.failed.push(FailedUpload {
                            filename: record.url.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if !summary.failed.is_empty() {
            self.notices.push(Notice::error(format!(
                "{} file(s) could not be attached to the property",
                summary.failed.len()
            )));
        }
        tracing::info!(
            property_id = %property_id,
            attached = summary.attached.len(),
            failed = summary.failed.len(),
            "local media attached"
        );

        summary
    }

    async fn attach_one(
        &mut self,
        property_id: &str,
        record: &MediaRecord,
    ) -> Result<MediaRecord> {
        let remote_max = self.repo.max_sort_order(property_id, record.kind).await?;
        let mut insert = NewMedia::from_record(record, property_id);
        if let Some(max) = remote_max {
            insert.sort_order = insert.sort_order.max(max + 1);
        }

        let change = self
            .gallery
            .begin(ChangeKind::Attach, Some(record.id.clone()), now_millis());
        match self.repo.insert(insert).await {
            Ok(persisted) => {
                Reconciler::new(&mut self.gallery).settle(
                    change,
                    RemoteOutcome::Replaced {
                        temporary: record.id.clone(),
                        record: persisted.clone(),
                    },
                );
                Ok(persisted)
            }
            Err(e) => {
                Reconciler::new(&mut self.gallery).abandon(change);
                Err(e.into())
            }
        }
    }

    /// Reload the remote listing and merge it into the gallery.
    pub async fn refresh(&mut self) -> Result<ReconcileResult> {
        let Some(property_id) = self.gallery.property_id().map(str::to_owned) else {
            return Ok(ReconcileResult::default());
        };
        let remote = self.repo.list(&property_id).await?;
        Ok(Reconciler::new(&mut self.gallery).merge_remote(remote))
    }
}
