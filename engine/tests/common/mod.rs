//! In-memory stand-ins for the media table and the blob bucket.

#![allow(dead_code)]

use async_trait::async_trait;
use casa_engine::{
    storage, BlobStore, MediaId, MediaKind, MediaRecord, MediaRepository, NewMedia, RemoteError,
    RemoteResult, SortOrder,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "property-media";
pub const BASE_URL: &str = "https://api.test";

#[derive(Default)]
struct Failures {
    remaining: HashMap<&'static str, usize>,
}

impl Failures {
    fn check(&mut self, op: &'static str) -> RemoteResult<()> {
        match self.remaining.get_mut(op) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Err(RemoteError::Database(format!("injected {} failure", op)))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
struct RepoState {
    rows: Vec<MediaRecord>,
    next_id: u64,
    calls: Vec<&'static str>,
    failures: Failures,
}

/// A `property_images` table held in memory.
#[derive(Default)]
pub struct FakeRepo {
    state: Mutex<RepoState>,
}

impl FakeRepo {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `times` calls of `op` fail.
    pub fn fail_next(&self, op: &'static str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failures
            .remaining
            .insert(op, times);
    }

    /// Insert a row directly, bypassing call tracking.
    pub fn seed(&self, property_id: &str, kind: MediaKind, sort_order: SortOrder) -> MediaRecord {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("row-{}", state.next_id);
        let record = MediaRecord {
            id: MediaId::Persisted(id.clone()),
            url: storage::public_url(
                BASE_URL,
                BUCKET,
                &format!("properties/{}/{}.jpg", property_id, id),
            ),
            property_id: Some(property_id.to_string()),
            kind,
            sort_order,
            is_main: false,
            is_featured: false,
        };
        state.rows.push(record.clone());
        record
    }

    pub fn seed_record(&self, record: MediaRecord) {
        self.state.lock().unwrap().rows.push(record);
    }

    pub fn rows(&self) -> Vec<MediaRecord> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn row(&self, id: &str) -> Option<MediaRecord> {
        self.rows().into_iter().find(|r| r.id.as_str() == id)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn begin(&self, op: &'static str) -> RemoteResult<std::sync::MutexGuard<'_, RepoState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        state.failures.check(op)?;
        Ok(state)
    }
}

#[async_trait]
impl MediaRepository for FakeRepo {
    async fn list(&self, property_id: &str) -> RemoteResult<Vec<MediaRecord>> {
        let state = self.begin("list")?;
        let mut rows: Vec<MediaRecord> = state
            .rows
            .iter()
            .filter(|r| r.property_id.as_deref() == Some(property_id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.kind, r.sort_order));
        Ok(rows)
    }

    async fn insert(&self, media: NewMedia) -> RemoteResult<MediaRecord> {
        let mut state = self.begin("insert")?;
        state.next_id += 1;
        let record = MediaRecord {
            id: MediaId::Persisted(format!("row-{}", state.next_id)),
            url: media.url,
            property_id: Some(media.property_id),
            kind: media.kind,
            sort_order: media.sort_order,
            is_main: media.is_main,
            is_featured: media.is_featured,
        };
        state.rows.push(record.clone());
        Ok(record)
    }

    async fn max_sort_order(
        &self,
        property_id: &str,
        kind: MediaKind,
    ) -> RemoteResult<Option<SortOrder>> {
        let state = self.begin("max_sort_order")?;
        Ok(state
            .rows
            .iter()
            .filter(|r| r.property_id.as_deref() == Some(property_id) && r.kind == kind)
            .map(|r| r.sort_order)
            .max())
    }

    async fn find_by_url(&self, property_id: &str, url: &str) -> RemoteResult<Vec<MediaRecord>> {
        let state = self.begin("find_by_url")?;
        Ok(state
            .rows
            .iter()
            .filter(|r| r.property_id.as_deref() == Some(property_id) && r.url == url)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> RemoteResult<()> {
        let mut state = self.begin("delete_by_id")?;
        let before = state.rows.len();
        state.rows.retain(|r| r.id.as_str() != id);
        if state.rows.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn clear_main(&self, property_id: &str) -> RemoteResult<()> {
        let mut state = self.begin("clear_main")?;
        for row in state
            .rows
            .iter_mut()
            .filter(|r| r.property_id.as_deref() == Some(property_id))
        {
            row.is_main = false;
        }
        Ok(())
    }

    async fn mark_main(&self, id: &str) -> RemoteResult<()> {
        let mut state = self.begin("mark_main")?;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id.as_str() == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        row.is_main = true;
        Ok(())
    }

    async fn set_featured(&self, id: &str, featured: bool) -> RemoteResult<()> {
        let mut state = self.begin("set_featured")?;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id.as_str() == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        row.is_featured = featured;
        Ok(())
    }

    async fn set_sort_order(&self, id: &str, sort_order: SortOrder) -> RemoteResult<()> {
        let mut state = self.begin("set_sort_order")?;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id.as_str() == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        row.sort_order = sort_order;
        Ok(())
    }
}

#[derive(Default)]
struct BlobState {
    objects: HashMap<String, Vec<u8>>,
    failures: Failures,
}

/// A public bucket held in memory.
#[derive(Default)]
pub struct FakeBlobs {
    state: Mutex<BlobState>,
}

impl FakeBlobs {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, op: &'static str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failures
            .remaining
            .insert(op, times);
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().unwrap().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn put(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), Vec::new());
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    fn bucket(&self) -> &str {
        BUCKET
    }

    fn public_url(&self, path: &str) -> String {
        storage::public_url(BASE_URL, BUCKET, path)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.failures.check("upload").map_err(storage_error)?;
        state.objects.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.failures.check("delete").map_err(storage_error)?;
        state
            .objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::Storage(format!("no object at {}", path)))
    }
}

fn storage_error(e: RemoteError) -> RemoteError {
    RemoteError::Storage(e.to_string())
}

pub fn files(names: &[&str]) -> Vec<casa_engine::UploadFile> {
    names
        .iter()
        .map(|name| casa_engine::UploadFile::new(*name, name.as_bytes().to_vec()))
        .collect()
}
