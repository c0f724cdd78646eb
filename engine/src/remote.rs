//! Seams to the hosted backend: the media table and the blob bucket.
//!
//! The engine never talks to a network itself. Sessions are generic over
//! these traits so the server can plug in PostgreSQL and disk storage while
//! tests plug in in-memory fakes.

use crate::{error::RemoteError, MediaKind, MediaRecord, NewMedia, SortOrder};
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for remote calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Accessor for the `property_images` table.
///
/// Rows are addressed by their server id. The only lookup by URL is
/// [`MediaRepository::find_by_url`], which returns every match so callers
/// can treat duplicates as an integrity error.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// All rows of a property, ordered by kind then sort order.
    async fn list(&self, property_id: &str) -> RemoteResult<Vec<MediaRecord>>;

    /// Insert a row and return it with its server id.
    async fn insert(&self, media: NewMedia) -> RemoteResult<MediaRecord>;

    /// Highest sort order stored for a property and kind.
    async fn max_sort_order(
        &self,
        property_id: &str,
        kind: MediaKind,
    ) -> RemoteResult<Option<SortOrder>>;

    /// Rows of a property whose URL matches exactly.
    async fn find_by_url(&self, property_id: &str, url: &str) -> RemoteResult<Vec<MediaRecord>>;

    async fn delete_by_id(&self, id: &str) -> RemoteResult<()>;

    /// Clear the main flag on every row of a property.
    async fn clear_main(&self, property_id: &str) -> RemoteResult<()>;

    async fn mark_main(&self, id: &str) -> RemoteResult<()>;

    async fn set_featured(&self, id: &str, featured: bool) -> RemoteResult<()>;

    async fn set_sort_order(&self, id: &str, sort_order: SortOrder) -> RemoteResult<()>;
}

/// A public blob bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket name, part of every public URL.
    fn bucket(&self) -> &str;

    /// Publicly resolvable URL of an object path.
    fn public_url(&self, path: &str) -> String;

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> RemoteResult<()>;

    async fn delete(&self, path: &str) -> RemoteResult<()>;
}

#[async_trait]
impl<T: MediaRepository + ?Sized> MediaRepository for Arc<T> {
    async fn list(&self, property_id: &str) -> RemoteResult<Vec<MediaRecord>> {
        (**self).list(property_id).await
    }

    async fn insert(&self, media: NewMedia) -> RemoteResult<MediaRecord> {
        (**self).insert(media).await
    }

    async fn max_sort_order(
        &self,
        property_id: &str,
        kind: MediaKind,
    ) -> RemoteResult<Option<SortOrder>> {
        (**self).max_sort_order(property_id, kind).await
    }

    async fn find_by_url(&self, property_id: &str, url: &str) -> RemoteResult<Vec<MediaRecord>> {
        (**self).find_by_url(property_id, url).await
    }

    async fn delete_by_id(&self, id: &str) -> RemoteResult<()> {
        (**self).delete_by_id(id).await
    }

    async fn clear_main(&self, property_id: &str) -> RemoteResult<()> {
        (**self).clear_main(property_id).await
    }

    async fn mark_main(&self, id: &str) -> RemoteResult<()> {
        (**self).mark_main(id).await
    }

    async fn set_featured(&self, id: &str, featured: bool) -> RemoteResult<()> {
        (**self).set_featured(id, featured).await
    }

    async fn set_sort_order(&self, id: &str, sort_order: SortOrder) -> RemoteResult<()> {
        (**self).set_sort_order(id, sort_order).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn bucket(&self) -> &str {
        (**self).bucket()
    }

    fn public_url(&self, path: &str) -> String {
        (**self).public_url(path)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> RemoteResult<()> {
        (**self).upload(path, bytes, content_type).await
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        (**self).delete(path).await
    }
}
