//! The `property_images` table behind the engine's media repository.

use async_trait::async_trait;
use casa_engine::{
    MediaId, MediaKind, MediaRecord, MediaRepository, NewMedia, RemoteError, RemoteResult,
    SortOrder,
};
use sqlx::{PgPool, Row};

const MEDIA_COLUMNS: &str =
    "id, property_id, url, type, sort_order, is_main, is_featured_image";

/// A stored media row from the database.
#[derive(Debug)]
pub struct StoredMedia {
    pub id: String,
    pub property_id: String,
    pub url: String,
    pub kind: String,
    pub sort_order: i64,
    pub is_main: bool,
    pub is_featured: bool,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredMedia {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredMedia {
            id: row.try_get("id")?,
            property_id: row.try_get("property_id")?,
            url: row.try_get("url")?,
            kind: row.try_get("type")?,
            sort_order: row.try_get("sort_order")?,
            is_main: row.try_get("is_main")?,
            is_featured: row.try_get("is_featured_image")?,
        })
    }
}

impl StoredMedia {
    /// Convert database row to an engine record.
    pub fn to_record(&self) -> RemoteResult<MediaRecord> {
        let kind = MediaKind::parse(&self.kind).ok_or_else(|| {
            RemoteError::Database(format!("row {} has unknown type {:?}", self.id, self.kind))
        })?;

        Ok(MediaRecord {
            id: MediaId::Persisted(self.id.clone()),
            url: self.url.clone(),
            property_id: Some(self.property_id.clone()),
            kind,
            sort_order: self.sort_order,
            is_main: self.is_main,
            is_featured: self.is_featured,
        })
    }
}

fn db_error(e: sqlx::Error) -> RemoteError {
    RemoteError::Database(e.to_string())
}

fn expect_one(result: sqlx::postgres::PgQueryResult, id: &str) -> RemoteResult<()> {
    if result.rows_affected() == 0 {
        return Err(RemoteError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Media repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn list(&self, property_id: &str) -> RemoteResult<Vec<MediaRecord>> {
        let rows = sqlx::query_as::<_, StoredMedia>(&format!(
            "SELECT {} FROM property_images WHERE property_id = $1 ORDER BY type, sort_order",
            MEDIA_COLUMNS
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(StoredMedia::to_record).collect()
    }

    async fn insert(&self, media: NewMedia) -> RemoteResult<MediaRecord> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = sqlx::query_as::<_, StoredMedia>(&format!(
            r#"
            INSERT INTO property_images
                (id, property_id, url, type, sort_order, is_main, is_featured_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(&id)
        .bind(&media.property_id)
        .bind(&media.url)
        .bind(media.kind.as_str())
        .bind(media.sort_order)
        .bind(media.is_main)
        .bind(media.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::debug!(id = %id, property_id = %media.property_id, kind = %media.kind, "media row inserted");
        row.to_record()
    }

    async fn max_sort_order(
        &self,
        property_id: &str,
        kind: MediaKind,
    ) -> RemoteResult<Option<SortOrder>> {
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(sort_order) FROM property_images WHERE property_id = $1 AND type = $2",
        )
        .bind(property_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn find_by_url(&self, property_id: &str, url: &str) -> RemoteResult<Vec<MediaRecord>> {
        let rows = sqlx::query_as::<_, StoredMedia>(&format!(
            "SELECT {} FROM property_images WHERE property_id = $1 AND url = $2",
            MEDIA_COLUMNS
        ))
        .bind(property_id)
        .bind(url)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(StoredMedia::to_record).collect()
    }

    async fn delete_by_id(&self, id: &str) -> RemoteResult<()> {
        let result = sqlx::query("DELETE FROM property_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        expect_one(result, id)
    }

    async fn clear_main(&self, property_id: &str) -> RemoteResult<()> {
        sqlx::query(
            "UPDATE property_images SET is_main = FALSE WHERE property_id = $1 AND is_main",
        )
        .bind(property_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn mark_main(&self, id: &str) -> RemoteResult<()> {
        let result = sqlx::query("UPDATE property_images SET is_main = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        expect_one(result, id)
    }

    async fn set_featured(&self, id: &str, featured: bool) -> RemoteResult<()> {
        let result =
            sqlx::query("UPDATE property_images SET is_featured_image = $2 WHERE id = $1")
                .bind(id)
                .bind(featured)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        expect_one(result, id)
    }

    async fn set_sort_order(&self, id: &str, sort_order: SortOrder) -> RemoteResult<()> {
        let result = sqlx::query("UPDATE property_images SET sort_order = $2 WHERE id = $1")
            .bind(id)
            .bind(sort_order)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        expect_one(result, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(kind: &str) -> StoredMedia {
        StoredMedia {
            id: "row-1".into(),
            property_id: "prop-1".into(),
            url: "http://localhost:3000/storage/v1/object/public/property-media/a.jpg".into(),
            kind: kind.into(),
            sort_order: 3,
            is_main: true,
            is_featured: false,
        }
    }

    #[test]
    fn rows_convert_to_persisted_records() {
        let record = stored("floorplan").to_record().unwrap();
        assert_eq!(record.id, MediaId::Persisted("row-1".into()));
        assert_eq!(record.kind, MediaKind::Floorplan);
        assert_eq!(record.property_id.as_deref(), Some("prop-1"));
        assert!(record.is_main);
    }

    #[test]
    fn unknown_type_is_a_database_error() {
        assert!(matches!(
            stored("video").to_record(),
            Err(RemoteError::Database(_))
        ));
    }
}
