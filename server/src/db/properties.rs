//! Database operations for the properties table.

use casa_engine::property::{decode_list, encode_list};
use casa_engine::PropertyFields;
use sqlx::{PgPool, Row};

/// A stored property row from the database.
#[derive(Debug)]
pub struct StoredProperty {
    pub id: String,
    pub title: String,
    pub price: Option<f64>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub description: String,
    pub status: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub living_area: Option<f64>,
    pub features: Option<serde_json::Value>,
    pub areas: Option<serde_json::Value>,
    pub nearby_places: Option<serde_json::Value>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredProperty {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredProperty {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            price: row.try_get("price")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            postal_code: row.try_get("postal_code")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            bedrooms: row.try_get("bedrooms")?,
            bathrooms: row.try_get("bathrooms")?,
            living_area: row.try_get("living_area")?,
            features: row.try_get("features")?,
            areas: row.try_get("areas")?,
            nearby_places: row.try_get("nearby_places")?,
        })
    }
}

impl StoredProperty {
    /// Convert database row to editable fields.
    ///
    /// List columns that fail to decode come back empty.
    pub fn to_fields(&self) -> PropertyFields {
        PropertyFields {
            title: self.title.clone(),
            price: self.price,
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            living_area: self.living_area,
            features: decode_list(self.features.as_ref(), "features"),
            areas: decode_list(self.areas.as_ref(), "areas"),
            nearby_places: decode_list(self.nearby_places.as_ref(), "nearby_places"),
        }
    }
}

/// Get a property by ID.
pub async fn get_property(pool: &PgPool, id: &str) -> Result<Option<StoredProperty>, sqlx::Error> {
    sqlx::query_as::<_, StoredProperty>(
        r#"
        SELECT id, title, price, address, city, postal_code, description, status,
               bedrooms, bathrooms, living_area, features, areas, nearby_places
        FROM properties
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a new property and return its ID.
pub async fn insert_property(pool: &PgPool, fields: &PropertyFields) -> Result<String, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO properties (
            id, title, price, address, city, postal_code, description, status,
            bedrooms, bathrooms, living_area, features, areas, nearby_places
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(&id)
    .bind(&fields.title)
    .bind(fields.price)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.postal_code)
    .bind(&fields.description)
    .bind(&fields.status)
    .bind(fields.bedrooms)
    .bind(fields.bathrooms)
    .bind(fields.living_area)
    .bind(encode_list(&fields.features))
    .bind(encode_list(&fields.areas))
    .bind(encode_list(&fields.nearby_places))
    .execute(pool)
    .await?;

    tracing::info!(property_id = %id, "property created");
    Ok(id)
}

/// Overwrite the fields of a property.
///
/// Returns false if no such property exists.
pub async fn update_property(
    pool: &PgPool,
    id: &str,
    fields: &PropertyFields,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE properties SET
            title = $2, price = $3, address = $4, city = $5, postal_code = $6,
            description = $7, status = $8, bedrooms = $9, bathrooms = $10,
            living_area = $11, features = $12, areas = $13, nearby_places = $14,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(fields.price)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.postal_code)
    .bind(&fields.description)
    .bind(&fields.status)
    .bind(fields.bedrooms)
    .bind(fields.bathrooms)
    .bind(fields.living_area)
    .bind(encode_list(&fields.features))
    .bind(encode_list(&fields.areas))
    .bind(encode_list(&fields.nearby_places))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
