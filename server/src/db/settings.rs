//! Agency-wide settings.
//!
//! The settings row is read once per process and shared through
//! [`SettingsCache`], which lives in the application state.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tokio::sync::OnceCell;

/// The agency's contact and branding details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencySettings {
    pub agency_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub logo_url: Option<String>,
    pub primary_color: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for AgencySettings {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(AgencySettings {
            agency_name: row.try_get("agency_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            website: row.try_get("website")?,
            logo_url: row.try_get("logo_url")?,
            primary_color: row.try_get("primary_color")?,
        })
    }
}

/// Load the settings row. A missing row yields defaults.
pub async fn load_settings(pool: &PgPool) -> Result<AgencySettings, sqlx::Error> {
    let settings = sqlx::query_as::<_, AgencySettings>(
        r#"
        SELECT agency_name, email, phone, address, website, logo_url, primary_color
        FROM agency_settings
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(settings.unwrap_or_default())
}

/// Process-wide cache of the settings row.
#[derive(Debug, Default)]
pub struct SettingsCache {
    cell: OnceCell<AgencySettings>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that never hits the database.
    #[cfg(test)]
    pub fn preloaded(settings: AgencySettings) -> Self {
        Self {
            cell: OnceCell::from(settings),
        }
    }

    /// The cached settings, loading them on first use.
    pub async fn get(&self, pool: &PgPool) -> Result<&AgencySettings, sqlx::Error> {
        self.cell
            .get_or_try_init(|| async {
                let settings = load_settings(pool).await?;
                tracing::info!(agency = %settings.agency_name, "agency settings loaded");
                Ok::<_, sqlx::Error>(settings)
            })
            .await
    }
}
