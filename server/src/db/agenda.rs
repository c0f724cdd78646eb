//! Database operations for agenda events.

use casa_engine::AgendaEvent;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

/// A stored agenda row.
#[derive(Debug)]
pub struct StoredEvent {
    pub id: String,
    pub title: String,
    pub property_id: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub end_time: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEvent {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredEvent {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            property_id: row.try_get("property_id")?,
            event_date: row.try_get("event_date")?,
            event_time: row.try_get("event_time")?,
            end_time: row.try_get("end_time")?,
        })
    }
}

impl From<StoredEvent> for AgendaEvent {
    fn from(row: StoredEvent) -> Self {
        AgendaEvent {
            id: row.id,
            title: row.title,
            property_id: row.property_id,
            event_date: row.event_date,
            event_time: row.event_time,
            end_time: row.end_time,
        }
    }
}

/// Events dated between `from` and `to`, inclusive.
pub async fn get_events_between(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AgendaEvent>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoredEvent>(
        r#"
        SELECT id, title, property_id, event_date, event_time, end_time
        FROM agenda_events
        WHERE event_date BETWEEN $1 AND $2
        ORDER BY event_date, event_time
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AgendaEvent::from).collect())
}
