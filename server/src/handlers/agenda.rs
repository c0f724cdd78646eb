//! Agenda handlers.

use casa_engine::calendar::{self, WeekLayout};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::Result;
use crate::AppState;

/// Query parameters for the week view.
#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    /// Any day of the requested week; today if absent
    pub start: Option<NaiveDate>,
}

/// The week grid with its hour rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekResponse {
    pub hours: Vec<String>,
    pub hour_height_px: i32,
    #[serde(flatten)]
    pub layout: WeekLayout,
}

/// Lay out the week containing `query.start`.
pub async fn week(state: &AppState, query: WeekQuery) -> Result<WeekResponse> {
    let day = query
        .start
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let monday = calendar::week_start(day);
    let events = db::get_events_between(&state.pool, monday, monday + Duration::days(6)).await?;

    tracing::debug!(week_start = %monday, events = events.len(), "agenda week loaded");
    Ok(WeekResponse {
        hours: calendar::hour_labels(),
        hour_height_px: calendar::HOUR_HEIGHT_PX,
        layout: calendar::layout_week(monday, &events),
    })
}
