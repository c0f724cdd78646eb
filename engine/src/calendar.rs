//! Weekly agenda layout.
//!
//! The week grid starts on Monday and shows 08:00 to 19:00 with one pixel
//! per minute (60 px hour rows). Events are bucketed by date, positioned by
//! start time and sized by duration, with a floor so short events remain
//! clickable.

use crate::error::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// First hour shown in the grid.
pub const DAY_START_HOUR: u32 = 8;
/// Last hour row shown in the grid.
pub const DAY_END_HOUR: u32 = 19;
/// Height of one hour row.
pub const HOUR_HEIGHT_PX: i32 = 60;
/// Events shorter than this are drawn this tall.
pub const MIN_EVENT_HEIGHT_PX: i32 = 25;
/// Duration assumed when an event has no end time.
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Fixed palette events are colored from.
pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

/// A scheduled agenda entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub property_id: Option<String>,
    pub event_date: NaiveDate,
    /// Start time as `HH:MM` or `HH:MM:SS`
    pub event_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// An event positioned inside its day column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPlacement {
    pub event_id: String,
    pub title: String,
    /// Minutes since midnight, used for ordering
    pub start_minutes: u32,
    /// Offset from the top of the grid
    pub top_px: i32,
    pub height_px: i32,
    pub color: String,
}

/// One day of the week grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayColumn {
    pub date: NaiveDate,
    pub events: Vec<EventPlacement>,
}

/// A full Monday-to-Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekLayout {
    pub week_start: NaiveDate,
    pub days: Vec<DayColumn>,
}

/// Parse `HH:MM[:SS]` into minutes since midnight. Seconds are ignored.
pub fn parse_time(value: &str) -> Result<u32> {
    let invalid = || Error::InvalidTime(value.to_string());

    let mut parts = value.trim().split(':');
    let hours: u32 = parts
        .next()
        .and_then(|h| h.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: u32 = parts
        .next()
        .and_then(|m| m.parse().ok())
        .ok_or_else(invalid)?;
    if let Some(seconds) = parts.next() {
        let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
        if seconds > 59 {
            return Err(invalid());
        }
    }
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Labels of the hour rows, `08:00` through `19:00`.
pub fn hour_labels() -> Vec<String> {
    (DAY_START_HOUR..=DAY_END_HOUR)
        .map(|h| format!("{:02}:00", h))
        .collect()
}

/// Palette color for an event, stable across renders.
///
/// Keyed by property id, falling back to the title.
pub fn event_color(event: &AgendaEvent) -> &'static str {
    let key = event.property_id.as_deref().unwrap_or(&event.title);
    PALETTE[color_index(key)]
}

fn color_index(key: &str) -> usize {
    let hash = key.chars().fold(0i32, |hash, c| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32)
    });
    hash.unsigned_abs() as usize % PALETTE.len()
}

/// Position a single event.
///
/// A malformed start time places the event at the top of the grid with the
/// default duration; a malformed end time only falls back to the default
/// duration.
pub fn place_event(event: &AgendaEvent) -> EventPlacement {
    let (start, duration) = match parse_time(&event.event_time) {
        Ok(start) => {
            let duration = match event.end_time.as_deref() {
                None => DEFAULT_DURATION_MINUTES,
                Some(end) => match parse_time(end) {
                    Ok(end) => end as i32 - start as i32,
                    Err(e) => {
                        tracing::warn!(event_id = %event.id, "bad end time: {}", e);
                        DEFAULT_DURATION_MINUTES
                    }
                },
            };
            (Some(start), duration)
        }
        Err(e) => {
            tracing::warn!(event_id = %event.id, "bad start time: {}", e);
            (None, DEFAULT_DURATION_MINUTES)
        }
    };

    let top_px = match start {
        Some(start) => {
            let hours = (start / 60) as i32;
            let minutes = (start % 60) as i32;
            (hours - DAY_START_HOUR as i32) * HOUR_HEIGHT_PX + minutes
        }
        None => 0,
    };

    EventPlacement {
        event_id: event.id.clone(),
        title: event.title.clone(),
        start_minutes: start.unwrap_or(0),
        top_px,
        height_px: duration.max(MIN_EVENT_HEIGHT_PX),
        color: event_color(event).to_string(),
    }
}

/// Lay out every event falling in the week that contains `any_day`.
pub fn layout_week(any_day: NaiveDate, events: &[AgendaEvent]) -> WeekLayout {
    let start = week_start(any_day);
    let days = (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let mut placed: Vec<EventPlacement> = events
                .iter()
                .filter(|e| e.event_date == date)
                .map(place_event)
                .collect();
            placed.sort_by_key(|p| p.start_minutes);
            DayColumn {
                date,
                events: placed,
            }
        })
        .collect();

    WeekLayout {
        week_start: start,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, date: &str, start: &str, end: Option<&str>) -> AgendaEvent {
        AgendaEvent {
            id: id.to_string(),
            title: format!("Viewing {}", id),
            property_id: Some(format!("prop-{}", id)),
            event_date: date.parse().unwrap(),
            event_time: start.to_string(),
            end_time: end.map(str::to_string),
        }
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_time("14:30").unwrap(), 870);
        assert_eq!(parse_time("09:05:59").unwrap(), 545);
        assert_eq!(parse_time("00:00").unwrap(), 0);
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("12:60").is_err());
        assert!(parse_time("noon").is_err());
        assert!(parse_time("12").is_err());
        assert!(parse_time("12:00:00:00").is_err());
    }

    #[test]
    fn default_duration_without_end_time() {
        let placed = place_event(&event("a", "2024-03-06", "14:30", None));
        assert_eq!(placed.top_px, 390);
        assert_eq!(placed.height_px, 60);
    }

    #[test]
    fn short_events_get_minimum_height() {
        let placed = place_event(&event("a", "2024-03-06", "09:00", Some("09:15")));
        assert_eq!(placed.top_px, 60);
        assert_eq!(placed.height_px, 25);
    }

    #[test]
    fn explicit_duration() {
        let placed = place_event(&event("a", "2024-03-06", "10:15:00", Some("12:00")));
        assert_eq!(placed.top_px, 135);
        assert_eq!(placed.height_px, 105);
    }

    #[test]
    fn malformed_times_fall_back() {
        let placed = place_event(&event("a", "2024-03-06", "later", Some("12:00")));
        assert_eq!(placed.top_px, 0);
        assert_eq!(placed.height_px, 60);

        let placed = place_event(&event("a", "2024-03-06", "11:00", Some("soon")));
        assert_eq!(placed.top_px, 180);
        assert_eq!(placed.height_px, 60);
    }

    #[test]
    fn week_starts_on_monday() {
        let wednesday: NaiveDate = "2024-03-06".parse().unwrap();
        let monday: NaiveDate = "2024-03-04".parse().unwrap();
        let sunday: NaiveDate = "2024-03-10".parse().unwrap();
        assert_eq!(week_start(wednesday), monday);
        assert_eq!(week_start(monday), monday);
        assert_eq!(week_start(sunday), monday);
    }

    #[test]
    fn layout_buckets_and_sorts() {
        let events = vec![
            event("late", "2024-03-06", "16:00", None),
            event("early", "2024-03-06", "08:30", None),
            event("monday", "2024-03-04", "10:00", None),
            event("next-week", "2024-03-11", "10:00", None),
        ];
        let layout = layout_week("2024-03-07".parse().unwrap(), &events);

        assert_eq!(layout.week_start, "2024-03-04".parse::<NaiveDate>().unwrap());
        assert_eq!(layout.days.len(), 7);
        assert_eq!(layout.days[0].events.len(), 1);

        let wednesday: Vec<&str> = layout.days[2]
            .events
            .iter()
            .map(|p| p.event_id.as_str())
            .collect();
        assert_eq!(wednesday, vec!["early", "late"]);

        let total: usize = layout.days.iter().map(|d| d.events.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn colors_are_stable_per_property() {
        let a = event("1", "2024-03-06", "10:00", None);
        let mut b = event("2", "2024-03-07", "12:00", None);
        b.property_id = a.property_id.clone();
        b.title = "Something else".into();
        assert_eq!(event_color(&a), event_color(&b));
        assert_eq!(event_color(&a), event_color(&a.clone()));

        let mut untitled = a.clone();
        untitled.property_id = None;
        assert!(PALETTE.contains(&event_color(&untitled)));
    }

    #[test]
    fn hour_rows() {
        let labels = hour_labels();
        assert_eq!(labels.first().map(String::as_str), Some("08:00"));
        assert_eq!(labels.last().map(String::as_str), Some("19:00"));
        assert_eq!(labels.len(), 12);
    }
}
