//! Property draft fields.
//!
//! The scalar fields of a listing plus the three list fields the
//! `properties` table keeps as JSON (`features`, `areas`,
//! `nearby_places`). Stored lists may come back either as JSON arrays or as
//! strings holding JSON; anything unreadable decodes to an empty list.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named area of the property, e.g. a living room with its size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub name: String,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A point of interest near the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPlace {
    pub name: String,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Editable fields of a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyFields {
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
    pub features: Vec<String>,
    pub areas: Vec<Area>,
    pub nearby_places: Vec<NearbyPlace>,
}

impl PropertyFields {
    /// Titles are the only field a listing cannot be saved without.
    pub fn is_saveable(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Decode a stored list column.
///
/// `field` names the column in the warning logged on bad input.
pub fn decode_list<T: DeserializeOwned>(raw: Option<&serde_json::Value>, field: &str) -> Vec<T> {
    let value = match raw {
        None | Some(serde_json::Value::Null) => return Vec::new(),
        Some(serde_json::Value::String(text)) if text.trim().is_empty() => return Vec::new(),
        Some(serde_json::Value::String(text)) => match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(field, "stored list is not JSON: {}", e);
                return Vec::new();
            }
        },
        Some(value) => value.clone(),
    };

    match serde_json::from_value(value) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(field, "stored list has unexpected shape: {}", e);
            Vec::new()
        }
    }
}

/// Encode a list column.
pub fn encode_list<T: Serialize>(list: &[T]) -> serde_json::Value {
    serde_json::to_value(list).unwrap_or_else(|e| {
        tracing::warn!("list not encodable: {}", e);
        serde_json::Value::Array(Vec::new())
    })
}
