//! Location models

use serde::{Deserialize, Serialize};

use super::LocationId;

/// A place that can be tagged on a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Location id
    pub id: LocationId,
    /// Place name
    pub name: String,
    /// Street address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Country
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Latitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Postal code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Result of a location search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSearchResponse {
    /// Matches
    #[serde(default)]
    pub data: Vec<Location>,
}

/// Fields requested for locations
pub const LOCATION_FIELDS: &str = "id,name,address,city,country,latitude,longitude,postal_code";
