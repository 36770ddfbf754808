//! Location search for tagging posts

use super::validation;
use super::{Client, fields_query};
use crate::error::{Error, Result};
use crate::models::{LOCATION_FIELDS, Location, LocationId, LocationSearchResponse};

impl Client {
    /// Find locations by name, by coordinates, or both
    pub async fn search_locations(
        &self,
        query: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<LocationSearchResponse> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        if query.is_none() && latitude.is_none() && longitude.is_none() {
            return Err(Error::validation(
                "search_params",
                "a query or latitude and longitude are required",
            ));
        }
        validation::validate_coordinates(latitude, longitude)?;

        let mut params = fields_query(LOCATION_FIELDS);
        if let Some(query) = query {
            params.set("q", query);
        }
        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            params.set("latitude", lat.to_string());
            params.set("longitude", lon.to_string());
        }
        self.get("location_search", params).await
    }

    /// A location by id
    pub async fn get_location(&self, id: &LocationId) -> Result<Location> {
        if !id.is_valid() {
            return Err(Error::validation("location_id", "location_id is required"));
        }
        self.get(id.as_str(), fields_query(LOCATION_FIELDS)).await
    }
}
