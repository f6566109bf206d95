//! Partner flower shops and the store locator.

use blossom_core::StoreId;
use serde::{Deserialize, Serialize};

use crate::validate::{self, Validate, ValidationError};

/// A registered partner store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
    pub open_time: String,
    pub close_time: String,
    pub closed_days: Vec<String>,
}

impl Validate for Store {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::coordinates(self.lat, self.lon)
    }
}

/// Store locator result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWithDistance {
    #[serde(flatten)]
    pub store: Store,
    /// Distance from the search point in kilometers.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl Validate for StoreWithDistance {
    fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        if let Some(distance) = self.distance
            && (!distance.is_finite() || distance < 0.0)
        {
            return Err(ValidationError::new("distance", "must not be negative"));
        }
        Ok(())
    }
}

/// Partner store registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
    pub open_time: String,
    pub close_time: String,
    #[serde(default)]
    pub closed_days: Vec<String>,
}

impl Validate for CreateStoreRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::non_blank("address", &self.address)?;
        validate::non_blank("phone", &self.phone)?;
        validate::coordinates(self.lat, self.lon)?;
        validate::min_chars("description", &self.description, 10)?;
        validate::clock_time("openTime", &self.open_time)?;
        validate::clock_time("closeTime", &self.close_time)
    }
}

/// Store locator search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStoreQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub keyword: Option<String>,
}

impl NearbyStoreQuery {
    /// Search within `radius_km` of a point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64, radius_km: f64) -> Self {
        Self {
            lat,
            lon,
            radius_km,
            keyword: None,
        }
    }

    /// Narrow the search by name.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.lat.to_string()),
            ("lon", self.lon.to_string()),
            ("radiusKm", self.radius_km.to_string()),
        ];
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            pairs.push(("keyword", keyword.to_string()));
        }
        pairs
    }
}

impl Validate for NearbyStoreQuery {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::coordinates(self.lat, self.lon)?;
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(ValidationError::new("radiusKm", "must be greater than 0"));
        }
        Ok(())
    }
}
