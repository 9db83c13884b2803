// 🔎 Geocoding - free-text address lookup via an external service

use crate::geo::LatLng;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub position: LatLng,
    pub formatted_address: String,
}

pub trait Geocoder: Send {
    /// Best matches first. An empty vector means "no results".
    fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>>;
}

/// Gazetteer-backed geocoder: case-insensitive substring match on known
/// place names.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: Vec<(String, GeocodeResult)>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, name: &str, position: LatLng, formatted_address: &str) -> Self {
        self.places.push((
            name.to_lowercase(),
            GeocodeResult {
                position,
                formatted_address: formatted_address.to_string(),
            },
        ));
        self
    }

    /// A handful of well-known cities.
    pub fn with_defaults() -> Self {
        StaticGeocoder::new()
            .with_place("paris", LatLng::new(48.8566, 2.3522), "Paris, France")
            .with_place("london", LatLng::new(51.5074, -0.1278), "London, UK")
            .with_place("new york", LatLng::new(40.7128, -74.006), "New York, NY, USA")
            .with_place("tokyo", LatLng::new(35.6762, 139.6503), "Tokyo, Japan")
            .with_place("sydney", LatLng::new(-33.8688, 151.2093), "Sydney NSW, Australia")
            .with_place("nairobi", LatLng::new(-1.2921, 36.8219), "Nairobi, Kenya")
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .places
            .iter()
            .filter(|(name, _)| needle.contains(name.as_str()) || name.contains(&needle))
            .map(|(_, result)| result.clone())
            .collect())
    }
}
