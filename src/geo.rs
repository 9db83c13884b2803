// 🌍 Geo primitives - coordinates, great-circle distance, bounds
// Entities speak `{lat, long}`, the map widget and the wire formats speak `{lat, lng}`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by every distance computation (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// ============================================================================
// COORDINATES
// ============================================================================

/// Entity coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

impl Location {
    pub fn new(lat: f64, long: f64) -> Self {
        Location { lat, long }
    }
}

/// Marker position as the map widget and the export formats see it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

impl From<Location> for LatLng {
    fn from(loc: Location) -> Self {
        LatLng {
            lat: loc.lat,
            lng: loc.long,
        }
    }
}

impl From<LatLng> for Location {
    fn from(pos: LatLng) -> Self {
        Location {
            lat: pos.lat,
            long: pos.lng,
        }
    }
}

// ============================================================================
// DISTANCE
// ============================================================================

/// Great-circle distance in kilometres (haversine formula).
pub fn haversine_km(a: Location, b: Location) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.long - a.long).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

pub fn km_to_meters(km: f64) -> f64 {
    km * 1000.0
}

// ============================================================================
// BOUNDS
// ============================================================================

/// Bounding region accumulator (the widget's `LatLngBounds`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Degenerate bounds around a single point.
    pub fn around(pos: LatLng) -> Self {
        Bounds {
            south: pos.lat,
            west: pos.lng,
            north: pos.lat,
            east: pos.lng,
        }
    }

    pub fn extend(&mut self, pos: LatLng) {
        self.south = self.south.min(pos.lat);
        self.north = self.north.max(pos.lat);
        self.west = self.west.min(pos.lng);
        self.east = self.east.max(pos.lng);
    }

    /// Bounds covering every position, `None` for an empty input.
    pub fn covering<I>(positions: I) -> Option<Bounds>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = positions.into_iter();
        let mut bounds = Bounds::around(iter.next()?);
        for pos in iter {
            bounds.extend(pos);
        }
        Some(bounds)
    }

    pub fn contains(&self, pos: LatLng) -> bool {
        pos.lat >= self.south && pos.lat <= self.north && pos.lng >= self.west && pos.lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point_is_zero() {
        let p = Location::new(48.8566, 2.3522);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        // 2 * pi * 6371 / 360
        assert!((haversine_km(a, b) - 111.19492664455873).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_paris_london() {
        let paris = Location::new(48.8566, 2.3522);
        let london = Location::new(51.5074, -0.1278);
        let d = haversine_km(paris, london);
        assert!(d > 340.0 && d < 345.0, "got {}", d);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = Location::new(-33.8688, 151.2093);
        let b = Location::new(35.6762, 139.6503);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_antipodal_points() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.0, 180.0);
        assert!((haversine_km(a, b) - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_location_latlng_conversion() {
        let loc = Location::new(1.23, 4.56);
        let pos: LatLng = loc.into();
        assert_eq!(pos, LatLng::new(1.23, 4.56));
        assert_eq!(Location::from(pos), loc);
    }

    #[test]
    fn test_bounds_covering() {
        let bounds = Bounds::covering(vec![
            LatLng::new(10.0, -5.0),
            LatLng::new(-3.0, 20.0),
            LatLng::new(4.0, 0.0),
        ])
        .unwrap();

        assert_eq!(bounds.south, -3.0);
        assert_eq!(bounds.north, 10.0);
        assert_eq!(bounds.west, -5.0);
        assert_eq!(bounds.east, 20.0);
        assert!(bounds.contains(LatLng::new(4.0, 0.0)));
        assert!(!bounds.contains(LatLng::new(11.0, 0.0)));
    }

    #[test]
    fn test_bounds_covering_empty() {
        assert!(Bounds::covering(Vec::new()).is_none());
    }
}
