//! Locations and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean earth radius used for radius searches.
pub const EARTH_RADIUS_MILES: f64 = 3963.2;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance in miles.
    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_MILES * a.sqrt().min(1.0).asin()
    }

    pub fn within(&self, center: &GeoPoint, miles: f64) -> bool {
        self.distance_miles(center) <= miles
    }
}

/// A geocoder hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// GeoJSON point plus the resolved address parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lng, lat]`, GeoJSON order.
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.coordinates[1], self.coordinates[0])
    }
}

impl From<Place> for Location {
    fn from(place: Place) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [place.lng, place.lat],
            formatted_address: place.formatted_address,
            street: place.street,
            city: place.city,
            state: place.state,
            zipcode: place.zipcode,
            country: place.country,
        }
    }
}
