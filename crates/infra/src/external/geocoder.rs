use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use devcamper_catalog::Place;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder table could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("geocoder table is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Resolves a free-form address or zipcode to a place.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Place>, GeocodeError>;
}

/// Fixed lookup table keyed by query text (case and surrounding whitespace
/// ignored). Entries are also reachable by their `zipcode`.
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    places: HashMap<String, Place>,
}

impl StaticGeocoder {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Place)>,
    {
        let mut places = HashMap::new();
        for (query, place) in entries {
            if let Some(zip) = &place.zipcode {
                places.entry(normalize(zip)).or_insert_with(|| place.clone());
            }
            places.insert(normalize(&query), place);
        }
        Self { places }
    }

    /// Load `{ "<query>": { "lat": .., "lng": .., ... } }` from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, GeocodeError> {
        let raw = std::fs::read_to_string(path)?;
        let table: HashMap<String, Place> = serde_json::from_str(&raw)?;
        Ok(Self::new(table))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait::async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Place>, GeocodeError> {
        Ok(self.places.get(&normalize(query)).cloned())
    }
}

fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boston() -> Place {
        Place {
            lat: 42.35,
            lng: -71.1,
            zipcode: Some("02215".into()),
            city: Some("Boston".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn lookup_by_address_or_zip() {
        let geocoder = StaticGeocoder::new([("233 Bay State Rd Boston MA 02215".to_string(), boston())]);
        assert_eq!(
            geocoder.geocode("  233 bay state rd   Boston MA 02215").await.unwrap(),
            Some(boston())
        );
        assert_eq!(geocoder.geocode("02215").await.unwrap(), Some(boston()));
        assert_eq!(geocoder.geocode("99999").await.unwrap(), None);
    }

    #[test]
    fn loads_json_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.json");
        std::fs::write(&path, r#"{"02118": {"lat": 42.34, "lng": -71.07, "city": "Boston"}}"#).unwrap();
        let geocoder = StaticGeocoder::from_file(&path).unwrap();
        assert_eq!(geocoder.len(), 1);
    }
}
