//! Free-text location → coordinates.
//!
//! "No match" is `Ok(None)` and never blocks anything: a service whose
//! locations cannot be resolved is still valid and simply has no map pin.
//! A failed lookup is an `Err` the caller may retry.

use std::{collections::HashMap, future::Future};

use gigledger_types::{GigError, Result};

use crate::geo::Coordinates;

pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &str) -> impl Future<Output = Result<Option<Coordinates>>> + Send;
}

/// Gazetteer-backed geocoder with literal `"lat, lon"` support.
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    places: HashMap<String, Coordinates>,
}

impl StaticGeocoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a place name. Lookups are case- and whitespace-insensitive.
    #[must_use]
    pub fn with_place(mut self, name: &str, at: Coordinates) -> Self {
        self.places.insert(normalize(name), at);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let key = normalize(query);
        if key.is_empty() {
            return Err(GigError::Geocoding {
                query: query.to_string(),
                reason: "empty query".into(),
            });
        }
        let hit = Coordinates::parse(&key).or_else(|| self.places.get(&key).copied());
        tracing::debug!(query, found = hit.is_some(), "Geocoded");
        Ok(hit)
    }
}
