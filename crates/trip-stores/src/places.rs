//! Reverse geocoding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// One administrative area covering a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    pub id: String,
    /// Administrative level; lower is broader (country < region < city)
    pub admin_level: u8,
    pub name: String,
}

impl ResolvedPlace {
    pub fn new(id: impl Into<String>, admin_level: u8, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            admin_level,
            name: name.into(),
        }
    }
}

/// The host's reverse geocoder.
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Areas covering a coordinate, most specific first. May fail closed by
    /// returning an empty list.
    async fn resolve(&self, latitude: f64, longitude: f64) -> StoreResult<Vec<ResolvedPlace>>;
}
