//! Home locations and clustering threshold pairs.

use serde::{Deserialize, Serialize};

/// Default radius for a detected home, in kilometers.
pub const DEFAULT_HOME_RADIUS_KM: f64 = 10.0;

/// Per-user home location.
///
/// Source precedence: explicitly supplied > previously stored > auto-detected
/// from the densest 0.1 degree bucket of geotagged items. Detected homes are
/// persisted so detection runs once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HomeLocation {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A time-gap / distance threshold pair for clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdPair {
    /// Maximum gap between consecutive items before a split, in seconds
    pub time_gap_secs: i64,
    /// Maximum distance from the last geolocated item before a split
    pub max_distance_km: f64,
}

impl ThresholdPair {
    pub fn new(time_gap_secs: i64, max_distance_km: f64) -> Self {
        Self {
            time_gap_secs,
            max_distance_km,
        }
    }
}

/// The two named threshold pairs used by home-aware clustering.
///
/// `near` is tighter and suits day-trips from home; `away` is looser and
/// suits multi-day travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterThresholds {
    pub near: ThresholdPair,
    pub away: ThresholdPair,
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            // 8 hours / 15 km near home, 36 hours / 150 km away
            near: ThresholdPair::new(8 * 3600, 15.0),
            away: ThresholdPair::new(36 * 3600, 150.0),
        }
    }
}
