//! Journey configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use trip_cluster::InterpolationOptions;
use trip_models::{ClusterThresholds, HomeLocation, ThresholdPair};
use trip_story::SelectionOptions;

/// Config-store key for per-user setting overrides.
pub const SETTINGS_KEY: &str = "journeys.settings";
/// Config-store key under which a detected home is persisted.
pub const DETECTED_HOME_KEY: &str = "journeys.home.detected";

/// Journey engine configuration.
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// Near/away threshold pairs for home-aware clustering
    pub thresholds: ClusterThresholds,
    /// Minimum items for a cluster to materialize
    pub min_cluster_size: usize,
    /// Clusters ending within this many days are skipped (0 disables)
    pub recent_cutoff_days: i64,
    /// Also query secondary mounted storage
    pub include_secondary_storage: bool,
    /// Radius assigned to detected homes
    pub home_radius_km: f64,
    pub interpolation: InterpolationOptions,
    pub selection: SelectionOptions,
    /// Seconds each segment holds in the rendered video
    pub hold_secs: f64,
    /// Crossfade duration in the rendered video
    pub transition_secs: f64,
    /// Managed-storage folder for rendered videos
    pub output_folder: String,
    /// Pool directory for background tracks
    pub soundtrack_dir: Option<PathBuf>,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            thresholds: ClusterThresholds::default(),
            min_cluster_size: 5,
            recent_cutoff_days: 7,
            include_secondary_storage: false,
            home_radius_km: trip_models::DEFAULT_HOME_RADIUS_KM,
            interpolation: InterpolationOptions::default(),
            selection: SelectionOptions::default(),
            hold_secs: 3.0,
            transition_secs: 1.0,
            output_folder: "Journeys".to_string(),
            soundtrack_dir: None,
        }
    }
}

impl JourneyConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            thresholds: ClusterThresholds {
                near: ThresholdPair::new(
                    env_parse("TRIP_NEAR_TIME_GAP_SECS", defaults.thresholds.near.time_gap_secs),
                    env_parse(
                        "TRIP_NEAR_MAX_DISTANCE_KM",
                        defaults.thresholds.near.max_distance_km,
                    ),
                ),
                away: ThresholdPair::new(
                    env_parse("TRIP_AWAY_TIME_GAP_SECS", defaults.thresholds.away.time_gap_secs),
                    env_parse(
                        "TRIP_AWAY_MAX_DISTANCE_KM",
                        defaults.thresholds.away.max_distance_km,
                    ),
                ),
            },
            min_cluster_size: env_parse("TRIP_MIN_CLUSTER_SIZE", defaults.min_cluster_size),
            recent_cutoff_days: env_parse("TRIP_RECENT_CUTOFF_DAYS", defaults.recent_cutoff_days),
            include_secondary_storage: env_parse(
                "TRIP_INCLUDE_SECONDARY",
                defaults.include_secondary_storage,
            ),
            home_radius_km: env_parse("TRIP_HOME_RADIUS_KM", defaults.home_radius_km),
            interpolation: defaults.interpolation,
            selection: SelectionOptions {
                min_gap_secs: env_parse("TRIP_STORY_MIN_GAP_SECS", defaults.selection.min_gap_secs),
                max_images: env_parse("TRIP_STORY_MAX_IMAGES", defaults.selection.max_images),
                face_boost: env_parse("TRIP_STORY_FACE_BOOST", defaults.selection.face_boost),
            },
            hold_secs: env_parse("TRIP_HOLD_SECS", defaults.hold_secs),
            transition_secs: env_parse("TRIP_TRANSITION_SECS", defaults.transition_secs),
            output_folder: std::env::var("TRIP_OUTPUT_FOLDER")
                .unwrap_or(defaults.output_folder),
            soundtrack_dir: std::env::var("TRIP_SOUNDTRACK_DIR").ok().map(PathBuf::from),
        }
    }

    /// Apply a user's stored overrides on top of this config.
    pub fn with_overrides(mut self, settings: &JourneySettings) -> Self {
        if let Some(pair) = settings.near {
            self.thresholds.near = pair;
        }
        if let Some(pair) = settings.away {
            self.thresholds.away = pair;
        }
        if let Some(size) = settings.min_cluster_size {
            self.min_cluster_size = size;
        }
        if let Some(days) = settings.recent_cutoff_days {
            self.recent_cutoff_days = days;
        }
        if let Some(boost) = settings.face_boost {
            self.selection.face_boost = boost;
        }
        if let Some(max) = settings.max_images {
            self.selection.max_images = max;
        }
        self
    }
}

/// Per-user overrides stored as a JSON blob in the config store.
///
/// The `home` field is the explicitly supplied home location, which takes
/// precedence over stored and detected homes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JourneySettings {
    pub near: Option<ThresholdPair>,
    pub away: Option<ThresholdPair>,
    pub min_cluster_size: Option<usize>,
    pub recent_cutoff_days: Option<i64>,
    pub face_boost: Option<bool>,
    pub max_images: Option<usize>,
    pub home: Option<HomeLocation>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = JourneyConfig::default();
        assert!(config.min_cluster_size >= 2);
        assert!(config.thresholds.near.time_gap_secs < config.thresholds.away.time_gap_secs);
        assert!(config.transition_secs < config.hold_secs);
    }

    #[test]
    fn test_overrides_apply() {
        let settings = JourneySettings {
            near: Some(ThresholdPair::new(1800, 5.0)),
            min_cluster_size: Some(3),
            face_boost: Some(false),
            ..Default::default()
        };
        let config = JourneyConfig::default().with_overrides(&settings);
        assert_eq!(config.thresholds.near.time_gap_secs, 1800);
        assert_eq!(config.min_cluster_size, 3);
        assert!(!config.selection.face_boost);
        // Untouched fields keep their defaults
        assert_eq!(
            config.thresholds.away,
            JourneyConfig::default().thresholds.away
        );
    }

    #[test]
    fn test_settings_deserialize_partial_json() {
        let settings: JourneySettings =
            serde_json::from_str(r#"{"minClusterSize": 4, "home": {"latitude": 52.5, "longitude": 13.4, "radiusKm": 12.0}}"#)
                .unwrap();
        assert_eq!(settings.min_cluster_size, Some(4));
        assert_eq!(settings.home.as_ref().map(|h| h.radius_km), Some(12.0));
        assert!(settings.near.is_none());
    }
}
