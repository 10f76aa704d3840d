//! Home detection from the density of geotagged items.

use std::collections::HashMap;

use tracing::debug;

use trip_models::{HomeLocation, MediaItem};

/// Bucket size for density estimation, in degrees.
const BUCKET_DEGREES: f64 = 0.1;

/// Detect a likely home location as the centroid of the densest
/// 0.1 degree lat/lon bucket of geotagged items.
///
/// Returns `None` when no item carries coordinates. Callers persist the
/// result so detection runs once per user.
pub fn detect_home(items: &[MediaItem], radius_km: f64) -> Option<HomeLocation> {
    let mut buckets: HashMap<(i64, i64), Vec<(f64, f64)>> = HashMap::new();

    for item in items {
        if let Some((lat, lon)) = item.location() {
            let key = (
                (lat / BUCKET_DEGREES).floor() as i64,
                (lon / BUCKET_DEGREES).floor() as i64,
            );
            buckets.entry(key).or_default().push((lat, lon));
        }
    }

    // Densest bucket wins; ties broken by key for determinism.
    let (key, points) = buckets
        .into_iter()
        .max_by(|(ka, a), (kb, b)| a.len().cmp(&b.len()).then(kb.cmp(ka)))?;

    let count = points.len() as f64;
    let lat = points.iter().map(|p| p.0).sum::<f64>() / count;
    let lon = points.iter().map(|p| p.1).sum::<f64>() / count;

    debug!(
        bucket = ?key,
        items = points.len(),
        latitude = lat,
        longitude = lon,
        "detected home bucket"
    );

    Some(HomeLocation::new(lat, lon, radius_km))
}
