//! Missing-location interpolation.
//!
//! Fills missing coordinates on items by examining the nearest geotagged
//! neighbors in time, bounded so interpolation never bridges large time gaps
//! or large movements.

use trip_models::MediaItem;

use crate::geo::haversine_km;

/// Bounds for neighbor interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationOptions {
    /// Maximum gap to either neighbor for two-sided interpolation, in seconds
    pub max_gap_secs: i64,
    /// Maximum distance between the two neighbors for two-sided interpolation
    pub max_distance_km: f64,
    /// Maximum gap for copying coordinates from a single neighbor, in seconds
    pub single_neighbor_max_secs: i64,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            max_gap_secs: 6 * 3600,
            max_distance_km: 1.0,
            single_neighbor_max_secs: 3600,
        }
    }
}

/// Fill missing coordinates on items sorted by timestamp.
///
/// For an item without coordinates, the nearest preceding and following
/// geotagged items in the *input* are considered:
///
/// - Both present: interpolate linearly in time fraction, but only when both
///   time gaps are within `max_gap_secs` and the neighbors are within
///   `max_distance_km` of each other. Equal neighbor timestamps use the
///   midpoint; out-of-order neighbors are skipped.
/// - One present: copy its coordinates when within
///   `single_neighbor_max_secs`.
///
/// Items that already have coordinates are never modified. Returns a new
/// sequence; the input is untouched.
pub fn interpolate_locations(items: &[MediaItem], opts: &InterpolationOptions) -> Vec<MediaItem> {
    // Nearest geotagged neighbor indices, computed against the input only so
    // freshly interpolated items never become anchors themselves.
    let n = items.len();
    let mut prev_geo: Vec<Option<usize>> = vec![None; n];
    let mut next_geo: Vec<Option<usize>> = vec![None; n];

    let mut last = None;
    for (i, item) in items.iter().enumerate() {
        prev_geo[i] = last;
        if item.has_location() {
            last = Some(i);
        }
    }
    let mut next = None;
    for (i, item) in items.iter().enumerate().rev() {
        next_geo[i] = next;
        if item.has_location() {
            next = Some(i);
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.has_location() {
                return item.clone();
            }
            match interpolated_location(items, item, prev_geo[i], next_geo[i], opts) {
                Some((lat, lon)) => item.clone().with_location(lat, lon),
                None => item.clone(),
            }
        })
        .collect()
}

fn interpolated_location(
    items: &[MediaItem],
    item: &MediaItem,
    prev: Option<usize>,
    next: Option<usize>,
    opts: &InterpolationOptions,
) -> Option<(f64, f64)> {
    match (prev, next) {
        (Some(p), Some(f)) => {
            let prev = &items[p];
            let next = &items[f];
            let (p_lat, p_lon) = prev.location()?;
            let (f_lat, f_lon) = next.location()?;

            let gap_before = (item.taken_at - prev.taken_at).num_seconds();
            let gap_after = (next.taken_at - item.taken_at).num_seconds();
            if gap_before > opts.max_gap_secs || gap_after > opts.max_gap_secs {
                return None;
            }
            if haversine_km(p_lat, p_lon, f_lat, f_lon) > opts.max_distance_km {
                return None;
            }

            let span = (next.taken_at - prev.taken_at).num_seconds();
            if span < 0 {
                // Out-of-order neighbors: do not guess
                return None;
            }
            let fraction = if span == 0 {
                0.5
            } else {
                gap_before as f64 / span as f64
            };
            Some((
                p_lat + (f_lat - p_lat) * fraction,
                p_lon + (f_lon - p_lon) * fraction,
            ))
        }
        (Some(single), None) | (None, Some(single)) => {
            let neighbor = &items[single];
            let gap = (item.taken_at - neighbor.taken_at).num_seconds().abs();
            if gap <= opts.single_neighbor_max_secs {
                neighbor.location()
            } else {
                None
            }
        }
        (None, None) => None,
    }
}
