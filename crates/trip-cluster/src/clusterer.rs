//! Time/distance threshold clustering, flat and home-aware.

use tracing::debug;

use trip_models::{Cluster, ClusterThresholds, HomeLocation, MediaItem, ThresholdPair};

use crate::geo::haversine_km;

/// Why the clusterer started a new cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitReason {
    /// Gap to the previous item exceeded the time threshold
    TimeGap,
    /// Distance to the last geolocated item in the cluster exceeded the
    /// distance threshold
    Distance,
}

/// Context for one boundary decision, offered to an optional observer.
#[derive(Debug, Clone)]
pub struct SplitEvent<'a> {
    /// Last item of the cluster being closed
    pub previous: &'a MediaItem,
    /// First item of the new cluster
    pub current: &'a MediaItem,
    /// Absolute gap between the two, in seconds
    pub time_gap_secs: i64,
    /// Distance to the cluster's last geolocated item, when both sides had
    /// coordinates
    pub distance_km: Option<f64>,
    pub reason: SplitReason,
    /// Thresholds in effect for this decision
    pub thresholds: ThresholdPair,
}

/// Optional side channel observing every split decision.
///
/// Called synchronously as boundaries are decided; not part of the result.
pub trait SplitObserver {
    fn on_split(&mut self, event: &SplitEvent<'_>);
}

/// Split a chronologically ordered item sequence into clusters.
///
/// A new cluster starts when the gap to the previous item exceeds
/// `time_gap_secs`, or when the current item has coordinates and lies more
/// than `max_distance_km` from the last *geolocated* item of the current
/// cluster. Anchoring the distance check against the last geolocated item
/// means a run of location-less items cannot silently bridge two far-apart
/// places.
///
/// Single forward pass; never fails on malformed input. Missing coordinates
/// never force a split.
pub fn cluster_items(
    items: &[MediaItem],
    thresholds: &ThresholdPair,
    mut observer: Option<&mut (dyn SplitObserver + '_)>,
) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut current: Vec<MediaItem> = Vec::new();
    // Last geolocated item in the current cluster
    let mut prev_geo: Option<(f64, f64)> = None;

    for item in items {
        if let Some(prev) = current.last() {
            let time_gap = (item.taken_at - prev.taken_at).num_seconds().abs();
            let distance = match (item.location(), prev_geo) {
                (Some((lat, lon)), Some((g_lat, g_lon))) => {
                    Some(haversine_km(g_lat, g_lon, lat, lon))
                }
                _ => None,
            };

            let reason = if time_gap > thresholds.time_gap_secs {
                Some(SplitReason::TimeGap)
            } else if distance.is_some_and(|d| d > thresholds.max_distance_km) {
                Some(SplitReason::Distance)
            } else {
                None
            };

            if let Some(reason) = reason {
                if let Some(obs) = observer.as_deref_mut() {
                    obs.on_split(&SplitEvent {
                        previous: prev,
                        current: item,
                        time_gap_secs: time_gap,
                        distance_km: distance,
                        reason,
                        thresholds: *thresholds,
                    });
                }
                debug!(
                    ?reason,
                    time_gap_secs = time_gap,
                    distance_km = distance,
                    "cluster boundary"
                );
                clusters.extend(Cluster::new(std::mem::take(&mut current)));
                prev_geo = None;
            }
        }

        if let Some(loc) = item.location() {
            prev_geo = Some(loc);
        }
        current.push(item.clone());
    }

    clusters.extend(Cluster::new(current));
    clusters
}

/// Near/away tag for home-aware segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HomeTag {
    Near,
    Away,
}

/// Cluster with different thresholds for items near a known home.
///
/// Without a home this is exactly flat clustering with the `away` pair.
/// Otherwise the timeline is partitioned into maximal runs of constant
/// near/away tag (location-less items inherit the previous tag, the first
/// item defaults to near) and each run is flat-clustered independently with
/// its tag's thresholds. Near-home clustering is therefore never blended
/// with away-from-home clustering.
pub fn cluster_items_home_aware(
    items: &[MediaItem],
    home: Option<&HomeLocation>,
    thresholds: &ClusterThresholds,
    mut observer: Option<&mut (dyn SplitObserver + '_)>,
) -> Vec<Cluster> {
    let Some(home) = home else {
        return cluster_items(items, &thresholds.away, observer);
    };

    let mut clusters = Vec::new();
    let mut run: Vec<MediaItem> = Vec::new();
    let mut run_tag = HomeTag::Near;
    let mut prev_tag = HomeTag::Near;

    for item in items {
        let tag = match item.location() {
            Some((lat, lon)) => {
                if haversine_km(home.latitude, home.longitude, lat, lon) <= home.radius_km {
                    HomeTag::Near
                } else {
                    HomeTag::Away
                }
            }
            None => prev_tag,
        };
        prev_tag = tag;

        if run.is_empty() {
            run_tag = tag;
        } else if tag != run_tag {
            let pair = segment_thresholds(run_tag, thresholds);
            clusters.extend(cluster_items(&run, &pair, observer.as_deref_mut()));
            run.clear();
            run_tag = tag;
        }
        run.push(item.clone());
    }

    if !run.is_empty() {
        let pair = segment_thresholds(run_tag, thresholds);
        clusters.extend(cluster_items(&run, &pair, observer.as_deref_mut()));
    }

    clusters
}

fn segment_thresholds(tag: HomeTag, thresholds: &ClusterThresholds) -> ThresholdPair {
    match tag {
        HomeTag::Near => thresholds.near,
        HomeTag::Away => thresholds.away,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 20)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn geo(id: &str, offset_min: i64, lat: f64, lon: f64) -> MediaItem {
        MediaItem::new(
            id,
            format!("/p/{id}.jpg"),
            base() + Duration::minutes(offset_min),
        )
        .with_location(lat, lon)
    }

    fn bare(id: &str, offset_min: i64) -> MediaItem {
        MediaItem::new(id, format!("/p/{id}.jpg"), base() + Duration::minutes(offset_min))
    }

    fn pair(time_gap_secs: i64, max_distance_km: f64) -> ThresholdPair {
        ThresholdPair::new(time_gap_secs, max_distance_km)
    }

    struct CountingObserver {
        events: Vec<(SplitReason, i64)>,
    }

    impl SplitObserver for CountingObserver {
        fn on_split(&mut self, event: &SplitEvent<'_>) {
            self.events.push((event.reason, event.time_gap_secs));
        }
    }

    #[test]
    fn test_time_and_distance_splits() {
        // Three shots within 2 km, then +26h at a point 150 km away, then
        // +10min nearby: exactly 2 clusters of sizes 3 and 2.
        let items = vec![
            geo("a", 0, 52.00, 13.00),
            geo("b", 10, 52.005, 13.00),
            geo("c", 20, 52.01, 13.00),
            geo("d", 20 + 26 * 60, 53.3, 13.9),
            geo("e", 30 + 26 * 60, 53.305, 13.9),
        ];
        let clusters = cluster_items(&items, &pair(3600, 2.0), None);
        let sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![3, 2]);
    }

    #[test]
    fn test_concatenation_reconstructs_input() {
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            bare("b", 5),
            geo("c", 500, 55.0, 12.0),
            bare("d", 505),
            geo("e", 2000, 40.0, 9.0),
        ];
        let clusters = cluster_items(&items, &pair(3600, 5.0), None);
        let rebuilt: Vec<MediaItem> = clusters
            .into_iter()
            .flat_map(Cluster::into_items)
            .collect();
        assert_eq!(rebuilt, items);
    }

    #[test]
    fn test_distance_anchored_at_last_geolocated() {
        // Location-less items in between must not bridge two far-apart
        // places: d is 300+ km from a, the last geolocated item.
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            bare("b", 10),
            bare("c", 20),
            geo("d", 30, 55.0, 15.0),
        ];
        let clusters = cluster_items(&items, &pair(3600, 2.0), None);
        let sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[test]
    fn test_missing_coordinates_never_split() {
        let items = vec![bare("a", 0), bare("b", 10), bare("c", 20)];
        let clusters = cluster_items(&items, &pair(3600, 0.1), None);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_prev_geo_resets_on_split() {
        // After the time split at c, the distance anchor restarts from c, so
        // d (close to c) stays in the second cluster even though it is far
        // from a.
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            geo("b", 10, 52.001, 13.0),
            geo("c", 10 + 48 * 60, 55.0, 15.0),
            geo("d", 20 + 48 * 60, 55.001, 15.0),
        ];
        let clusters = cluster_items(&items, &pair(3600, 2.0), None);
        let sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn test_observer_sees_every_split() {
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            geo("b", 200, 52.0, 13.0),
            geo("c", 210, 56.0, 13.0),
        ];
        let mut observer = CountingObserver { events: Vec::new() };
        let clusters = cluster_items(&items, &pair(3600, 2.0), Some(&mut observer));
        assert_eq!(clusters.len(), 3);
        assert_eq!(observer.events.len(), 2);
        assert_eq!(observer.events[0].0, SplitReason::TimeGap);
        assert_eq!(observer.events[1].0, SplitReason::Distance);
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_items(&[], &pair(3600, 2.0), None).is_empty());
    }

    fn thresholds() -> ClusterThresholds {
        ClusterThresholds {
            near: pair(1800, 2.0),
            away: pair(24 * 3600, 100.0),
        }
    }

    #[test]
    fn test_home_aware_without_home_matches_flat_away() {
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            geo("b", 90, 52.0, 13.0),
            geo("c", 60 * 30, 40.0, 9.0),
        ];
        let t = thresholds();
        let home_aware = cluster_items_home_aware(&items, None, &t, None);
        let flat = cluster_items(&items, &t.away, None);
        let a: Vec<Vec<String>> = home_aware.iter().map(Cluster::item_ids).collect();
        let b: Vec<Vec<String>> = flat.iter().map(Cluster::item_ids).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_home_aware_uses_tighter_thresholds_near_home() {
        let home = HomeLocation::new(52.0, 13.0, 10.0);
        // Two near-home shots 40 minutes apart split under the 30 minute
        // near threshold, but a distant pair with the same gap stays joined
        // under the away threshold.
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            geo("b", 40, 52.0, 13.0),
            geo("c", 80, 40.0, 9.0),
            geo("d", 120, 40.0, 9.0),
        ];
        let clusters = cluster_items_home_aware(&items, Some(&home), &thresholds(), None);
        let sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![1, 1, 2]);
    }

    #[test]
    fn test_home_tag_inherited_by_locationless_items() {
        let home = HomeLocation::new(52.0, 13.0, 10.0);
        // b has no coordinates and inherits a's near tag; the run split
        // happens only at c, which is away.
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            bare("b", 10),
            geo("c", 20, 40.0, 9.0),
        ];
        let clusters = cluster_items_home_aware(&items, Some(&home), &thresholds(), None);
        let rebuilt: Vec<String> = clusters
            .iter()
            .flat_map(|c| c.item_ids())
            .collect();
        assert_eq!(rebuilt, vec!["a", "b", "c"]);
        assert_eq!(clusters[0].item_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_home_aware_preserves_order_across_segments() {
        let home = HomeLocation::new(52.0, 13.0, 10.0);
        let items = vec![
            geo("a", 0, 52.0, 13.0),
            geo("b", 10, 40.0, 9.0),
            geo("c", 20, 52.0, 13.0),
            geo("d", 30, 40.0, 9.0),
        ];
        let clusters = cluster_items_home_aware(&items, Some(&home), &thresholds(), None);
        let rebuilt: Vec<String> = clusters.iter().flat_map(|c| c.item_ids()).collect();
        assert_eq!(rebuilt, vec!["a", "b", "c", "d"]);
    }
}
