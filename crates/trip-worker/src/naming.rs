//! Cluster naming: place resolution and display names.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDateTime};
use tracing::debug;

use trip_models::Cluster;
use trip_stores::{PlaceResolver, ResolvedPlace};

/// Resolve a display place for a cluster by majority vote over its
/// geolocated items.
///
/// The resolver may fail closed per item; failed items still count toward
/// the vote denominator.
pub async fn resolve_cluster_place(
    resolver: &dyn PlaceResolver,
    cluster: &Cluster,
) -> Option<String> {
    let mut per_item: Vec<Vec<ResolvedPlace>> = Vec::new();
    for item in cluster.geolocated_items() {
        let (lat, lon) = item.location()?;
        let places = resolver.resolve(lat, lon).await.unwrap_or_default();
        per_item.push(places);
    }
    majority_place(&per_item)
}

/// The two-step majority vote.
///
/// Step one picks the broadest administrative level among areas shared by at
/// least half the items. Step two, when nothing reaches half, falls back to
/// the broadest level present at all and its most common name. The two
/// steps can disagree with a straight majority in edge cases with many
/// small place clusters; both are kept deliberately.
pub fn majority_place(per_item: &[Vec<ResolvedPlace>]) -> Option<String> {
    let total = per_item.len();
    if total == 0 {
        return None;
    }

    // Count each (level, name) once per item
    let mut counts: HashMap<(u8, &str), usize> = HashMap::new();
    for places in per_item {
        let unique: HashSet<(u8, &str)> = places
            .iter()
            .map(|p| (p.admin_level, p.name.as_str()))
            .collect();
        for key in unique {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    // Step one: broadest level among areas shared by at least half
    let shared = counts
        .iter()
        .filter(|(_, &count)| count * 2 >= total)
        .min_by(|((level_a, name_a), count_a), ((level_b, name_b), count_b)| {
            level_a
                .cmp(level_b)
                .then(count_b.cmp(count_a))
                .then(name_a.cmp(name_b))
        });
    if let Some(((_, name), _)) = shared {
        return Some(name.to_string());
    }

    // Step two: broadest level available, most common name at that level
    let broadest_level = counts.keys().map(|(level, _)| *level).min()?;
    counts
        .iter()
        .filter(|((level, _), _)| *level == broadest_level)
        .min_by(|((_, name_a), count_a), ((_, name_b), count_b)| {
            count_b.cmp(count_a).then(name_a.cmp(name_b))
        })
        .map(|((_, name), _)| {
            debug!(level = broadest_level, name, "place vote fell back to broadest available");
            name.to_string()
        })
}

/// Display name for an accepted cluster.
///
/// `"<place> <Month Year> (<day range>)"` when a place resolved, else
/// `"Journey <n> <Month Year> (<day range>)"` with the run-local ordinal.
pub fn format_cluster_name(
    place: Option<&str>,
    ordinal: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> String {
    let month_year = start.format("%B %Y");
    let range = day_range(start, end);
    match place {
        Some(place) => format!("{place} {month_year} ({range})"),
        None => format!("Journey {ordinal} {month_year} ({range})"),
    }
}

/// Day range within the journey: `"12"` for a single day, `"12-15"`
/// otherwise (calendar-month crossings keep the plain day numbers).
pub fn day_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    if start.date() == end.date() {
        format!("{}", start.day())
    } else {
        format!("{}-{}", start.day(), end.day())
    }
}
