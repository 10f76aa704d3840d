//! Incremental boundary filtering.
//!
//! The boundary itself is persisted externally (see the boundary store in
//! `trip-stores`); this module holds the pure filtering logic the
//! orchestrator applies before clustering.

use chrono::NaiveDateTime;

use trip_models::MediaItem;

/// Keep only items with a timestamp strictly greater than the boundary.
///
/// `None` means no boundary is known and every item passes.
pub fn filter_after_boundary(
    items: Vec<MediaItem>,
    boundary: Option<NaiveDateTime>,
) -> Vec<MediaItem> {
    match boundary {
        Some(mark) => items.into_iter().filter(|i| i.taken_at > mark).collect(),
        None => items,
    }
}

/// Latest capture timestamp among items, used to derive a boundary from
/// previously tracked albums when no boundary record carries one.
pub fn latest_timestamp(items: &[MediaItem]) -> Option<NaiveDateTime> {
    items.iter().map(|i| i.taken_at).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn item(id: &str, offset_min: i64) -> MediaItem {
        let t = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(offset_min);
        MediaItem::new(id, format!("/p/{id}.jpg"), t)
    }

    #[test]
    fn test_strictly_greater() {
        let items = vec![item("a", 0), item("b", 60), item("c", 120)];
        let boundary = items[1].taken_at;

        let kept = filter_after_boundary(items, Some(boundary));
        // b sits exactly on the boundary and is excluded
        let ids: Vec<&str> = kept.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn test_no_boundary_keeps_all() {
        let items = vec![item("a", 0), item("b", 60)];
        assert_eq!(filter_after_boundary(items.clone(), None), items);
    }

    #[test]
    fn test_latest_timestamp() {
        let items = vec![item("a", 0), item("c", 120), item("b", 60)];
        assert_eq!(latest_timestamp(&items), Some(item("c", 120).taken_at));
        assert_eq!(latest_timestamp(&[]), None);
    }
}
