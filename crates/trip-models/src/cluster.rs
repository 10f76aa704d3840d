//! Journey clusters: contiguous runs of chronologically ordered items.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::item::MediaItem;

/// A non-empty, ordered group of items attributed to one trip.
///
/// Clusters are produced per run and consumed by the orchestrator; they are
/// never persisted as such. Only the `(start, end)` boundary and the resolved
/// name survive, via the album and boundary stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    items: Vec<MediaItem>,

    /// Resolved place name, set after reverse geocoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl Cluster {
    /// Build a cluster from an ordered item list. Returns `None` for an
    /// empty list; a cluster is non-empty by construction.
    pub fn new(items: Vec<MediaItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self { items, place: None })
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<MediaItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Clusters are non-empty by construction; kept for call-site symmetry.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Capture timestamp of the first item.
    pub fn start(&self) -> NaiveDateTime {
        self.items[0].taken_at
    }

    /// Capture timestamp of the last item.
    pub fn end(&self) -> NaiveDateTime {
        self.items[self.items.len() - 1].taken_at
    }

    /// Whether at least one item carries coordinates.
    pub fn has_geolocated_item(&self) -> bool {
        self.items.iter().any(|i| i.has_location())
    }

    /// Iterate over the geolocated items only.
    pub fn geolocated_items(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(|i| i.has_location())
    }

    /// Item ids in order.
    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }
}
