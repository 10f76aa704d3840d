//! Media items: the immutable records the clustering pipeline consumes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single photo or video in a user's library.
///
/// Capture timestamps are resolved to a single time zone-naive instant by the
/// image index before items reach this crate. Latitude and longitude are
/// either both present or both absent; the builder enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Stable identifier from the image index
    pub id: String,

    /// Virtual storage path (resolved to a local path by file storage)
    pub path: String,

    /// Capture timestamp, time zone-naive
    pub taken_at: NaiveDateTime,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Pixel width, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Pixel height, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Whether face detection found at least one face
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_faces: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
}

impl MediaItem {
    /// Create an item with no location, dimensions, or face data.
    pub fn new(id: impl Into<String>, path: impl Into<String>, taken_at: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            taken_at,
            latitude: None,
            longitude: None,
            width: None,
            height: None,
            has_faces: None,
            camera_make: None,
            camera_model: None,
        }
    }

    /// Attach coordinates. Both components are set together, preserving the
    /// both-or-neither invariant.
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Attach pixel dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Attach the face-presence flag.
    pub fn with_faces(mut self, has_faces: bool) -> Self {
        self.has_faces = Some(has_faces);
        self
    }

    /// Attach camera make/model strings.
    pub fn with_camera(mut self, make: impl Into<String>, model: impl Into<String>) -> Self {
        self.camera_make = Some(make.into());
        self.camera_model = Some(model.into());
        self
    }

    /// Whether this item carries coordinates.
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Coordinates as a pair, when present.
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Portrait orientation (height strictly greater than width), or `None`
    /// when dimensions are unknown.
    pub fn is_portrait(&self) -> Option<bool> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(h > w),
            _ => None,
        }
    }

    /// Ordering key: capture timestamp, ties broken by id for determinism.
    pub fn sort_key(&self) -> (NaiveDateTime, &str) {
        (self.taken_at, self.id.as_str())
    }
}

/// Sort items chronologically, breaking timestamp ties by id.
pub fn sort_chronological(items: &mut [MediaItem]) {
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_location_invariant() {
        let item = MediaItem::new("a", "/p/a.jpg", ts(10, 0));
        assert!(!item.has_location());
        assert_eq!(item.location(), None);

        let item = item.with_location(52.0, 13.0);
        assert!(item.has_location());
        assert_eq!(item.location(), Some((52.0, 13.0)));
    }

    #[test]
    fn test_orientation() {
        let portrait = MediaItem::new("a", "/p/a.jpg", ts(10, 0)).with_dimensions(1080, 1920);
        let landscape = MediaItem::new("b", "/p/b.jpg", ts(10, 1)).with_dimensions(1920, 1080);
        let square = MediaItem::new("c", "/p/c.jpg", ts(10, 2)).with_dimensions(1000, 1000);
        let unknown = MediaItem::new("d", "/p/d.jpg", ts(10, 3));

        assert_eq!(portrait.is_portrait(), Some(true));
        assert_eq!(landscape.is_portrait(), Some(false));
        assert_eq!(square.is_portrait(), Some(false));
        assert_eq!(unknown.is_portrait(), None);
    }

    #[test]
    fn test_sort_ties_broken_by_id() {
        let mut items = vec![
            MediaItem::new("b", "/p/b.jpg", ts(10, 0)),
            MediaItem::new("a", "/p/a.jpg", ts(10, 0)),
            MediaItem::new("c", "/p/c.jpg", ts(9, 0)),
        ];
        sort_chronological(&mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
