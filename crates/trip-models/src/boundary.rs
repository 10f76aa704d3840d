//! Persisted cluster boundaries: the incremental low-water mark.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The record persisted per (user, album) when a cluster materializes.
///
/// The maximum `end` across a user's records is the low-water mark below
/// which items are considered already processed; incremental runs only
/// consider items with a timestamp strictly greater than that mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBoundaryRecord {
    pub user_id: String,
    pub album_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ClusterBoundaryRecord {
    pub fn new(
        user_id: impl Into<String>,
        album_id: impl Into<String>,
        name: impl Into<String>,
        place: Option<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            album_id: album_id.into(),
            name: name.into(),
            place,
            start,
            end,
        }
    }
}
