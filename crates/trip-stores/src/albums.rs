//! Album lifecycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Payload for album creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlbum {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    pub item_ids: Vec<String>,
}

/// A stored album, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
}

/// The host's album storage.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    /// Create an album, returning its opaque id. A name collision fails with
    /// `StoreError::AlreadyExists`; callers log and skip, never retry.
    async fn create_album(&self, user_id: &str, album: NewAlbum) -> StoreResult<String>;

    async fn delete_album(&self, user_id: &str, album_id: &str) -> StoreResult<()>;

    async fn list_albums(&self, user_id: &str) -> StoreResult<Vec<AlbumSummary>>;

    /// Member item ids of an album, in stored order.
    async fn album_members(&self, user_id: &str, album_id: &str) -> StoreResult<Vec<String>>;
}
