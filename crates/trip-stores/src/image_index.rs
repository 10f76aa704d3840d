//! Media item queries.

use async_trait::async_trait;

use trip_models::MediaItem;

use crate::error::StoreResult;

/// The host's media index.
///
/// Implementations must return stable ids and resolved capture timestamps;
/// ordering is not required, the core sorts.
#[async_trait]
pub trait ImageIndex: Send + Sync {
    /// All items for a user, optionally including secondary mounted storage.
    async fn items_for_user(
        &self,
        user_id: &str,
        include_secondary: bool,
    ) -> StoreResult<Vec<MediaItem>>;

    /// Items by explicit id set. Unknown ids are silently absent.
    async fn items_by_ids(&self, user_id: &str, ids: &[String]) -> StoreResult<Vec<MediaItem>>;
}
