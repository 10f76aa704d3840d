//! Persisted cluster boundaries.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use trip_models::ClusterBoundaryRecord;

use crate::error::StoreResult;

/// Persistence for the incremental low-water mark.
///
/// Modeled as an explicit externally-injected store; the core never keeps
/// boundary state in process globals.
#[async_trait]
pub trait BoundaryStore: Send + Sync {
    /// Insert or replace the record for `(user, album)`.
    async fn upsert(&self, record: ClusterBoundaryRecord) -> StoreResult<()>;

    /// Maximum `end` across a user's records, the incremental low-water mark.
    async fn max_end(&self, user_id: &str) -> StoreResult<Option<NaiveDateTime>>;

    /// Whether any record exists for the user.
    async fn has_any(&self, user_id: &str) -> StoreResult<bool>;

    /// Album ids of all tracked records, in insertion order.
    async fn album_ids(&self, user_id: &str) -> StoreResult<Vec<String>>;

    /// Remove every record for the user.
    async fn delete_all(&self, user_id: &str) -> StoreResult<()>;
}
