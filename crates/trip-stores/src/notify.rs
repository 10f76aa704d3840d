//! End-of-run notifications.

use async_trait::async_trait;

use crate::error::StoreResult;

/// The host's notification service.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post one aggregated "N journeys created" notification for a run,
    /// with a deep link to the album overview.
    async fn journeys_created(
        &self,
        user_id: &str,
        count: usize,
        deep_link: &str,
    ) -> StoreResult<()>;
}
