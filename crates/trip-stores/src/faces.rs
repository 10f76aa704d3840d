//! Face-presence queries.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreResult;

/// The host's face detection results, queried per id set.
#[async_trait]
pub trait FacePresence: Send + Sync {
    /// Map of item id to whether at least one face was detected. Ids with
    /// no detection result may be absent from the map.
    async fn faces_present(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> StoreResult<HashMap<String, bool>>;
}
