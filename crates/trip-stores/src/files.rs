//! Virtual path resolution and output placement.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StoreResult;

/// The host's file storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Resolve a user's virtual path to a local, readable path.
    async fn resolve_local(&self, user_id: &str, virtual_path: &str) -> StoreResult<PathBuf>;

    /// Ensure an output folder exists in the user's managed storage and
    /// return its local path.
    async fn prepare_output_folder(&self, user_id: &str, folder: &str) -> StoreResult<PathBuf>;
}
