//! Per-user settings.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreResult;

/// Per-user scalar and JSON-blob settings.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_value(&self, user_id: &str, key: &str) -> StoreResult<Option<serde_json::Value>>;

    async fn set_value(
        &self,
        user_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> StoreResult<()>;
}

/// Typed accessors over the raw value contract.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn ConfigStore,
    user_id: &str,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get_value(user_id, key).await? {
        Some(value) => Ok(serde_json::from_value(value).ok()),
        None => Ok(None),
    }
}

pub async fn set_typed<T: Serialize>(
    store: &dyn ConfigStore,
    user_id: &str,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    store
        .set_value(user_id, key, serde_json::to_value(value)?)
        .await
}
