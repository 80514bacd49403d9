use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::state::AppState;

/// A catalog resource exposed through the generic CRUD routes.
pub trait Document: Serialize + Clone + Send + Sync + 'static {
    /// Client-supplied fields for create and full replace.
    type Input: DeserializeOwned + Send + 'static;

    /// Human name used in messages and logs.
    const KIND: &'static str;

    fn store(state: &AppState) -> &Arc<dyn CatalogStore<Self>>;
}

#[async_trait]
pub trait CatalogStore<T: Document>: Send + Sync {
    async fn insert(&self, input: T::Input) -> Result<T, StoreError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<T>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;
    /// Replaces every client-supplied field; `None` if `id` is unknown.
    async fn replace(&self, id: Uuid, input: T::Input) -> Result<Option<T>, StoreError>;
    /// Returns the removed document; `None` if `id` is unknown.
    async fn delete(&self, id: Uuid) -> Result<Option<T>, StoreError>;
}
