use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::store::{CatalogStore, Document};
use crate::db::PgStore;
use crate::error::StoreError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Release {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub version: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub released_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInput {
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub version: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub released_at: Option<OffsetDateTime>,
}

impl Document for Release {
    type Input = ReleaseInput;
    const KIND: &'static str = "Release";

    fn store(state: &AppState) -> &Arc<dyn CatalogStore<Self>> {
        &state.releases
    }
}

#[async_trait]
impl CatalogStore<Release> for PgStore {
    async fn insert(&self, input: ReleaseInput) -> Result<Release, StoreError> {
        let row = sqlx::query_as::<_, Release>(
            r#"
            INSERT INTO releases (product_id, version, notes, released_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, version, notes, released_at, created_at, updated_at
            "#,
        )
        .bind(input.product_id)
        .bind(input.version)
        .bind(input.notes)
        .bind(input.released_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Release>, StoreError> {
        let rows = sqlx::query_as::<_, Release>(
            r#"
            SELECT id, product_id, version, notes, released_at, created_at, updated_at
            FROM releases
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Release>, StoreError> {
        let row = sqlx::query_as::<_, Release>(
            r#"
            SELECT id, product_id, version, notes, released_at, created_at, updated_at
            FROM releases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn replace(&self, id: Uuid, input: ReleaseInput) -> Result<Option<Release>, StoreError> {
        let row = sqlx::query_as::<_, Release>(
            r#"
            UPDATE releases
            SET product_id = $2, version = $3, notes = $4, released_at = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, product_id, version, notes, released_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.product_id)
        .bind(input.version)
        .bind(input.notes)
        .bind(input.released_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Release>, StoreError> {
        let row = sqlx::query_as::<_, Release>(
            r#"
            DELETE FROM releases
            WHERE id = $1
            RETURNING id, product_id, version, notes, released_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
impl crate::catalog::store::memory::InMemory for Release {
    fn build(id: Uuid, input: ReleaseInput, now: OffsetDateTime) -> Self {
        Self {
            id,
            product_id: input.product_id,
            version: input.version,
            notes: input.notes,
            released_at: input.released_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: ReleaseInput, now: OffsetDateTime) {
        self.product_id = input.product_id;
        self.version = input.version;
        self.notes = input.notes;
        self.released_at = input.released_at;
        self.updated_at = now;
    }

    fn id(&self) -> Uuid {
        self.id
    }
}
