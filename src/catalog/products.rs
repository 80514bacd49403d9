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
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

impl Document for Product {
    type Input = ProductInput;
    const KIND: &'static str = "Product";

    fn store(state: &AppState) -> &Arc<dyn CatalogStore<Self>> {
        &state.products
    }
}

#[async_trait]
impl CatalogStore<Product> for PgStore {
    async fn insert(&self, input: ProductInput) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price_cents)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price_cents, created_at, updated_at
            "#,
        )
        .bind(input.name)
        .bind(input.description)
        .bind(input.price_cents)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn replace(&self, id: Uuid, input: ProductInput) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, price_cents, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.description)
        .bind(input.price_cents)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = $1
            RETURNING id, name, description, price_cents, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
impl crate::catalog::store::memory::InMemory for Product {
    fn build(id: Uuid, input: ProductInput, now: OffsetDateTime) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: ProductInput, now: OffsetDateTime) {
        self.name = input.name;
        self.description = input.description;
        self.price_cents = input.price_cents;
        self.updated_at = now;
    }

    fn id(&self) -> Uuid {
        self.id
    }
}
