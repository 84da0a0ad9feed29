//! Postgres-backed page store.
//!
//! Pages live in `scrapbook_pages` with the item list as JSONB; uploaded media
//! lives in `scrapbook_media`. Migrations are in `src/db/migrations`.

#[cfg(test)]
#[path = "postgres_test.rs"]
mod postgres_test;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use uuid::Uuid;

use super::{PageDocument, PageStore, StoreError, parse_items};
use crate::config::env_parse;
use crate::doc::Item;
use crate::payload::{MediaEntry, MediaKind, Subcollection};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and bring the schema up to date.
    ///
    /// The pool size is read from `DB_MAX_CONNECTIONS` (default 5).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection or migrations fail.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(env_parse("DB_MAX_CONNECTIONS", 5_u32))
            .connect(database_url)
            .await?;
        sqlx::migrate!("src/db/migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!(max_connections = pool.options().get_max_connections(), "page store connected");
        Ok(Self::new(pool))
    }
}

/// Build a media entry from a stored row. Rows with an unknown subcollection are skipped.
fn media_from_row((id, name, url, kind, subcollection): (String, String, String, String, String)) -> Option<MediaEntry> {
    let Some(subcollection) = Subcollection::from_name(&subcollection) else {
        warn!(media = %id, subcollection = %subcollection, "skipping media in unknown subcollection");
        return None;
    };
    Some(MediaEntry { id, name, url, kind: MediaKind::from_name(&kind), subcollection: Some(subcollection) })
}

#[async_trait::async_trait]
impl PageStore for PgStore {
    async fn list_pages(&self, scrapbook: &str) -> Result<Vec<PageDocument>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, serde_json::Value, i64, i64)>(
            "SELECT id, items,
                    (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT,
                    (EXTRACT(EPOCH FROM updated_at) * 1000)::BIGINT
             FROM scrapbook_pages
             WHERE scrapbook_id = $1
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(scrapbook)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, items, created_at, updated_at)| PageDocument {
                id,
                items: parse_items(id, items),
                created_at,
                updated_at,
            })
            .collect())
    }

    async fn create_page(&self, scrapbook: &str) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO scrapbook_pages (id, scrapbook_id, items) VALUES ($1, $2, '[]'::jsonb)")
            .bind(id)
            .bind(scrapbook)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn save_items(&self, scrapbook: &str, page: Uuid, items: &[Item]) -> Result<(), StoreError> {
        let items = serde_json::to_value(items)?;
        let result = sqlx::query(
            "UPDATE scrapbook_pages SET items = $1, updated_at = now() \
             WHERE id = $2 AND scrapbook_id = $3",
        )
        .bind(items)
        .bind(page)
        .bind(scrapbook)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PageNotFound(page));
        }
        Ok(())
    }

    async fn list_media(&self, scrapbook: &str) -> Result<Vec<MediaEntry>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT id, name, url, kind, subcollection
             FROM scrapbook_media
             WHERE scrapbook_id = $1
             ORDER BY created_at DESC",
        )
        .bind(scrapbook)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(media_from_row).collect())
    }
}
