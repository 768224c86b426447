//! SQLite-backed object store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::store::ObjectStore;

/// Object store handle bound to one namespace of the `objects` table.
#[derive(Clone)]
pub struct SqliteObjectStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteObjectStore {
    /// Open a handle on `namespace`. The pool must have been initialised with
    /// [`super::init_database`].
    pub fn open(pool: SqlitePool, namespace: &str) -> Self {
        Self {
            pool,
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Close the underlying pool. Other handles sharing the pool are closed too.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ObjectStore for SqliteObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let row = sqlx::query("SELECT value FROM objects WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<Vec<u8>, _>("value")))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO objects (namespace, key, value, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM objects WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM objects WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT key FROM objects WHERE namespace = ? ORDER BY key")
            .bind(&self.namespace)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("key"))
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
