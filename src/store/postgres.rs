//! Postgres-backed document store.
//!
//! Documents are JSONB rows in a single `documents` table keyed by
//! `(collection, id)`; see `migrations/`. A [`WriteBatch`] runs inside one
//! SQL transaction.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{DocPath, Document, DocumentStore, StoreError, WriteBatch, WriteOp};

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    collection: String,
    id: String,
    data: Json<Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document { path: DocPath::new(row.collection, row.id), data: row.data.0 }
    }
}

const UPSERT: &str = "INSERT INTO documents (collection, id, data, updated_at) VALUES ($1, $2, $3, NOW()) \
                      ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()";
const DELETE: &str = "DELETE FROM documents WHERE collection = $1 AND id = $2";

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool { &self.pool }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let row: Option<(Json<Value>,)> = sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(&path.collection).bind(&path.id)
            .fetch_optional(&self.pool).await?;
        Ok(row.map(|(data,)| data.0))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>("SELECT collection, id, data FROM documents WHERE collection = $1 ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT collection, id, data FROM documents WHERE collection = $1 AND data -> $2 = $3 ORDER BY id",
        )
        .bind(collection).bind(field).bind(Json(value.clone()))
        .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set(&self, path: &DocPath, data: Value) -> Result<(), StoreError> {
        sqlx::query(UPSERT).bind(&path.collection).bind(&path.id).bind(Json(data)).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        sqlx::query(DELETE).bind(&path.collection).bind(&path.id).execute(&self.pool).await?;
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, data } => {
                    sqlx::query(UPSERT).bind(path.collection).bind(path.id).bind(Json(data)).execute(&mut *tx).await?;
                }
                WriteOp::Delete { path } => {
                    sqlx::query(DELETE).bind(path.collection).bind(path.id).execute(&mut *tx).await?;
                }
            }
        }
        // Dropping `tx` on an early return rolls the whole batch back.
        tx.commit().await?;
        Ok(())
    }
}
