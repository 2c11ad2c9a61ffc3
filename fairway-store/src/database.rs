use async_trait::async_trait;
use fairway_core::repository::{DocumentStore, Filter, OrderBy, SortDirection, StoreError};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    /// Create the documents table when it is missing. All collections
    /// share one table; a document is a JSONB blob keyed by
    /// (collection, doc_id).
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        info!("Ensuring document store schema");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id     TEXT NOT NULL,
                doc        JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, doc_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Production `DocumentStore` over Postgres JSONB.
pub struct PgDocumentStore {
    db: DbClient,
}

impl PgDocumentStore {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// Postgres resource exhaustion classes: disk_full, out_of_memory,
// configuration_limit_exceeded.
const EXHAUSTED_CODES: &[&str] = &["53100", "53200", "53400"];

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if EXHAUSTED_CODES.contains(&code.as_ref()) {
                return StoreError::ResourceExhausted(db_err.message().to_string());
            }
        }
    }
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let doc = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM documents WHERE collection = $1 AND doc_id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(doc)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        // Equality filters become one JSONB containment check.
        let mut containment = serde_json::Map::new();
        for Filter::Eq(field, value) in filters {
            containment.insert(field.clone(), value.clone());
        }

        let mut sql =
            String::from("SELECT doc FROM documents WHERE collection = $1 AND doc @> $2::jsonb");
        if let Some(order_by) = &order {
            let direction = match order_by.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY doc ->> $3 {}", direction));
        }

        let mut query = sqlx::query_scalar::<_, Value>(&sql)
            .bind(collection)
            .bind(Value::Object(containment));
        if let Some(order_by) = &order {
            query = query.bind(order_by.field.clone());
        }

        query.fetch_all(&self.db.pool).await.map_err(map_sqlx_err)
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, doc_id)
            DO UPDATE SET doc = EXCLUDED.doc, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET doc = doc || $3::jsonb, updated_at = NOW()
            WHERE collection = $1 AND doc_id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(patch)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.db.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO documents (collection, doc_id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(doc)
            .execute(&self.db.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(id)
    }
}
