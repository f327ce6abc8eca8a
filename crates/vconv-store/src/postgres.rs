//! Postgres-backed task state.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info};
use vconv_models::{ErrorRecord, TaskId};

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::TaskStateStore;

const CREATE_PROCESSED_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS processed_videos (
        video_id     BIGINT PRIMARY KEY,
        processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_ERRORS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS process_errors (
        id         BIGSERIAL PRIMARY KEY,
        video_id   BIGINT NOT NULL,
        error      TEXT NOT NULL,
        details    TEXT NOT NULL,
        error_data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_ERRORS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_process_errors_video_id ON process_errors (video_id)";

/// sqlx implementation of [`TaskStateStore`].
#[derive(Debug, Clone)]
pub struct PgTaskStateStore {
    pool: PgPool,
}

impl PgTaskStateStore {
    /// Open a pool and check that the server answers.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = config.connect_options()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!(url = %config.redacted_url(), "failed to connect");
                StoreError::connection(e.to_string())
            })?;

        sqlx::query("SELECT 1").execute(&pool).await.map_err(|e| {
            error!(url = %config.redacted_url(), "failed to connect");
            StoreError::connection(e.to_string())
        })?;

        info!("connection to postgres succeeded");
        Ok(Self { pool })
    }

    /// Create the tables this store writes to, if missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in [CREATE_PROCESSED_TABLE, CREATE_ERRORS_TABLE, CREATE_ERRORS_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStateStore for PgTaskStateStore {
    async fn is_processed(&self, task_id: TaskId) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM processed_videos WHERE video_id = $1)",
        )
        .bind(task_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn mark_processed(&self, task_id: TaskId) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_videos (video_id, processed_at)
            VALUES ($1, $2)
            ON CONFLICT (video_id) DO NOTHING
            "#,
        )
        .bind(task_id.as_i64())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn register_error(&self, record: &ErrorRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO process_errors (video_id, error, details, error_data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.task_id.as_i64())
        .bind(&record.message)
        .bind(&record.details)
        .bind(record.to_json())
        .bind(record.occurred_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
