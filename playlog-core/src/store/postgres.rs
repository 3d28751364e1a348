use std::collections::HashMap;

use async_trait::async_trait;
use playlog_model::{JobId, JobRecord};
use sqlx::{PgPool, Row, types::Json};
use tracing::{instrument, warn};

use super::JobStore;
use crate::error::{EngineError, Result};

/// [`JobStore`] over the `playlog_jobs` table, one JSONB body per job.
#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        crate::MIGRATOR.run(&pool).await?;
        Ok(Self::new(pool))
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    #[instrument(skip_all, fields(job_id = %job.id, state = %job.state))]
    async fn save(&self, job: &JobRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO playlog_jobs (id, body, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO UPDATE
            SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(job.id.as_str())
        .bind(Json(job))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn load_many(&self, ids: &[JobId]) -> Result<Vec<JobRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> =
            ids.iter().map(|id| id.as_str().to_string()).collect();

        let rows = sqlx::query(
            "SELECT id, body FROM playlog_jobs WHERE id = ANY($1)",
        )
        .bind(&keys)
        .fetch_all(self.pool())
        .await?;

        let mut found = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(|e| {
                EngineError::Internal(format!("Failed to read job id: {e}"))
            })?;
            let body: serde_json::Value = row.try_get("body").map_err(|e| {
                EngineError::Internal(format!("Failed to read job body: {e}"))
            })?;
            match serde_json::from_value::<JobRecord>(body) {
                Ok(job) => {
                    found.insert(id, job);
                }
                Err(err) => {
                    warn!(job_id = %id, "Skipping unreadable job record: {err}")
                }
            }
        }

        Ok(keys.iter().filter_map(|key| found.remove(key)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_round_trip_and_skip_unreadable(pool: PgPool) {
        let store = PostgresJobStore::new(pool.clone());

        let job = JobRecord::new(JobId::generate());
        store.save(&job).await.unwrap();
        store.save(&job).await.unwrap();

        let broken = JobId::generate();
        sqlx::query(
            "INSERT INTO playlog_jobs (id, body, updated_at) \
             VALUES ($1, $2, NOW())",
        )
        .bind(broken.as_str())
        .bind(serde_json::json!({ "state": 42 }))
        .execute(&pool)
        .await
        .unwrap();

        let loaded = store
            .load_many(&[broken.clone(), JobId::generate(), job.id.clone()])
            .await
            .unwrap();
        assert_eq!(loaded, vec![job]);
        assert!(store.load(&broken).await.unwrap().is_none());
    }
}
