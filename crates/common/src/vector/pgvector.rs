//! pgvector-backed vector store
//!
//! Vector similarity uses the `<=>` cosine distance operator; the lexical
//! leg uses `ts_rank_cd` over a tsvector column maintained at insert time.
//! SeaORM cannot express either, so all operations go through raw
//! statements.

use super::{
    BatchFailure, BatchUpsert, HybridOptions, QueryOptions, VectorHit, VectorProperties,
    VectorStore, DEFAULT_QUERY_LIMIT,
};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement, TryGetable, Value};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Shared columns returned by every query
const HIT_COLUMNS: &str = "id, content, summary, resource_id, chunk_id, chunk_order, title";

pub struct PgVectorStore {
    pool: DbPool,
}

impl PgVectorStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the extension and backing tables if they do not exist yet.
    /// Called once at boot.
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = [
            "CREATE EXTENSION IF NOT EXISTS vector",
            r#"
            CREATE TABLE IF NOT EXISTS vector_classes (
                class_name TEXT PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS vector_objects (
                id UUID PRIMARY KEY,
                class_name TEXT NOT NULL REFERENCES vector_classes (class_name) ON DELETE CASCADE,
                content TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                resource_id BIGINT NOT NULL,
                chunk_id BIGINT NOT NULL,
                chunk_order INT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                embedding vector NOT NULL,
                ts tsvector NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS vector_objects_class_idx ON vector_objects (class_name)",
            "CREATE INDEX IF NOT EXISTS vector_objects_ts_idx ON vector_objects USING GIN (ts)",
        ];

        for statement in ddl {
            self.pool
                .write()
                .execute_unprepared(statement)
                .await
                .map_err(|e| AppError::VectorStore {
                    message: format!("failed to prepare vector schema: {}", e),
                })?;
        }

        Ok(())
    }

    async fn class_exists(&self, class: &str) -> Result<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT 1 FROM vector_classes WHERE class_name = $1",
            vec![class.into()],
        );

        Ok(self.pool.read().query_one(stmt).await?.is_some())
    }

    async fn require_class(&self, class: &str) -> Result<()> {
        if self.class_exists(class).await? {
            Ok(())
        } else {
            Err(AppError::not_found("vector class", class))
        }
    }

    fn parse_hit(row: &sea_orm::QueryResult, score: f64, certainty: f64) -> Result<VectorHit> {
        Ok(VectorHit {
            id: get(row, 0)?,
            score,
            certainty,
            properties: VectorProperties {
                content: get(row, 1)?,
                summary: get(row, 2)?,
                resource_id: get(row, 3)?,
                chunk_id: get(row, 4)?,
                order: get(row, 5)?,
                title: get(row, 6)?,
            },
        })
    }
}

fn get<T: TryGetable>(row: &sea_orm::QueryResult, index: usize) -> Result<T> {
    row.try_get_by_index(index)
        .map_err(|e| AppError::Database(DbErr::from(e)))
}

/// Serialize an embedding to the pgvector text format "[1.0,2.0,...]"
fn embedding_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 8 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Fuse dense and lexical hits with reciprocal ranks weighted by alpha.
/// Ranks start at 1; a hit absent from one leg contributes zero there.
fn fuse_hybrid(dense: Vec<VectorHit>, lexical: Vec<VectorHit>, alpha: f64) -> Vec<VectorHit> {
    let mut fused: HashMap<Uuid, (VectorHit, f64)> = HashMap::new();

    for (rank, hit) in dense.into_iter().enumerate() {
        let score = alpha / (rank + 1) as f64;
        fused.insert(hit.id, (hit, score));
    }

    for (rank, hit) in lexical.into_iter().enumerate() {
        let score = (1.0 - alpha) / (rank + 1) as f64;
        fused
            .entry(hit.id)
            .and_modify(|(_, s)| *s += score)
            .or_insert((hit, score));
    }

    let mut results: Vec<VectorHit> = fused
        .into_values()
        .map(|(mut hit, score)| {
            hit.score = score;
            hit
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    results
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn ensure_class(&self, class: &str) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO vector_classes (class_name) VALUES ($1) ON CONFLICT DO NOTHING",
            vec![class.into()],
        );

        self.pool.write().execute(stmt).await?;
        debug!(class, "Vector class ensured");
        Ok(())
    }

    async fn delete_class(&self, class: &str) -> Result<()> {
        // Objects go with the class via the FK cascade.
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM vector_classes WHERE class_name = $1",
            vec![class.into()],
        );

        self.pool.write().execute(stmt).await?;
        debug!(class, "Vector class deleted");
        Ok(())
    }

    async fn upsert_one(
        &self,
        class: &str,
        vector: &[f32],
        properties: &VectorProperties,
    ) -> Result<Uuid> {
        self.require_class(class).await?;

        let id = Uuid::new_v4();
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO vector_objects (
                id, class_name, content, summary, resource_id, chunk_id,
                chunk_order, title, embedding, ts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::vector, to_tsvector('english', $3))
            "#,
            vec![
                id.into(),
                class.into(),
                properties.content.clone().into(),
                properties.summary.clone().into(),
                properties.resource_id.into(),
                properties.chunk_id.into(),
                properties.order.into(),
                properties.title.clone().into(),
                embedding_literal(vector).into(),
            ],
        );

        self.pool.write().execute(stmt).await?;
        Ok(id)
    }

    async fn upsert_batch(
        &self,
        class: &str,
        objects: &[(Vec<f32>, VectorProperties)],
    ) -> Result<BatchUpsert> {
        self.require_class(class).await?;

        let mut outcome = BatchUpsert::default();
        for (index, (vector, properties)) in objects.iter().enumerate() {
            match self.upsert_one(class, vector, properties).await {
                Ok(id) => outcome.ids.push(id),
                Err(e) => outcome.failures.push(BatchFailure {
                    index,
                    message: e.to_string(),
                }),
            }
        }

        Ok(outcome)
    }

    async fn query_dense(
        &self,
        class: &str,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<VectorHit>> {
        self.require_class(class).await?;

        let limit = options.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        // A certainty floor is the same bound expressed as a distance cap.
        let max_distance = match (options.distance, options.certainty) {
            (Some(d), _) => Some(d),
            (None, Some(c)) => Some((1.0 - c) * 2.0),
            (None, None) => None,
        };

        let distance_filter = max_distance
            .map(|_| "AND embedding <=> $2::vector <= $4")
            .unwrap_or("");

        let sql = format!(
            r#"
            SELECT {HIT_COLUMNS}, embedding <=> $2::vector AS distance
            FROM vector_objects
            WHERE class_name = $1
            {distance_filter}
            ORDER BY embedding <=> $2::vector
            LIMIT $3
            "#,
        );

        let mut values: Vec<Value> = vec![
            class.into(),
            embedding_literal(vector).into(),
            (limit as i64).into(),
        ];
        if let Some(d) = max_distance {
            values.push(d.into());
        }

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);
        let rows = self.pool.read().query_all(stmt).await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let distance: f64 = get(row, 7)?;
            hits.push(Self::parse_hit(row, distance, 1.0 - distance / 2.0)?);
        }

        Ok(hits)
    }

    async fn query_lexical(
        &self,
        class: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>> {
        self.require_class(class).await?;

        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {HIT_COLUMNS}, ts_rank_cd(ts, plainto_tsquery('english', $2)) AS score
            FROM vector_objects
            WHERE class_name = $1
              AND ts @@ plainto_tsquery('english', $2)
            ORDER BY score DESC
            LIMIT $3
            "#,
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![class.into(), query.into(), (limit as i64).into()],
        );
        let rows = self.pool.read().query_all(stmt).await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let score: f32 = get(row, 7)?;
            hits.push(Self::parse_hit(row, score as f64, 0.0)?);
        }

        Ok(hits)
    }

    async fn query_hybrid(
        &self,
        class: &str,
        vector: &[f32],
        options: &HybridOptions,
    ) -> Result<Vec<VectorHit>> {
        let limit = options.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let dense = self
            .query_dense(
                class,
                vector,
                &QueryOptions {
                    limit: Some(limit),
                    ..Default::default()
                },
            )
            .await?;
        let lexical = self.query_lexical(class, &options.query_text, limit).await?;

        let mut fused = fuse_hybrid(dense, lexical, options.alpha.clamp(0.0, 1.0));
        fused.truncate(limit);
        Ok(fused)
    }

    async fn delete_by_id(&self, class: &str, id: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM vector_objects WHERE class_name = $1 AND id = $2",
            vec![class.into(), id.into()],
        );

        self.pool.write().execute(stmt).await?;
        Ok(())
    }

    async fn delete_by_resource(&self, class: &str, resource_id: i64) -> Result<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM vector_objects WHERE class_name = $1 AND resource_id = $2",
            vec![class.into(), resource_id.into()],
        );

        let result = self.pool.write().execute(stmt).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self, class: &str) -> Result<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT COUNT(*) FROM vector_objects WHERE class_name = $1",
            vec![class.into()],
        );

        let row = self.pool.read().query_one(stmt).await?;
        let count: i64 = match row {
            Some(row) => get(&row, 0)?,
            None => 0,
        };

        Ok(count as u64)
    }

    async fn total_content_bytes(&self, class: &str) -> Result<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT COALESCE(SUM(OCTET_LENGTH(content)), 0)::BIGINT FROM vector_objects WHERE class_name = $1",
            vec![class.into()],
        );

        let row = self.pool.read().query_one(stmt).await?;
        let bytes: i64 = match row {
            Some(row) => get(&row, 0)?,
            None => 0,
        };

        Ok(bytes as u64)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: u128) -> VectorHit {
        VectorHit {
            id: Uuid::from_u128(id),
            score: 0.0,
            certainty: 0.0,
            properties: VectorProperties {
                content: "content".into(),
                summary: "summary".into(),
                resource_id: 1,
                chunk_id: id as i64,
                order: 0,
                title: "title".into(),
            },
        }
    }

    #[test]
    fn test_embedding_literal() {
        assert_eq!(embedding_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(embedding_literal(&[]), "[]");
    }

    #[test]
    fn test_fuse_hybrid_weights() {
        // alpha 0.75: dense rank 1 scores 0.75, lexical rank 1 scores 0.25.
        let fused = fuse_hybrid(vec![hit(1), hit(2)], vec![hit(2), hit(3)], 0.75);

        assert_eq!(fused[0].id, Uuid::from_u128(1)); // 0.75
        assert_eq!(fused[1].id, Uuid::from_u128(2)); // 0.375 + 0.25 = 0.625
        assert_eq!(fused[2].id, Uuid::from_u128(3)); // 0.125
        assert!((fused[1].score - 0.625).abs() < 1e-9);
    }

    #[test]
    fn test_fuse_hybrid_pure_vector() {
        // alpha 1.0 ignores the lexical leg entirely.
        let fused = fuse_hybrid(vec![hit(1)], vec![hit(2)], 1.0);
        assert_eq!(fused[0].id, Uuid::from_u128(1));
        assert_eq!(fused[1].score, 0.0);
    }
}
