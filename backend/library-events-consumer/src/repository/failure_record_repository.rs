use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::FailureRecordRepository;
use crate::models::{FailureRecord, FailureStatus, InboundRecord};

const FAILURE_RECORD_COLUMNS: &str = "id, topic, partition, offset_value, key_value, \
     error_record, exception, status, created_at, updated_at";

/// PostgreSQL repository for failure records
#[derive(Clone)]
pub struct PgFailureRecordRepository {
    pool: PgPool,
}

impl PgFailureRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_failure_record(row: &PgRow) -> Result<FailureRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(FailureRecord {
        id: row.try_get("id")?,
        topic: row.try_get("topic")?,
        partition: row.try_get("partition")?,
        offset_value: row.try_get("offset_value")?,
        key_value: row.try_get("key_value")?,
        error_record: row.try_get("error_record")?,
        exception: row.try_get("exception")?,
        status: status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl FailureRecordRepository for PgFailureRecordRepository {
    async fn save(
        &self,
        record: &InboundRecord,
        error: &str,
        status: FailureStatus,
    ) -> Result<FailureRecord, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO failure_records
                (topic, partition, offset_value, key_value, error_record, exception, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            FAILURE_RECORD_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&record.topic)
            .bind(record.partition)
            .bind(record.offset)
            .bind(record.key)
            .bind(&record.payload)
            .bind(error)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        row_to_failure_record(&row)
    }

    async fn find_by_status(
        &self,
        status: FailureStatus,
    ) -> Result<Vec<FailureRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM failure_records WHERE status = $1 ORDER BY id",
            FAILURE_RECORD_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_failure_record).collect()
    }

    async fn update_status(
        &self,
        id: i32,
        from: FailureStatus,
        to: FailureStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE failure_records
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
