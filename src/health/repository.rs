//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::health::{HealthRecord, Illness, NewHealthRecord, NewIllness};

const COLUMNS: &str = "id, student_id, entry_weight, entry_height, exit_weight, exit_height, \
    blood_type, physical_fitness";
const ILLNESS_COLUMNS: &str = "id, health_record_id, name, year, duration, notes";

/// Storage of health records and their illness history.
#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Insert the health record of a student, or replace the existing one.
    /// Illnesses are kept and not returned.
    async fn upsert(&self, student_id: i64, record: &NewHealthRecord) -> Result<HealthRecord>;
    /// Health record of a student with its illnesses.
    async fn find_by_student(&self, student_id: i64) -> Result<Option<HealthRecord>>;
    async fn exists(&self, id: i64) -> Result<bool>;
    /// Illnesses of a record, oldest first.
    async fn illnesses(&self, record_id: i64) -> Result<Vec<Illness>>;
    async fn insert_illness(&self, record_id: i64, illness: &NewIllness) -> Result<Illness>;
    /// Returns `false` if nothing was deleted.
    async fn delete_illness(&self, id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgHealthRepository {
    pool: PgPool,
}

impl PgHealthRepository {
    /// Create a new [`PgHealthRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthRepository for PgHealthRepository {
    async fn upsert(&self, student_id: i64, record: &NewHealthRecord) -> Result<HealthRecord> {
        let query = format!(
            r#"INSERT INTO health_records (student_id, entry_weight, entry_height, exit_weight,
                exit_height, blood_type, physical_fitness)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (student_id) DO UPDATE SET entry_weight = EXCLUDED.entry_weight,
                entry_height = EXCLUDED.entry_height, exit_weight = EXCLUDED.exit_weight,
                exit_height = EXCLUDED.exit_height, blood_type = EXCLUDED.blood_type,
                physical_fitness = EXCLUDED.physical_fitness
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, HealthRecord>(&query)
            .bind(student_id)
            .bind(record.entry_weight)
            .bind(record.entry_height)
            .bind(record.exit_weight)
            .bind(record.exit_height)
            .bind(&record.blood_type)
            .bind(&record.physical_fitness)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<HealthRecord>> {
        let query = format!("SELECT {COLUMNS} FROM health_records WHERE student_id = $1");

        let record = sqlx::query_as::<_, HealthRecord>(&query)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(mut record) => {
                record.illnesses = self.illnesses(record.id).await?;
                Ok(Some(record))
            },
            None => Ok(None),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM health_records WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn illnesses(&self, record_id: i64) -> Result<Vec<Illness>> {
        let query = format!(
            "SELECT {ILLNESS_COLUMNS} FROM illnesses WHERE health_record_id = $1 ORDER BY year NULLS LAST, id"
        );

        Ok(sqlx::query_as::<_, Illness>(&query)
            .bind(record_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_illness(&self, record_id: i64, illness: &NewIllness) -> Result<Illness> {
        let query = format!(
            r#"INSERT INTO illnesses (health_record_id, name, year, duration, notes)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ILLNESS_COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Illness>(&query)
            .bind(record_id)
            .bind(&illness.name)
            .bind(illness.year)
            .bind(&illness.duration)
            .bind(&illness.notes)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_illness(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM illnesses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
