//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::guardian::{Guardian, NewGuardian};

const COLUMNS: &str = "id, student_id, name, gender, birth_place, birth_date, nationality, \
    last_education, occupation, monthly_income, address, phone, relationship";

/// Storage of guardians, one per student.
#[async_trait]
pub trait GuardianRepository: Send + Sync {
    /// Insert the guardian of a student, or replace the existing one.
    async fn upsert(&self, student_id: i64, guardian: &NewGuardian) -> Result<Guardian>;
    async fn find_by_student(&self, student_id: i64) -> Result<Option<Guardian>>;
}

#[derive(Clone)]
pub struct PgGuardianRepository {
    pool: PgPool,
}

impl PgGuardianRepository {
    /// Create a new [`PgGuardianRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuardianRepository for PgGuardianRepository {
    async fn upsert(&self, student_id: i64, guardian: &NewGuardian) -> Result<Guardian> {
        let query = format!(
            r#"INSERT INTO guardians (student_id, name, gender, birth_place, birth_date,
                nationality, last_education, occupation, monthly_income, address, phone,
                relationship)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (student_id) DO UPDATE SET name = EXCLUDED.name,
                gender = EXCLUDED.gender, birth_place = EXCLUDED.birth_place,
                birth_date = EXCLUDED.birth_date, nationality = EXCLUDED.nationality,
                last_education = EXCLUDED.last_education, occupation = EXCLUDED.occupation,
                monthly_income = EXCLUDED.monthly_income, address = EXCLUDED.address,
                phone = EXCLUDED.phone, relationship = EXCLUDED.relationship
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Guardian>(&query)
            .bind(student_id)
            .bind(&guardian.name)
            .bind(&guardian.gender)
            .bind(&guardian.birth_place)
            .bind(guardian.birth_date)
            .bind(&guardian.nationality)
            .bind(&guardian.last_education)
            .bind(&guardian.occupation)
            .bind(guardian.monthly_income)
            .bind(&guardian.address)
            .bind(&guardian.phone)
            .bind(&guardian.relationship)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<Guardian>> {
        let query = format!("SELECT {COLUMNS} FROM guardians WHERE student_id = $1");

        Ok(sqlx::query_as::<_, Guardian>(&query)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
