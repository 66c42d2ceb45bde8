//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::education::{NewEducation, PreviousEducation};
use crate::error::Result;

const COLUMNS: &str = "id, student_id, kind, admitted_on, school_name, school_address, \
    diploma_number, diploma_date, skhun_number, skhun_date, admitted_class, transfer_reason";

#[async_trait]
pub trait EducationRepository: Send + Sync {
    async fn insert(&self, student_id: i64, education: &NewEducation) -> Result<PreviousEducation>;
    async fn find_by_id(&self, id: i64) -> Result<Option<PreviousEducation>>;
    /// Previous schools of a student, earliest admission first.
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PreviousEducation>>;
    async fn update(&self, education: &PreviousEducation) -> Result<PreviousEducation>;
    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgEducationRepository {
    pool: PgPool,
}

impl PgEducationRepository {
    /// Create a new [`PgEducationRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EducationRepository for PgEducationRepository {
    async fn insert(&self, student_id: i64, education: &NewEducation) -> Result<PreviousEducation> {
        let query = format!(
            r#"INSERT INTO previous_education (student_id, kind, admitted_on, school_name,
                school_address, diploma_number, diploma_date, skhun_number, skhun_date,
                admitted_class, transfer_reason)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, PreviousEducation>(&query)
            .bind(student_id)
            .bind(&education.kind)
            .bind(education.admitted_on)
            .bind(&education.school_name)
            .bind(&education.school_address)
            .bind(&education.diploma_number)
            .bind(education.diploma_date)
            .bind(&education.skhun_number)
            .bind(education.skhun_date)
            .bind(&education.admitted_class)
            .bind(&education.transfer_reason)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PreviousEducation>> {
        let query = format!("SELECT {COLUMNS} FROM previous_education WHERE id = $1");

        Ok(sqlx::query_as::<_, PreviousEducation>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<PreviousEducation>> {
        let query = format!(
            "SELECT {COLUMNS} FROM previous_education WHERE student_id = $1 ORDER BY admitted_on, id"
        );

        Ok(sqlx::query_as::<_, PreviousEducation>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, education: &PreviousEducation) -> Result<PreviousEducation> {
        let query = format!(
            r#"UPDATE previous_education SET kind = $2, admitted_on = $3, school_name = $4,
                school_address = $5, diploma_number = $6, diploma_date = $7, skhun_number = $8,
                skhun_date = $9, admitted_class = $10, transfer_reason = $11
                WHERE id = $1
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, PreviousEducation>(&query)
            .bind(education.id)
            .bind(&education.kind)
            .bind(education.admitted_on)
            .bind(&education.school_name)
            .bind(&education.school_address)
            .bind(&education.diploma_number)
            .bind(education.diploma_date)
            .bind(&education.skhun_number)
            .bind(education.skhun_date)
            .bind(&education.admitted_class)
            .bind(&education.transfer_reason)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM previous_education WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
