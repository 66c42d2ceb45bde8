//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::diploma::{DiplomaGrade, NewDiplomaGrade};
use crate::error::{Result, ServerError};

const COLUMNS: &str = "d.id, d.student_id, d.subject_id, s.code AS subject_code, \
    s.name AS subject_name, d.final_score, d.graduation_year, d.diploma_number, d.graduated_on";

#[async_trait]
pub trait DiplomaRepository: Send + Sync {
    /// Fails with `409` if the subject already has a diploma score.
    async fn insert(&self, student_id: i64, grade: &NewDiplomaGrade) -> Result<DiplomaGrade>;
    /// Diploma scores of a student ordered by subject code.
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<DiplomaGrade>>;
}

#[derive(Clone)]
pub struct PgDiplomaRepository {
    pool: PgPool,
}

impl PgDiplomaRepository {
    /// Create a new [`PgDiplomaRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiplomaRepository for PgDiplomaRepository {
    async fn insert(&self, student_id: i64, grade: &NewDiplomaGrade) -> Result<DiplomaGrade> {
        let query = format!(
            r#"WITH d AS (
                INSERT INTO diploma_grades (student_id, subject_id, final_score,
                    graduation_year, diploma_number, graduated_on)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {COLUMNS} FROM d JOIN subjects s ON s.id = d.subject_id"#
        );

        sqlx::query_as::<_, DiplomaGrade>(&query)
            .bind(student_id)
            .bind(grade.subject_id)
            .bind(grade.final_score)
            .bind(&grade.graduation_year)
            .bind(&grade.diploma_number)
            .bind(grade.graduated_on)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| ServerError::unique(err, "diploma grade already exists for this subject"))
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<DiplomaGrade>> {
        let query = format!(
            r#"SELECT {COLUMNS} FROM diploma_grades d JOIN subjects s ON s.id = d.subject_id
                WHERE d.student_id = $1 ORDER BY s.code, d.id"#
        );

        Ok(sqlx::query_as::<_, DiplomaGrade>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
