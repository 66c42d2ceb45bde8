//! Handle database requests.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::error::{Result, ServerError};
use crate::grade::{GradeFilter, NewGrade, SemesterGrade, Subject};
use crate::model::PageRequest;

const SUBJECT_COLUMNS: &str = "id, code, name, subject_group, subgroup, active";
const GRADE_COLUMNS: &str = "g.id, g.student_id, g.subject_id, s.code AS subject_code, \
    s.name AS subject_name, g.class, g.semester, g.academic_year, g.knowledge_score, \
    g.knowledge_grade, g.knowledge_description, g.skill_score, g.skill_grade, g.skill_description";
// Classes are stored as text, order them by level.
const GRADE_ORDER: &str = " ORDER BY CASE g.class WHEN 'X' THEN 1 WHEN 'XI' THEN 2 ELSE 3 END, \
    g.semester, s.code, g.id";

const DUPLICATE: &str = "grade already exists for this subject and semester";
const INSERT: &str = r#"INSERT INTO semester_grades (student_id, subject_id, class, semester,
    academic_year, knowledge_score, knowledge_grade, knowledge_description, skill_score,
    skill_grade, skill_description)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    RETURNING id"#;

/// Storage of subjects and semester grades.
#[async_trait]
pub trait GradeRepository: Send + Sync {
    /// Active subjects ordered by code.
    async fn subjects(&self) -> Result<Vec<Subject>>;
    async fn find_subject(&self, id: i64) -> Result<Option<Subject>>;
    async fn insert(&self, student_id: i64, grade: &NewGrade) -> Result<SemesterGrade>;
    /// Insert every grade or none of them.
    async fn insert_batch(&self, student_id: i64, grades: &[NewGrade]) -> Result<()>;
    /// Grades of a student with the total number of matching rows.
    /// `page` set to `None` returns every grade.
    async fn find_by_student(
        &self,
        student_id: i64,
        filter: &GradeFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<SemesterGrade>, i64)>;
}

#[derive(Clone)]
pub struct PgGradeRepository {
    pool: PgPool,
}

impl PgGradeRepository {
    /// Create a new [`PgGradeRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    student_id: i64,
    filter: &GradeFilter,
) {
    builder
        .push(" FROM semester_grades g JOIN subjects s ON s.id = g.subject_id WHERE g.student_id = ")
        .push_bind(student_id);

    if let Some(class) = filter.class.clone() {
        builder.push(" AND g.class = ").push_bind(class);
    }
    if let Some(semester) = filter.semester {
        builder.push(" AND g.semester = ").push_bind(semester);
    }
    if let Some(year) = filter.academic_year.clone() {
        builder.push(" AND g.academic_year = ").push_bind(year);
    }
}

async fn insert_one<'e, E>(executor: E, student_id: i64, grade: &NewGrade) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(INSERT)
        .bind(student_id)
        .bind(grade.subject_id)
        .bind(&grade.class)
        .bind(grade.semester)
        .bind(&grade.academic_year)
        .bind(grade.knowledge_score)
        .bind(&grade.knowledge_grade)
        .bind(&grade.knowledge_description)
        .bind(grade.skill_score)
        .bind(&grade.skill_grade)
        .bind(&grade.skill_description)
        .fetch_one(executor)
        .await
        .map_err(|err| ServerError::unique(err, DUPLICATE))
}

#[async_trait]
impl GradeRepository for PgGradeRepository {
    async fn subjects(&self) -> Result<Vec<Subject>> {
        let query =
            format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE active ORDER BY code");

        Ok(sqlx::query_as::<_, Subject>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_subject(&self, id: i64) -> Result<Option<Subject>> {
        let query = format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1");

        Ok(sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, student_id: i64, grade: &NewGrade) -> Result<SemesterGrade> {
        let id = insert_one(&self.pool, student_id, grade).await?;

        let query = format!(
            "SELECT {GRADE_COLUMNS} FROM semester_grades g JOIN subjects s ON s.id = g.subject_id WHERE g.id = $1"
        );

        Ok(sqlx::query_as::<_, SemesterGrade>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn insert_batch(&self, student_id: i64, grades: &[NewGrade]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for grade in grades {
            insert_one(&mut *tx, student_id, grade).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_student(
        &self,
        student_id: i64,
        filter: &GradeFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<SemesterGrade>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count, student_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {GRADE_COLUMNS}"));
        push_filters(&mut select, student_id, filter);
        select.push(GRADE_ORDER);
        if let Some(page) = page {
            select
                .push(" LIMIT ")
                .push_bind(page.limit())
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let grades = select
            .build_query_as::<SemesterGrade>()
            .fetch_all(&self.pool)
            .await?;

        Ok((grades, total))
    }
}
