//! Handle database requests.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{Result, ServerError};
use crate::student::{NewStudent, Student, StudentQuery};

pub(crate) const COLUMNS: &str = "id, registration_number, nisn, full_name, nickname, gender, \
    birth_place, birth_date, religion, child_order, siblings, nationality, home_language, \
    photo_path, created_at, updated_at, deleted_at";

const DUPLICATE: &str = "NISN or registration number already exists";

/// Storage of students. Soft deleted students are never returned.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn insert(&self, student: &NewStudent) -> Result<Student>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>>;
    /// Return the requested page and the total number of matching students.
    async fn find_all(&self, query: &StudentQuery) -> Result<(Vec<Student>, i64)>;
    async fn update(&self, student: &Student) -> Result<Student>;
    /// Soft delete a student. Returns `false` if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Whether another student already uses `nisn`.
    async fn nisn_taken(&self, nisn: &str, except: Option<i64>) -> Result<bool>;
    /// Whether another student already uses `number`.
    async fn registration_number_taken(
        &self,
        number: &str,
        except: Option<i64>,
    ) -> Result<bool>;

    /// Fail with `404` unless a live student has this id.
    async fn ensure_exists(&self, id: i64) -> Result<()> {
        match self.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ServerError::NotFound("student")),
        }
    }
}

#[derive(Clone)]
pub struct PgStudentRepository {
    pool: PgPool,
}

impl PgStudentRepository {
    /// Create a new [`PgStudentRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn taken(&self, column: &str, value: &str, except: Option<i64>) -> Result<bool> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM students WHERE {column} = $1 AND deleted_at IS NULL AND ($2::BIGINT IS NULL OR id <> $2))"
        );

        Ok(sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .bind(except)
            .fetch_one(&self.pool)
            .await?)
    }
}

/// Escape `LIKE` wildcards.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &StudentQuery) {
    builder.push(" FROM students WHERE deleted_at IS NULL");

    if let Some(search) = query.search.as_deref() {
        let pattern = like_pattern(search);
        builder
            .push(" AND (full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR nisn ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR registration_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn insert(&self, student: &NewStudent) -> Result<Student> {
        let query = format!(
            r#"INSERT INTO students (registration_number, nisn, full_name, nickname, gender,
                birth_place, birth_date, religion, child_order, siblings, nationality, home_language)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(&student.registration_number)
            .bind(&student.nisn)
            .bind(&student.full_name)
            .bind(&student.nickname)
            .bind(&student.gender)
            .bind(&student.birth_place)
            .bind(student.birth_date)
            .bind(&student.religion)
            .bind(student.child_order)
            .bind(student.siblings)
            .bind(&student.nationality)
            .bind(&student.home_language)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| ServerError::unique(err, DUPLICATE))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = $1 AND deleted_at IS NULL");

        Ok(sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_all(&self, query: &StudentQuery) -> Result<(Vec<Student>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS}"));
        push_filters(&mut select, query);
        // Sort fragments come from enums only.
        select
            .push(" ORDER BY ")
            .push(query.sort_by.column())
            .push(" ")
            .push(query.sort_dir.as_sql())
            .push(", id ")
            .push(query.sort_dir.as_sql())
            .push(" LIMIT ")
            .push_bind(query.page.limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let students = select
            .build_query_as::<Student>()
            .fetch_all(&self.pool)
            .await?;

        Ok((students, total))
    }

    async fn update(&self, student: &Student) -> Result<Student> {
        let query = format!(
            r#"UPDATE students SET registration_number = $1, nisn = $2, full_name = $3,
                nickname = $4, gender = $5, birth_place = $6, birth_date = $7, religion = $8,
                child_order = $9, siblings = $10, nationality = $11, home_language = $12,
                updated_at = NOW()
                WHERE id = $13 AND deleted_at IS NULL
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(&student.registration_number)
            .bind(&student.nisn)
            .bind(&student.full_name)
            .bind(&student.nickname)
            .bind(&student.gender)
            .bind(&student.birth_place)
            .bind(student.birth_date)
            .bind(&student.religion)
            .bind(student.child_order)
            .bind(student.siblings)
            .bind(&student.nationality)
            .bind(&student.home_language)
            .bind(student.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| ServerError::unique(err, DUPLICATE))?
            .ok_or(ServerError::NotFound("student"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE students SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn nisn_taken(&self, nisn: &str, except: Option<i64>) -> Result<bool> {
        self.taken("nisn", nisn, except).await
    }

    async fn registration_number_taken(
        &self,
        number: &str,
        except: Option<i64>,
    ) -> Result<bool> {
        self.taken("registration_number", number, except).await
    }
}
