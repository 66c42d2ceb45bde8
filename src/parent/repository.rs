//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Result, ServerError};
use crate::parent::{NewParent, Parent};

const COLUMNS: &str = "id, student_id, kind, name, birth_place, birth_date, nationality, \
    last_education, occupation, monthly_income, address, phone, alive";

/// Storage of parents.
#[async_trait]
pub trait ParentRepository: Send + Sync {
    async fn insert(&self, student_id: i64, parent: &NewParent) -> Result<Parent>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Parent>>;
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<Parent>>;
    async fn update(&self, parent: &Parent) -> Result<Parent>;
    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Clone)]
pub struct PgParentRepository {
    pool: PgPool,
}

impl PgParentRepository {
    /// Create a new [`PgParentRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParentRepository for PgParentRepository {
    async fn insert(&self, student_id: i64, parent: &NewParent) -> Result<Parent> {
        let query = format!(
            r#"INSERT INTO parents (student_id, kind, name, birth_place, birth_date, nationality,
                last_education, occupation, monthly_income, address, phone, alive)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Parent>(&query)
            .bind(student_id)
            .bind(&parent.kind)
            .bind(&parent.name)
            .bind(&parent.birth_place)
            .bind(parent.birth_date)
            .bind(&parent.nationality)
            .bind(&parent.last_education)
            .bind(&parent.occupation)
            .bind(parent.monthly_income)
            .bind(&parent.address)
            .bind(&parent.phone)
            .bind(parent.alive)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Parent>> {
        let query = format!("SELECT {COLUMNS} FROM parents WHERE id = $1");

        Ok(sqlx::query_as::<_, Parent>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<Parent>> {
        let query =
            format!("SELECT {COLUMNS} FROM parents WHERE student_id = $1 ORDER BY id");

        Ok(sqlx::query_as::<_, Parent>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, parent: &Parent) -> Result<Parent> {
        let query = format!(
            r#"UPDATE parents SET kind = $1, name = $2, birth_place = $3, birth_date = $4,
                nationality = $5, last_education = $6, occupation = $7, monthly_income = $8,
                address = $9, phone = $10, alive = $11
                WHERE id = $12
                RETURNING {COLUMNS}"#
        );

        sqlx::query_as::<_, Parent>(&query)
            .bind(&parent.kind)
            .bind(&parent.name)
            .bind(&parent.birth_place)
            .bind(parent.birth_date)
            .bind(&parent.nationality)
            .bind(&parent.last_education)
            .bind(&parent.occupation)
            .bind(parent.monthly_income)
            .bind(&parent.address)
            .bind(&parent.phone)
            .bind(parent.alive)
            .bind(parent.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::NotFound("parent"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM parents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
