//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Result, ServerError};
use crate::note::{Internship, NewInternship, NewSemesterNote, SemesterNote};

const COLUMNS: &str = "id, student_id, class, semester";
const INTERNSHIP_COLUMNS: &str = "id, note_id, company, location, months, description";

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fails with `409` if the semester already has a note.
    async fn insert(&self, student_id: i64, note: &NewSemesterNote) -> Result<SemesterNote>;
    /// Note without its internships.
    async fn find_by_id(&self, id: i64) -> Result<Option<SemesterNote>>;
    /// Notes of a student by class then semester, with their internships.
    async fn find_by_student(&self, student_id: i64) -> Result<Vec<SemesterNote>>;
    async fn insert_internship(&self, note_id: i64, internship: &NewInternship)
    -> Result<Internship>;
}

#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    /// Create a new [`PgNoteRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, student_id: i64, note: &NewSemesterNote) -> Result<SemesterNote> {
        let query = format!(
            "INSERT INTO semester_notes (student_id, class, semester) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, SemesterNote>(&query)
            .bind(student_id)
            .bind(&note.class)
            .bind(note.semester)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| ServerError::unique(err, "semester note already exists"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SemesterNote>> {
        let query = format!("SELECT {COLUMNS} FROM semester_notes WHERE id = $1");

        Ok(sqlx::query_as::<_, SemesterNote>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Vec<SemesterNote>> {
        let query = format!(
            r#"SELECT {COLUMNS} FROM semester_notes WHERE student_id = $1
                ORDER BY CASE class WHEN 'X' THEN 1 WHEN 'XI' THEN 2 ELSE 3 END, semester"#
        );
        let mut notes = sqlx::query_as::<_, SemesterNote>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = notes.iter().map(|note| note.id).collect();
        let query = format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE note_id = ANY($1) ORDER BY id"
        );
        let internships = sqlx::query_as::<_, Internship>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        for internship in internships {
            if let Some(note) = notes.iter_mut().find(|note| note.id == internship.note_id) {
                note.internships.push(internship);
            }
        }

        Ok(notes)
    }

    async fn insert_internship(
        &self,
        note_id: i64,
        internship: &NewInternship,
    ) -> Result<Internship> {
        let query = format!(
            r#"INSERT INTO internships (note_id, company, location, months, description)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {INTERNSHIP_COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Internship>(&query)
            .bind(note_id)
            .bind(&internship.company)
            .bind(&internship.location)
            .bind(internship.months)
            .bind(&internship.description)
            .fetch_one(&self.pool)
            .await?)
    }
}
