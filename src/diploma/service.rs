use std::sync::Arc;

use validator::Validate;

use crate::diploma::{DiplomaGrade, DiplomaRepository, NewDiplomaGrade};
use crate::error::{Result, ServerError};
use crate::grade::GradeRepository;
use crate::student::StudentRepository;

/// Business rules around diploma scores.
#[derive(Clone)]
pub struct DiplomaService {
    students: Arc<dyn StudentRepository>,
    grades: Arc<dyn GradeRepository>,
    diplomas: Arc<dyn DiplomaRepository>,
}

impl DiplomaService {
    /// Create a new [`DiplomaService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        grades: Arc<dyn GradeRepository>,
        diplomas: Arc<dyn DiplomaRepository>,
    ) -> Self {
        Self {
            students,
            grades,
            diplomas,
        }
    }

    pub async fn create(&self, student_id: i64, grade: NewDiplomaGrade) -> Result<DiplomaGrade> {
        self.students.ensure_exists(student_id).await?;
        if self.grades.find_subject(grade.subject_id).await?.is_none() {
            return Err(ServerError::NotFound("subject"));
        }

        let grade = grade.sanitized();
        grade.validate()?;

        let grade = self.diplomas.insert(student_id, &grade).await?;
        tracing::info!(student_id, diploma_grade_id = grade.id, "diploma grade created");

        Ok(grade)
    }

    pub async fn list(&self, student_id: i64) -> Result<Vec<DiplomaGrade>> {
        self.students.ensure_exists(student_id).await?;
        self.diplomas.find_by_student(student_id).await
    }
}
