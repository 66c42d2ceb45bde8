use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Result, ServerError};
use crate::grade::{GradeFilter, GradeRepository, NewGrade, SemesterGrade, Subject};
use crate::model::{Page, PageRequest, sanitize_opt};
use crate::student::StudentRepository;

/// Business rules around subjects and semester grades.
#[derive(Clone)]
pub struct GradeService {
    students: Arc<dyn StudentRepository>,
    grades: Arc<dyn GradeRepository>,
}

impl GradeService {
    /// Create a new [`GradeService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        grades: Arc<dyn GradeRepository>,
    ) -> Self {
        Self { students, grades }
    }

    pub async fn subjects(&self) -> Result<Vec<Subject>> {
        self.grades.subjects().await
    }

    pub async fn create(&self, student_id: i64, grade: NewGrade) -> Result<SemesterGrade> {
        self.students.ensure_exists(student_id).await?;
        self.ensure_subjects([grade.subject_id]).await?;

        let grade = self.grades.insert(student_id, &clean(grade)).await?;
        tracing::info!(student_id, grade_id = grade.id, "semester grade created");

        Ok(grade)
    }

    /// Insert all grades in one transaction and return every grade of the
    /// student.
    pub async fn create_batch(
        &self,
        student_id: i64,
        grades: Vec<NewGrade>,
    ) -> Result<Vec<SemesterGrade>> {
        if grades.is_empty() {
            return Err(ServerError::BadRequest("grades must not be empty".into()));
        }

        self.students.ensure_exists(student_id).await?;
        self.ensure_subjects(grades.iter().map(|grade| grade.subject_id))
            .await?;

        let grades: Vec<NewGrade> = grades.into_iter().map(clean).collect();
        self.grades.insert_batch(student_id, &grades).await?;
        tracing::info!(student_id, count = grades.len(), "semester grades created");

        let (grades, _) = self
            .grades
            .find_by_student(student_id, &GradeFilter::default(), None)
            .await?;
        Ok(grades)
    }

    pub async fn list(
        &self,
        student_id: i64,
        filter: &GradeFilter,
        page: PageRequest,
    ) -> Result<Page<SemesterGrade>> {
        self.students.ensure_exists(student_id).await?;

        let (grades, total) = self
            .grades
            .find_by_student(student_id, filter, Some(page))
            .await?;

        Ok(Page::new(grades, page, total))
    }

    async fn ensure_subjects(&self, ids: impl IntoIterator<Item = i64>) -> Result<()> {
        let ids: BTreeSet<i64> = ids.into_iter().collect();

        for id in ids {
            if self.grades.find_subject(id).await?.is_none() {
                return Err(ServerError::NotFound("subject"));
            }
        }

        Ok(())
    }
}

fn clean(grade: NewGrade) -> NewGrade {
    NewGrade {
        academic_year: grade.academic_year.trim().to_owned(),
        knowledge_description: sanitize_opt(grade.knowledge_description.as_deref()),
        skill_description: sanitize_opt(grade.skill_description.as_deref()),
        ..grade
    }
}
