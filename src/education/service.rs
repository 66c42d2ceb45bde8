use std::sync::Arc;

use validator::Validate;

use crate::education::{EducationChanges, EducationRepository, NewEducation, PreviousEducation};
use crate::error::{Result, ServerError};
use crate::student::StudentRepository;

/// Business rules around previous education.
#[derive(Clone)]
pub struct EducationService {
    students: Arc<dyn StudentRepository>,
    educations: Arc<dyn EducationRepository>,
}

impl EducationService {
    /// Create a new [`EducationService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        educations: Arc<dyn EducationRepository>,
    ) -> Self {
        Self {
            students,
            educations,
        }
    }

    pub async fn add(&self, student_id: i64, education: NewEducation) -> Result<PreviousEducation> {
        self.students.ensure_exists(student_id).await?;

        let education = education.sanitized();
        education.validate()?;

        let education = self.educations.insert(student_id, &education).await?;
        tracing::info!(student_id, education_id = education.id, "previous education added");

        Ok(education)
    }

    pub async fn update(&self, id: i64, changes: EducationChanges) -> Result<PreviousEducation> {
        let mut education = self
            .educations
            .find_by_id(id)
            .await?
            .ok_or(ServerError::NotFound("education"))?;

        let changes = changes.sanitized();
        changes.validate()?;
        changes.apply(&mut education);

        self.educations.update(&education).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.educations.delete(id).await? {
            return Err(ServerError::NotFound("education"));
        }

        tracing::info!(education_id = id, "previous education deleted");
        Ok(())
    }
}
