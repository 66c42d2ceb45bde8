use std::sync::Arc;

use validator::Validate;

use crate::error::Result;
use crate::guardian::{Guardian, GuardianRepository, NewGuardian};
use crate::student::StudentRepository;

/// Business rules around guardians.
#[derive(Clone)]
pub struct GuardianService {
    students: Arc<dyn StudentRepository>,
    guardians: Arc<dyn GuardianRepository>,
}

impl GuardianService {
    /// Create a new [`GuardianService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        guardians: Arc<dyn GuardianRepository>,
    ) -> Self {
        Self {
            students,
            guardians,
        }
    }

    /// Create the guardian of a student or update the existing one.
    pub async fn save(&self, student_id: i64, guardian: NewGuardian) -> Result<Guardian> {
        self.students.ensure_exists(student_id).await?;

        let guardian = guardian.sanitized();
        guardian.validate()?;

        let guardian = self.guardians.upsert(student_id, &guardian).await?;
        tracing::info!(student_id, guardian_id = guardian.id, "guardian saved");

        Ok(guardian)
    }
}
